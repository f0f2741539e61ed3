//! Native id to interpolation expression table.

use crate::discovery::resource::DiscoveredResource;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct ReferenceMap {
    entries: HashMap<String, String>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the expression for `id`.
    pub fn register(&mut self, id: impl Into<String>, expression: impl Into<String>) {
        self.entries.insert(id.into(), expression.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expression to emit for `value`, unless it is the owning resource's own id.
    pub fn resolve(&self, value: &str, self_id: &str) -> Option<&str> {
        if value == self_id {
            return None;
        }
        self.get(value)
    }

    /// Drop entries for resources excluded from the export. The root
    /// pseudo-resource keeps its variable binding.
    pub fn prune_omitted(&mut self, resources: &[DiscoveredResource]) {
        for resource in resources {
            if resource.omit_from_export && resource.parent.is_some() {
                self.remove_resource(resource);
            }
        }
    }

    /// Remove every reference to resources whose import failed: their own
    /// entry and any expression that names them. Returns the number of
    /// entries removed.
    pub fn invalidate(&mut self, resources: &[DiscoveredResource]) -> usize {
        let before = self.entries.len();
        for resource in resources.iter().filter(|r| r.is_error) {
            self.remove_resource(resource);
        }
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Invalidated {} reference(s) to failed imports", removed);
        }
        removed
    }

    fn remove_resource(&mut self, resource: &DiscoveredResource) {
        self.entries.remove(&resource.id);
        let needle = format!("{}.", resource.address());
        self.entries.retain(|_, expression| !expression.contains(&needle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::resource::ResourceId;
    use crate::discovery::value::AttributeMap;

    fn resource(index: usize, resource_type: &str, id: &str, name: &str) -> DiscoveredResource {
        DiscoveredResource {
            index: ResourceId(index),
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            terraform_name: name.to_string(),
            attributes: AttributeMap::new(),
            parent: Some(ResourceId(0)),
            service: "core".to_string(),
            import_id: None,
            omit_from_export: false,
            is_error: false,
        }
    }

    #[test]
    fn test_resolve_skips_self_reference() {
        let mut refs = ReferenceMap::new();
        refs.register("v1", "oci_core_vcn.export_vcn.id");

        assert_eq!(refs.resolve("v1", "s1"), Some("oci_core_vcn.export_vcn.id"));
        assert_eq!(refs.resolve("v1", "v1"), None);
        assert_eq!(refs.resolve("unknown", "s1"), None);
    }

    #[test]
    fn test_register_overwrites() {
        let mut refs = ReferenceMap::new();
        refs.register("v1", "a.b.id");
        refs.register("v1", "c.d.id");
        assert_eq!(refs.get("v1"), Some("c.d.id"));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_invalidate_removes_textual_references() {
        let mut vcn = resource(1, "oci_core_vcn", "v1", "export_db");
        let other = resource(2, "oci_core_vcn", "v2", "export_db_1");
        vcn.is_error = true;

        let mut refs = ReferenceMap::new();
        refs.register("v1", vcn.reference_expression());
        refs.register("v2", other.reference_expression());
        refs.register("x", "oci_core_vcn.export_db.default_route_table_id");

        let removed = refs.invalidate(&[vcn, other]);

        assert_eq!(removed, 2);
        assert!(refs.get("v1").is_none());
        assert!(refs.get("x").is_none());
        assert_eq!(refs.get("v2"), Some("oci_core_vcn.export_db_1.id"));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_prune_omitted_keeps_root_binding() {
        let mut root = resource(0, "oci_identity_compartment", "c1", "export");
        root.parent = None;
        root.omit_from_export = true;
        let mut vcn = resource(1, "oci_core_vcn", "v1", "export_vcn");
        vcn.omit_from_export = true;

        let mut refs = ReferenceMap::new();
        refs.register("c1", "var.compartment_ocid");
        refs.register("v1", vcn.reference_expression());

        refs.prune_omitted(&[root, vcn]);
        assert_eq!(refs.get("c1"), Some("var.compartment_ocid"));
        assert!(refs.get("v1").is_none());
    }
}
