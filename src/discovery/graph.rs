//! Resource graphs: which child types to query under a parent type, and how.

use crate::discovery::client::QueryParams;
use crate::discovery::resource::DiscoveredResource;
use std::collections::{HashMap, HashSet};

/// Resource type of the compartment pseudo-resource discovery starts from.
pub const COMPARTMENT_ROOT: &str = "oci_identity_compartment";
/// Resource type of the tenancy pseudo-resource.
pub const TENANCY_ROOT: &str = "oci_identity_tenancy";

/// Where a graph's traversal starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compartment,
    Tenancy,
}

impl Scope {
    pub fn root_type(self) -> &'static str {
        match self {
            Scope::Compartment => COMPARTMENT_ROOT,
            Scope::Tenancy => TENANCY_ROOT,
        }
    }

    /// Variable the generated configuration uses for the root id.
    pub fn variable(self) -> &'static str {
        match self {
            Scope::Compartment => "compartment_ocid",
            Scope::Tenancy => "tenancy_ocid",
        }
    }
}

/// How one datasource query attribute is filled from the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Constant written in quotes in the graph table
    Literal(String),
    /// The parent's own id
    ParentId,
    /// Named attribute of the parent
    ParentAttribute(String),
}

impl QueryParam {
    /// `"\"ACTIVE\""` is a literal, `"id"` is the parent id, anything else
    /// names a parent attribute.
    pub fn parse(raw: &str) -> Self {
        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            QueryParam::Literal(raw[1..raw.len() - 1].to_string())
        } else if raw == "id" {
            QueryParam::ParentId
        } else {
            QueryParam::ParentAttribute(raw.to_string())
        }
    }
}

/// Edge from a parent type to a child type.
#[derive(Debug, Clone)]
pub struct Association {
    pub child: &'static str,
    pub params: Vec<(String, QueryParam)>,
}

impl Association {
    pub fn new(child: &'static str, params: &[(&str, &str)]) -> Self {
        Self {
            child,
            params: params
                .iter()
                .map(|(key, raw)| (key.to_string(), QueryParam::parse(raw)))
                .collect(),
        }
    }

    /// Build the query for this association. Returns the name of the
    /// parent attribute that was missing if it cannot be built.
    pub fn derive_params(&self, parent: &DiscoveredResource) -> Result<QueryParams, String> {
        let mut query = QueryParams::new();
        for (key, rule) in &self.params {
            let value = match rule {
                QueryParam::Literal(value) => value.clone(),
                QueryParam::ParentId => parent.id.clone(),
                QueryParam::ParentAttribute(attr) => parent
                    .attributes
                    .get(attr)
                    .and_then(|v| v.to_plain_string())
                    .ok_or_else(|| attr.clone())?,
            };
            query.insert(key.clone(), value);
        }
        Ok(query)
    }
}

/// Graph of one service mode.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    pub service: &'static str,
    pub scope: Scope,
    edges: HashMap<&'static str, Vec<Association>>,
}

impl ResourceGraph {
    pub fn new(service: &'static str, scope: Scope) -> Self {
        Self {
            service,
            scope,
            edges: HashMap::new(),
        }
    }

    pub fn edge(mut self, parent: &'static str, children: Vec<Association>) -> Self {
        self.edges.entry(parent).or_default().extend(children);
        self
    }

    pub fn children(&self, parent: &str) -> &[Association] {
        self.edges.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every child type reachable from the root, in traversal order.
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut stack = vec![self.scope.root_type()];
        while let Some(parent) = stack.pop() {
            let fresh: Vec<&'static str> = self
                .children(parent)
                .iter()
                .filter(|assoc| seen.insert(assoc.child))
                .map(|assoc| assoc.child)
                .collect();
            ordered.extend(fresh.iter().copied());
            stack.extend(fresh.into_iter().rev());
        }
        ordered
    }

    /// Reject graphs containing a cycle.
    pub fn validate(&self) -> Result<(), String> {
        fn visit<'a>(
            graph: &'a ResourceGraph,
            node: &'a str,
            path: &mut Vec<&'a str>,
            done: &mut HashSet<&'a str>,
        ) -> Result<(), String> {
            if path.contains(&node) {
                return Err(format!(
                    "graph '{}' has a cycle: {} -> {}",
                    graph.service,
                    path.join(" -> "),
                    node
                ));
            }
            if done.contains(node) {
                return Ok(());
            }
            path.push(node);
            for assoc in graph.children(node) {
                visit(graph, assoc.child, path, done)?;
            }
            path.pop();
            done.insert(node);
            Ok(())
        }

        let mut done = HashSet::new();
        for parent in self.edges.keys() {
            visit(self, parent, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::resource::ResourceId;
    use crate::discovery::value::attributes_from_json;
    use serde_json::json;

    fn parent() -> DiscoveredResource {
        DiscoveredResource {
            index: ResourceId(1),
            resource_type: "oci_core_vcn".to_string(),
            id: "v1".to_string(),
            terraform_name: "export_vcn".to_string(),
            attributes: attributes_from_json(json!({"compartment_id": "c1", "id": "v1"})),
            parent: Some(ResourceId(0)),
            service: "core".to_string(),
            import_id: None,
            omit_from_export: false,
            is_error: false,
        }
    }

    #[test]
    fn test_parse_query_param() {
        assert_eq!(
            QueryParam::parse("\"AVAILABLE\""),
            QueryParam::Literal("AVAILABLE".to_string())
        );
        assert_eq!(QueryParam::parse("id"), QueryParam::ParentId);
        assert_eq!(
            QueryParam::parse("compartment_id"),
            QueryParam::ParentAttribute("compartment_id".to_string())
        );
    }

    #[test]
    fn test_derive_params() {
        let assoc = Association::new(
            "oci_core_subnet",
            &[
                ("compartment_id", "compartment_id"),
                ("vcn_id", "id"),
                ("state", "\"AVAILABLE\""),
            ],
        );
        let params = assoc.derive_params(&parent()).unwrap();
        assert_eq!(params["compartment_id"], "c1");
        assert_eq!(params["vcn_id"], "v1");
        assert_eq!(params["state"], "AVAILABLE");
    }

    #[test]
    fn test_derive_params_missing_attribute() {
        let assoc = Association::new("oci_core_subnet", &[("vcn_id", "vcn_id")]);
        assert_eq!(assoc.derive_params(&parent()).unwrap_err(), "vcn_id");
    }

    #[test]
    fn test_validate_detects_cycle() {
        let graph = ResourceGraph::new("loop", Scope::Compartment)
            .edge(COMPARTMENT_ROOT, vec![Association::new("a", &[])])
            .edge("a", vec![Association::new("b", &[])])
            .edge("b", vec![Association::new("a", &[])]);
        assert!(graph.validate().unwrap_err().contains("cycle"));

        let dag = ResourceGraph::new("dag", Scope::Compartment)
            .edge(COMPARTMENT_ROOT, vec![Association::new("a", &[]), Association::new("b", &[])])
            .edge("a", vec![Association::new("c", &[])])
            .edge("b", vec![Association::new("c", &[])]);
        assert!(dag.validate().is_ok());
        assert_eq!(dag.resource_types(), vec!["a", "b", "c"]);
    }
}
