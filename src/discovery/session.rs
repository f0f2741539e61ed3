//! State of one discovery run.

use crate::catalog::Catalog;
use crate::discovery::client::CloudClient;
use crate::discovery::error::DiscoveryErrorRecord;
use crate::discovery::graph::Scope;
use crate::discovery::naming::NameRegistry;
use crate::discovery::references::ReferenceMap;
use crate::discovery::resource::{DiscoveredResource, ResourceId};
use crate::discovery::value::{AttributeMap, Value};
use std::collections::HashSet;

/// Everything a run accumulates. Instance-scoped, so independent sessions
/// can run side by side in one process.
pub struct DiscoverySession<'a> {
    pub(crate) client: &'a dyn CloudClient,
    pub(crate) catalog: &'a Catalog,
    pub(crate) resources: Vec<DiscoveredResource>,
    pub(crate) errors: Vec<DiscoveryErrorRecord>,
    pub(crate) references: ReferenceMap,
    pub(crate) names: NameRegistry,
    pub(crate) seen: HashSet<(String, String)>,
    id_filter: Option<HashSet<String>>,
}

impl<'a> DiscoverySession<'a> {
    pub fn new(client: &'a dyn CloudClient, catalog: &'a Catalog) -> Self {
        Self {
            client,
            catalog,
            resources: Vec::new(),
            errors: Vec::new(),
            references: ReferenceMap::new(),
            names: NameRegistry::new(),
            seen: HashSet::new(),
            id_filter: None,
        }
    }

    /// Only export resources whose id is listed. Others are still traversed.
    pub fn with_id_filter(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        let ids: HashSet<String> = ids.into_iter().collect();
        self.id_filter = (!ids.is_empty()).then_some(ids);
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Add the pseudo-resource a graph walk starts from. Its id is bound to
    /// a root variable instead of a resource reference.
    pub fn add_root(&mut self, scope: Scope, id: &str) -> ResourceId {
        let index = ResourceId(self.resources.len());
        let name = match scope {
            Scope::Compartment => "export",
            Scope::Tenancy => "tenancy",
        };
        let attributes: AttributeMap = [
            ("id".to_string(), Value::from(id)),
            ("compartment_id".to_string(), Value::from(id)),
        ]
        .into();

        self.resources.push(DiscoveredResource {
            index,
            resource_type: scope.root_type().to_string(),
            id: id.to_string(),
            terraform_name: self.names.assign(name),
            attributes,
            parent: None,
            service: String::new(),
            import_id: None,
            omit_from_export: true,
            is_error: false,
        });
        self.references
            .register(id, format!("var.{}", scope.variable()));
        index
    }

    pub(crate) fn is_filtered_out(&self, id: &str) -> bool {
        self.id_filter
            .as_ref()
            .is_some_and(|filter| !filter.contains(id))
    }

    pub fn resource(&self, id: ResourceId) -> &DiscoveredResource {
        &self.resources[id.0]
    }

    pub fn resources(&self) -> &[DiscoveredResource] {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut [DiscoveredResource] {
        &mut self.resources
    }

    /// Resources that end up in generated configuration.
    pub fn exported(&self) -> impl Iterator<Item = &DiscoveredResource> {
        self.resources.iter().filter(|r| !r.omit_from_export)
    }

    pub fn errors(&self) -> &[DiscoveryErrorRecord] {
        &self.errors
    }

    pub fn record_error(&mut self, record: DiscoveryErrorRecord) {
        self.errors.push(record);
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut ReferenceMap {
        &mut self.references
    }

    /// Drop references to resources whose import failed.
    pub fn invalidate_failed_references(&mut self) -> usize {
        self.references.invalidate(&self.resources)
    }

    /// Drop references to resources excluded by the id filter.
    pub fn prune_omitted_references(&mut self) {
        self.references.prune_omitted(&self.resources);
    }

    /// Walk up the parent chain, nearest parent first.
    pub fn ancestors(&self, id: ResourceId) -> Vec<ResourceId> {
        let mut chain = Vec::new();
        let mut current = self.resource(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.resource(parent).parent;
        }
        chain
    }
}
