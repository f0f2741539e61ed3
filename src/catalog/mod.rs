//! Compiled-in resource hints, schemas and service graphs.

pub mod definitions;
pub mod graphs;
pub mod schemas;

use crate::discovery::graph::{ResourceGraph, Scope};
use crate::discovery::hints::ResourceTypeHint;
use crate::discovery::schema::ResourceSchema;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The catalog shipped with the binary.
pub static BUILTIN: Lazy<Catalog> = Lazy::new(Catalog::builtin);

pub struct Catalog {
    hints: HashMap<&'static str, ResourceTypeHint>,
    schemas: HashMap<&'static str, ResourceSchema>,
    graphs: Vec<ResourceGraph>,
}

impl Catalog {
    pub fn new(
        hints: Vec<ResourceTypeHint>,
        schemas: Vec<(&'static str, ResourceSchema)>,
        graphs: Vec<ResourceGraph>,
    ) -> Self {
        Self {
            hints: hints.into_iter().map(|h| (h.resource_type, h)).collect(),
            schemas: schemas.into_iter().collect(),
            graphs,
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            definitions::builtin_hints(),
            vec![
                ("oci_core_vcn", schemas::vcn()),
                ("oci_core_subnet", schemas::subnet()),
                ("oci_core_route_table", schemas::route_table()),
                ("oci_core_security_list", schemas::security_list()),
                ("oci_core_internet_gateway", schemas::internet_gateway()),
                ("oci_core_instance", schemas::instance()),
                ("oci_core_volume", schemas::volume()),
                ("oci_core_volume_attachment", schemas::volume_attachment()),
                ("oci_database_db_system", schemas::db_system()),
                ("oci_database_autonomous_database", schemas::autonomous_database()),
                ("oci_objectstorage_bucket", schemas::bucket()),
                ("oci_load_balancer_load_balancer", schemas::load_balancer()),
                ("oci_load_balancer_backend_set", schemas::backend_set()),
                ("oci_ons_notification_topic", schemas::notification_topic()),
                ("oci_ons_subscription", schemas::subscription()),
                ("oci_identity_compartment", schemas::compartment()),
                ("oci_identity_user", schemas::user()),
                ("oci_identity_api_key", schemas::api_key()),
                ("oci_identity_group", schemas::group()),
                ("oci_identity_policy", schemas::policy()),
            ],
            graphs::builtin_graphs(),
        )
    }

    pub fn hint(&self, resource_type: &str) -> Option<&ResourceTypeHint> {
        self.hints.get(resource_type)
    }

    pub fn schema(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.schemas.get(resource_type)
    }

    pub fn graph(&self, service: &str) -> Option<&ResourceGraph> {
        self.graphs.iter().find(|g| g.service == service)
    }

    pub fn graphs(&self) -> &[ResourceGraph] {
        &self.graphs
    }

    pub fn services(&self, scope: Scope) -> impl Iterator<Item = &'static str> + '_ {
        self.graphs
            .iter()
            .filter(move |g| g.scope == scope)
            .map(|g| g.service)
    }

    /// Graphs must be acyclic, every child needs a hint, and every exported
    /// type needs a schema.
    pub fn validate(&self) -> Result<(), String> {
        for graph in &self.graphs {
            graph.validate()?;
            for resource_type in graph.resource_types() {
                let hint = self.hint(resource_type).ok_or_else(|| {
                    format!(
                        "graph '{}' references '{}' which has no hint",
                        graph.service, resource_type
                    )
                })?;
                if !hint.is_datasource && self.schema(resource_type).is_none() {
                    return Err(format!("'{}' has no schema", resource_type));
                }
            }
        }
        Ok(())
    }
}
