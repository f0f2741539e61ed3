//! Resources found by discovery, stored in the session arena.

use crate::discovery::value::{AttributeMap, Value};
use serde::Serialize;

/// Index of a resource in its session's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId(pub usize);

/// One concrete instance found during discovery.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredResource {
    pub index: ResourceId,
    pub resource_type: String,
    /// Native cloud id, or a synthesized composite id when the API has none
    pub id: String,
    /// Unique configuration name within the session
    pub terraform_name: String,
    pub attributes: AttributeMap,
    pub parent: Option<ResourceId>,
    /// Service graph that discovered this resource
    pub service: String,
    /// Import id when it differs from `id`
    pub import_id: Option<String>,
    pub omit_from_export: bool,
    pub is_error: bool,
}

impl DiscoveredResource {
    /// `<type>.<name>` address used by terraform commands.
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.terraform_name)
    }

    /// Expression other resources use to reference this one.
    pub fn reference_expression(&self) -> String {
        format!("{}.id", self.address())
    }

    pub fn import_id(&self) -> &str {
        self.import_id.as_deref().unwrap_or(&self.id)
    }

    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }
}

/// A resource not yet added to a session.
#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
    pub id: String,
    pub attributes: AttributeMap,
    pub import_id: Option<String>,
}

impl ResourceDraft {
    pub fn new(id: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            id: id.into(),
            attributes,
            import_id: None,
        }
    }
}
