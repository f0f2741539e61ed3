//! Attribute schemas for exportable resource types.

use std::collections::BTreeMap;

/// Whether the practitioner sets an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Read-only; never written to generated configuration
    Computed,
}

/// Shape of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    String,
    Number,
    Bool,
    /// List or set of primitives
    List,
    /// Map of primitives
    Map,
    /// Repeated nested block (list/set of objects)
    Block(ResourceSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub kind: AttributeKind,
    pub presence: Presence,
    pub deprecated: bool,
}

impl AttributeSchema {
    /// Computed-only and deprecated attributes are never emitted.
    pub fn is_emitted(&self) -> bool {
        !self.deprecated && self.presence != Presence::Computed
    }
}

/// Schema of a resource or nested block, attributes sorted by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceSchema {
    pub attributes: BTreeMap<String, AttributeSchema>,
}

impl ResourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, name: &str, kind: AttributeKind, presence: Presence) -> Self {
        self.attributes.insert(
            name.to_string(),
            AttributeSchema {
                kind,
                presence,
                deprecated: false,
            },
        );
        self
    }

    pub fn required(self, name: &str, kind: AttributeKind) -> Self {
        self.with(name, kind, Presence::Required)
    }

    pub fn optional(self, name: &str, kind: AttributeKind) -> Self {
        self.with(name, kind, Presence::Optional)
    }

    pub fn computed(self, name: &str, kind: AttributeKind) -> Self {
        self.with(name, kind, Presence::Computed)
    }

    pub fn deprecated(mut self, name: &str, kind: AttributeKind) -> Self {
        self.attributes.insert(
            name.to_string(),
            AttributeSchema {
                kind,
                presence: Presence::Optional,
                deprecated: true,
            },
        );
        self
    }

    /// Attributes common to every compartment-scoped resource.
    pub fn with_common_tags(self) -> Self {
        self.optional("defined_tags", AttributeKind::Map)
            .optional("freeform_tags", AttributeKind::Map)
            .computed("id", AttributeKind::String)
            .computed("state", AttributeKind::String)
            .computed("time_created", AttributeKind::String)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitted_attributes() {
        let schema = ResourceSchema::new()
            .required("cidr_block", AttributeKind::String)
            .deprecated("ipv6cidr_block", AttributeKind::String)
            .with_common_tags();

        assert!(schema.get("cidr_block").unwrap().is_emitted());
        assert!(schema.get("freeform_tags").unwrap().is_emitted());
        assert!(!schema.get("ipv6cidr_block").unwrap().is_emitted());
        assert!(!schema.get("id").unwrap().is_emitted());
    }
}
