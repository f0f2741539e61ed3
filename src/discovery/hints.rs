//! Per-type discovery metadata and the override seam for bespoke types.

use crate::discovery::client::{CloudClient, ListRequest, QueryParams};
use crate::discovery::error::{ClientError, DiscoveryError};
use crate::discovery::resource::ResourceDraft;
use crate::discovery::value::{attributes_from_json, AttributeMap};
use serde_json::Value as JsonValue;
use tracing::trace;

/// How instances of a type are read from the datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// Plural datasource; `items_attribute` holds the list. With `collection`
    /// each list element wraps the real items in its own `items` attribute.
    Plural {
        items_attribute: &'static str,
        collection: bool,
    },
    /// Singular datasource yielding at most one resource
    Singular,
}

/// Static descriptor for one discoverable resource class.
pub struct ResourceTypeHint {
    pub resource_type: &'static str,
    pub datasource: &'static str,
    pub query: QueryShape,
    /// Listing returns partial attributes; re-read each resource by id
    pub requires_refresh: bool,
    /// Lifecycle states eligible for discovery; empty means any
    pub discoverable_states: &'static [&'static str],
    /// Used in fallback names: `<parent>_<abbreviation>_<n>`
    pub abbreviation: &'static str,
    pub supports_import: bool,
    /// Intermediate lookup feeding child queries; never exported itself
    pub is_datasource: bool,
    pub discoverer: Box<dyn Discoverer>,
}

impl std::fmt::Debug for ResourceTypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTypeHint")
            .field("resource_type", &self.resource_type)
            .field("datasource", &self.datasource)
            .field("query", &self.query)
            .finish()
    }
}

impl ResourceTypeHint {
    /// Plural hint with default behaviour; adjust with the builder methods.
    pub fn plural(
        resource_type: &'static str,
        datasource: &'static str,
        items_attribute: &'static str,
    ) -> Self {
        Self {
            resource_type,
            datasource,
            query: QueryShape::Plural {
                items_attribute,
                collection: false,
            },
            requires_refresh: false,
            discoverable_states: &[],
            abbreviation: abbreviation_for(resource_type),
            supports_import: true,
            is_datasource: false,
            discoverer: Box::new(ListDiscoverer),
        }
    }

    pub fn singular(resource_type: &'static str, datasource: &'static str) -> Self {
        Self {
            query: QueryShape::Singular,
            ..Self::plural(resource_type, datasource, "")
        }
    }

    pub fn collection(mut self) -> Self {
        if let QueryShape::Plural { items_attribute, .. } = self.query {
            self.query = QueryShape::Plural {
                items_attribute,
                collection: true,
            };
        }
        self
    }

    pub fn refresh(mut self) -> Self {
        self.requires_refresh = true;
        self
    }

    pub fn states(mut self, states: &'static [&'static str]) -> Self {
        self.discoverable_states = states;
        self
    }

    pub fn datasource_only(mut self) -> Self {
        self.is_datasource = true;
        self.supports_import = false;
        self
    }

    pub fn with_discoverer(mut self, discoverer: impl Discoverer + 'static) -> Self {
        self.discoverer = Box::new(discoverer);
        self
    }

    /// Eligible when no states are declared or the state matches ignoring case.
    pub fn is_discoverable_state(&self, state: Option<&str>) -> bool {
        if self.discoverable_states.is_empty() {
            return true;
        }
        state.is_some_and(|s| {
            self.discoverable_states
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(s))
        })
    }
}

/// `oci_core_route_table` -> `route_table`.
fn abbreviation_for(resource_type: &'static str) -> &'static str {
    let trimmed = resource_type.strip_prefix("oci_").unwrap_or(resource_type);
    trimmed.split_once('_').map_or(trimmed, |(_, rest)| rest)
}

/// Capability interface for resource types whose discovery deviates from
/// the plain list call. Every method has the standard behaviour as default.
pub trait Discoverer: Send + Sync {
    /// Fetch raw attribute maps for one association.
    fn discover(
        &self,
        client: &dyn CloudClient,
        hint: &ResourceTypeHint,
        params: &QueryParams,
    ) -> Result<Vec<AttributeMap>, DiscoveryError> {
        fetch_records(client, hint, params)
    }

    /// Composite id for APIs that do not return one.
    fn synthesize_id(&self, _attributes: &AttributeMap) -> Option<String> {
        None
    }

    /// Post-process a freshly listed batch.
    fn process(&self, batch: Vec<ResourceDraft>) -> Result<Vec<ResourceDraft>, DiscoveryError> {
        Ok(batch)
    }

    /// Import id when the native id cannot be used to re-fetch the resource.
    fn import_id(&self, _draft: &ResourceDraft) -> Option<String> {
        None
    }

    /// Adjust attributes right before serialization.
    fn customize(&self, _attributes: &mut AttributeMap) {}
}

/// Standard discovery: page through the datasource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListDiscoverer;

impl Discoverer for ListDiscoverer {}

/// Read every record for `hint`, following pagination and unwrapping
/// collection envelopes.
pub fn fetch_records(
    client: &dyn CloudClient,
    hint: &ResourceTypeHint,
    params: &QueryParams,
) -> Result<Vec<AttributeMap>, DiscoveryError> {
    let (items_attribute, collection) = match hint.query {
        QueryShape::Singular => {
            let body = client.read_singular(hint.datasource, params)?;
            return Ok(vec![attributes_from_json(body)]);
        }
        QueryShape::Plural {
            items_attribute,
            collection,
        } => (items_attribute, collection),
    };

    let mut records = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let page = client.list(&ListRequest {
            datasource: hint.datasource,
            params,
            page: page_token.as_deref(),
        })?;

        let items = items_of(&page.body, items_attribute, hint.datasource)?;
        for item in items {
            if collection {
                records.extend(
                    items_of(item, "items", hint.datasource)?
                        .iter()
                        .cloned()
                        .map(attributes_from_json),
                );
            } else {
                records.push(attributes_from_json(item.clone()));
            }
        }

        match page.next_page {
            Some(token) => {
                trace!("{}: fetching next page {}", hint.datasource, token);
                page_token = Some(token);
            }
            None => break,
        }
    }

    Ok(records)
}

fn items_of<'a>(
    body: &'a JsonValue,
    attribute: &str,
    datasource: &str,
) -> Result<&'a [JsonValue], ClientError> {
    match body.get(attribute) {
        None | Some(JsonValue::Null) => Ok(&[]),
        Some(JsonValue::Array(items)) => Ok(items),
        Some(other) => Err(ClientError::MalformedResponse(format!(
            "{}: expected a list in '{}', got {}",
            datasource, attribute, other
        ))),
    }
}
