//! Offline `CloudClient` serving recorded API responses from a JSON file.
//!
//! Layout of a snapshot file:
//!
//! ```json
//! {
//!   "tenancy_id": "ocid1.tenancy.oc1..aaa",
//!   "region": "us-phoenix-1",
//!   "lists": {
//!     "oci_core_vcns": [
//!       { "params": { "compartment_id": "ocid1.compartment.oc1..c" },
//!         "pages": [ { "virtual_networks": [ { "id": "ocid1.vcn.oc1..v" } ] } ] }
//!     ]
//!   },
//!   "singular": { "oci_objectstorage_namespace": [ { "params": {}, "result": { "id": "ns" } } ] },
//!   "resources": { "oci_core_instance": { "ocid1.instance.oc1..i": { "id": "..." } } }
//! }
//! ```
//!
//! An entry may carry `"error": { "status": 500, "message": "..." }` instead of data.

use crate::discovery::client::{CloudClient, ListPage, ListRequest, QueryParams};
use crate::discovery::error::ClientError;
use anyhow::Context;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedError {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

impl RecordedError {
    fn to_client_error(&self, subject: &str) -> ClientError {
        match self.status {
            404 => ClientError::NotFound(subject.to_string()),
            429 => ClientError::Throttled,
            status => ClientError::Service {
                status,
                message: self.message.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ListEntry {
    #[serde(default)]
    params: QueryParams,
    #[serde(default)]
    pages: Vec<JsonValue>,
    #[serde(default)]
    error: Option<RecordedError>,
}

#[derive(Debug, Clone, Deserialize)]
struct SingularEntry {
    #[serde(default)]
    params: QueryParams,
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<RecordedError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordedResource {
    Error { error: RecordedError },
    Record(JsonValue),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotClient {
    #[serde(default)]
    tenancy_id: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    lists: HashMap<String, Vec<ListEntry>>,
    #[serde(default)]
    singular: HashMap<String, Vec<SingularEntry>>,
    #[serde(default)]
    resources: HashMap<String, HashMap<String, RecordedResource>>,
}

impl SnapshotClient {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
        let client = serde_json::from_str(&content)
            .with_context(|| format!("Invalid snapshot file {}", path.display()))?;
        Ok(client)
    }

    pub fn from_json(value: JsonValue) -> Result<Self, ClientError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl CloudClient for SnapshotClient {
    fn tenancy_id(&self) -> Result<String, ClientError> {
        self.tenancy_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::NotFound("tenancy".to_string()))
    }

    fn region(&self) -> Option<String> {
        self.region.clone()
    }

    fn list(&self, request: &ListRequest<'_>) -> Result<ListPage, ClientError> {
        let entry = self
            .lists
            .get(request.datasource)
            .and_then(|entries| entries.iter().find(|e| &e.params == request.params));

        let Some(entry) = entry else {
            return Ok(ListPage {
                body: json!({}),
                next_page: None,
            });
        };

        if let Some(error) = &entry.error {
            return Err(error.to_client_error(request.datasource));
        }

        let index = match request.page {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ClientError::MalformedResponse(format!("invalid page token '{}'", token))
            })?,
            None => 0,
        };

        let body = entry.pages.get(index).cloned().unwrap_or_else(|| json!({}));
        let next_page = (index + 1 < entry.pages.len()).then(|| (index + 1).to_string());
        Ok(ListPage { body, next_page })
    }

    fn read_singular(
        &self,
        datasource: &str,
        params: &QueryParams,
    ) -> Result<JsonValue, ClientError> {
        let entry = self
            .singular
            .get(datasource)
            .and_then(|entries| entries.iter().find(|e| &e.params == params));

        match entry {
            Some(SingularEntry {
                error: Some(error), ..
            }) => Err(error.to_client_error(datasource)),
            Some(entry) => Ok(entry.result.clone().unwrap_or_else(|| json!({}))),
            None => Ok(json!({})),
        }
    }

    fn get(&self, resource_type: &str, id: &str) -> Result<Option<JsonValue>, ClientError> {
        match self.resources.get(resource_type).and_then(|r| r.get(id)) {
            Some(RecordedResource::Error { error }) if error.status == 404 => Ok(None),
            Some(RecordedResource::Error { error }) => Err(error.to_client_error(id)),
            Some(RecordedResource::Record(record)) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SnapshotClient {
        SnapshotClient::from_json(json!({
            "tenancy_id": "ocid1.tenancy.oc1..t",
            "region": "us-phoenix-1",
            "lists": {
                "oci_core_vcns": [
                    {"params": {"compartment_id": "c1"}, "pages": [
                        {"virtual_networks": [{"id": "v1"}]},
                        {"virtual_networks": [{"id": "v2"}]}
                    ]},
                    {"params": {"compartment_id": "broken"}, "error": {"status": 500, "message": "boom"}}
                ]
            },
            "resources": {
                "oci_core_instance": {
                    "i1": {"id": "i1", "shape": "VM.Standard2.1"},
                    "gone": {"error": {"status": 404}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_list_pages() {
        let client = snapshot();
        let params: QueryParams = [("compartment_id".to_string(), "c1".to_string())].into();

        let first = client
            .list(&ListRequest {
                datasource: "oci_core_vcns",
                params: &params,
                page: None,
            })
            .unwrap();
        assert_eq!(first.next_page.as_deref(), Some("1"));

        let second = client
            .list(&ListRequest {
                datasource: "oci_core_vcns",
                params: &params,
                page: first.next_page.as_deref(),
            })
            .unwrap();
        assert_eq!(second.body["virtual_networks"][0]["id"], "v2");
        assert!(second.next_page.is_none());
    }

    #[test]
    fn test_recorded_error() {
        let client = snapshot();
        let params: QueryParams = [("compartment_id".to_string(), "broken".to_string())].into();
        let err = client
            .list(&ListRequest {
                datasource: "oci_core_vcns",
                params: &params,
                page: None,
            })
            .unwrap_err();
        assert!(matches!(err, ClientError::Service { status: 500, .. }));
    }

    #[test]
    fn test_get() {
        let client = snapshot();
        assert!(client.get("oci_core_instance", "i1").unwrap().is_some());
        assert!(client.get("oci_core_instance", "gone").unwrap().is_none());
        assert!(client.get("oci_core_instance", "unknown").unwrap().is_none());
        assert_eq!(client.tenancy_id().unwrap(), "ocid1.tenancy.oc1..t");
    }
}
