//! Inspection of the state file produced by importing.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TerraformStateJson {
    version: Option<i32>,
    terraform_version: Option<String>,
    serial: Option<i64>,
    resources: Option<Vec<StateResourceJson>>,
}

#[derive(Debug, Deserialize)]
struct StateResourceJson {
    #[serde(default)]
    mode: Option<String>,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    instances: Vec<serde_json::Value>,
}

/// What an imported state contains.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateSummary {
    pub state_version: Option<i32>,
    pub terraform_version: Option<String>,
    pub serial: Option<i64>,
    /// `<type>.<name>` of every managed resource with at least one instance
    pub addresses: Vec<String>,
}

impl StateSummary {
    pub fn resource_count(&self) -> usize {
        self.addresses.len()
    }
}

pub fn summarize_state(state_json: &str) -> anyhow::Result<StateSummary> {
    let state: TerraformStateJson = serde_json::from_str(state_json)?;
    let addresses = state
        .resources
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.mode.as_deref().unwrap_or("managed") == "managed")
        .filter(|r| !r.instances.is_empty())
        .map(|r| format!("{}.{}", r.resource_type, r.name))
        .collect();

    Ok(StateSummary {
        state_version: state.version,
        terraform_version: state.terraform_version,
        serial: state.serial,
        addresses,
    })
}

pub fn read_state(path: &Path) -> anyhow::Result<StateSummary> {
    let content = std::fs::read_to_string(path)?;
    summarize_state(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_state() {
        let state = r#"{
            "version": 4,
            "terraform_version": "1.6.0",
            "serial": 3,
            "resources": [
                {"mode": "managed", "type": "oci_core_vcn", "name": "export_vcn",
                 "provider": "provider[\"registry.terraform.io/oracle/oci\"]",
                 "instances": [{"attributes": {"id": "v1"}}]},
                {"mode": "data", "type": "oci_objectstorage_namespace", "name": "ns",
                 "instances": [{"attributes": {}}]},
                {"mode": "managed", "type": "oci_core_subnet", "name": "export_empty",
                 "instances": []}
            ]
        }"#;

        let summary = summarize_state(state).unwrap();
        assert_eq!(summary.state_version, Some(4));
        assert_eq!(summary.terraform_version.as_deref(), Some("1.6.0"));
        assert_eq!(summary.resource_count(), 1);
        assert_eq!(summary.addresses, vec!["oci_core_vcn.export_vcn"]);
    }

    #[test]
    fn test_state_without_resources() {
        let summary = summarize_state(r#"{"version": 4}"#).unwrap();
        assert_eq!(summary.resource_count(), 0);
    }

    #[test]
    fn test_invalid_state() {
        assert!(summarize_state("not json").is_err());
    }
}
