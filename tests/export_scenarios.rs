use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tfdiscover::core::exporter::{ExitStatus, ExportOptions, Exporter, RunSummary};
use tfdiscover::discovery::SnapshotClient;
use tfdiscover::formatters::OutputFormatter;
use tfdiscover::terraform::import::STATE_FILE;
use tfdiscover::terraform::{ImportResult, TerraformRunner};
use tfdiscover::BUILTIN;

const TENANCY: &str = "ocid1.tenancy.oc1..t";
const COMPARTMENT: &str = "ocid1.compartment.oc1..c";

fn snapshot(lists: Value, resources: Value) -> SnapshotClient {
    SnapshotClient::from_json(json!({
        "tenancy_id": TENANCY,
        "region": "us-phoenix-1",
        "lists": lists,
        "resources": resources,
    }))
    .unwrap()
}

fn in_compartment() -> Value {
    json!({"compartment_id": COMPARTMENT})
}

fn vcn(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "display_name": name,
        "compartment_id": COMPARTMENT,
        "cidr_blocks": ["10.0.0.0/16"],
        "state": "AVAILABLE"
    })
}

fn network_with_subnet() -> Value {
    json!({
        "oci_core_vcns": [{"params": in_compartment(), "pages": [{"virtual_networks": [vcn("v1", "main")]}]}],
        "oci_core_subnets": [{
            "params": {"compartment_id": COMPARTMENT, "vcn_id": "v1"},
            "pages": [{"subnets": [{
                "id": "s1",
                "display_name": "app",
                "compartment_id": COMPARTMENT,
                "vcn_id": "v1",
                "cidr_block": "10.0.1.0/24",
                "state": "AVAILABLE"
            }]}]
        }]
    })
}

fn options(dir: &Path, services: &[&str]) -> ExportOptions {
    ExportOptions {
        compartment_id: Some(COMPARTMENT.to_string()),
        services: services.iter().map(|s| s.to_string()).collect(),
        output_path: Some(dir.to_path_buf()),
        ..Default::default()
    }
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap_or_default()
}

async fn export(client: &SnapshotClient, options: &ExportOptions) -> RunSummary {
    Exporter::new(client, &BUILTIN).run(options).await.unwrap()
}

/// Fails the import of the listed ids; successful imports write the state file.
struct ScriptedRunner {
    failing_ids: Vec<&'static str>,
    imported: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn failing(ids: &[&'static str]) -> Self {
        Self {
            failing_ids: ids.to_vec(),
            imported: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TerraformRunner for ScriptedRunner {
    async fn init(&self, _working_dir: &Path) -> anyhow::Result<String> {
        Ok("Terraform has been successfully initialized!".to_string())
    }

    async fn import(
        &self,
        working_dir: &Path,
        state_path: &Path,
        address: &str,
        id: &str,
    ) -> anyhow::Result<ImportResult> {
        let success = !self.failing_ids.contains(&id);
        if success {
            self.imported.lock().unwrap().push(address.to_string());
            fs::write(working_dir.join(state_path), r#"{"version": 4, "resources": []}"#)?;
        }
        Ok(ImportResult {
            success,
            resource_address: address.to_string(),
            resource_id: id.to_string(),
            message: if success {
                "Resource imported successfully".to_string()
            } else {
                format!("Resource with ID '{}' does not exist in the cloud", id)
            },
            output: None,
        })
    }
}

#[tokio::test]
async fn test_single_network_resource() {
    let client = snapshot(
        json!({"oci_core_vcns": [{"params": in_compartment(), "pages": [{"virtual_networks": [vcn("v1", "main")]}]}]}),
        json!({}),
    );
    let dir = tempfile::tempdir().unwrap();

    let summary = export(&client, &options(dir.path(), &["core"])).await;

    assert!(summary.errors.is_empty());
    assert_eq!(summary.exported, 1);
    assert_eq!(summary.exit_status(), ExitStatus::Success);

    let core = read(dir.path(), "core.tf");
    assert_eq!(core.matches("resource \"").count(), 1);
    assert!(core.contains("resource \"oci_core_vcn\" \"export_main\" {"));
    assert!(core.contains("compartment_id = var.compartment_ocid"));

    let vars = read(dir.path(), "vars.tf");
    assert_eq!(vars.matches("variable \"").count(), 1);
    assert!(vars.contains(&format!(
        "variable \"compartment_ocid\" {{\n  default = \"{}\"\n}}",
        COMPARTMENT
    )));
    assert!(read(dir.path(), "provider.tf").contains("region = \"us-phoenix-1\""));
}

#[tokio::test]
async fn test_duplicate_names_get_suffixes() {
    let adb = |id: &str| {
        json!({
            "id": id,
            "display_name": "db",
            "db_name": id,
            "compartment_id": COMPARTMENT,
            "state": "AVAILABLE"
        })
    };
    let client = snapshot(
        json!({"oci_database_autonomous_databases": [{
            "params": in_compartment(),
            "pages": [{"autonomous_databases": [adb("adb1"), adb("adb2")]}]
        }]}),
        json!({}),
    );
    let dir = tempfile::tempdir().unwrap();

    let summary = export(&client, &options(dir.path(), &["database"])).await;

    assert_eq!(summary.exported, 2);
    let database = read(dir.path(), "database.tf");
    assert!(database.contains("resource \"oci_database_autonomous_database\" \"export_db\" {"));
    assert!(database.contains("resource \"oci_database_autonomous_database\" \"export_db_1\" {"));
    assert!(database.contains("db_name = \"adb1\""));
    assert!(database.contains("db_name = \"adb2\""));
}

#[tokio::test]
async fn test_missing_required_attribute_is_placeholdered() {
    let client = snapshot(
        json!({"oci_core_instances": [{
            "params": in_compartment(),
            "pages": [{"instances": [{"id": "i1", "state": "RUNNING"}]}]
        }]}),
        json!({"oci_core_instance": {"i1": {
            "id": "i1",
            "display_name": "web",
            "compartment_id": COMPARTMENT,
            "availability_domain": "AD-1",
            "image_id": "img1",
            "state": "RUNNING"
        }}}),
    );
    let dir = tempfile::tempdir().unwrap();

    let summary = export(&client, &options(dir.path(), &["core"])).await;

    let core = read(dir.path(), "core.tf");
    assert!(core.contains("shape = \"<placeholder for missing required attribute>\""));
    assert!(core.contains("ignore_changes = [shape]"));
    assert!(core.contains("source_id = \"img1\""));
    assert_eq!(summary.missing_attributes.len(), 1);
    assert_eq!(summary.missing_attributes[0].address, "oci_core_instance.export_web");
    assert_eq!(summary.missing_attributes[0].path, "shape");
    assert_eq!(summary.exit_status(), ExitStatus::Success);

    let text = OutputFormatter::summary_text(&summary);
    assert!(text.contains("WARNING: required attributes missing"));
    assert!(text.contains("oci_core_instance.export_web: shape"));
}

#[tokio::test]
async fn test_failed_import_falls_back_to_literal_id() {
    let client = snapshot(network_with_subnet(), json!({}));
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::failing(&["v1"]);

    let summary = Exporter::new(&client, &BUILTIN)
        .with_runner(&runner)
        .run(&ExportOptions {
            generate_state: true,
            ..options(dir.path(), &["core"])
        })
        .await
        .unwrap();

    let core = read(dir.path(), "core.tf");
    assert!(core.contains("  vcn_id = \"v1\"\n"));
    assert!(!core.contains("oci_core_vcn.export_main.id"));
    assert!(core.contains("# resource \"oci_core_vcn\" \"export_main\" {"));
    assert!(core.contains("resource \"oci_core_subnet\" \"export_app\" {"));

    assert_eq!(
        *runner.imported.lock().unwrap(),
        vec!["oci_core_subnet.export_app".to_string()]
    );
    let import = summary.import.as_ref().unwrap();
    assert_eq!((import.attempted, import.imported, import.failed), (2, 1, 1));
    assert!(dir.path().join(STATE_FILE).exists());

    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].message.contains("oci_core_vcn.export_main"));
    assert_eq!(summary.exit_status(), ExitStatus::PartialSuccess);
    assert_eq!(summary.exit_status().code(), 64);
}

#[tokio::test]
async fn test_successful_import_keeps_references() {
    let client = snapshot(network_with_subnet(), json!({}));
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::failing(&[]);

    let summary = Exporter::new(&client, &BUILTIN)
        .with_runner(&runner)
        .run(&ExportOptions {
            generate_state: true,
            ..options(dir.path(), &["core"])
        })
        .await
        .unwrap();

    assert!(summary.errors.is_empty());
    assert!(read(dir.path(), "core.tf").contains("vcn_id = oci_core_vcn.export_main.id"));
    assert!(!dir.path().join("terraform.tfstate.tmp").exists());
}

#[tokio::test]
async fn test_state_written_for_relative_output_path() {
    let client = snapshot(network_with_subnet(), json!({}));
    let dir = tempfile::tempdir_in(".").unwrap();
    let relative = PathBuf::from(dir.path().file_name().unwrap());
    let runner = ScriptedRunner::failing(&[]);

    let summary = Exporter::new(&client, &BUILTIN)
        .with_runner(&runner)
        .run(&ExportOptions {
            generate_state: true,
            ..options(&relative, &["core"])
        })
        .await
        .unwrap();

    let import = summary.import.unwrap();
    assert_eq!(import.imported, 2);
    assert!(import.state_path.is_some());
    assert!(dir.path().join(STATE_FILE).exists());
    assert!(read(dir.path(), "core.tf").contains("resource \"oci_core_subnet\""));
}

#[tokio::test]
async fn test_string_values_do_not_declare_variables() {
    let client = snapshot(
        json!({"oci_core_vcns": [{"params": in_compartment(), "pages": [{"virtual_networks": [vcn("v1", "see var.secret")]}]}]}),
        json!({}),
    );
    let dir = tempfile::tempdir().unwrap();

    export(&client, &options(dir.path(), &["core"])).await;

    assert!(read(dir.path(), "core.tf").contains("display_name = \"see var.secret\""));
    let vars = read(dir.path(), "vars.tf");
    assert!(!vars.contains("secret"));
    assert_eq!(vars.matches("variable \"").count(), 1);
}

#[tokio::test]
async fn test_id_filter_still_traverses_parents() {
    let client = snapshot(network_with_subnet(), json!({}));
    let dir = tempfile::tempdir().unwrap();

    let summary = export(
        &client,
        &ExportOptions {
            ids: vec!["s1".to_string()],
            ..options(dir.path(), &["core"])
        },
    )
    .await;

    assert_eq!(summary.exported, 1);
    let core = read(dir.path(), "core.tf");
    assert!(!core.contains("resource \"oci_core_vcn\""));
    assert!(core.contains("resource \"oci_core_subnet\" \"export_app\" {"));
    assert!(core.contains("vcn_id = \"v1\""));
}

#[tokio::test]
async fn test_listing_failure_is_deferred() {
    let client = snapshot(
        json!({
            "oci_core_vcns": [{"params": in_compartment(), "pages": [{"virtual_networks": [vcn("v1", "main")]}]}],
            "oci_core_subnets": [{
                "params": {"compartment_id": COMPARTMENT, "vcn_id": "v1"},
                "error": {"status": 500, "message": "internal error"}
            }]
        }),
        json!({}),
    );
    let dir = tempfile::tempdir().unwrap();

    let summary = export(&client, &options(dir.path(), &["core"])).await;

    assert_eq!(summary.exported, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].resource_class, "oci_core_subnet");
    assert_eq!(summary.errors[0].parent_name, "export_main");
    assert_eq!(summary.exit_status(), ExitStatus::PartialSuccess);
}

#[tokio::test]
async fn test_nothing_exported_with_errors_is_failure() {
    let client = snapshot(
        json!({"oci_core_vcns": [{"params": in_compartment(), "error": {"status": 401, "message": "not authorized"}}]}),
        json!({}),
    );
    let dir = tempfile::tempdir().unwrap();

    let summary = export(&client, &options(dir.path(), &["core"])).await;

    assert_eq!(summary.exported, 0);
    assert_eq!(summary.exit_status(), ExitStatus::Failure);
}

#[tokio::test]
async fn test_tenancy_services_skipped_below_root() {
    let client = snapshot(json!({}), json!({}));
    let dir = tempfile::tempdir().unwrap();

    let summary = export(&client, &options(dir.path(), &["core", "identity"])).await;

    assert_eq!(summary.services, vec!["core".to_string()]);
    assert_eq!(summary.skipped_services, vec!["identity".to_string()]);
    assert!(!dir.path().join("identity.tf").exists());
}

#[tokio::test]
async fn test_identity_export_at_tenancy_root() {
    let client = snapshot(
        json!({
            "oci_identity_users": [{
                "params": {"compartment_id": TENANCY},
                "pages": [{"users": [{
                    "id": "u1",
                    "name": "alice@example.com",
                    "description": "ops",
                    "compartment_id": TENANCY,
                    "state": "ACTIVE"
                }]}]
            }]
        }),
        json!({}),
    );
    let dir = tempfile::tempdir().unwrap();

    let summary = export(
        &client,
        &ExportOptions {
            services: vec!["identity".to_string()],
            output_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        },
    )
    .await;

    assert_eq!(summary.compartment_id, TENANCY);
    let identity = read(dir.path(), "identity.tf");
    assert!(identity.contains("resource \"oci_identity_user\" \"export_alice-example-com\" {"));
    assert!(identity.contains("compartment_id = var.tenancy_ocid"));
    assert!(read(dir.path(), "vars.tf").contains("variable \"tenancy_ocid\""));
}
