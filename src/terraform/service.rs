//! Running the terraform binary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("Terraform command failed: {0}")]
    CommandError(String),

    #[error("Terraform binary not found: {0}")]
    BinaryNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Outcome of one `terraform import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub resource_address: String,
    pub resource_id: String,
    pub message: String,
    pub output: Option<String>,
}

/// The terraform operations the import step needs.
#[async_trait]
pub trait TerraformRunner: Send + Sync {
    async fn init(&self, working_dir: &Path) -> anyhow::Result<String>;

    /// Import `id` into `address`, writing to `state_path`. A failed import is
    /// an `Ok` result with `success == false`; `Err` means terraform could
    /// not be run at all.
    async fn import(
        &self,
        working_dir: &Path,
        state_path: &Path,
        address: &str,
        id: &str,
    ) -> anyhow::Result<ImportResult>;
}

pub struct TerraformService {
    terraform_path: PathBuf,
}

impl TerraformService {
    pub fn new(terraform_path: PathBuf) -> Self {
        debug!(
            "TerraformService initialized with terraform path: {}",
            terraform_path.display()
        );
        Self { terraform_path }
    }

    /// Locate the binary from config, `TERRAFORM_BINARY_NAME`, or `PATH`.
    pub fn locate(configured: Option<&str>) -> Result<Self, TerraformError> {
        let path = match configured {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(TerraformError::BinaryNotFound(path.display().to_string()));
                }
                path
            }
            None => {
                let binary = std::env::var("TERRAFORM_BINARY_NAME")
                    .unwrap_or_else(|_| "terraform".to_string());
                which::which(&binary).map_err(|_| TerraformError::BinaryNotFound(binary))?
            }
        };
        Ok(Self::new(path))
    }

    pub fn terraform_path(&self) -> &Path {
        &self.terraform_path
    }

    pub async fn get_version(&self) -> anyhow::Result<String> {
        let output = Command::new(&self.terraform_path)
            .arg("version")
            .arg("-json")
            .output()
            .await?;

        let output_str = String::from_utf8_lossy(&output.stdout);
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&output_str) {
            if let Some(version) = json.get("terraform_version").and_then(|v| v.as_str()) {
                return Ok(version.to_string());
            }
        }

        Ok(output_str
            .lines()
            .find(|line| line.starts_with("Terraform") || line.starts_with("OpenTofu"))
            .unwrap_or("Unknown version")
            .to_string())
    }
}

#[async_trait]
impl TerraformRunner for TerraformService {
    async fn init(&self, working_dir: &Path) -> anyhow::Result<String> {
        let output = Command::new(&self.terraform_path)
            .arg("init")
            .arg("-input=false")
            .arg("-no-color")
            .current_dir(working_dir)
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(TerraformError::CommandError(format!(
                "terraform init failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ))
            .into())
        }
    }

    async fn import(
        &self,
        working_dir: &Path,
        state_path: &Path,
        address: &str,
        id: &str,
    ) -> anyhow::Result<ImportResult> {
        debug!("terraform import {} {}", address, id);
        let output = Command::new(&self.terraform_path)
            .arg("import")
            .arg("-input=false")
            .arg("-no-color")
            .arg(format!("-state={}", state_path.display()))
            .arg(address)
            .arg(id)
            .current_dir(working_dir)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            Ok(ImportResult {
                success: true,
                resource_address: address.to_string(),
                resource_id: id.to_string(),
                message: "Resource imported successfully".to_string(),
                output: Some(stdout.to_string()),
            })
        } else {
            Ok(ImportResult {
                success: false,
                resource_address: address.to_string(),
                resource_id: id.to_string(),
                message: classify_import_failure(&stderr, address, id),
                output: Some(stderr.to_string()),
            })
        }
    }
}

/// Turn terraform's import stderr into a one-line reason.
pub fn classify_import_failure(stderr: &str, address: &str, id: &str) -> String {
    if stderr.contains("Cannot import non-existent remote object") {
        format!("Resource with ID '{}' does not exist in the cloud", id)
    } else if stderr.contains("Resource already managed by Terraform") {
        format!("Resource '{}' is already managed by Terraform", address)
    } else if stderr.contains("configuration for") && stderr.contains("is not present") {
        format!("No configuration found for '{}'", address)
    } else if stderr.contains("doesn't support import") {
        format!("Resource type of '{}' does not support import", address)
    } else {
        let reason = stderr
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("Error:"))
            .unwrap_or_else(|| stderr.trim());
        format!("Import failed: {}", reason)
    }
}
