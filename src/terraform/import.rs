//! Import discovered resources into a state file.

use crate::discovery::error::{DiscoveryError, DiscoveryErrorRecord};
use crate::discovery::resource::ResourceId;
use crate::discovery::session::DiscoverySession;
use crate::terraform::files::{render_import_config, render_provider, IMPORT_CONFIG_FILE, PROVIDER_FILE};
use crate::terraform::service::TerraformRunner;
use crate::terraform::state::read_state;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const STATE_FILE: &str = "terraform.tfstate";
/// Imports write here; promoted to `STATE_FILE` once all imports ran.
pub const SCRATCH_STATE_FILE: &str = "terraform.tfstate.tmp";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub attempted: usize,
    pub imported: usize,
    pub failed: usize,
    /// Set when a state file was promoted
    pub state_path: Option<PathBuf>,
    /// Managed resources recorded in the promoted state
    pub state_resources: Option<usize>,
}

struct ImportJob {
    index: ResourceId,
    address: String,
    import_id: String,
    resource_type: String,
    parent_name: String,
    service: String,
}

/// Import every exported, importable resource of `session`.
///
/// Individual failures flag the resource as `is_error` and are recorded on
/// the session. Only I/O problems with the output directory return `Err`.
pub async fn import_resources(
    session: &mut DiscoverySession<'_>,
    runner: &dyn TerraformRunner,
    output_dir: &Path,
    region: Option<&str>,
) -> anyhow::Result<ImportOutcome> {
    let jobs = import_jobs(session);
    let mut outcome = ImportOutcome {
        attempted: jobs.len(),
        ..Default::default()
    };
    if jobs.is_empty() {
        info!("Nothing to import");
        return Ok(outcome);
    }
    // Terraform runs inside the scratch directory and resolves `-state` from there.
    let output_dir = &fs::canonicalize(output_dir)?;

    let scratch = tempfile::Builder::new()
        .prefix(".tfdiscover-import-")
        .tempdir_in(output_dir)?;
    fs::write(scratch.path().join(PROVIDER_FILE), render_provider(region))?;
    fs::write(
        scratch.path().join(IMPORT_CONFIG_FILE),
        render_import_config(jobs.iter().map(|job| session.resource(job.index))),
    )?;

    let scratch_state = output_dir.join(SCRATCH_STATE_FILE);
    if scratch_state.exists() {
        fs::remove_file(&scratch_state)?;
    }

    info!("Running terraform init in {}", scratch.path().display());
    if let Err(err) = runner.init(scratch.path()).await {
        warn!("terraform init failed, skipping {} import(s): {}", jobs.len(), err);
        let error = DiscoveryError::Init(err.to_string());
        session.record_error(DiscoveryErrorRecord::new("terraform", "init", "import", &error));
        for job in &jobs {
            session.resources_mut()[job.index.0].is_error = true;
        }
        outcome.failed = jobs.len();
        session.invalidate_failed_references();
        return Ok(outcome);
    }

    for (n, job) in jobs.iter().enumerate() {
        info!(
            "Importing {} ({}/{}): {}",
            job.address,
            n + 1,
            jobs.len(),
            job.import_id
        );
        let failure = match runner
            .import(scratch.path(), &scratch_state, &job.address, &job.import_id)
            .await
        {
            Ok(result) if result.success => None,
            Ok(result) => Some(result.message),
            Err(err) => Some(err.to_string()),
        };

        match failure {
            None => outcome.imported += 1,
            Some(message) => {
                warn!("Import of {} failed: {}", job.address, message);
                session.resources_mut()[job.index.0].is_error = true;
                let error = DiscoveryError::Import {
                    address: job.address.clone(),
                    message,
                };
                session.record_error(DiscoveryErrorRecord::new(
                    &job.resource_type,
                    &job.parent_name,
                    &job.service,
                    &error,
                ));
                outcome.failed += 1;
            }
        }
    }

    if scratch_state.exists() {
        let state_path = output_dir.join(STATE_FILE);
        fs::rename(&scratch_state, &state_path)?;
        match read_state(&state_path) {
            Ok(state) => {
                info!(
                    "State written to {} with {} resource(s)",
                    state_path.display(),
                    state.resource_count()
                );
                outcome.state_resources = Some(state.resource_count());
            }
            Err(err) => warn!("Cannot read {}: {}", state_path.display(), err),
        }
        outcome.state_path = Some(state_path);
    } else {
        debug!("No state produced by import");
    }

    session.invalidate_failed_references();
    Ok(outcome)
}

fn import_jobs(session: &DiscoverySession<'_>) -> Vec<ImportJob> {
    let catalog = session.catalog();
    session
        .exported()
        .filter(|resource| {
            let importable = catalog
                .hint(&resource.resource_type)
                .is_some_and(|hint| hint.supports_import);
            if !importable {
                debug!("{} does not support import", resource.address());
            }
            importable
        })
        .map(|resource| ImportJob {
            index: resource.index,
            address: resource.address(),
            import_id: resource.import_id().to_string(),
            resource_type: resource.resource_type.clone(),
            parent_name: resource
                .parent
                .map(|p| session.resource(p).terraform_name.clone())
                .unwrap_or_default(),
            service: resource.service.clone(),
        })
        .collect()
}
