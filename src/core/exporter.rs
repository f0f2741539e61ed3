//! The `export` command: precondition checks, discovery, import, emission.

use crate::catalog::Catalog;
use crate::discovery::client::{CloudClient, QueryParams};
use crate::discovery::error::DiscoveryErrorRecord;
use crate::discovery::graph::{ResourceGraph, Scope, COMPARTMENT_ROOT};
use crate::discovery::hints::fetch_records;
use crate::discovery::resource::ResourceId;
use crate::discovery::session::DiscoverySession;
use crate::discovery::value::non_empty_str;
use crate::terraform::emitter::MissingAttribute;
use crate::terraform::files;
use crate::terraform::import::{self, ImportOutcome};
use crate::terraform::service::TerraformRunner;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{info, warn};

/// Run the synchronous discovery walk. Client calls and retry backoff block,
/// so on a multi-threaded runtime the worker is handed off first.
fn run_blocking<R>(walk: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(walk)
        }
        _ => walk(),
    }
}

/// Fatal problems found before discovery starts.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No output path given")]
    MissingOutputPath,

    #[error("Output path '{0}' is not an existing directory")]
    NotADirectory(PathBuf),

    #[error("Cannot resolve tenancy id: {0}")]
    TenancyUnresolved(String),

    #[error("Cannot resolve compartment named '{name}': {reason}")]
    CompartmentNameUnresolved { name: String, reason: String },

    #[error("Unknown service '{0}'")]
    UnknownService(String),

    #[error("Give either a compartment id or a compartment name, not both")]
    ConflictingScope,

    #[error("State generation requested but no terraform runner is available")]
    NoTerraformRunner,

    #[error("Failed to write output: {0}")]
    Output(String),
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub compartment_id: Option<String>,
    pub compartment_name: Option<String>,
    /// Services to run; all services valid for the scope when empty
    pub services: Vec<String>,
    pub exclude_services: Vec<String>,
    /// Restrict output to these resource ids
    pub ids: Vec<String>,
    pub output_path: Option<PathBuf>,
    pub generate_state: bool,
    /// Overrides the client's region in `provider.tf`
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Success,
    Failure,
    PartialSuccess,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::PartialSuccess => 64,
        }
    }
}

/// Result of one export run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub compartment_id: String,
    pub services: Vec<String>,
    /// Selected services that cannot run at this scope
    pub skipped_services: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub discovered: usize,
    /// Resources written as live configuration blocks
    pub exported: usize,
    pub import: Option<ImportOutcome>,
    pub files: Vec<PathBuf>,
    pub errors: Vec<DiscoveryErrorRecord>,
    pub missing_attributes: Vec<MissingAttribute>,
}

impl RunSummary {
    pub fn exit_status(&self) -> ExitStatus {
        if self.errors.is_empty() {
            ExitStatus::Success
        } else if self.exported > 0 {
            ExitStatus::PartialSuccess
        } else {
            ExitStatus::Failure
        }
    }
}

pub struct Exporter<'a> {
    client: &'a dyn CloudClient,
    catalog: &'a Catalog,
    runner: Option<&'a dyn TerraformRunner>,
}

impl<'a> Exporter<'a> {
    pub fn new(client: &'a dyn CloudClient, catalog: &'a Catalog) -> Self {
        Self {
            client,
            catalog,
            runner: None,
        }
    }

    pub fn with_runner(mut self, runner: &'a dyn TerraformRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    pub async fn run(&self, options: &ExportOptions) -> Result<RunSummary, ExportError> {
        let started_at = Utc::now();

        let output_dir = options
            .output_path
            .clone()
            .ok_or(ExportError::MissingOutputPath)?;
        if !output_dir.is_dir() {
            return Err(ExportError::NotADirectory(output_dir));
        }
        if options.compartment_id.is_some() && options.compartment_name.is_some() {
            return Err(ExportError::ConflictingScope);
        }
        if options.generate_state && self.runner.is_none() {
            return Err(ExportError::NoTerraformRunner);
        }

        let tenancy_id = self
            .client
            .tenancy_id()
            .map_err(|e| ExportError::TenancyUnresolved(e.to_string()))?;
        if tenancy_id.is_empty() {
            return Err(ExportError::TenancyUnresolved("empty tenancy id".to_string()));
        }

        let compartment_id = match (&options.compartment_id, &options.compartment_name) {
            (Some(id), _) => id.clone(),
            (None, Some(name)) => self.resolve_compartment_name(&tenancy_id, name)?,
            (None, None) => tenancy_id.clone(),
        };
        let at_tenancy_root = compartment_id == tenancy_id;

        let (graphs, skipped_services) = select_graphs(
            self.catalog,
            &options.services,
            &options.exclude_services,
            at_tenancy_root,
        )?;
        let service_names: Vec<&str> = graphs.iter().map(|g| g.service).collect();
        info!(
            "Exporting {} from {} into {}",
            service_names.join(", "),
            compartment_id,
            output_dir.display()
        );

        let mut session = DiscoverySession::new(self.client, self.catalog)
            .with_id_filter(options.ids.iter().cloned());
        run_blocking(|| {
            let mut roots: Vec<(Scope, ResourceId)> = Vec::new();
            for graph in &graphs {
                let root = match roots.iter().find(|(scope, _)| *scope == graph.scope) {
                    Some((_, root)) => *root,
                    None => {
                        let root_id = match graph.scope {
                            Scope::Compartment => &compartment_id,
                            Scope::Tenancy => &tenancy_id,
                        };
                        let root = session.add_root(graph.scope, root_id);
                        roots.push((graph.scope, root));
                        root
                    }
                };
                session.discover_graph(graph, root);
            }
            session.prune_omitted_references();
        });
        let discovered = session.exported().count();

        let region = options.region.clone().or_else(|| self.client.region());

        let import = match (options.generate_state, self.runner) {
            (true, Some(runner)) => Some(
                import::import_resources(&mut session, runner, &output_dir, region.as_deref())
                    .await
                    .map_err(|e| ExportError::Output(e.to_string()))?,
            ),
            _ => None,
        };

        let config = files::generate(&session, &service_names, region.as_deref());
        let written = config
            .write_to(&output_dir)
            .map_err(|e| ExportError::Output(e.to_string()))?;

        let summary = RunSummary {
            compartment_id,
            services: service_names.iter().map(|s| s.to_string()).collect(),
            skipped_services,
            started_at,
            finished_at: Utc::now(),
            discovered,
            exported: config.resource_count,
            import,
            files: written,
            errors: session.errors().to_vec(),
            missing_attributes: config.missing,
        };
        info!(
            "Export finished: {} resource(s) exported, {} error(s)",
            summary.exported,
            summary.errors.len()
        );
        Ok(summary)
    }

    /// Find the single active compartment called `name` anywhere in the tenancy.
    fn resolve_compartment_name(&self, tenancy_id: &str, name: &str) -> Result<String, ExportError> {
        let unresolved = |reason: String| ExportError::CompartmentNameUnresolved {
            name: name.to_string(),
            reason,
        };
        let hint = self
            .catalog
            .hint(COMPARTMENT_ROOT)
            .ok_or_else(|| unresolved("compartments are not in the catalog".to_string()))?;

        let params: QueryParams = [
            ("compartment_id".to_string(), tenancy_id.to_string()),
            ("compartment_id_in_subtree".to_string(), "true".to_string()),
            ("access_level".to_string(), "ANY".to_string()),
        ]
        .into();
        let records = fetch_records(self.client, hint, &params).map_err(|e| unresolved(e.to_string()))?;

        let matches: Vec<String> = records
            .iter()
            .filter(|r| non_empty_str(r, "name") == Some(name))
            .filter(|r| {
                non_empty_str(r, "state").map_or(true, |s| s.eq_ignore_ascii_case("ACTIVE"))
            })
            .filter_map(|r| non_empty_str(r, "id").map(str::to_string))
            .collect();

        match matches.as_slice() {
            [id] => {
                info!("Compartment '{}' resolved to {}", name, id);
                Ok(id.clone())
            }
            [] => Err(unresolved("no active compartment with that name".to_string())),
            _ => Err(unresolved(format!(
                "{} active compartments share that name",
                matches.len()
            ))),
        }
    }
}

/// Graphs to run, in catalog order, plus selected services skipped because
/// their scope does not match.
fn select_graphs<'c>(
    catalog: &'c Catalog,
    include: &[String],
    exclude: &[String],
    at_tenancy_root: bool,
) -> Result<(Vec<&'c ResourceGraph>, Vec<String>), ExportError> {
    for name in include.iter().chain(exclude) {
        if catalog.graph(name).is_none() {
            return Err(ExportError::UnknownService(name.clone()));
        }
    }

    let mut selected = Vec::new();
    let mut skipped = Vec::new();
    for graph in catalog.graphs() {
        let wanted = include.is_empty() || include.iter().any(|s| s == graph.service);
        if !wanted || exclude.iter().any(|s| s == graph.service) {
            continue;
        }
        if graph.scope == Scope::Tenancy && !at_tenancy_root {
            if !include.is_empty() {
                warn!(
                    "Service '{}' is tenancy scoped and is only exported from the tenancy root",
                    graph.service
                );
                skipped.push(graph.service.to_string());
            }
            continue;
        }
        selected.push(graph);
    }
    Ok((selected, skipped))
}
