//! Text and JSON renderings of command results.

use crate::catalog::Catalog;
use crate::core::exporter::RunSummary;
use crate::discovery::graph::ResourceGraph;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output formatter for command results
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_services(catalog: &Catalog) -> Value {
        json!({
            "summary": {
                "total_services": catalog.graphs().len(),
            },
            "services": catalog.graphs().iter().map(|graph| {
                json!({
                    "name": graph.service,
                    "scope": graph.scope,
                    "resource_types": graph.resource_types().len(),
                })
            }).collect::<Vec<_>>()
        })
    }

    pub fn services_text(catalog: &Catalog) -> String {
        catalog
            .graphs()
            .iter()
            .map(|graph| format!("{:<16} {:?} scope\n", graph.service, graph.scope))
            .collect()
    }

    /// Exportable resource types per service. Intermediate lookups that are
    /// never exported are left out.
    pub fn format_exportable_resources(catalog: &Catalog, graphs: &[&ResourceGraph]) -> Value {
        json!({
            "services": graphs.iter().map(|graph| {
                json!({
                    "name": graph.service,
                    "resources": exportable_types(catalog, graph).iter().map(|(resource_type, importable)| {
                        json!({
                            "type": resource_type,
                            "supports_import": importable,
                        })
                    }).collect::<Vec<_>>()
                })
            }).collect::<Vec<_>>()
        })
    }

    pub fn exportable_resources_text(catalog: &Catalog, graphs: &[&ResourceGraph]) -> String {
        let mut out = String::new();
        for graph in graphs {
            out.push_str(&format!("{}:\n", graph.service));
            for (resource_type, importable) in exportable_types(catalog, graph) {
                let note = if importable { "" } else { " (not importable)" };
                out.push_str(&format!("  {}{}\n", resource_type, note));
            }
        }
        out
    }

    pub fn format_summary(summary: &RunSummary) -> Value {
        let mut result = json!({
            "status": summary.exit_status(),
            "compartment_id": summary.compartment_id,
            "services": summary.services,
            "started_at": summary.started_at.to_rfc3339(),
            "finished_at": summary.finished_at.to_rfc3339(),
            "discovered": summary.discovered,
            "exported": summary.exported,
            "files": summary.files,
            "errors": summary.errors,
            "missing_attributes": summary.missing_attributes,
        });
        if !summary.skipped_services.is_empty() {
            result["skipped_services"] = json!(summary.skipped_services);
        }
        if let Some(import) = &summary.import {
            result["import"] = json!(import);
        }
        result
    }

    pub fn summary_text(summary: &RunSummary) -> String {
        let elapsed = summary.finished_at - summary.started_at;
        let mut out = format!(
            "Exported {} of {} discovered resource(s) from {} in {:.1}s\n",
            summary.exported,
            summary.discovered,
            summary.compartment_id,
            elapsed.num_milliseconds() as f64 / 1000.0
        );
        out.push_str(&format!("Services: {}\n", summary.services.join(", ")));
        if !summary.skipped_services.is_empty() {
            out.push_str(&format!(
                "Skipped (tenancy scoped): {}\n",
                summary.skipped_services.join(", ")
            ));
        }
        if let Some(import) = &summary.import {
            out.push_str(&format!(
                "Imported {} of {} resource(s), {} failed\n",
                import.imported, import.attempted, import.failed
            ));
            match (&import.state_path, import.state_resources) {
                (Some(path), Some(count)) => {
                    out.push_str(&format!("State: {} ({} resource(s))\n", path.display(), count));
                }
                (Some(path), None) => out.push_str(&format!("State: {}\n", path.display())),
                (None, _) => {}
            }
        }
        for file in &summary.files {
            out.push_str(&format!("Wrote {}\n", file.display()));
        }

        if !summary.errors.is_empty() {
            out.push_str(&format!("\n{} error(s) during export:\n", summary.errors.len()));
            for error in &summary.errors {
                out.push_str(&format!("  {}\n", error));
            }
        }

        if !summary.missing_attributes.is_empty() {
            out.push_str(
                "\nWARNING: required attributes missing from discovery were set to placeholder values.\n",
            );
            out.push_str("Replace them before applying; they are listed in each resource's ignore_changes:\n");
            for missing in &summary.missing_attributes {
                out.push_str(&format!("  {}: {}\n", missing.address, missing.path));
            }
        }
        out
    }
}

fn exportable_types(catalog: &Catalog, graph: &ResourceGraph) -> Vec<(&'static str, bool)> {
    graph
        .resource_types()
        .into_iter()
        .filter_map(|resource_type| {
            let hint = catalog.hint(resource_type)?;
            (!hint.is_datasource).then_some((resource_type, hint.supports_import))
        })
        .collect()
}
