//! Generated configuration files: variables, provider, one file per service.

use crate::catalog::Catalog;
use crate::discovery::references::ReferenceMap;
use crate::discovery::resource::DiscoveredResource;
use crate::discovery::session::DiscoverySession;
use crate::discovery::value::AttributeMap;
use crate::terraform::emitter::{quote, HclEmitter, MissingAttribute};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const VARS_FILE: &str = "vars.tf";
pub const PROVIDER_FILE: &str = "provider.tf";
/// Resource blocks used only while importing.
pub const IMPORT_CONFIG_FILE: &str = "import.tf";

#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

/// Everything one export writes to the output directory.
#[derive(Debug, Clone, Default)]
pub struct GeneratedConfig {
    pub files: Vec<GeneratedFile>,
    pub missing: Vec<MissingAttribute>,
    /// Resources rendered as live blocks
    pub resource_count: usize,
}

impl GeneratedConfig {
    pub fn file(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn write_to(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(&file.name);
            fs::write(&path, &file.contents)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Render the configuration for `services`, in the given order.
pub fn generate(
    session: &DiscoverySession<'_>,
    services: &[&str],
    region: Option<&str>,
) -> GeneratedConfig {
    let catalog = session.catalog();
    let emitter = HclEmitter::new(session.references());
    let literal_refs = ReferenceMap::new();
    let literal_emitter = HclEmitter::new(&literal_refs);

    let mut config = GeneratedConfig::default();
    let mut service_files = Vec::new();
    let mut variables = BTreeSet::new();

    for service in services {
        let mut text = String::new();
        for resource in session.exported().filter(|r| r.service == *service) {
            let Some(schema) = catalog.schema(&resource.resource_type) else {
                warn!("No schema for {}, not exported", resource.resource_type);
                continue;
            };
            let attributes = customized_attributes(catalog, resource);

            if resource.is_error {
                let rendered = literal_emitter.render(resource, &attributes, schema);
                text.push_str(&comment_out(resource, &rendered.text));
            } else {
                let rendered = emitter.render(resource, &attributes, schema);
                text.push_str(&rendered.text);
                config.missing.extend(rendered.missing);
                variables.extend(rendered.variables);
                config.resource_count += 1;
            }
            text.push('\n');
        }

        if text.is_empty() {
            debug!("Service '{}' has nothing to export", service);
            continue;
        }
        service_files.push(GeneratedFile {
            name: format!("{}.tf", service),
            contents: text,
        });
    }

    config.files.push(GeneratedFile {
        name: VARS_FILE.to_string(),
        contents: render_vars(&variables, &root_defaults(session)),
    });
    config.files.push(GeneratedFile {
        name: PROVIDER_FILE.to_string(),
        contents: render_provider(region),
    });
    config.files.extend(service_files);
    config
}

fn customized_attributes(catalog: &Catalog, resource: &DiscoveredResource) -> AttributeMap {
    let mut attributes = resource.attributes.clone();
    if let Some(hint) = catalog.hint(&resource.resource_type) {
        hint.discoverer.customize(&mut attributes);
    }
    attributes
}

fn comment_out(resource: &DiscoveredResource, text: &str) -> String {
    let mut out = format!(
        "# Import of {} ({}) failed; the block is kept for reference only.\n",
        resource.address(),
        resource.import_id()
    );
    for line in text.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Root variable names bound in the reference map, with the ids they stand for.
fn root_defaults(session: &DiscoverySession<'_>) -> BTreeMap<String, String> {
    session
        .resources()
        .iter()
        .filter(|r| r.parent.is_none())
        .filter_map(|root| {
            let expression = session.references().get(&root.id)?;
            let name = expression.strip_prefix("var.")?;
            Some((name.to_string(), root.id.clone()))
        })
        .collect()
}

pub fn render_vars(referenced: &BTreeSet<String>, defaults: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for name in referenced {
        out.push_str(&format!("variable {} {{\n", quote(name)));
        if let Some(default) = defaults.get(name) {
            out.push_str(&format!("  default = {}\n", quote(default)));
        }
        out.push_str("}\n\n");
    }
    out
}

pub fn render_provider(region: Option<&str>) -> String {
    match region {
        Some(region) => format!("provider \"oci\" {{\n  region = {}\n}}\n", quote(region)),
        None => "provider \"oci\" {\n}\n".to_string(),
    }
}

/// Empty resource blocks for every importable, exported resource. Terraform
/// only needs the address to exist in configuration to import into it.
pub fn render_import_config<'r>(resources: impl IntoIterator<Item = &'r DiscoveredResource>) -> String {
    let mut out = String::new();
    for resource in resources {
        out.push_str(&format!(
            "resource {} {} {{}}\n",
            quote(&resource.resource_type),
            quote(&resource.terraform_name)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_vars_with_defaults() {
        let referenced: BTreeSet<String> = ["compartment_ocid".to_string()].into();
        let defaults: BTreeMap<String, String> =
            [("compartment_ocid".to_string(), "ocid1.compartment.oc1..c".to_string())].into();

        assert_eq!(
            render_vars(&referenced, &defaults),
            "variable \"compartment_ocid\" {\n  default = \"ocid1.compartment.oc1..c\"\n}\n\n"
        );
        assert_eq!(render_vars(&BTreeSet::new(), &defaults), "");
    }

    #[test]
    fn test_render_provider() {
        assert_eq!(
            render_provider(Some("us-phoenix-1")),
            "provider \"oci\" {\n  region = \"us-phoenix-1\"\n}\n"
        );
        assert_eq!(render_provider(None), "provider \"oci\" {\n}\n");
    }
}
