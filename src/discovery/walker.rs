//! Graph traversal: query each child type under each parent, recursively.

use crate::discovery::error::{DiscoveryError, DiscoveryErrorRecord};
use crate::discovery::graph::{Association, ResourceGraph};
use crate::discovery::hints::{QueryShape, ResourceTypeHint};
use crate::discovery::naming;
use crate::discovery::resource::{DiscoveredResource, ResourceDraft, ResourceId};
use crate::discovery::session::DiscoverySession;
use crate::discovery::value::{attributes_from_json, non_empty_str, AttributeMap};
use tracing::{debug, info, warn};

impl DiscoverySession<'_> {
    /// Discover everything reachable from `root` through `graph`. Failures on
    /// one association are recorded and do not stop its siblings. Returns the
    /// number of resources added.
    pub fn discover_graph(&mut self, graph: &ResourceGraph, root: ResourceId) -> usize {
        let before = self.resources.len();
        let errors_before = self.errors.len();
        info!(
            "Discovering service '{}' under {}",
            graph.service,
            self.resource(root).id
        );

        self.discover_children(graph, root);

        let found = self.resources.len() - before;
        info!(
            "Service '{}': {} resource(s) found, {} error(s)",
            graph.service,
            found,
            self.errors.len() - errors_before
        );
        found
    }

    fn discover_children(&mut self, graph: &ResourceGraph, parent: ResourceId) {
        let parent_type = self.resource(parent).resource_type.clone();
        for association in graph.children(&parent_type) {
            match self.discover_association(graph, parent, association) {
                Ok(children) => {
                    for child in children {
                        self.discover_children(graph, child);
                    }
                }
                Err(err) => {
                    let parent_name = self.resource(parent).terraform_name.clone();
                    warn!(
                        "{} under '{}' failed: {}",
                        association.child, parent_name, err
                    );
                    self.record_error(DiscoveryErrorRecord::new(
                        association.child,
                        &parent_name,
                        graph.service,
                        &err,
                    ));
                }
            }
        }
    }

    fn discover_association(
        &mut self,
        graph: &ResourceGraph,
        parent: ResourceId,
        association: &Association,
    ) -> Result<Vec<ResourceId>, DiscoveryError> {
        let catalog = self.catalog;
        let hint = catalog.hint(association.child).ok_or_else(|| {
            DiscoveryError::Processing(format!("no hint for '{}'", association.child))
        })?;

        let params = match association.derive_params(self.resource(parent)) {
            Ok(params) => params,
            Err(missing) => {
                warn!(
                    "Skipping {} under '{}': parent has no '{}' attribute",
                    hint.resource_type,
                    self.resource(parent).terraform_name,
                    missing
                );
                return Ok(Vec::new());
            }
        };

        let parent_name = self.resource(parent).terraform_name.clone();
        debug!("Querying {} with {:?}", hint.datasource, params);
        let records = hint.discoverer.discover(self.client, hint, &params)?;
        let drafts = self.drafts_from_records(hint, records);

        let mut survivors = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let draft = if hint.requires_refresh {
                let draft_id = draft.id.clone();
                match self.refresh(hint, draft) {
                    Ok(draft) => draft,
                    Err(err) => {
                        warn!(
                            "Dropping {} '{}' under '{}': {}",
                            hint.resource_type, draft_id, parent_name, err
                        );
                        self.record_error(DiscoveryErrorRecord::new(
                            hint.resource_type,
                            &parent_name,
                            graph.service,
                            &err,
                        ));
                        continue;
                    }
                }
            } else {
                draft
            };

            let state = non_empty_str(&draft.attributes, "state");
            if !hint.is_discoverable_state(state) {
                debug!(
                    "Skipping {} '{}' in state {:?}",
                    hint.resource_type, draft.id, state
                );
                continue;
            }
            survivors.push(draft);
        }

        let processed = hint.discoverer.process(survivors)?;

        let mut found = Vec::with_capacity(processed.len());
        for (position, mut draft) in processed.into_iter().enumerate() {
            if !self
                .seen
                .insert((hint.resource_type.to_string(), draft.id.clone()))
            {
                debug!("{} '{}' already discovered", hint.resource_type, draft.id);
                continue;
            }
            draft.import_id = hint.discoverer.import_id(&draft);
            found.push(self.add_resource(graph, parent, hint, draft, position + 1));
        }
        Ok(found)
    }

    /// Turn raw records into drafts with a stable id. A singular lookup with
    /// an empty id means nothing exists at that scope.
    fn drafts_from_records(
        &self,
        hint: &ResourceTypeHint,
        records: Vec<AttributeMap>,
    ) -> Vec<ResourceDraft> {
        let singular = hint.query == QueryShape::Singular;
        records
            .into_iter()
            .filter_map(|attributes| {
                let id = hint
                    .discoverer
                    .synthesize_id(&attributes)
                    .or_else(|| non_empty_str(&attributes, "id").map(str::to_string));
                match id {
                    Some(id) => Some(ResourceDraft::new(id, attributes)),
                    None => {
                        if !singular {
                            warn!("Skipping {} record without an id", hint.resource_type);
                        }
                        None
                    }
                }
            })
            .take(if singular { 1 } else { usize::MAX })
            .collect()
    }

    /// Re-read a listed resource. An empty result means the listing was stale.
    fn refresh(
        &self,
        hint: &ResourceTypeHint,
        mut draft: ResourceDraft,
    ) -> Result<ResourceDraft, DiscoveryError> {
        let record = self
            .client
            .get(hint.resource_type, &draft.id)?
            .map(attributes_from_json)
            .filter(|attrs| non_empty_str(attrs, "id").is_some())
            .ok_or_else(|| DiscoveryError::RefreshVoided(draft.id.clone()))?;

        draft.attributes.extend(record);
        Ok(draft)
    }

    fn add_resource(
        &mut self,
        graph: &ResourceGraph,
        parent: ResourceId,
        hint: &ResourceTypeHint,
        draft: ResourceDraft,
        position: usize,
    ) -> ResourceId {
        let index = ResourceId(self.resources.len());
        let parent_name = &self.resource(parent).terraform_name;
        let base = naming::base_name(&draft.attributes, parent_name, hint.abbreviation, position);
        let terraform_name = self.names.assign(&base);
        let omit_from_export = hint.is_datasource || self.is_filtered_out(&draft.id);

        let resource = DiscoveredResource {
            index,
            resource_type: hint.resource_type.to_string(),
            id: draft.id,
            terraform_name,
            attributes: draft.attributes,
            parent: Some(parent),
            service: graph.service.to_string(),
            import_id: draft.import_id,
            omit_from_export,
            is_error: false,
        };

        if !hint.is_datasource {
            self.references
                .register(resource.id.clone(), resource.reference_expression());
        }
        debug!("Discovered {} ({})", resource.address(), resource.id);
        self.resources.push(resource);
        index
    }
}
