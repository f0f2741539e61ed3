//! Resource type hints, including the types that need bespoke discovery.

use crate::discovery::client::{CloudClient, QueryParams};
use crate::discovery::error::DiscoveryError;
use crate::discovery::hints::{fetch_records, Discoverer, ResourceTypeHint};
use crate::discovery::resource::ResourceDraft;
use crate::discovery::value::{non_empty_str, AttributeMap, Value};
use std::collections::BTreeMap;

const AVAILABLE: &[&str] = &["AVAILABLE"];
const ACTIVE: &[&str] = &["ACTIVE"];

/// Instances list without boot source; rebuild `source_details` from the
/// image and keep cloud-init payloads out of the generated files.
struct InstanceDiscoverer;

impl Discoverer for InstanceDiscoverer {
    fn process(&self, batch: Vec<ResourceDraft>) -> Result<Vec<ResourceDraft>, DiscoveryError> {
        batch
            .into_iter()
            .map(|mut draft| {
                if draft.attributes.contains_key("source_details") {
                    return Ok(draft);
                }
                let image_id = non_empty_str(&draft.attributes, "image_id")
                    .ok_or_else(|| {
                        DiscoveryError::Processing(format!(
                            "instance '{}' has neither source_details nor image_id",
                            draft.id
                        ))
                    })?
                    .to_string();
                let source: BTreeMap<String, Value> = [
                    ("source_id".to_string(), Value::from(image_id)),
                    ("source_type".to_string(), Value::from("image")),
                ]
                .into();
                draft
                    .attributes
                    .insert("source_details".to_string(), Value::List(vec![Value::Map(source)]));
                Ok(draft)
            })
            .collect()
    }

    fn customize(&self, attributes: &mut AttributeMap) {
        if let Some(Value::Map(metadata)) = attributes.get_mut("metadata") {
            metadata.remove("user_data");
        }
    }
}

/// The namespace datasource carries neither an id nor the compartment the
/// bucket listing needs.
struct NamespaceDiscoverer;

impl Discoverer for NamespaceDiscoverer {
    fn discover(
        &self,
        client: &dyn CloudClient,
        hint: &ResourceTypeHint,
        params: &QueryParams,
    ) -> Result<Vec<AttributeMap>, DiscoveryError> {
        let mut records = fetch_records(client, hint, params)?;
        for record in &mut records {
            if let Some(compartment) = params.get("compartment_id") {
                record
                    .entry("compartment_id".to_string())
                    .or_insert_with(|| Value::from(compartment.as_str()));
            }
        }
        Ok(records)
    }

    fn synthesize_id(&self, attributes: &AttributeMap) -> Option<String> {
        non_empty_str(attributes, "namespace").map(str::to_string)
    }
}

/// Buckets are addressed by namespace and name.
struct BucketDiscoverer;

impl Discoverer for BucketDiscoverer {
    fn synthesize_id(&self, attributes: &AttributeMap) -> Option<String> {
        let namespace = non_empty_str(attributes, "namespace")?;
        let name = non_empty_str(attributes, "name")?;
        Some(format!("n/{}/b/{}", namespace, name))
    }

    fn import_id(&self, draft: &ResourceDraft) -> Option<String> {
        Some(draft.id.clone())
    }
}

/// Backend sets are named children of a load balancer without an id.
struct BackendSetDiscoverer;

impl Discoverer for BackendSetDiscoverer {
    fn discover(
        &self,
        client: &dyn CloudClient,
        hint: &ResourceTypeHint,
        params: &QueryParams,
    ) -> Result<Vec<AttributeMap>, DiscoveryError> {
        let load_balancer_id = params.get("load_balancer_id").ok_or_else(|| {
            DiscoveryError::Processing("backend set query without load_balancer_id".to_string())
        })?;
        let mut records = fetch_records(client, hint, params)?;
        for record in &mut records {
            record.insert(
                "load_balancer_id".to_string(),
                Value::from(load_balancer_id.as_str()),
            );
        }
        Ok(records)
    }

    fn synthesize_id(&self, attributes: &AttributeMap) -> Option<String> {
        let load_balancer_id = non_empty_str(attributes, "load_balancer_id")?;
        let name = non_empty_str(attributes, "name")?;
        Some(format!("loadBalancers/{}/backendSets/{}", load_balancer_id, name))
    }

    fn import_id(&self, draft: &ResourceDraft) -> Option<String> {
        Some(draft.id.clone())
    }
}

/// API keys import as `users/{user}/apiKeys/{fingerprint}`.
struct ApiKeyDiscoverer;

impl Discoverer for ApiKeyDiscoverer {
    fn import_id(&self, draft: &ResourceDraft) -> Option<String> {
        let user_id = non_empty_str(&draft.attributes, "user_id")?;
        let fingerprint = non_empty_str(&draft.attributes, "fingerprint")?;
        Some(format!("users/{}/apiKeys/{}", user_id, fingerprint))
    }
}

/// Every hint the catalog ships with.
pub fn builtin_hints() -> Vec<ResourceTypeHint> {
    vec![
        // core
        ResourceTypeHint::plural("oci_core_vcn", "oci_core_vcns", "virtual_networks")
            .states(AVAILABLE),
        ResourceTypeHint::plural("oci_core_subnet", "oci_core_subnets", "subnets")
            .states(AVAILABLE),
        ResourceTypeHint::plural("oci_core_route_table", "oci_core_route_tables", "route_tables")
            .states(AVAILABLE),
        ResourceTypeHint::plural(
            "oci_core_security_list",
            "oci_core_security_lists",
            "security_lists",
        )
        .states(AVAILABLE),
        ResourceTypeHint::plural(
            "oci_core_internet_gateway",
            "oci_core_internet_gateways",
            "gateways",
        )
        .states(AVAILABLE),
        ResourceTypeHint::plural("oci_core_instance", "oci_core_instances", "instances")
            .states(&["RUNNING", "STOPPED"])
            .refresh()
            .with_discoverer(InstanceDiscoverer),
        ResourceTypeHint::plural("oci_core_volume", "oci_core_volumes", "volumes")
            .states(AVAILABLE),
        ResourceTypeHint::plural(
            "oci_core_volume_attachment",
            "oci_core_volume_attachments",
            "volume_attachments",
        )
        .states(&["ATTACHED"]),
        // database
        ResourceTypeHint::plural("oci_database_db_system", "oci_database_db_systems", "db_systems")
            .states(AVAILABLE)
            .refresh(),
        ResourceTypeHint::plural(
            "oci_database_autonomous_database",
            "oci_database_autonomous_databases",
            "autonomous_databases",
        )
        .states(&["AVAILABLE", "STOPPED"]),
        // object_storage
        ResourceTypeHint::singular("oci_objectstorage_namespace", "oci_objectstorage_namespace")
            .datasource_only()
            .with_discoverer(NamespaceDiscoverer),
        ResourceTypeHint::plural(
            "oci_objectstorage_bucket",
            "oci_objectstorage_bucket_summaries",
            "bucket_summaries",
        )
        .refresh()
        .with_discoverer(BucketDiscoverer),
        // load_balancer
        ResourceTypeHint::plural(
            "oci_load_balancer_load_balancer",
            "oci_load_balancer_load_balancers",
            "load_balancers",
        )
        .states(ACTIVE),
        ResourceTypeHint::plural(
            "oci_load_balancer_backend_set",
            "oci_load_balancer_backend_sets",
            "backendsets",
        )
        .collection()
        .with_discoverer(BackendSetDiscoverer),
        // notifications
        ResourceTypeHint::plural(
            "oci_ons_notification_topic",
            "oci_ons_notification_topics",
            "notification_topics",
        )
        .states(ACTIVE),
        ResourceTypeHint::plural("oci_ons_subscription", "oci_ons_subscriptions", "subscriptions")
            .states(&["ACTIVE", "PENDING"]),
        // identity
        ResourceTypeHint::plural(
            "oci_identity_compartment",
            "oci_identity_compartments",
            "compartments",
        )
        .states(ACTIVE),
        ResourceTypeHint::plural("oci_identity_user", "oci_identity_users", "users")
            .states(ACTIVE),
        ResourceTypeHint::plural("oci_identity_api_key", "oci_identity_api_keys", "api_keys")
            .states(ACTIVE)
            .with_discoverer(ApiKeyDiscoverer),
        ResourceTypeHint::plural("oci_identity_group", "oci_identity_groups", "groups")
            .states(ACTIVE),
        ResourceTypeHint::plural("oci_identity_policy", "oci_identity_policies", "policies")
            .states(ACTIVE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::value::attributes_from_json;
    use serde_json::json;

    #[test]
    fn test_instance_source_details_from_image() {
        let draft = ResourceDraft::new(
            "i1",
            attributes_from_json(json!({"id": "i1", "image_id": "ocid1.image.oc1..img"})),
        );
        let processed = InstanceDiscoverer.process(vec![draft]).unwrap();
        let source = processed[0].attributes["source_details"].as_list().unwrap()[0]
            .as_map()
            .unwrap()
            .clone();
        assert_eq!(source["source_id"], Value::from("ocid1.image.oc1..img"));
        assert_eq!(source["source_type"], Value::from("image"));
    }

    #[test]
    fn test_instance_without_image_fails_processing() {
        let draft = ResourceDraft::new("i1", attributes_from_json(json!({"id": "i1"})));
        assert!(matches!(
            InstanceDiscoverer.process(vec![draft]),
            Err(DiscoveryError::Processing(_))
        ));
    }

    #[test]
    fn test_instance_drops_user_data() {
        let mut attrs = attributes_from_json(json!({
            "metadata": {"ssh_authorized_keys": "ssh-rsa AAA", "user_data": "IyEvYmlu"}
        }));
        InstanceDiscoverer.customize(&mut attrs);
        let metadata = attrs["metadata"].as_map().unwrap();
        assert!(metadata.contains_key("ssh_authorized_keys"));
        assert!(!metadata.contains_key("user_data"));
    }

    #[test]
    fn test_composite_ids() {
        let bucket = attributes_from_json(json!({"namespace": "ns", "name": "logs"}));
        assert_eq!(
            BucketDiscoverer.synthesize_id(&bucket).as_deref(),
            Some("n/ns/b/logs")
        );

        let key = ResourceDraft::new(
            "k1",
            attributes_from_json(json!({"user_id": "u1", "fingerprint": "aa:bb"})),
        );
        assert_eq!(
            ApiKeyDiscoverer.import_id(&key).as_deref(),
            Some("users/u1/apiKeys/aa:bb")
        );
    }

    #[test]
    fn test_hint_types_are_unique() {
        let hints = builtin_hints();
        let mut types: Vec<_> = hints.iter().map(|h| h.resource_type).collect();
        types.sort();
        types.dedup();
        assert_eq!(types.len(), hints.len());
    }
}
