//! Provider schemas of the resource types the catalog exports.

use crate::discovery::schema::{AttributeKind, ResourceSchema};

use AttributeKind::{Bool, List, Map, Number, String as Str};

fn tcp_options() -> ResourceSchema {
    ResourceSchema::new()
        .optional("max", Number)
        .optional("min", Number)
}

fn security_rule(direction_attr: &str) -> ResourceSchema {
    ResourceSchema::new()
        .required("protocol", Str)
        .required(direction_attr, Str)
        .optional(&format!("{}_type", direction_attr), Str)
        .optional("description", Str)
        .optional("stateless", Bool)
        .optional("tcp_options", AttributeKind::Block(tcp_options()))
        .optional("udp_options", AttributeKind::Block(tcp_options()))
}

pub fn vcn() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .deprecated("cidr_block", Str)
        .optional("cidr_blocks", List)
        .optional("display_name", Str)
        .optional("dns_label", Str)
        .optional("is_ipv6enabled", Bool)
        .computed("default_route_table_id", Str)
        .computed("default_security_list_id", Str)
        .computed("vcn_domain_name", Str)
        .with_common_tags()
}

pub fn subnet() -> ResourceSchema {
    ResourceSchema::new()
        .required("cidr_block", Str)
        .required("compartment_id", Str)
        .required("vcn_id", Str)
        .optional("availability_domain", Str)
        .optional("dhcp_options_id", Str)
        .optional("display_name", Str)
        .optional("dns_label", Str)
        .optional("prohibit_public_ip_on_vnic", Bool)
        .optional("route_table_id", Str)
        .optional("security_list_ids", List)
        .computed("virtual_router_ip", Str)
        .with_common_tags()
}

pub fn route_table() -> ResourceSchema {
    let route_rule = ResourceSchema::new()
        .required("network_entity_id", Str)
        .deprecated("cidr_block", Str)
        .optional("description", Str)
        .optional("destination", Str)
        .optional("destination_type", Str);

    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("vcn_id", Str)
        .optional("display_name", Str)
        .optional("route_rules", AttributeKind::Block(route_rule))
        .with_common_tags()
}

pub fn security_list() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("vcn_id", Str)
        .optional("display_name", Str)
        .optional(
            "egress_security_rules",
            AttributeKind::Block(security_rule("destination")),
        )
        .optional(
            "ingress_security_rules",
            AttributeKind::Block(security_rule("source")),
        )
        .with_common_tags()
}

pub fn internet_gateway() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("vcn_id", Str)
        .optional("display_name", Str)
        .optional("enabled", Bool)
        .with_common_tags()
}

pub fn instance() -> ResourceSchema {
    let vnic = ResourceSchema::new()
        .required("subnet_id", Str)
        .optional("assign_public_ip", Str)
        .optional("display_name", Str)
        .optional("hostname_label", Str)
        .optional("nsg_ids", List)
        .optional("private_ip", Str)
        .optional("skip_source_dest_check", Bool);

    let source = ResourceSchema::new()
        .required("source_id", Str)
        .required("source_type", Str)
        .optional("boot_volume_size_in_gbs", Number)
        .optional("kms_key_id", Str);

    let shape_config = ResourceSchema::new()
        .optional("memory_in_gbs", Number)
        .optional("ocpus", Number);

    ResourceSchema::new()
        .required("availability_domain", Str)
        .required("compartment_id", Str)
        .required("shape", Str)
        .optional("create_vnic_details", AttributeKind::Block(vnic))
        .optional("display_name", Str)
        .optional("fault_domain", Str)
        .deprecated("image", Str)
        .optional("metadata", Map)
        .optional("shape_config", AttributeKind::Block(shape_config))
        .optional("source_details", AttributeKind::Block(source))
        .optional("state", Str)
        .computed("boot_volume_id", Str)
        .computed("image_id", Str)
        .computed("private_ip", Str)
        .computed("public_ip", Str)
        .computed("region", Str)
        .optional("defined_tags", Map)
        .optional("freeform_tags", Map)
        .computed("id", Str)
        .computed("time_created", Str)
}

pub fn volume() -> ResourceSchema {
    ResourceSchema::new()
        .required("availability_domain", Str)
        .required("compartment_id", Str)
        .optional("backup_policy_id", Str)
        .optional("display_name", Str)
        .optional("is_auto_tune_enabled", Bool)
        .optional("kms_key_id", Str)
        .optional("size_in_gbs", Number)
        .optional("vpus_per_gb", Number)
        .deprecated("size_in_mbs", Number)
        .with_common_tags()
}

pub fn volume_attachment() -> ResourceSchema {
    ResourceSchema::new()
        .required("attachment_type", Str)
        .required("instance_id", Str)
        .required("volume_id", Str)
        .optional("device", Str)
        .optional("display_name", Str)
        .optional("is_read_only", Bool)
        .optional("is_shareable", Bool)
        .computed("compartment_id", Str)
        .computed("id", Str)
        .computed("state", Str)
        .computed("time_created", Str)
}

pub fn db_system() -> ResourceSchema {
    let database = ResourceSchema::new()
        .required("admin_password", Str)
        .optional("db_name", Str)
        .optional("character_set", Str)
        .optional("db_workload", Str);

    let db_home = ResourceSchema::new()
        .required("database", AttributeKind::Block(database))
        .optional("db_version", Str)
        .optional("display_name", Str);

    ResourceSchema::new()
        .required("availability_domain", Str)
        .required("compartment_id", Str)
        .required("db_home", AttributeKind::Block(db_home))
        .required("hostname", Str)
        .required("shape", Str)
        .required("ssh_public_keys", List)
        .required("subnet_id", Str)
        .optional("cpu_core_count", Number)
        .optional("data_storage_size_in_gb", Number)
        .optional("database_edition", Str)
        .optional("display_name", Str)
        .optional("license_model", Str)
        .optional("node_count", Number)
        .with_common_tags()
}

pub fn autonomous_database() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("db_name", Str)
        .optional("admin_password", Str)
        .optional("cpu_core_count", Number)
        .optional("data_storage_size_in_tbs", Number)
        .optional("db_workload", Str)
        .optional("display_name", Str)
        .optional("is_auto_scaling_enabled", Bool)
        .optional("is_free_tier", Bool)
        .optional("license_model", Str)
        .optional("whitelisted_ips", List)
        .computed("connection_strings", Map)
        .with_common_tags()
}

pub fn bucket() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("name", Str)
        .required("namespace", Str)
        .optional("access_type", Str)
        .optional("auto_tiering", Str)
        .optional("kms_key_id", Str)
        .optional("metadata", Map)
        .optional("object_events_enabled", Bool)
        .optional("storage_tier", Str)
        .optional("versioning", Str)
        .computed("bucket_id", Str)
        .computed("etag", Str)
        .computed("approximate_size", Number)
        .optional("defined_tags", Map)
        .optional("freeform_tags", Map)
        .computed("id", Str)
        .computed("time_created", Str)
}

pub fn load_balancer() -> ResourceSchema {
    let shape_details = ResourceSchema::new()
        .required("maximum_bandwidth_in_mbps", Number)
        .required("minimum_bandwidth_in_mbps", Number);

    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("display_name", Str)
        .required("shape", Str)
        .required("subnet_ids", List)
        .optional("ip_mode", Str)
        .optional("is_private", Bool)
        .optional("network_security_group_ids", List)
        .optional("shape_details", AttributeKind::Block(shape_details))
        .computed("ip_address_details", List)
        .with_common_tags()
}

pub fn backend_set() -> ResourceSchema {
    let health_checker = ResourceSchema::new()
        .required("protocol", Str)
        .optional("interval_ms", Number)
        .optional("port", Number)
        .optional("response_body_regex", Str)
        .optional("retries", Number)
        .optional("return_code", Number)
        .optional("timeout_in_millis", Number)
        .optional("url_path", Str);

    ResourceSchema::new()
        .required("health_checker", AttributeKind::Block(health_checker))
        .required("load_balancer_id", Str)
        .required("name", Str)
        .required("policy", Str)
        .computed("id", Str)
        .computed("state", Str)
}

pub fn notification_topic() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("name", Str)
        .optional("description", Str)
        .computed("api_endpoint", Str)
        .computed("topic_id", Str)
        .with_common_tags()
}

pub fn subscription() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("endpoint", Str)
        .required("protocol", Str)
        .required("topic_id", Str)
        .optional("delivery_policy", Str)
        .computed("etag", Str)
        .with_common_tags()
}

pub fn compartment() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("description", Str)
        .required("name", Str)
        .optional("enable_delete", Bool)
        .computed("is_accessible", Bool)
        .with_common_tags()
}

pub fn user() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("description", Str)
        .required("name", Str)
        .optional("email", Str)
        .computed("capabilities", List)
        .with_common_tags()
}

pub fn api_key() -> ResourceSchema {
    ResourceSchema::new()
        .required("key_value", Str)
        .required("user_id", Str)
        .computed("fingerprint", Str)
        .computed("id", Str)
        .computed("state", Str)
}

pub fn group() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("description", Str)
        .required("name", Str)
        .with_common_tags()
}

pub fn policy() -> ResourceSchema {
    ResourceSchema::new()
        .required("compartment_id", Str)
        .required("description", Str)
        .required("name", Str)
        .required("statements", List)
        .optional("version_date", Str)
        .computed("etag", Str)
        .with_common_tags()
}
