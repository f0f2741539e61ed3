//! Service graphs: parent type -> child associations.

use crate::discovery::graph::{Association, ResourceGraph, Scope, COMPARTMENT_ROOT, TENANCY_ROOT};

fn in_compartment(child: &'static str) -> Association {
    Association::new(child, &[("compartment_id", "id")])
}

fn core() -> ResourceGraph {
    let vcn_child =
        |child| Association::new(child, &[("compartment_id", "compartment_id"), ("vcn_id", "id")]);

    ResourceGraph::new("core", Scope::Compartment)
        .edge(
            COMPARTMENT_ROOT,
            vec![
                in_compartment("oci_core_vcn"),
                in_compartment("oci_core_instance"),
                in_compartment("oci_core_volume"),
            ],
        )
        .edge(
            "oci_core_vcn",
            vec![
                vcn_child("oci_core_subnet"),
                vcn_child("oci_core_route_table"),
                vcn_child("oci_core_security_list"),
                vcn_child("oci_core_internet_gateway"),
            ],
        )
        .edge(
            "oci_core_instance",
            vec![Association::new(
                "oci_core_volume_attachment",
                &[("compartment_id", "compartment_id"), ("instance_id", "id")],
            )],
        )
}

fn database() -> ResourceGraph {
    ResourceGraph::new("database", Scope::Compartment).edge(
        COMPARTMENT_ROOT,
        vec![
            in_compartment("oci_database_db_system"),
            in_compartment("oci_database_autonomous_database"),
        ],
    )
}

fn object_storage() -> ResourceGraph {
    ResourceGraph::new("object_storage", Scope::Compartment)
        .edge(
            COMPARTMENT_ROOT,
            vec![in_compartment("oci_objectstorage_namespace")],
        )
        .edge(
            "oci_objectstorage_namespace",
            vec![Association::new(
                "oci_objectstorage_bucket",
                &[("compartment_id", "compartment_id"), ("namespace", "namespace")],
            )],
        )
}

fn load_balancer() -> ResourceGraph {
    ResourceGraph::new("load_balancer", Scope::Compartment)
        .edge(
            COMPARTMENT_ROOT,
            vec![in_compartment("oci_load_balancer_load_balancer")],
        )
        .edge(
            "oci_load_balancer_load_balancer",
            vec![Association::new(
                "oci_load_balancer_backend_set",
                &[("load_balancer_id", "id")],
            )],
        )
}

fn notifications() -> ResourceGraph {
    ResourceGraph::new("notifications", Scope::Compartment)
        .edge(
            COMPARTMENT_ROOT,
            vec![in_compartment("oci_ons_notification_topic")],
        )
        .edge(
            "oci_ons_notification_topic",
            vec![Association::new(
                "oci_ons_subscription",
                &[("compartment_id", "compartment_id"), ("topic_id", "id")],
            )],
        )
}

fn identity() -> ResourceGraph {
    ResourceGraph::new("identity", Scope::Tenancy)
        .edge(
            TENANCY_ROOT,
            vec![
                Association::new(
                    "oci_identity_compartment",
                    &[("compartment_id", "id"), ("access_level", "\"ANY\"")],
                ),
                in_compartment("oci_identity_user"),
                in_compartment("oci_identity_group"),
                in_compartment("oci_identity_policy"),
            ],
        )
        .edge(
            "oci_identity_user",
            vec![Association::new("oci_identity_api_key", &[("user_id", "id")])],
        )
}

/// Every graph the catalog ships with.
pub fn builtin_graphs() -> Vec<ResourceGraph> {
    vec![
        core(),
        database(),
        object_storage(),
        load_balancer(),
        notifications(),
        identity(),
    ]
}
