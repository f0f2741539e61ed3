// Re-export modules for testing and external use
pub mod discovery {
    pub mod client;
    pub mod error;
    pub mod graph;
    pub mod hints;
    pub mod naming;
    pub mod references;
    pub mod resource;
    pub mod schema;
    pub mod session;
    pub mod snapshot;
    pub mod value;
    mod walker;

    pub use client::{CloudClient, RetryingClient};
    pub use error::{ClientError, DiscoveryError, DiscoveryErrorRecord};
    pub use session::DiscoverySession;
    pub use snapshot::SnapshotClient;
}

pub mod catalog;

pub mod terraform {
    pub mod emitter;
    pub mod files;
    pub mod import;
    pub mod service;
    pub mod state;

    pub use service::{ImportResult, TerraformRunner, TerraformService};
}

pub mod core {
    pub mod exporter;
}

pub mod formatters {
    pub mod output;

    pub use output::{OutputFormat, OutputFormatter};
}

pub mod shared {
    pub mod logging;
}

pub mod config;

// Re-export commonly used types for easier testing and external use
pub use catalog::{Catalog, BUILTIN};
pub use core::exporter::{ExitStatus, ExportError, ExportOptions, Exporter, RunSummary};
pub use discovery::{CloudClient, DiscoverySession, SnapshotClient};
pub use terraform::service::TerraformService;
