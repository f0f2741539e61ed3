use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tfdiscover::config::{self, Config};
use tfdiscover::discovery::{RetryingClient, SnapshotClient};
use tfdiscover::formatters::{OutputFormat, OutputFormatter};
use tfdiscover::shared::logging;
use tfdiscover::terraform::TerraformService;
use tfdiscover::{ExitStatus, ExportOptions, Exporter, BUILTIN};
use tracing::{error, info};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "tfdiscover",
    about = "Export existing cloud infrastructure as Terraform configuration and state.",
    version = APP_VERSION
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        short = 'c',
        value_name = "PATH",
        global = true,
        help = "Path to the configuration file"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "export", about = "Discover resources and write Terraform files")]
    Export(ExportArgs),

    #[command(name = "list-services", about = "List the services that can be exported")]
    ListServices {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(
        name = "list-exportable-resources",
        about = "List resource types each service exports"
    )]
    ListExportableResources {
        #[arg(long, value_delimiter = ',')]
        services: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(clap::Args)]
struct ExportArgs {
    #[arg(long, conflicts_with = "compartment_name")]
    compartment_id: Option<String>,

    #[arg(long)]
    compartment_name: Option<String>,

    #[arg(long, value_delimiter = ',')]
    services: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    exclude_services: Vec<String>,

    /// Only export resources with these ids
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,

    #[arg(long, value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// Import discovered resources into terraform.tfstate
    #[arg(long)]
    generate_state: bool,

    /// Seconds to keep retrying failed discovery calls
    #[arg(long, value_name = "SECS")]
    retry_timeout: Option<u64>,

    /// Recorded API responses to discover from
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let code = match run(&cli).await {
        Ok(status) => status.code(),
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitStatus::Failure.code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> anyhow::Result<ExitStatus> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Export(args) => export(args, &config).await,
        Commands::ListServices { format } => {
            match format {
                OutputFormat::Text => print!("{}", OutputFormatter::services_text(&BUILTIN)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&OutputFormatter::format_services(&BUILTIN))?
                ),
            }
            Ok(ExitStatus::Success)
        }
        Commands::ListExportableResources { services, format } => {
            let graphs = services
                .iter()
                .map(|name| {
                    BUILTIN
                        .graph(name)
                        .ok_or_else(|| anyhow::anyhow!("Unknown service '{}'", name))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let graphs = if graphs.is_empty() {
                BUILTIN.graphs().iter().collect()
            } else {
                graphs
            };
            match format {
                OutputFormat::Text => {
                    print!("{}", OutputFormatter::exportable_resources_text(&BUILTIN, &graphs))
                }
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&OutputFormatter::format_exportable_resources(
                        &BUILTIN, &graphs
                    ))?
                ),
            }
            Ok(ExitStatus::Success)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Using config file: {}", path.display());
            config::init_from_path(path)?
        }
        None => config::init_default()?,
    };
    Ok(config)
}

async fn export(args: &ExportArgs, config: &Config) -> anyhow::Result<ExitStatus> {
    let snapshot = args
        .snapshot
        .clone()
        .or_else(|| config.export.snapshot_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow::anyhow!("No cloud client configured; pass --snapshot FILE"))?;
    let retry_timeout = args
        .retry_timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.export.retry_timeout());

    let client = RetryingClient::new(SnapshotClient::from_path(&snapshot)?, retry_timeout);

    let terraform = if args.generate_state {
        let service = TerraformService::locate(config.terraform.executable_path.as_deref())?;
        info!(
            "Using terraform {} at {}",
            service.get_version().await?,
            service.terraform_path().display()
        );
        Some(service)
    } else {
        None
    };

    let mut exporter = Exporter::new(&client, &BUILTIN);
    if let Some(terraform) = &terraform {
        exporter = exporter.with_runner(terraform);
    }

    let options = ExportOptions {
        compartment_id: args.compartment_id.clone(),
        compartment_name: args.compartment_name.clone(),
        services: args.services.clone(),
        exclude_services: args.exclude_services.clone(),
        ids: args.ids.clone(),
        output_path: args.output_path.clone(),
        generate_state: args.generate_state,
        region: config.export.region.clone(),
    };
    let summary = exporter.run(&options).await?;

    match args.format {
        OutputFormat::Text => print!("{}", OutputFormatter::summary_text(&summary)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&OutputFormatter::format_summary(&summary))?
        ),
    }
    Ok(summary.exit_status())
}
