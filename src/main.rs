//! Kubernetes CRD provider command line
//!
//! Lists resource types, prints their schemas, and validates or renders
//! resource configurations read from JSON or YAML files.

use anyhow::{anyhow, bail, Context as _};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use k8s_crd_provider::{
    config::Configuration,
    crd::generate_crds,
    diagnostics::Diagnostics,
    logging, metrics,
    provider::Provider,
    resources::{CreateRequest, Resource},
};

#[derive(Parser)]
#[command(name = "k8s-crd-provider")]
#[command(about = "Render Kubernetes custom resources from typed configuration")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resource type names
    Resources,

    /// Print the schema of a resource type as JSON
    Schema {
        /// Resource type name
        resource: String,
    },

    /// Validate a resource configuration
    Validate {
        /// Resource type name
        resource: String,

        /// Configuration file (JSON or YAML)
        file: PathBuf,
    },

    /// Render a resource configuration to a Kubernetes manifest
    Render {
        /// Resource type name
        resource: String,

        /// Configuration file (JSON or YAML)
        file: PathBuf,

        /// Print the whole state record instead of the manifest
        #[arg(long)]
        state: bool,

        /// Dump Prometheus metrics to stderr afterwards
        #[arg(long)]
        metrics: bool,
    },

    /// Print the built-in CRDs
    Crds,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Configuration::load(cli.config.as_deref())?;
    logging::init(&config.logging);

    let provider = Provider::new(config)?;
    info!("Provider {} ready", provider.metadata());

    match cli.command {
        Commands::Resources => {
            for name in provider.resources() {
                println!("{}", name);
            }
        }
        Commands::Schema { resource } => {
            let resource = provider
                .resource(&resource)
                .ok_or_else(|| anyhow!("Unknown resource type: {}", resource))?;
            println!("{}", serde_json::to_string_pretty(resource.schema())?);
        }
        Commands::Validate { resource, file } => {
            let config = read_config(&file)?;
            let diagnostics = provider.validate_resource_config(&resource, &config);
            report(&diagnostics)?;
            println!("{} is valid", file.display());
        }
        Commands::Render {
            resource,
            file,
            state,
            metrics: dump_metrics,
        } => {
            let config = read_config(&file)?;
            let response = provider.create(&resource, CreateRequest { config });
            if let Some(record) = &response.state {
                if state {
                    println!("{}", serde_json::to_string_pretty(record)?);
                } else if let Some(yaml) = record.get("yaml").and_then(Value::as_str) {
                    print!("{}", yaml);
                }
            }
            if dump_metrics {
                eprint!("{}", metrics::gather()?);
            }
            report(&response.diagnostics)?;
        }
        Commands::Crds => print_crds()?,
    }

    Ok(())
}

fn print_crds() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}

/// Parse a JSON or YAML configuration file
fn read_config(path: &Path) -> anyhow::Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Print diagnostics to stderr, failing when any is an error
fn report(diagnostics: &Diagnostics) -> anyhow::Result<()> {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
    if diagnostics.has_errors() {
        bail!("{} error(s) reported", diagnostics.errors().count());
    }
    Ok(())
}
