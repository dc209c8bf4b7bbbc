//! ALTO backend entry point.
//!
//! Loads the daemon configuration, wires the brokers of the selected
//! namespace and runs one service lookup, writing the rendered ALTO
//! response body to stdout.

use altod::commands::{Response, Runner};
use altod::{AltoConfig, MultipartEncoder};
use alto_types::{EndpointId, Flow};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ALTO path-vector backend
#[derive(Parser, Debug)]
#[command(name = "altod")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Namespace to serve
    #[arg(short = 'n', long, default_value = "default")]
    namespace: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute path vectors for flows
    PathVector {
        /// Flow as SRC,DST or INGRESS,SRC,DST
        #[arg(short = 'f', long = "flow", required = true)]
        flows: Vec<Flow>,

        /// ANE property to report
        #[arg(short = 'p', long = "prop")]
        props: Vec<String>,
    },

    /// Look up endpoint properties
    EndpointProp {
        /// Endpoint such as ipv4:10.0.0.1
        #[arg(short = 'e', long = "endpoint", required = true)]
        endpoints: Vec<EndpointId>,

        /// Property to report; all properties when omitted
        #[arg(short = 'p', long = "prop")]
        props: Vec<String>,
    },

    /// Look up entity geolocations
    Geo {
        /// Entity such as ipv4:10.0.0.1
        #[arg(short = 'e', long = "entity", required = true)]
        entities: Vec<EndpointId>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("altod: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "altod: lookup failed");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries the response body.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set logger: {e}"))?;
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = AltoConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info!(config = %args.config.display(), namespace = %args.namespace, "Starting altod");

    let runner = Runner::new(config, args.namespace)?;
    let response = match args.command {
        Command::PathVector { flows, props } => {
            let names: BTreeSet<String> = props.into_iter().collect();
            runner
                .path_vector(&flows, &names, &MultipartEncoder::new())
                .await?
        }
        Command::EndpointProp { endpoints, props } => {
            let names: BTreeSet<String> = props.into_iter().collect();
            let names = (!names.is_empty()).then_some(&names);
            runner.endpoint_properties(&endpoints, names).await?
        }
        Command::Geo { entities } => runner.geolocation(&entities).await?,
    };

    write_response(&response)
}

fn write_response(response: &Response) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Content-Type: {}", response.content_type)?;
    writeln!(stdout)?;
    stdout.write_all(&response.body)?;
    writeln!(stdout)?;
    Ok(())
}
