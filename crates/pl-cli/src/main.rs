use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pl_cli::commands::keys::{cmd_encode, cmd_keygen};
use pl_cli::commands::ledger::{cmd_log, cmd_verify, HistoryArgs, HistoryCommand};
use pl_cli::commands::serve::{cmd_serve, ServeArgs};
use pl_cli::telemetry;
use pl_service::{ProvenanceService, ServiceConfig};
use std::path::PathBuf;
use tracing::info;

/// Provenance ledger command line.
#[derive(Parser, Debug)]
#[command(name = "pl", author = "Provledger Contributors", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve JSON-lines requests from stdin (or --input) to stdout.
    Serve(ServeArgs),
    /// Inspect an exported product history.
    History(HistoryArgs),
    /// Generate a new Ed25519 keypair.
    Keygen {
        /// Optional output path for the keypair (default: prints to stdout)
        output: Option<PathBuf>,
    },
    /// Base58-encode hex bytes.
    Encode {
        /// Hex input, optionally prefixed with 0x.
        hex: String,
    },
    /// Display the resolved configuration and anchor identity.
    Info,
}

fn load_config(path: Option<&PathBuf>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    config
        .apply_env()
        .context("invalid environment override")?;
    Ok(config)
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => {
            let config = load_config(cli.config.as_ref())?;
            let service =
                ProvenanceService::from_config(&config).context("failed to start service")?;
            info!(public_key = %service.public_key(), "serving requests");
            cmd_serve(&service, args)
        }
        Commands::History(args) => match args.command {
            HistoryCommand::Log { file } => cmd_log(file),
            HistoryCommand::Verify { file } => cmd_verify(file),
        },
        Commands::Keygen { output } => cmd_keygen(output),
        Commands::Encode { hex } => cmd_encode(&hex),
        Commands::Info => handle_info(cli.config.as_ref()),
    }
}

fn handle_info(config_path: Option<&PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let anchor = config
        .anchor
        .build_anchor()
        .context("failed to build signature anchor")?;

    println!("network: {}", config.anchor.network);
    match config.anchor.resolved_rpc_url() {
        Ok(url) => println!("rpc_url: {url}"),
        Err(err) => println!("rpc_url: unresolved ({err})"),
    }
    println!("anchoring: {}", anchor.is_anchoring());
    println!("timeout_ms: {}", config.anchor.timeout_ms);
    println!("public_key: {}", anchor.public_key_base58());
    println!(
        "default_recent_limit: {}",
        config.query.default_recent_limit
    );
    Ok(())
}
