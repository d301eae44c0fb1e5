//! Capacity Sizer
//!
//! Command-line front end: size a usage export into tier recommendations or a
//! cost allocation, print the effective policy, or serve the REST API.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use capacity_sizer::{
    AllocationMode, AllocationReport, ApiServer, ApiServerConfig, AssemblerOptions, OutputFormat,
    SizingEngine, SizingMetrics, SizingPolicy, TierReport,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Capacity Sizer - tier recommendations and cost allocation for shared clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sizing policy file (YAML)
    #[arg(long, global = true, env = "SIZER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every client and recommend a tier
    Tiers {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Split the cluster's monthly cost across clients
    Allocate {
        #[command(flatten)]
        io: IoArgs,

        /// Total monthly cluster cost in USD
        #[arg(long)]
        total_cost: Option<f64>,

        /// Blend data and IOPS shares instead of sizing by data alone
        #[arg(long)]
        blended: bool,

        /// Client that always gets the heavy-IOPS weights (repeatable)
        #[arg(long = "heavy-client")]
        heavy_clients: Vec<String>,

        /// Rescale weighted shares so they sum to one
        #[arg(long)]
        normalize_shares: bool,
    },

    /// Serve the REST API
    Serve {
        /// REST API bind address
        #[arg(long, env = "API_ADDR", default_value = capacity_sizer::api::DEFAULT_API_ADDR)]
        addr: String,

        /// Allow cross-origin requests
        #[arg(long, env = "API_CORS")]
        cors: bool,
    },

    /// Print the effective sizing policy as YAML
    Policy,
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Usage export to read; "-" reads stdin
    #[arg(long, short, default_value = "-")]
    input: String,

    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Report format (csv, json)
    #[arg(long, default_value = "csv")]
    format: OutputFormat,

    /// Report every recovered input problem as a warning
    #[arg(long)]
    strict: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let policy = match &cli.config {
        Some(path) => SizingPolicy::load(path)
            .with_context(|| format!("failed to load policy from {}", path.display()))?,
        None => SizingPolicy::default(),
    };

    match cli.command {
        Command::Tiers { io } => {
            let engine = SizingEngine::new(policy).context("invalid sizing policy")?;
            let text = read_input(&io.input)?;

            let run = engine.run_tiers(&text, AssemblerOptions { strict: io.strict });
            info!(
                clients = run.recommendations.len(),
                dropped = run.stats.dropped_rows,
                "Tier recommendations complete"
            );

            let rendered = TierReport::from(&run).render(io.format)?;
            write_output(io.output.as_deref(), &rendered)?;
        }

        Command::Allocate {
            io,
            total_cost,
            blended,
            heavy_clients,
            normalize_shares,
        } => {
            let mut allocation = policy.allocation.clone();
            if let Some(total) = total_cost {
                allocation.total_monthly_cost = total;
            }
            if blended {
                allocation.mode = AllocationMode::Blended;
            }
            if normalize_shares {
                allocation.normalize_shares = true;
            }
            let allocation = allocation.with_heavy_clients(&heavy_clients);

            let engine = SizingEngine::new(SizingPolicy {
                allocation,
                ..policy
            })
            .context("invalid allocation settings")?;
            let text = read_input(&io.input)?;

            let run = engine.run_allocation(&text, AssemblerOptions { strict: io.strict });
            let summary = &run.allocation.summary;
            info!(
                mode = %summary.mode,
                clients = summary.clients,
                allocated = summary.allocated_cost,
                "Cost allocation complete"
            );

            let rendered = AllocationReport::from(&run).render(io.format)?;
            write_output(io.output.as_deref(), &rendered)?;
        }

        Command::Serve { addr, cors } => {
            let engine = SizingEngine::new(policy).context("invalid sizing policy")?;
            let rest_addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid REST API address '{}'", addr))?;

            info!("Starting Capacity Sizer API");
            info!("  Version: {}", capacity_sizer::VERSION);
            info!("  REST API: {}", rest_addr);

            let config = ApiServerConfig {
                rest_addr,
                cors_enabled: cors,
            };
            let server = ApiServer::new(config, Arc::new(engine), SizingMetrics::new()?);
            server.run().await?;

            info!("Shutdown complete");
        }

        Command::Policy => {
            policy.validate().context("invalid sizing policy")?;
            print!("{}", policy.to_yaml()?);
        }
    }

    Ok(())
}

// =============================================================================
// Input / Output
// =============================================================================

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read usage export from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read usage export from {}", input))
    }
}

fn write_output(output: Option<&Path>, rendered: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(cli: &Cli) {
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "tower=warn", "tower_http=info", "axum=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr so reports on stdout stay clean
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
