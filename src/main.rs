mod server;
mod tools;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mnemo::config::MnemoConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mnemo", version, about = "In-process cognitive memory MCP server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on (overrides config)
        #[arg(long, value_enum)]
        transport: Option<Transport>,
        /// HTTP port (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Memory capacity (overrides config)
        #[arg(long)]
        max_memories: Option<usize>,
        /// Seconds between decay passes (overrides config)
        #[arg(long)]
        decay_interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let mut config = MnemoConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            transport,
            port,
            max_memories,
            decay_interval_secs,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(max) = max_memories {
                config.store.max_memories = max;
            }
            if let Some(secs) = decay_interval_secs {
                config.maintenance.decay_interval_secs = secs;
            }

            let transport = match transport {
                Some(t) => t,
                None => match config.server.transport.as_str() {
                    "stdio" => Transport::Stdio,
                    "http" => Transport::Http,
                    other => bail!("unknown transport in config: {other}"),
                },
            };
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Http => server::serve_http(config).await?,
            }
        }
    }

    Ok(())
}
