use clap::{Args, Parser, Subcommand};
use kb_recommend::Result;
use kb_recommend::commands::{Overrides, recommend_once, serve_http, show_status};
use kb_recommend::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kb-recommend")]
#[command(about = "Recommend knowledge-base articles for support tickets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct CommonArgs {
    /// Knowledge base CSV to use instead of the configured one
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Number of articles to return per ticket
    #[arg(long)]
    top_k: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and knowledge base location
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP recommendation server
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Recommend articles for a single ticket and exit
    Recommend {
        /// Ticket description
        ticket: String,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Check Ollama reachability and the knowledge base file
    Status {
        #[command(flatten)]
        common: CommonArgs,
    },
}

impl CommonArgs {
    fn into_overrides(self, port: Option<u16>) -> Overrides {
        Overrides {
            corpus: self.corpus,
            port,
            top_k: self.top_k,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Serve { port, common } => {
            serve_http(common.into_overrides(port)).await?;
        }
        Commands::Recommend { ticket, common } => {
            recommend_once(ticket, common.into_overrides(None)).await?;
        }
        Commands::Status { common } => {
            show_status(common.into_overrides(None)).await?;
        }
    }

    Ok(())
}
