mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "Bootstrap and plan cloud stacks through a remote executor", long_about = None)]
struct Cli {
    /// Executor endpoint, overrides the settings file
    #[arg(long, global = true, env = "STACKFLOW_EXECUTOR")]
    endpoint: Option<String>,

    /// User the request is made on behalf of
    #[arg(short, long, global = true, env = "STACKFLOW_USER")]
    user: Option<String>,

    /// Directory holding credentials.json and templates.json
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the shared provider resources of a group
    Bootstrap {
        /// Group the resources belong to
        #[arg(short, long)]
        group: String,
        /// Credential identifiers
        #[arg(required = true)]
        identifiers: Vec<String>,
        /// Tear the resources down instead
        #[arg(long)]
        destroy: bool,
    },
    /// Preview the machines a stack template would create
    Plan {
        /// Group the stack belongs to
        #[arg(short, long)]
        group: String,
        /// Stack template id
        stack_template_id: String,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // no settings needed
    if matches!(cli.command, Commands::Version) {
        println!("stackflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = stackflow_config::load_or_default()?;

    let default_filter = settings.log_level.clone().unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context::resolve(settings, cli.endpoint, cli.user, cli.store_dir)?;

    match cli.command {
        Commands::Bootstrap {
            group,
            identifiers,
            destroy,
        } => commands::bootstrap::handle(&ctx, group, identifiers, destroy).await,
        Commands::Plan {
            group,
            stack_template_id,
            json,
        } => commands::plan::handle(&ctx, group, stack_template_id, json).await,
        Commands::Version => Ok(()),
    }
}
