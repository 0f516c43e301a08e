//! navmatch MCP server and CLI entry point.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use navmatch::{GroundTruthInput, Site, Verifier};
use navmatch_mcp::config::{load_tasks, resolve_tasks_path, ServerConfig};
use navmatch_mcp::protocol::ProtocolHandler;
use navmatch_mcp::session::VerifierSessionManager;
use navmatch_mcp::tools::ToolRegistry;
use navmatch_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "navmatch-mcp",
    about = "Grade browser-agent navigation URLs against ground truth, over MCP or from the shell",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Self-match every task's ground-truth alternatives.
    Check {
        /// Task file (JSON array of tasks).
        #[arg(short, long)]
        tasks: Option<String>,
    },

    /// Compare one agent URL against ground-truth URLs.
    Match {
        /// Site dialect; detected from the first ground-truth URL when omitted.
        #[arg(long)]
        site: Option<Site>,

        /// The agent's URL.
        agent_url: String,

        /// One or more ground-truth alternatives.
        #[arg(required = true)]
        ground_truth: Vec<String>,
    },

    /// Print the canonical search record for a URL.
    Parse {
        /// Site dialect; detected from the URL when omitted.
        #[arg(long)]
        site: Option<Site>,

        url: String,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   navmatch-mcp completions bash > ~/.local/share/bash-completion/completions/navmatch-mcp
    ///   navmatch-mcp completions zsh > ~/.zfunc/_navmatch-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let session = VerifierSessionManager::new(ServerConfig::from_env());
            let handler = ProtocolHandler::new(Arc::new(Mutex::new(session)));
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Check { tasks } => {
            let path = resolve_tasks_path(tasks.as_deref());
            let tasks = load_tasks(Path::new(&path))?;
            let summary = navmatch_mcp::run_check(&tasks, &mut std::io::stdout().lock())?;
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }

        Commands::Match {
            site,
            agent_url,
            ground_truth,
        } => {
            let ground_truth = GroundTruthInput::List(ground_truth);
            let mut verifier = match site {
                Some(site) => Verifier::new(site, ground_truth)?,
                None => Verifier::detect(ground_truth)?,
            };
            verifier.update(&agent_url);
            let result = verifier.compute();
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_match {
                std::process::exit(1);
            }
        }

        Commands::Parse { site, url } => {
            let site = match site {
                Some(site) => site,
                None => Site::detect(&url)?,
            };
            let record = site.parse_url(&url)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Info => {
            let capabilities = navmatch_mcp::types::InitializeResult::default();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "sites": Site::ALL,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "navmatch-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
