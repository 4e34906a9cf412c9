//! Delve CLI: research a topic from the terminal or serve the HTTP gateway.

mod commands;

use clap::Parser;
use delve_core::research::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Delve: decompose a topic, search it, summarize and critique the findings
#[derive(Parser, Debug)]
#[command(name = "delve", version, about, long_about = None)]
struct Cli {
    /// LLM model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Workspace directory
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Research a topic in-process and print the report
    Research {
        /// Topic to research
        topic: String,
        /// Search results per query
        #[arg(short = 'n', long)]
        max_results: Option<i64>,
        /// Output format (markdown, json)
        #[arg(short, long, default_value = "markdown")]
        format: OutputFormat,
    },
    /// Ask a running gateway to research a topic
    Ask {
        /// Topic to research
        topic: String,
        /// Search results per query
        #[arg(short = 'n', long)]
        max_results: Option<i64>,
        /// Gateway base URL
        #[arg(long, default_value = "http://localhost:8000")]
        server_url: String,
        /// Output format (markdown, json)
        #[arg(short, long, default_value = "markdown")]
        format: OutputFormat,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the merged configuration (secrets omitted)
    Show,
    /// Check the merged configuration for invalid values
    Validate,
}

/// Options shared by every subcommand.
#[derive(Debug)]
struct GlobalArgs {
    workspace: PathBuf,
    config: Option<PathBuf>,
    model: Option<String>,
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "delve", "delve")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "delve.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let globals = GlobalArgs {
        workspace,
        config: cli.config,
        model: cli.model,
        quiet: cli.quiet,
    };
    commands::handle_command(cli.command, &globals).await
}
