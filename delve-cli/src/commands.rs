//! Subcommand handlers.

use crate::{Commands, ConfigAction, GlobalArgs};
use delve_core::DelveError;
use delve_core::config::{DelveConfig, config_exists, load_config};
use delve_core::gateway::{ResearchRequest, ResearchResponse};
use delve_core::research::{
    OutputFormat, PipelineStep, ResearchCallback, ResearchEngine, ResearchReport,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Dispatch a parsed subcommand.
pub async fn handle_command(command: Commands, globals: &GlobalArgs) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => {
            let mut config = load(globals)?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            handle_serve(config).await
        }
        Commands::Research {
            topic,
            max_results,
            format,
        } => {
            let config = load(globals)?;
            handle_research(config, &topic, max_results, format, globals.quiet).await
        }
        Commands::Ask {
            topic,
            max_results,
            server_url,
            format,
        } => handle_ask(&server_url, &topic, max_results, format).await,
        Commands::Config { action } => handle_config(action, globals),
    }
}

/// Load the layered configuration and apply CLI overrides.
fn load(globals: &GlobalArgs) -> anyhow::Result<DelveConfig> {
    let mut config = load_config(Some(&globals.workspace), globals.config.as_deref())
        .map_err(DelveError::from)?;
    if let Some(model) = &globals.model {
        config.llm.model = model.clone();
    }
    config.validate().map_err(DelveError::from)?;
    Ok(config)
}

async fn handle_serve(config: DelveConfig) -> anyhow::Result<()> {
    let engine = ResearchEngine::from_config(&config)?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        search = %config.search.provider,
        "Starting Delve gateway"
    );
    delve_core::gateway::run(&config.gateway, Arc::new(engine)).await?;
    Ok(())
}

async fn handle_research(
    config: DelveConfig,
    topic: &str,
    max_results: Option<i64>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let max_results = max_results.unwrap_or(config.research.default_max_results as i64);
    let mut engine = ResearchEngine::from_config(&config)?;
    if !quiet {
        engine = engine.with_callback(Arc::new(StderrProgress));
    }

    let report = engine.run(topic, max_results).await?;
    println!("{}", report.render(format)?);
    Ok(())
}

async fn handle_ask(
    server_url: &str,
    topic: &str,
    max_results: Option<i64>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/api/research", server_url.trim_end_matches('/'));
    debug!(url = %url, topic, "Sending research request");

    let request = ResearchRequest {
        topic: topic.to_string(),
        max_results,
    };
    let response = reqwest::Client::new()
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reach {}: {}", server_url, e))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        let detail = body["detail"].as_str().unwrap_or("unknown error");
        anyhow::bail!("Server returned {}: {}", status, detail);
    }

    let response: ResearchResponse = serde_json::from_value(body)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Markdown => println!("{}", remote_report(topic, response).to_markdown()),
    }
    Ok(())
}

/// A report for a gateway reply, which carries no refinement count.
fn remote_report(topic: &str, response: ResearchResponse) -> ResearchReport {
    ResearchReport {
        topic: topic.trim().to_string(),
        summary: response.summary,
        subtopics: response.subtopics,
        search_results: response.search_results,
        critique: response.critique,
        refinement_rounds: 0,
    }
}

fn handle_config(action: ConfigAction, globals: &GlobalArgs) -> anyhow::Result<()> {
    let mut config = load_config(Some(&globals.workspace), globals.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    if let Some(model) = &globals.model {
        config.llm.model = model.clone();
    }

    match action {
        ConfigAction::Show => {
            if !config_exists(Some(&globals.workspace)) && globals.config.is_none() {
                eprintln!("No configuration file found; showing defaults and environment overrides.");
            }
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigAction::Validate => {
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
            println!("Configuration is valid.");
            Ok(())
        }
    }
}

/// Prints pipeline progress to stderr.
struct StderrProgress;

impl ResearchCallback for StderrProgress {
    fn on_phase_change(&self, step: PipelineStep) {
        if step != PipelineStep::Done {
            eprintln!("==> {}", step);
        }
    }

    fn on_query_searched(&self, query: &str, results: usize) {
        eprintln!("    {} result(s) for \"{}\"", results, query);
    }

    fn on_refinement(&self, round: usize, queries: &[String]) {
        eprintln!("==> refinement round {}: {}", round, queries.join("; "));
    }
}
