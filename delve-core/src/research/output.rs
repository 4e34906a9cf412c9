//! The result of a research run and its renderings.

use super::state::PipelineState;
use crate::error::DelveError;
use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// How many sources the Markdown rendering lists.
const MARKDOWN_SOURCE_LIMIT: usize = 5;

/// Output of one completed research run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub topic: String,
    pub summary: String,
    pub subtopics: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub critique: String,
    /// Number of Critique → Search loops taken.
    pub refinement_rounds: usize,
}

impl From<PipelineState> for ResearchReport {
    fn from(state: PipelineState) -> Self {
        Self {
            topic: state.topic,
            summary: state.summary,
            subtopics: state.subtopics,
            search_results: state.search_results,
            critique: state.critique,
            refinement_rounds: state.refinement_rounds,
        }
    }
}

impl ResearchReport {
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Research: {}\n", self.topic);

        let _ = writeln!(md, "## Summary\n\n{}\n", self.summary);
        let _ = writeln!(md, "## Critique\n\n{}\n", self.critique);

        md.push_str("## Subtopics\n\n");
        for (i, subtopic) in self.subtopics.iter().enumerate() {
            let _ = writeln!(md, "{}. {}", i + 1, subtopic);
        }

        let _ = writeln!(
            md,
            "\n## Sources ({} total)\n",
            self.search_results.len()
        );
        for (i, result) in self
            .search_results
            .iter()
            .take(MARKDOWN_SOURCE_LIMIT)
            .enumerate()
        {
            let _ = writeln!(md, "{}. [{}]({})", i + 1, result.title, result.url);
            if !result.snippet.is_empty() {
                let _ = writeln!(md, "   {}", result.snippet);
            }
        }

        if self.refinement_rounds > 0 {
            let _ = writeln!(md, "\n_Refinement rounds: {}_", self.refinement_rounds);
        }
        md
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, DelveError> {
        match format {
            OutputFormat::Markdown => Ok(self.to_markdown()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Rendering for a `ResearchReport`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format '{other}' (expected markdown or json)"
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
