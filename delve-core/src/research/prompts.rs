//! Prompt templates for the model-backed steps.

use crate::types::SearchResult;
use std::fmt::Write;

pub fn decompose_prompt(topic: &str) -> String {
    format!(
        "You are a research assistant breaking a broad topic into specific, searchable \
subtopics. For the topic below, generate 3-5 focused subtopics that together support \
comprehensive research.

TOPIC: {topic}

Respond with a JSON array of strings and nothing else.
Example: [\"subtopic 1\", \"subtopic 2\", \"subtopic 3\"]"
    )
}

pub fn expand_prompt(query: &str) -> String {
    format!(
        "You are a search expert improving a query for a web search engine. Enhance the \
query below by adding synonyms or related terms, including alternative phrasings, and \
wording it for maximum search relevance.

ORIGINAL QUERY: {query}

Return ONLY the expanded search query as a single line."
    )
}

pub fn summarize_prompt(topic: &str, results: &[SearchResult]) -> String {
    format!(
        "You are a research assistant writing a concise, informative summary on the topic: \
\"{topic}\"

Use the following search results:

{results}
Guidelines:
- Write about one paragraph (5-7 sentences)
- Stick to factual information from the search results
- Organize the information in a logical flow
- Keep a neutral, informative tone
- Include key concepts, findings, or definitions
- No personal opinions or speculation

Write ONLY the summary, without any introduction or explanation.",
        results = format_results_for_llm(results)
    )
}

pub fn critique_prompt(topic: &str, summary: &str, sample: &[SearchResult]) -> String {
    let sample_text = sample
        .iter()
        .map(|r| format!("- {}: {}", r.title, r.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a research critique specialist. Evaluate the following research summary \
on the topic: \"{topic}\".

SUMMARY:
{summary}

SEARCH RESULTS USED (SAMPLE):
{sample_text}

Critique the summary for:
1. Accuracy - does it reflect the search results?
2. Comprehensiveness - are important aspects missing?
3. Balance - is the topic treated evenly?
4. Clarity - is it clear and well organized?

Then decide whether the research needs refinement. If it does, suggest specific \
additional search queries.

Respond with a JSON object with these keys:
- \"critique\": your detailed critique
- \"needs_refinement\": true or false
- \"refinement_queries\": list of additional search queries (when needs_refinement is true)"
    )
}

/// Render results as numbered `[i] title / URL / Description` blocks.
pub fn format_results_for_llm(results: &[SearchResult]) -> String {
    let mut text = String::new();
    for (i, result) in results.iter().enumerate() {
        let _ = write!(
            text,
            "[{}] {}\nURL: {}\nDescription: {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.snippet
        );
    }
    text
}
