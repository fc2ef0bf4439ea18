/// Keyword search over a loaded corpus.
///
/// Scoring per query term: 3 for a title hit, 1 for a rationale hit, 1 for a snippet hit.
/// Ties keep document order.
use crate::model::{Corpus, GuidelineSection};

const MAX_SUMMARY_LEN: usize = 300;
const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

const TITLE_WEIGHT: f32 = 3.0;
const RATIONALE_WEIGHT: f32 = 1.0;
const SNIPPET_WEIGHT: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SectionResult {
    pub title: String,
    pub category: Option<String>,
    pub score: f32,
    pub summary: String,
}

/// Clamp a caller-supplied limit to `1..=50`, defaulting to 10.
pub fn effective_limit(limit: Option<u32>) -> usize {
    limit
        .map(|l| l as usize)
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT)
}

pub fn search(corpus: &Corpus, query: &str, limit: usize) -> Vec<SectionResult> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, &GuidelineSection)> = corpus
        .list_sections()
        .map(|s| (score_section(s, &terms), s))
        .filter(|(score, _)| *score > 0.0)
        .collect();
    // stable sort keeps document order on ties
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(score, s)| SectionResult {
            title: s.title.clone(),
            category: s.category.clone(),
            score,
            summary: summarize(s),
        })
        .collect()
}

fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    terms.sort_unstable();
    terms.dedup();
    terms
}

fn score_section(section: &GuidelineSection, terms: &[String]) -> f32 {
    let title = section.title.to_lowercase();
    let rationale = section.rationale.join("\n").to_lowercase();
    let snippets: Vec<String> = section
        .examples
        .iter()
        .map(|e| e.snippet.to_lowercase())
        .collect();

    terms
        .iter()
        .map(|term| {
            let mut score = 0.0;
            if title.contains(term.as_str()) {
                score += TITLE_WEIGHT;
            }
            if rationale.contains(term.as_str()) {
                score += RATIONALE_WEIGHT;
            }
            if snippets.iter().any(|s| s.contains(term.as_str())) {
                score += SNIPPET_WEIGHT;
            }
            score
        })
        .sum()
}

fn summarize(section: &GuidelineSection) -> String {
    let text = section.rationale.first().map(String::as_str).unwrap_or_default();
    if text.chars().count() > MAX_SUMMARY_LEN {
        format!("{}...", text.chars().take(MAX_SUMMARY_LEN).collect::<String>())
    } else {
        text.to_string()
    }
}
