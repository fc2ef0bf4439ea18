use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Classification of an illustrative snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Bad,
    Good,
    Better,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Bad => "bad",
            Label::Good => "good",
            Label::Better => "better",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bad" => Ok(Label::Bad),
            "good" => Ok(Label::Good),
            "better" => Ok(Label::Better),
            _ => Err(AppError::UnknownLabel(s.to_string())),
        }
    }
}

/// A labeled code snippet attached to a section. The snippet is opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub label: Label,
    /// Fence info string, e.g. "js"
    pub language: Option<String>,
    /// Literal text between the fences
    pub snippet: String,
}

/// One guideline topic, e.g. "Avoid logic in your tests".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineSection {
    pub title: String,
    /// GitHub-style heading slug, e.g. "avoid-logic-in-your-tests"
    pub anchor: String,
    /// Enclosing `##` heading, if the section has one
    pub category: Option<String>,
    /// Prose paragraphs in document order; never empty
    pub rationale: Vec<String>,
    pub examples: Vec<Example>,
    /// 1-based line of the section heading
    pub line: usize,
}

impl GuidelineSection {
    pub fn has_label(&self, label: Label) -> bool {
        self.examples.iter().any(|e| e.label == label)
    }
}

/// A `##` grouping of sections, e.g. "General principles" or "Guidelines".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub anchor: String,
    pub section_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub author: Option<String>,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub url: String,
}

/// The parsed guide. Built once by [`crate::parser::load`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Corpus {
    title: Option<String>,
    sections: Vec<GuidelineSection>,
    categories: Vec<Category>,
    references: Vec<Reference>,
    contributors: Vec<Contributor>,
    digest: String,
    #[serde(skip)]
    by_title: HashMap<String, usize>,
}

impl Corpus {
    /// Assemble a corpus from parsed parts. Titles must already be unique.
    pub(crate) fn new(
        title: Option<String>,
        sections: Vec<GuidelineSection>,
        categories: Vec<Category>,
        references: Vec<Reference>,
        contributors: Vec<Contributor>,
        digest: String,
    ) -> Self {
        let by_title = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.title.clone(), i))
            .collect();
        Self {
            title,
            sections,
            categories,
            references,
            contributors,
            digest,
            by_title,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    /// SHA-256 hex digest of the source text.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub(crate) fn index_of(&self, title: &str) -> Option<usize> {
        self.by_title.get(title).copied()
    }

    pub(crate) fn sections_slice(&self) -> &[GuidelineSection] {
        &self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parses_any_case() {
        assert_eq!("bad".parse::<Label>().unwrap(), Label::Bad);
        assert_eq!(" Good ".parse::<Label>().unwrap(), Label::Good);
        assert_eq!("BETTER".parse::<Label>().unwrap(), Label::Better);
        assert!(matches!(
            "ugly".parse::<Label>(),
            Err(AppError::UnknownLabel(l)) if l == "ugly"
        ));
    }

    #[test]
    fn corpus_serializes_without_index() {
        let section = GuidelineSection {
            title: "Avoid logic in your tests".to_string(),
            anchor: "avoid-logic-in-your-tests".to_string(),
            category: Some("Guidelines".to_string()),
            rationale: vec!["Always use simple statements.".to_string()],
            examples: vec![Example {
                label: Label::Bad,
                language: Some("js".to_string()),
                snippet: "for (const t in values) {}".to_string(),
            }],
            line: 3,
        };
        let corpus = Corpus::new(
            None,
            vec![section],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            "abc".to_string(),
        );

        let json = serde_json::to_value(&corpus).expect("serializes");
        assert_eq!(json["sections"][0]["examples"][0]["label"], "bad");
        assert_eq!(json["digest"], "abc");
        assert!(json.get("by_title").is_none());
    }
}
