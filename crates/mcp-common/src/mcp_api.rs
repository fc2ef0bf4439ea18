use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchSectionsParams {
    /// The search query describing what you're looking for.
    pub query: String,
    /// Maximum number of results to return (default: 10, max: 50).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSectionParams {
    /// Exact, case-sensitive section title such as "Avoid logic in your tests".
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListSectionsParams {
    /// Optional category name such as "Guidelines" or "General principles".
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LabelParams {
    /// Example label: "bad", "good" or "better".
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionSummary {
    pub title: String,
    pub anchor: String,
    pub category: Option<String>,
    pub example_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionListResponse {
    pub sections: Vec<SectionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExampleSnippet {
    /// "bad", "good" or "better".
    pub label: String,
    pub language: Option<String>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionDetailResponse {
    pub title: String,
    pub anchor: String,
    pub category: Option<String>,
    pub rationale: Vec<String>,
    pub examples: Vec<ExampleSnippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryInfo {
    pub name: String,
    pub anchor: String,
    pub section_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionSearchResult {
    pub title: String,
    pub category: Option<String>,
    pub score: f32,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSectionsResponse {
    pub results: Vec<SectionSearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceInfo {
    pub author: Option<String>,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContributorInfo {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourcesResponse {
    pub references: Vec<ReferenceInfo>,
    pub contributors: Vec<ContributorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadGuidelinesResponse {
    pub updated: bool,
    /// SHA-256 of the guide text now being served.
    pub digest: String,
    pub section_count: usize,
}
