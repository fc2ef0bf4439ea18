/// MCP server implementation for the unit-testing guide.
///
/// Exposes seven tools:
/// - `list_sections`: Sections in document order, optionally filtered by category
/// - `get_section`: Full content of one section by exact title
/// - `sections_with_label`: Sections holding a `bad`, `good` or `better` example
/// - `list_categories`: Category names with section counts
/// - `search_sections`: Keyword search over titles, rationale and snippets
/// - `list_resources`: References and contributors
/// - `reload_guidelines`: Re-read the guide file if its content changed
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::config::Config;
use crate::model::{Corpus, GuidelineSection, Label};
use crate::reload::ReloadService;
use crate::search;
use mcp_common::mcp_api::{
    CategoryInfo, CategoryListResponse, ContributorInfo, ExampleSnippet, GetSectionParams,
    LabelParams, ListSectionsParams, ReferenceInfo, ReloadGuidelinesResponse, ResourcesResponse,
    SearchSectionsParams, SearchSectionsResponse, SectionDetailResponse, SectionListResponse,
    SectionSearchResult, SectionSummary,
};

#[derive(Clone)]
pub struct TestingGuidelinesServer {
    /// Swapped whole on reload; readers clone the inner `Arc` and drop the lock.
    corpus: Arc<RwLock<Arc<Corpus>>>,
    reload_service: Arc<ReloadService>,
    /// Held for a whole reload so an older read can never swap in after a newer one.
    reload_lock: Arc<Mutex<()>>,
    tool_router: ToolRouter<TestingGuidelinesServer>,
}

impl TestingGuidelinesServer {
    pub fn new(corpus: Corpus, config: Config) -> Self {
        Self {
            corpus: Arc::new(RwLock::new(Arc::new(corpus))),
            reload_service: Arc::new(ReloadService::new(config)),
            reload_lock: Arc::new(Mutex::new(())),
            tool_router: Self::tool_router(),
        }
    }

    async fn snapshot(&self) -> Arc<Corpus> {
        Arc::clone(&*self.corpus.read().await)
    }
}

#[tool_router]
impl TestingGuidelinesServer {
    #[tool(description = "List unit-testing guideline sections in document order. Optionally restrict to one category such as 'Guidelines' or 'General principles'.")]
    async fn list_sections(
        &self,
        Parameters(params): Parameters<ListSectionsParams>,
    ) -> Result<Json<SectionListResponse>, String> {
        let corpus = self.snapshot().await;
        let sections: Vec<SectionSummary> = match params.category.as_deref().map(str::trim) {
            None => corpus.list_sections().map(to_summary).collect(),
            Some("") => return Err("category must not be empty".to_string()),
            Some(category) => corpus
                .sections_in_category(category)
                .map_err(|e| e.to_string())?
                .map(to_summary)
                .collect(),
        };
        Ok(Json(SectionListResponse { sections }))
    }

    #[tool(description = "Get the full content of a guideline section by its exact, case-sensitive title (e.g. 'Avoid logic in your tests').")]
    async fn get_section(
        &self,
        Parameters(params): Parameters<GetSectionParams>,
    ) -> Result<Json<SectionDetailResponse>, String> {
        let title = params.title.trim();
        if title.is_empty() {
            return Err("title must not be empty".to_string());
        }

        let corpus = self.snapshot().await;
        let section = corpus.find_section(title).map_err(|e| e.to_string())?;
        Ok(Json(to_detail(section)))
    }

    #[tool(description = "List sections that contain at least one example labeled 'bad', 'good' or 'better'.")]
    async fn sections_with_label(
        &self,
        Parameters(params): Parameters<LabelParams>,
    ) -> Result<Json<SectionListResponse>, String> {
        if params.label.trim().is_empty() {
            return Err("label must not be empty".to_string());
        }
        let label = params.label.parse::<Label>().map_err(|e| e.to_string())?;

        let corpus = self.snapshot().await;
        let sections: Vec<SectionSummary> = corpus
            .sections_by_label_presence(label)
            .map(to_summary)
            .collect();
        Ok(Json(SectionListResponse { sections }))
    }

    #[tool(description = "List guideline categories with their section counts.")]
    async fn list_categories(&self) -> Result<Json<CategoryListResponse>, String> {
        let corpus = self.snapshot().await;
        let categories: Vec<CategoryInfo> = corpus
            .categories()
            .iter()
            .map(|c| CategoryInfo {
                name: c.name.clone(),
                anchor: c.anchor.clone(),
                section_count: c.section_titles.len(),
            })
            .collect();
        Ok(Json(CategoryListResponse { categories }))
    }

    #[tool(description = "Search guideline sections by keyword. Title matches rank above rationale and snippet matches.")]
    async fn search_sections(
        &self,
        Parameters(params): Parameters<SearchSectionsParams>,
    ) -> Result<Json<SearchSectionsResponse>, String> {
        let query = params.query.trim();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let limit = search::effective_limit(params.limit);
        let corpus = self.snapshot().await;
        let results: Vec<SectionSearchResult> = search::search(&corpus, query, limit)
            .into_iter()
            .map(|r| SectionSearchResult {
                title: r.title,
                category: r.category,
                score: r.score,
                summary: r.summary,
            })
            .collect();
        Ok(Json(SearchSectionsResponse { results }))
    }

    #[tool(description = "List the guide's references (author, title, URL) and contributors.")]
    async fn list_resources(&self) -> Result<Json<ResourcesResponse>, String> {
        let corpus = self.snapshot().await;
        Ok(Json(ResourcesResponse {
            references: corpus
                .references()
                .iter()
                .map(|r| ReferenceInfo {
                    author: r.author.clone(),
                    title: r.title.clone(),
                    url: r.url.clone(),
                })
                .collect(),
            contributors: corpus
                .contributors()
                .iter()
                .map(|c| ContributorInfo {
                    name: c.name.clone(),
                    url: c.url.clone(),
                })
                .collect(),
        }))
    }

    #[tool(description = "Re-read the guide file. Re-parses and swaps the served corpus only when the content changed.")]
    async fn reload_guidelines(&self) -> Result<Json<ReloadGuidelinesResponse>, String> {
        info!("reload_guidelines tool invoked");

        let _guard = self.reload_lock.lock().await;
        let current = self.snapshot().await;
        let result = self
            .reload_service
            .reload(current.digest())
            .await
            .map_err(|e| format!("reload failed: {e}"))?;

        let section_count = match result.corpus {
            Some(corpus) => {
                let count = corpus.len();
                *self.corpus.write().await = Arc::new(corpus);
                info!(section_count = count, "in-memory corpus updated");
                count
            }
            None => current.len(),
        };

        Ok(Json(ReloadGuidelinesResponse {
            updated: result.updated,
            digest: result.digest,
            section_count,
        }))
    }
}

fn to_summary(section: &GuidelineSection) -> SectionSummary {
    SectionSummary {
        title: section.title.clone(),
        anchor: section.anchor.clone(),
        category: section.category.clone(),
        example_count: section.examples.len(),
    }
}

fn to_detail(section: &GuidelineSection) -> SectionDetailResponse {
    SectionDetailResponse {
        title: section.title.clone(),
        anchor: section.anchor.clone(),
        category: section.category.clone(),
        rationale: section.rationale.clone(),
        examples: section
            .examples
            .iter()
            .map(|e| ExampleSnippet {
                label: e.label.to_string(),
                language: e.language.clone(),
                snippet: e.snippet.clone(),
            })
            .collect(),
    }
}

#[tool_handler]
impl ServerHandler for TestingGuidelinesServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "testing-guidelines".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Unit testing guidelines MCP server. Serves the sections of a JavaScript unit \
                 testing style guide with their bad/good/better examples. Use list_sections or \
                 list_categories to browse, get_section for one guideline by exact title, \
                 sections_with_label to find anti-patterns, search_sections for keywords, and \
                 reload_guidelines after the guide file changes."
                    .to_string(),
            ),
        }
    }
}
