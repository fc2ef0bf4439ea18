/// Reload service for the testing guide.
///
/// Re-reads the guide file and re-parses it when its SHA-256 digest changes.
/// Runs on demand via the `reload_guidelines` MCP tool.
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::model::Corpus;
use crate::parser;
use mcp_common::error::read_source_async;

/// Result of a reload operation.
pub struct ReloadResult {
    /// Whether the guide changed and was re-parsed.
    pub updated: bool,
    /// Digest of the guide file on disk.
    pub digest: String,
    /// The freshly parsed corpus, present only when `updated`.
    pub corpus: Option<Corpus>,
}

pub struct ReloadService {
    config: Config,
}

impl ReloadService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Read the guide, compare digests and re-parse if the content changed.
    ///
    /// A parse failure is returned to the caller; the running corpus is never replaced
    /// by a partial one.
    pub async fn reload(&self, current_digest: &str) -> Result<ReloadResult, AppError> {
        let path = self.config.guidelines_file_path();
        let content = read_source_async(&path).await?;

        let digest = format!("{:x}", Sha256::digest(content.as_bytes()));
        if digest == current_digest {
            info!(digest = %digest, "guide unchanged, skipping reload");
            return Ok(ReloadResult {
                updated: false,
                digest,
                corpus: None,
            });
        }

        let corpus = parser::load(&content)
            .inspect_err(|e| warn!(error = %e, path = %path.display(), "reload rejected"))?;
        info!(
            digest = %digest,
            sections = corpus.len(),
            "guide reloaded"
        );

        Ok(ReloadResult {
            updated: true,
            digest,
            corpus: Some(corpus),
        })
    }
}
