use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// The guide file or the directory holding it.
    pub guide_path: String,
    /// Guide file name inside `guide_path` when that is a directory.
    pub guide_file: String,
}

impl Config {
    /// Required:
    /// - `TESTING_GUIDELINES_PATH`: the guide markdown, or a checkout containing it
    ///
    /// Optional:
    /// - `TESTING_GUIDELINES_FILE` (default: "README.md")
    pub fn from_env() -> Result<Self, AppError> {
        let guide_path = std::env::var("TESTING_GUIDELINES_PATH").map_err(|_| {
            AppError::Config("TESTING_GUIDELINES_PATH environment variable is required".to_string())
        })?;
        let guide_file =
            std::env::var("TESTING_GUIDELINES_FILE").unwrap_or_else(|_| "README.md".to_string());
        Self::new(guide_path, guide_file)
    }

    pub fn new(guide_path: String, guide_file: String) -> Result<Self, AppError> {
        let config = Self {
            guide_path,
            guide_file,
        };
        let file = config.guidelines_file_path();
        if !file.is_file() {
            return Err(AppError::Config(format!(
                "required file not found: {}",
                file.display()
            )));
        }
        Ok(config)
    }

    /// Returns the full path to the guide markdown.
    pub fn guidelines_file_path(&self) -> PathBuf {
        let path = Path::new(&self.guide_path);
        if path.is_dir() {
            path.join(&self.guide_file)
        } else {
            path.to_path_buf()
        }
    }
}
