/// Error types shared across MCP server crates.
///
/// These errors represent failures in infrastructure shared by every guideline server
/// (currently reading source documents from disk). Application-specific errors should be
/// defined in each server crate and wrap `CommonError` via `#[from]`.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a UTF-8 source document, attaching the path to any I/O failure.
pub fn read_source(path: &std::path::Path) -> Result<String, CommonError> {
    std::fs::read_to_string(path).map_err(|source| CommonError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Async variant of [`read_source`] for callers already on the tokio runtime.
pub async fn read_source_async(path: &std::path::Path) -> Result<String, CommonError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommonError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.md");
        let err = read_source(&path).unwrap_err();
        assert!(err.to_string().contains("absent.md"), "got: {err}");
    }

    #[tokio::test]
    async fn async_read_matches_sync_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("guide.md");
        std::fs::write(&path, "# Guide\n").expect("write");
        assert_eq!(
            read_source_async(&path).await.expect("async read"),
            read_source(&path).expect("sync read")
        );

        let err = read_source_async(&dir.path().join("absent.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommonError::Io { ref path, .. } if path.ends_with("absent.md")));
    }
}
