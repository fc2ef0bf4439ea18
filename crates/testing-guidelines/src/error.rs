use mcp_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("parse error at lines {start_line}-{end_line}: {message}")]
    Parse {
        start_line: usize,
        end_line: usize,
        message: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("section not found: {0}")]
    NotFound(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown label: '{0}'. Expected one of: bad, good, better")]
    UnknownLabel(String),
}
