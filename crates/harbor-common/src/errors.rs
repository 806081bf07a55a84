use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HarborError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("update error: {0}")]
    Update(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("frontend error: {0}")]
    Frontend(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("{0}")]
    Other(String),
}
