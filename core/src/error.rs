use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that fail fast at session construction.
///
/// Everything else (spawn failures, non-zero exits, stale-computation
/// discards) degrades to an empty or unchanged result set and never
/// interrupts the interactive flow.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid item source: {0}")]
    InvalidSource(String),

    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("malformed option: {0}")]
    MalformedOption(String),
}
