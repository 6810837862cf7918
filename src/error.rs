use crate::strategy::Strategy;
use thiserror::Error;

/// Unified error type for version resolution
#[derive(Error, Debug)]
pub enum GitVersionError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Invalid configured next version '{value}': {reason}")]
    InvalidConfiguredVersion { value: String, reason: String },

    #[error("Strategy {strategy} failed: {source}")]
    StrategyFailure {
        strategy: Strategy,
        #[source]
        source: Box<GitVersionError>,
    },

    #[error("Invalid version format: {0}")]
    InvalidFormat(String),

    #[error("Repository query failed: {0}")]
    Repository(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(String),
}

/// Convenience type alias for Results in gitversion
pub type Result<T> = std::result::Result<T, GitVersionError>;

impl GitVersionError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GitVersionError::Config(msg.into())
    }

    /// Create a repository query error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        GitVersionError::Repository(msg.into())
    }

    /// Create a version format error with context
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        GitVersionError::InvalidFormat(msg.into())
    }

    /// Create an output rendering error with context
    pub fn output(msg: impl Into<String>) -> Self {
        GitVersionError::Output(msg.into())
    }

    /// Wrap an error raised while a strategy was collecting evidence.
    ///
    /// Configuration errors are already descriptive and pass through untouched.
    pub fn in_strategy(self, strategy: Strategy) -> Self {
        match self {
            err @ GitVersionError::InvalidConfiguredVersion { .. } => err,
            err @ GitVersionError::StrategyFailure { .. } => err,
            other => GitVersionError::StrategyFailure {
                strategy,
                source: Box::new(other),
            },
        }
    }
}
