//! Errors raised while preparing and solving a study.
use thiserror::Error;

/// The error type for the study library.
///
/// Application code (CLI, file output) wraps these in [`anyhow::Error`] with added context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudyError {
    /// The time series could not be fetched or was malformed. Aborts the whole run.
    #[error("Could not load time series from {source_name}: {message}")]
    DataFetch {
        /// URL or path of the time series
        source_name: String,
        /// What went wrong
        message: String,
    },
    /// A numeric parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// A scenario's fuel price is unusable
    #[error("Invalid scenario: fuel price must be a positive number (got {0})")]
    InvalidScenario(f64),
    /// A requested technology is missing from the technology table or has the wrong kind
    #[error("Invalid technology: {0}")]
    InvalidTechnology(String),
    /// A weather-dependent technology's profile is not present in the time series
    #[error("No availability profile \"{profile}\" for technology {technology}")]
    MissingProfile {
        /// The technology requesting the profile
        technology: String,
        /// The profile (time series column) name
        profile: String,
    },
    /// The optimisation failed for a scenario
    #[error("Solver failed: {0}")]
    Solver(String),
}

impl StudyError {
    /// Create a [`StudyError::DataFetch`] for the given source
    pub fn data_fetch(source_name: &str, message: impl Into<String>) -> Self {
        Self::DataFetch {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}

/// Shorthand for results of library operations
pub type StudyResult<T> = Result<T, StudyError>;
