//! Error types for the verification runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Target {url} did not answer after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
