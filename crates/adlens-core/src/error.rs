//! Error types for adlens

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Input is missing a required column or has no header. Aborts the run.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The text-generation collaborator could not be reached, timed out,
    /// or answered with an error status.
    #[error("Narrative unavailable: {0}")]
    NarrativeUnavailable(String),

    /// The text-generation collaborator answered, but not with a usable narrative.
    #[error("Malformed narrative response: {0}")]
    MalformedResponse(String),

    /// One of the output artifacts could not be written. Aborts the run;
    /// the previous artifact set is left in place.
    #[error("Artifact write error: {0}")]
    ArtifactWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
