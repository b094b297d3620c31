use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while parsing an upload or running a model on it.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("{file}: malformed CSV: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file}: no header row")]
    MissingHeader { file: String },

    #[error("{file}: row {row}, column '{column}': '{value}' is not a number")]
    NonNumeric {
        file: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{file}: missing column '{column}' required by the model")]
    MissingColumn { file: String, column: String },

    #[error("{file}: model expects {expected} feature columns, found {found}")]
    FeatureCount {
        file: String,
        expected: usize,
        found: usize,
    },

    #[error("Model outputs differ in length: bundle 1 = {bundle_one}, bundle 2 = {bundle_two}, traffic = {traffic}")]
    LengthMismatch {
        bundle_one: usize,
        bundle_two: usize,
        traffic: usize,
    },

    #[error("Failed to write predictions: {0}")]
    Output(String),

    #[error("Prediction timed out after {0} seconds")]
    Timeout(u64),
}

pub type PredictionResult<T> = Result<T, PredictionError>;

/// Failures while loading a model artifact at startup.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

pub type ModelResult<T> = Result<T, ModelError>;
