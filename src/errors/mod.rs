// Error types for the request boundary, the credential store and the prediction pipeline.
use thiserror::Error;

pub mod prediction;
pub mod response;
pub mod store;

pub use prediction::{ModelError, ModelResult, PredictionError, PredictionResult};
pub use store::{StoreError, StoreResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    // The #[from] attribute lets `?` lift a credential store failure into the request error.
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Expected exactly {expected} files, received {received}")]
    InputCount { expected: usize, received: usize },

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    #[error("Background task failed: {0}")]
    TaskPanic(String),
}

pub type AppResult<T> = Result<T, AppError>;
