mod credential_store;
mod prediction_service;

pub use credential_store::CredentialStore;
pub use prediction_service::{PredictionService, Upload, EXPECTED_UPLOADS};
