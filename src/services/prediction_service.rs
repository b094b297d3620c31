use std::time::Duration;
use bytes::Bytes;
use crate::errors::{AppError, AppResult, PredictionError, PredictionResult};
use crate::inference::{run_model, FeatureTable, ModelSet};
use crate::models::PredictionTable;

/// Bundle 1, bundle 2, traffic.
pub const EXPECTED_UPLOADS: usize = 3;

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct PredictionService {
    models: ModelSet,
    timeout: Duration,
}

impl PredictionService {
    pub fn new(models: ModelSet, timeout: Duration) -> Self {
        Self { models, timeout }
    }

    /// Checks the upload count before any model runs, then scores the three
    /// files off the async executor.
    pub async fn predict(&self, uploads: Vec<Upload>) -> AppResult<PredictionTable> {
        let uploads: [Upload; EXPECTED_UPLOADS] = uploads.try_into().map_err(|rejected: Vec<Upload>| {
            tracing::warn!("Rejected prediction request with {} files", rejected.len());
            AppError::InputCount {
                expected: EXPECTED_UPLOADS,
                received: rejected.len(),
            }
        })?;

        let models = self.models.clone();
        let handle = tokio::task::spawn_blocking(move || score(&models, &uploads));

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(e)) => {
                tracing::error!("Prediction task panicked: {}", e);
                Err(AppError::TaskPanic(e.to_string()))
            }
            Err(_elapsed) => {
                tracing::error!("Prediction timed out after {} seconds", self.timeout.as_secs());
                Err(PredictionError::Timeout(self.timeout.as_secs()).into())
            }
        }
    }
}

/// Parses and scores the uploads in bundle 1, bundle 2, traffic order.
pub fn score(models: &ModelSet, uploads: &[Upload; EXPECTED_UPLOADS]) -> PredictionResult<PredictionTable> {
    let [bundle_one, bundle_two, traffic] = uploads;

    let table_one = FeatureTable::from_csv(&bundle_one.filename, &bundle_one.data)?;
    let table_two = FeatureTable::from_csv(&bundle_two.filename, &bundle_two.data)?;
    let table_traffic = FeatureTable::from_csv(&traffic.filename, &traffic.data)?;

    let pred_one = run_model(models.bundle_one.as_ref(), &table_one)?;
    let pred_two = run_model(models.bundle_two.as_ref(), &table_two)?;
    let pred_traffic = run_model(models.traffic.as_ref(), &table_traffic)?;

    let table = PredictionTable::combine(&pred_one, &pred_two, &pred_traffic)?;
    tracing::info!("Scored {} rows", table.len());
    Ok(table)
}
