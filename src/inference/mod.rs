//! Model artifacts and inference.
//!
//! Artifacts are JSON documents tagged by `kind`:
//! `dense_network` (fully connected layers), `linear`, or `forest`.
//! All three are loaded once at startup into a [`ModelSet`] and shared
//! read-only between requests.
pub mod dense;
pub mod regressor;
pub mod table;

use std::path::Path;
use std::sync::Arc;
use nalgebra::DMatrix;
use serde::Deserialize;
use crate::config::ModelsConfig;
use crate::errors::{ModelError, ModelResult, PredictionResult};

pub use dense::{Activation, DenseNetwork};
pub use regressor::{LinearModel, RegressionForest};
pub use table::FeatureTable;

pub trait Model: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Number of feature columns the model consumes.
    fn input_width(&self) -> usize;

    /// Column names to select from an upload, if the artifact declares them.
    fn input_features(&self) -> Option<&[String]>;

    /// `features` is rows x `input_width`; the result has one row per input row.
    fn predict(&self, features: &DMatrix<f64>) -> DMatrix<f64>;
}

/// Runs `model` on an upload and flattens the output row-major.
pub fn run_model(model: &dyn Model, table: &FeatureTable) -> PredictionResult<Vec<f64>> {
    let features = table.features_for(model.input_features(), model.input_width())?;
    let output = model.predict(&features);
    tracing::debug!(
        "{} model on {}: {:?} -> {:?}",
        model.kind(),
        table.name,
        features.shape(),
        output.shape()
    );
    Ok(output.transpose().iter().copied().collect())
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Artifact {
    DenseNetwork(dense::DenseSpec),
    Linear(regressor::LinearSpec),
    Forest(regressor::ForestSpec),
}

pub fn load_model(path: &Path) -> ModelResult<Arc<dyn Model>> {
    let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact: Artifact = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let model: Result<Arc<dyn Model>, String> = match artifact {
        Artifact::DenseNetwork(spec) => DenseNetwork::from_spec(spec).map(|m| Arc::new(m) as Arc<dyn Model>),
        Artifact::Linear(spec) => LinearModel::from_spec(spec).map(|m| Arc::new(m) as Arc<dyn Model>),
        Artifact::Forest(spec) => RegressionForest::from_spec(spec).map(|m| Arc::new(m) as Arc<dyn Model>),
    };

    let model = model.map_err(|reason| ModelError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    tracing::info!(
        "Loaded {} model from {} ({} inputs)",
        model.kind(),
        path.display(),
        model.input_width()
    );
    Ok(model)
}

/// The two bundle models and the traffic model, in upload order.
#[derive(Clone)]
pub struct ModelSet {
    pub bundle_one: Arc<dyn Model>,
    pub bundle_two: Arc<dyn Model>,
    pub traffic: Arc<dyn Model>,
}

impl ModelSet {
    pub fn new(bundle_one: Arc<dyn Model>, bundle_two: Arc<dyn Model>, traffic: Arc<dyn Model>) -> Self {
        Self { bundle_one, bundle_two, traffic }
    }

    pub fn load(config: &ModelsConfig) -> ModelResult<Self> {
        Ok(Self {
            bundle_one: load_model(&config.bundle_one)?,
            bundle_two: load_model(&config.bundle_two)?,
            traffic: load_model(&config.traffic)?,
        })
    }
}
