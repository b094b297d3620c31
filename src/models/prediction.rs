use serde::{Deserialize, Serialize};
use crate::errors::{PredictionError, PredictionResult};

pub const COLUMN_NAMES: [&str; 4] = [
    "Bundle 1 Prediction",
    "Bundle 2 Prediction",
    "Traffic Prediction",
    "Final Combined Prediction",
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PredictionRow {
    #[serde(rename = "Bundle 1 Prediction")]
    pub bundle_one: f64,
    #[serde(rename = "Bundle 2 Prediction")]
    pub bundle_two: f64,
    #[serde(rename = "Traffic Prediction")]
    pub traffic: f64,
    #[serde(rename = "Final Combined Prediction")]
    pub combined: f64,
}

impl PredictionRow {
    pub fn new(bundle_one: f64, bundle_two: f64, traffic: f64) -> Self {
        Self {
            bundle_one,
            bundle_two,
            traffic,
            combined: (bundle_one + bundle_two + traffic) / 3.0,
        }
    }

    pub fn values(&self) -> [f64; 4] {
        [self.bundle_one, self.bundle_two, self.traffic, self.combined]
    }
}

/// Per-model predictions and their average, one row per input record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    pub rows: Vec<PredictionRow>,
}

impl PredictionTable {
    /// Builds the table from three equally long flattened model outputs.
    pub fn combine(bundle_one: &[f64], bundle_two: &[f64], traffic: &[f64]) -> PredictionResult<Self> {
        if bundle_one.len() != bundle_two.len() || bundle_one.len() != traffic.len() {
            return Err(PredictionError::LengthMismatch {
                bundle_one: bundle_one.len(),
                bundle_two: bundle_two.len(),
                traffic: traffic.len(),
            });
        }

        let rows = bundle_one
            .iter()
            .zip(bundle_two)
            .zip(traffic)
            .map(|((a, b), c)| PredictionRow::new(*a, *b, *c))
            .collect();

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// UTF-8 CSV with a header row and no index column.
    pub fn to_csv(&self) -> PredictionResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.rows.is_empty() {
            writer
                .write_record(COLUMN_NAMES)
                .map_err(|e| PredictionError::Output(e.to_string()))?;
        }
        for row in &self.rows {
            writer
                .serialize(row)
                .map_err(|e| PredictionError::Output(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| PredictionError::Output(e.to_string()))
    }

    pub fn from_csv(data: &[u8]) -> PredictionResult<Self> {
        let mut reader = csv::Reader::from_reader(data);
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<PredictionRow>, _>>()
            .map_err(|source| PredictionError::Csv {
                file: "predictions.csv".into(),
                source,
            })?;
        Ok(Self { rows })
    }
}
