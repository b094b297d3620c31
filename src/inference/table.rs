use nalgebra::DMatrix;
use crate::errors::{PredictionError, PredictionResult};

/// A parsed upload: header names plus a row-major numeric matrix.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub name: String,
    pub columns: Vec<String>,
    pub values: DMatrix<f64>,
}

impl FeatureTable {
    /// Parses delimited text with a header row where every cell is numeric.
    pub fn from_csv(name: &str, data: &[u8]) -> PredictionResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|source| PredictionError::Csv { file: name.to_string(), source })?
            .iter()
            .map(str::to_string)
            .collect();

        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(PredictionError::MissingHeader { file: name.to_string() });
        }

        let mut cells = Vec::new();
        let mut rows = 0;
        for (index, record) in reader.records().enumerate() {
            let record = record
                .map_err(|source| PredictionError::Csv { file: name.to_string(), source })?;
            for (column, value) in columns.iter().zip(record.iter()) {
                let parsed = value.parse::<f64>().map_err(|_| PredictionError::NonNumeric {
                    file: name.to_string(),
                    row: index + 1,
                    column: column.clone(),
                    value: value.to_string(),
                })?;
                cells.push(parsed);
            }
            rows += 1;
        }

        tracing::debug!("Parsed {}: {} rows x {} columns", name, rows, columns.len());
        Ok(Self {
            name: name.to_string(),
            values: DMatrix::from_row_slice(rows, columns.len(), &cells),
            columns,
        })
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    /// Selects the model's input matrix. Named features are picked by header;
    /// unnamed models take every column and need the width to match.
    pub fn features_for(&self, names: Option<&[String]>, width: usize) -> PredictionResult<DMatrix<f64>> {
        match names {
            Some(names) => {
                let indices = names
                    .iter()
                    .map(|wanted| {
                        self.columns
                            .iter()
                            .position(|column| column == wanted)
                            .ok_or_else(|| PredictionError::MissingColumn {
                                file: self.name.clone(),
                                column: wanted.clone(),
                            })
                    })
                    .collect::<PredictionResult<Vec<usize>>>()?;
                Ok(DMatrix::from_fn(self.rows(), indices.len(), |r, c| {
                    self.values[(r, indices[c])]
                }))
            }
            None if self.columns.len() != width => Err(PredictionError::FeatureCount {
                file: self.name.clone(),
                expected: width,
                found: self.columns.len(),
            }),
            None => Ok(self.values.clone()),
        }
    }
}
