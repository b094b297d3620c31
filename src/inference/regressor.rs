use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use super::Model;

#[derive(Deserialize, Debug)]
pub struct LinearSpec {
    #[serde(default)]
    pub input_features: Option<Vec<String>>,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

/// Ordinary linear regressor: `y = X . w + b`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    input_features: Option<Vec<String>>,
    coefficients: DVector<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn from_spec(spec: LinearSpec) -> Result<Self, String> {
        if spec.coefficients.is_empty() {
            return Err("linear model has no coefficients".into());
        }
        if let Some(names) = &spec.input_features {
            if names.len() != spec.coefficients.len() {
                return Err(format!(
                    "{} input features named for {} coefficients",
                    names.len(),
                    spec.coefficients.len()
                ));
            }
        }
        Ok(Self {
            input_features: spec.input_features,
            coefficients: DVector::from_vec(spec.coefficients),
            intercept: spec.intercept,
        })
    }
}

impl Model for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn input_features(&self) -> Option<&[String]> {
        self.input_features.as_deref()
    }

    fn predict(&self, features: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = features * &self.coefficients;
        out.add_scalar_mut(self.intercept);
        DMatrix::from_iterator(out.len(), 1, out.iter().copied())
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Goes left when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

#[derive(Deserialize, Debug, Clone)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    // Children always sit after their parent, so the walk terminates.
    fn evaluate(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Split { feature, left, right, .. } = *node {
                if feature >= n_features {
                    return Err(format!("node {} splits on feature {} of {}", index, feature, n_features));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {} points at invalid child {}", index, child));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct ForestSpec {
    #[serde(default)]
    pub input_features: Option<Vec<String>>,
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

/// Regression forest; the prediction is the mean over all trees.
#[derive(Debug, Clone)]
pub struct RegressionForest {
    input_features: Option<Vec<String>>,
    n_features: usize,
    trees: Vec<Tree>,
}

impl RegressionForest {
    pub fn from_spec(spec: ForestSpec) -> Result<Self, String> {
        if spec.n_features == 0 {
            return Err("forest declares zero features".into());
        }
        if spec.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (index, tree) in spec.trees.iter().enumerate() {
            tree.validate(spec.n_features)
                .map_err(|reason| format!("tree {}: {}", index, reason))?;
        }
        if let Some(names) = &spec.input_features {
            if names.len() != spec.n_features {
                return Err(format!(
                    "{} input features named but forest uses {}",
                    names.len(),
                    spec.n_features
                ));
            }
        }
        Ok(Self {
            input_features: spec.input_features,
            n_features: spec.n_features,
            trees: spec.trees,
        })
    }
}

impl Model for RegressionForest {
    fn kind(&self) -> &'static str {
        "forest"
    }

    fn input_width(&self) -> usize {
        self.n_features
    }

    fn input_features(&self) -> Option<&[String]> {
        self.input_features.as_deref()
    }

    fn predict(&self, features: &DMatrix<f64>) -> DMatrix<f64> {
        let mut row = vec![0.0; features.ncols()];
        DMatrix::from_fn(features.nrows(), 1, |r, _| {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = features[(r, c)];
            }
            let total: f64 = self.trees.iter().map(|tree| tree.evaluate(&row)).sum();
            total / self.trees.len() as f64
        })
    }
}
