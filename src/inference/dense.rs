use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use super::Model;

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LayerSpec {
    pub weights: Vec<Vec<f64>>,  // inputs x units, Keras kernel layout
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

#[derive(Deserialize, Debug)]
pub struct DenseSpec {
    #[serde(default)]
    pub input_features: Option<Vec<String>>,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
    activation: Activation,
}

/// Feed-forward network of fully connected layers.
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    input_features: Option<Vec<String>>,
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn from_spec(spec: DenseSpec) -> Result<Self, String> {
        if spec.layers.is_empty() {
            return Err("network has no layers".into());
        }

        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut previous_units: Option<usize> = None;
        for (index, layer) in spec.layers.into_iter().enumerate() {
            let inputs = layer.weights.len();
            let units = layer.bias.len();
            if inputs == 0 || units == 0 {
                return Err(format!("layer {} is empty", index));
            }
            if let Some(row) = layer.weights.iter().position(|row| row.len() != units) {
                return Err(format!(
                    "layer {}: weight row {} has {} entries, bias has {}",
                    index, row, layer.weights[row].len(), units
                ));
            }
            if let Some(previous) = previous_units {
                if previous != inputs {
                    return Err(format!(
                        "layer {} takes {} inputs but the previous layer yields {}",
                        index, inputs, previous
                    ));
                }
            }
            previous_units = Some(units);

            layers.push(DenseLayer {
                weights: DMatrix::from_fn(inputs, units, |r, c| layer.weights[r][c]),
                bias: DVector::from_vec(layer.bias),
                activation: layer.activation,
            });
        }

        let network = Self { input_features: spec.input_features, layers };
        if let Some(names) = &network.input_features {
            if names.len() != network.input_width() {
                return Err(format!(
                    "{} input features named but the first layer takes {}",
                    names.len(),
                    network.input_width()
                ));
            }
        }
        Ok(network)
    }
}

impl Model for DenseNetwork {
    fn kind(&self) -> &'static str {
        "dense_network"
    }

    fn input_width(&self) -> usize {
        self.layers[0].weights.nrows()
    }

    fn input_features(&self) -> Option<&[String]> {
        self.input_features.as_deref()
    }

    fn predict(&self, features: &DMatrix<f64>) -> DMatrix<f64> {
        let mut activations = features.clone();
        for layer in &self.layers {
            let mut next = &activations * &layer.weights;
            for (c, bias) in layer.bias.iter().enumerate() {
                next.column_mut(c).add_scalar_mut(*bias);
            }
            next.apply(|v| *v = layer.activation.apply(*v));
            activations = next;
        }
        activations
    }
}
