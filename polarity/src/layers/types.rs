use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Dense, Dropout};
use crate::error::{Error, Result};
use crate::optimizers::Param;
use crate::Activations;

pub trait Layer {
    fn forward(&mut self, x: Array2<f64>, training: bool) -> Array2<f64>;
    /// Takes the gradient with respect to this layer's output, stores the
    /// parameter gradients and returns the gradient with respect to its input.
    fn backward(&mut self, grad_output: Array2<f64>) -> Array2<f64>;
    fn params(&mut self) -> Vec<Param<'_>>;
    /// Regularization term added to the loss.
    fn penalty(&self) -> f64 {
        0.
    }
}

/// Layer definition, the serializable recipe `Sequential` weaves from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Layers {
    Dense {
        units: usize,
        activation: Activations,
        #[serde(default)]
        l2: f64,
    },
    Dropout {
        rate: f64,
    },
}

impl Layers {
    pub fn dense(units: usize, activation: Activations) -> Layers {
        Layers::Dense {
            units,
            activation,
            l2: 0.,
        }
    }

    pub fn dense_l2(units: usize, activation: Activations, l2: f64) -> Layers {
        Layers::Dense {
            units,
            activation,
            l2,
        }
    }

    pub fn dropout(rate: f64) -> Layers {
        Layers::Dropout { rate }
    }

    /// Rejects definitions that cannot be woven: zero units, a negative or
    /// non-finite L2 factor, a dropout rate outside `[0, 1]` (NaN included).
    pub fn validate(&self) -> Result<()> {
        match *self {
            Layers::Dense { units: 0, .. } => Err(Error::Layer("dense layer with 0 units".into())),
            Layers::Dense { l2, .. } if !(l2.is_finite() && l2 >= 0.) => {
                Err(Error::Layer(format!("l2 factor {} is not a finite non-negative number", l2)))
            }
            Layers::Dropout { rate } if !(0. ..=1.).contains(&rate) => {
                Err(Error::Layer(format!("dropout rate {} is outside [0, 1]", rate)))
            }
            _ => Ok(()),
        }
    }

    /// Width of the output given the width of the input.
    pub fn output_dim(&self, d_in: usize) -> usize {
        match self {
            Layers::Dense { units, .. } => *units,
            Layers::Dropout { .. } => d_in,
        }
    }

    pub fn wake(&self, d_in: usize, rng: &mut StdRng) -> Woven {
        match self {
            Layers::Dense {
                units,
                activation,
                l2,
            } => Woven::Dense(Dense::new(d_in, *units, *activation, *l2, rng)),
            Layers::Dropout { rate } => Woven::Dropout(Dropout::new(*rate, Some(rng.gen()))),
        }
    }
}

/// A live layer with its weights.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Woven {
    Dense(Dense),
    Dropout(Dropout),
}

impl Layer for Woven {
    fn forward(&mut self, x: Array2<f64>, training: bool) -> Array2<f64> {
        match self {
            Woven::Dense(l) => l.forward(x, training),
            Woven::Dropout(l) => l.forward(x, training),
        }
    }

    fn backward(&mut self, grad_output: Array2<f64>) -> Array2<f64> {
        match self {
            Woven::Dense(l) => l.backward(grad_output),
            Woven::Dropout(l) => l.backward(grad_output),
        }
    }

    fn params(&mut self) -> Vec<Param<'_>> {
        match self {
            Woven::Dense(l) => l.params(),
            Woven::Dropout(l) => l.params(),
        }
    }

    fn penalty(&self) -> f64 {
        match self {
            Woven::Dense(l) => l.penalty(),
            Woven::Dropout(l) => l.penalty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_catalog_shapes() {
        assert!(Layers::dense(16, Activations::Relu).validate().is_ok());
        assert!(Layers::dense_l2(16, Activations::Relu, 0.001).validate().is_ok());
        assert!(Layers::dropout(0.5).validate().is_ok());
        assert!(Layers::dropout(1.).validate().is_ok());
    }

    #[test]
    fn validate_rejects_nan_and_out_of_range_rates() {
        for rate in [f64::NAN, -0.1, 1.5] {
            assert!(matches!(Layers::dropout(rate).validate(), Err(Error::Layer(_))));
        }
    }

    #[test]
    fn validate_rejects_bad_dense_settings() {
        assert!(Layers::dense(0, Activations::Relu).validate().is_err());
        assert!(Layers::dense_l2(4, Activations::Relu, f64::NAN).validate().is_err());
        assert!(Layers::dense_l2(4, Activations::Relu, -1.).validate().is_err());
    }
}
