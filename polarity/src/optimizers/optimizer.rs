use ndarray::{ArrayViewD, ArrayViewMutD};
use serde::{Deserialize, Serialize};

use super::{Adam, RmsProp, Sgd};

/// A trainable tensor and the gradient the last backward pass left for it.
pub struct Param<'a> {
    pub value: ArrayViewMutD<'a, f64>,
    pub grad: ArrayViewD<'a, f64>,
}

impl<'a> Param<'a> {
    pub fn new(value: ArrayViewMutD<'a, f64>, grad: ArrayViewD<'a, f64>) -> Param<'a> {
        Param { value, grad }
    }
}

/// Applies one update to every parameter. Parameters arrive in the same
/// order on every call, so per-parameter state is keyed by position.
pub trait Optimizer {
    fn step(&mut self, params: Vec<Param<'_>>);
    fn learning_rate(&self) -> f64;
    fn set_learning_rate(&mut self, rate: f64);
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Optimizers {
    Adam { learning_rate: f64 },
    RmsProp { learning_rate: f64 },
    Sgd { learning_rate: f64, momentum: f64 },
}

impl Optimizers {
    pub fn adam() -> Optimizers {
        Optimizers::Adam {
            learning_rate: 0.001,
        }
    }

    pub fn rmsprop() -> Optimizers {
        Optimizers::RmsProp {
            learning_rate: 0.001,
        }
    }

    pub fn sgd() -> Optimizers {
        Optimizers::Sgd {
            learning_rate: 0.01,
            momentum: 0.,
        }
    }

    pub fn wake(&self) -> Box<dyn Optimizer> {
        match *self {
            Optimizers::Adam { learning_rate } => Box::new(Adam::new(learning_rate)),
            Optimizers::RmsProp { learning_rate } => Box::new(RmsProp::new(learning_rate)),
            Optimizers::Sgd {
                learning_rate,
                momentum,
            } => Box::new(Sgd::new(learning_rate, momentum)),
        }
    }
}

impl Default for Optimizers {
    fn default() -> Self {
        Optimizers::adam()
    }
}

#[derive(Clone, Debug)]
pub struct Hyper {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub patience: usize,
    pub min_delta: f64,
}

impl Hyper {
    pub fn new() -> Hyper {
        Hyper {
            epochs: 20,
            batch_size: 512,
            shuffle: true,
            seed: None,
            patience: 0,
            min_delta: 0.,
        }
    }
}

impl Default for Hyper {
    fn default() -> Self {
        Hyper::new()
    }
}
