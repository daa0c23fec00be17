use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{self, Deserialize, Serialize};

use crate::optimizers::Param;

use super::types::Layer;

/// Inverted dropout: while training each unit is zeroed with probability
/// `rate` and survivors are scaled by `1 / (1 - rate)`. Inference is the
/// identity.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Dropout {
    pub rate: f64,
    seed: Option<u64>,
    #[serde(skip)]
    rng: Option<StdRng>,
    #[serde(skip)]
    mask: Array2<f64>,
}

impl Dropout {
    pub fn new(rate: f64, seed: Option<u64>) -> Dropout {
        Dropout {
            rate: if rate.is_nan() { 0. } else { rate.clamp(0., 1.) },
            seed,
            rng: None,
            mask: Array2::zeros((0, 0)),
        }
    }

    fn rng(&mut self) -> &mut StdRng {
        let seed = self.seed;
        self.rng.get_or_insert_with(|| match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        })
    }
}

impl Layer for Dropout {
    fn forward(&mut self, x: Array2<f64>, training: bool) -> Array2<f64> {
        if !training || self.rate == 0. {
            self.mask = Array2::ones(x.raw_dim());
            return x;
        }

        if self.rate >= 1. {
            self.mask = Array2::zeros(x.raw_dim());
            return Array2::zeros(x.raw_dim());
        }

        let keep = 1. - self.rate;
        let scale = 1. / keep;
        let rng = self.rng();
        let mask = Array2::from_shape_fn(x.raw_dim(), |_| {
            if rng.gen_bool(keep) {
                scale
            } else {
                0.
            }
        });
        self.mask = mask;

        x * &self.mask
    }

    fn backward(&mut self, grad_output: Array2<f64>) -> Array2<f64> {
        grad_output * &self.mask
    }

    fn params(&mut self) -> Vec<Param<'_>> {
        vec![]
    }
}
