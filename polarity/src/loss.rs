use std::fmt::Debug;
use std::rc::Rc;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs.
pub const EPSILON: f64 = 1e-7;

/// `a` is the per-sample loss, `d` the gradient of the batch mean loss with
/// respect to `pred`.
pub trait Loss {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64>;
    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64>;
}

impl Debug for dyn Loss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LossFn")
    }
}

pub struct MSE;

impl MSE {
    pub fn new() -> Rc<MSE> {
        Rc::new(MSE)
    }
}

impl Loss for MSE {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        assert_eq!(
            pred.shape(),
            target.shape(),
            "Predictions and targets must have the same shape."
        );

        let features = pred.ncols() as f64;
        (pred - target)
            .mapv_into(|x| x.powi(2))
            .sum_axis(Axis(1))
            .mapv_into(|x| x / features)
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let scale = (pred.nrows() * pred.ncols()) as f64;
        (pred - target).mapv_into(|x| (x * 2.) / scale)
    }
}

pub struct BinaryCrossEntropy;

impl BinaryCrossEntropy {
    pub fn new() -> Rc<BinaryCrossEntropy> {
        Rc::new(BinaryCrossEntropy)
    }
}

impl Loss for BinaryCrossEntropy {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        assert_eq!(
            pred.shape(),
            target.shape(),
            "Predictions and targets must have the same shape."
        );

        let features = pred.ncols() as f64;
        let mut per_element = Array2::zeros(pred.raw_dim());
        ndarray::Zip::from(&mut per_element)
            .and(pred)
            .and(target)
            .for_each(|l, &p, &t| {
                let p = p.clamp(EPSILON, 1. - EPSILON);
                *l = -(t * p.ln() + (1. - t) * (1. - p).ln());
            });
        per_element.sum_axis(Axis(1)).mapv_into(|x| x / features)
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let scale = (pred.nrows() * pred.ncols()) as f64;
        let mut grad = Array2::zeros(pred.raw_dim());
        ndarray::Zip::from(&mut grad)
            .and(pred)
            .and(target)
            .for_each(|g, &p, &t| {
                let p = p.clamp(EPSILON, 1. - EPSILON);
                *g = (p - t) / (p * (1. - p)) / scale;
            });
        grad
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Losses {
    MeanSquaredError,
    BinaryCrossEntropy,
}

impl Losses {
    pub fn wake(&self) -> Rc<dyn Loss> {
        match self {
            Losses::MeanSquaredError => MSE::new(),
            Losses::BinaryCrossEntropy => BinaryCrossEntropy::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn bce_is_small_for_confident_correct_predictions() {
        let pred = array![[0.99], [0.01]];
        let target = array![[1.], [0.]];
        let l = Losses::BinaryCrossEntropy.wake().a(&pred, &target);
        assert!(l.iter().all(|v| *v < 0.011));
    }

    #[test]
    fn bce_survives_saturated_predictions() {
        let pred = array![[1.0], [0.0]];
        let target = array![[0.], [1.]];
        let loss = Losses::BinaryCrossEntropy.wake();
        assert!(loss.a(&pred, &target).iter().all(|v| v.is_finite()));
        assert!(loss.d(&pred, &target).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn mse_matches_hand_computation() {
        let pred = array![[0.5, 1.0]];
        let target = array![[0.0, 0.0]];
        let l = Losses::MeanSquaredError.wake().a(&pred, &target);
        assert!((l[0] - 0.625).abs() < 1e-12);
    }

    #[test]
    fn gradients_match_finite_differences_of_batch_mean() {
        let pred = array![[0.3], [0.8], [0.55]];
        let target = array![[0.], [1.], [1.]];
        let h = 1e-6;

        for kind in [Losses::BinaryCrossEntropy, Losses::MeanSquaredError] {
            let loss = kind.wake();
            let analytic = loss.d(&pred, &target);
            for i in 0..pred.nrows() {
                let mut up = pred.clone();
                let mut down = pred.clone();
                up[[i, 0]] += h;
                down[[i, 0]] -= h;
                let numeric = (loss.a(&up, &target).mean().unwrap()
                    - loss.a(&down, &target).mean().unwrap())
                    / (2. * h);
                assert!(
                    (numeric - analytic[[i, 0]]).abs() < 1e-5,
                    "{kind:?} row {i}: {numeric} vs {}",
                    analytic[[i, 0]]
                );
            }
        }
    }
}
