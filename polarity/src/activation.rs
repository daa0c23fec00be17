use std::fmt::Debug;
use std::rc::Rc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// `a` is the activation of the pre-activation `z`, `d` its derivative
/// with respect to `z`.
pub trait Activation {
    fn a(&self, z: &Array2<f64>) -> Array2<f64>;
    fn d(&self, z: &Array2<f64>) -> Array2<f64>;
}

impl Debug for dyn Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActivationFn")
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1. / (1. + (-x).exp())
}

pub struct Relu;

impl Relu {
    pub fn new() -> Rc<Relu> {
        Rc::new(Relu)
    }
}

impl Activation for Relu {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| if v < 0. { 0. } else { v })
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| if v > 0. { 1. } else { 0. })
    }
}

pub struct Tanh;

impl Tanh {
    pub fn new() -> Rc<Tanh> {
        Rc::new(Tanh)
    }
}

impl Activation for Tanh {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(f64::tanh)
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| 1. - v.tanh().powi(2))
    }
}

pub struct Sigmoid;

impl Sigmoid {
    pub fn new() -> Rc<Sigmoid> {
        Rc::new(Sigmoid)
    }
}

impl Activation for Sigmoid {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(sigmoid)
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| {
            let s = sigmoid(v);
            s * (1. - s)
        })
    }
}

pub struct Identity;

impl Identity {
    pub fn new() -> Rc<Identity> {
        Rc::new(Identity)
    }
}

impl Activation for Identity {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.clone()
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        Array2::ones(z.raw_dim())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activations {
    Relu,
    Tanh,
    Sigmoid,
    Identity,
}

impl Activations {
    pub fn wake(&self) -> Rc<dyn Activation> {
        match self {
            Activations::Relu => Relu::new(),
            Activations::Tanh => Tanh::new(),
            Activations::Sigmoid => Sigmoid::new(),
            Activations::Identity => Identity::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn relu_clamps_and_gates() {
        let z = array![[-2., 0., 3.]];
        let relu = Activations::Relu.wake();
        assert_eq!(relu.a(&z), array![[0., 0., 3.]]);
        assert_eq!(relu.d(&z), array![[0., 0., 1.]]);
    }

    #[test]
    fn sigmoid_derivative_peaks_at_zero() {
        let z = array![[0., 4.]];
        let s = Activations::Sigmoid.wake();
        assert!((s.a(&z)[[0, 0]] - 0.5).abs() < 1e-12);
        let d = s.d(&z);
        assert!((d[[0, 0]] - 0.25).abs() < 1e-12);
        assert!(d[[0, 1]] < d[[0, 0]]);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let z = array![[-1.3, -0.2, 0.4, 2.1]];
        let h = 1e-6;
        for act in [Activations::Tanh, Activations::Sigmoid, Activations::Identity] {
            let f = act.wake();
            let numeric = (f.a(&(&z + h)) - f.a(&(&z - h))) / (2. * h);
            let analytic = f.d(&z);
            for (n, a) in numeric.iter().zip(analytic.iter()) {
                assert!((n - a).abs() < 1e-6, "{act:?}: {n} vs {a}");
            }
        }
    }
}
