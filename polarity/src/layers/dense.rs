use core::fmt::Debug;

use ndarray::{Array, Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use serde::{self, Deserialize, Serialize};

use crate::activation::Activations;
use crate::optimizers::Param;

use super::types::Layer;

/// Fully connected layer `a = activation(x . w + b)` with an optional L2
/// penalty `l2 * sum(w^2)` on the kernel.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Dense {
    pub w: Array2<f64>,
    pub b: Array1<f64>,
    pub activation: Activations,
    pub l2: f64,
    #[serde(skip)]
    x: Array2<f64>,
    #[serde(skip)]
    z: Array2<f64>,
    #[serde(skip)]
    pub grad_w: Array2<f64>,
    #[serde(skip)]
    pub grad_b: Array1<f64>,
}

impl Dense {
    /// Glorot-uniform kernel, zero bias.
    pub fn new<R: Rng>(
        d_in: usize,
        units: usize,
        activation: Activations,
        l2: f64,
        rng: &mut R,
    ) -> Dense {
        let limit = (6. / (d_in + units) as f64).sqrt();
        let w_shape = (d_in, units);

        Dense {
            w: Array2::random_using(w_shape, Uniform::new(-limit, limit), rng),
            b: Array::zeros(units),
            activation,
            l2,
            x: Array2::zeros((0, d_in)),
            z: Array2::zeros((0, units)),
            grad_w: Array2::zeros(w_shape),
            grad_b: Array::zeros(units),
        }
    }

    pub fn units(&self) -> usize {
        self.w.ncols()
    }
}

impl Layer for Dense {
    fn forward(&mut self, x: Array2<f64>, _training: bool) -> Array2<f64> {
        let z = x.dot(&self.w) + &self.b;
        let a_z = self.activation.wake().a(&z);

        self.x = x;
        self.z = z;
        a_z
    }

    fn backward(&mut self, grad_output: Array2<f64>) -> Array2<f64> {
        let grad_z = grad_output * self.activation.wake().d(&self.z);
        let grad_input = grad_z.dot(&self.w.t());

        let mut grad_w = self.x.t().dot(&grad_z);
        if self.l2 > 0. {
            grad_w.scaled_add(2. * self.l2, &self.w);
        }

        self.grad_w = grad_w;
        self.grad_b = grad_z.sum_axis(Axis(0));

        grad_input
    }

    fn params(&mut self) -> Vec<Param<'_>> {
        vec![
            Param::new(self.w.view_mut().into_dyn(), self.grad_w.view().into_dyn()),
            Param::new(self.b.view_mut().into_dyn(), self.grad_b.view().into_dyn()),
        ]
    }

    fn penalty(&self) -> f64 {
        if self.l2 > 0. {
            return self.l2 * self.w.mapv(|v| v * v).sum();
        }
        0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(activation: Activations, l2: f64) -> Dense {
        let mut rng = StdRng::seed_from_u64(3);
        Dense::new(3, 2, activation, l2, &mut rng)
    }

    #[test]
    fn glorot_bounds_and_zero_bias() {
        let mut rng = StdRng::seed_from_u64(0);
        let d = Dense::new(100, 16, Activations::Relu, 0., &mut rng);
        let limit = (6. / 116f64).sqrt();
        assert!(d.w.iter().all(|v| v.abs() <= limit));
        assert!(d.b.iter().all(|v| *v == 0.));
        assert_eq!(d.units(), 16);
    }

    #[test]
    fn kernel_gradient_matches_finite_differences() {
        let x = array![[0.5, -1.0, 2.0], [1.5, 0.3, -0.7]];
        let mut d = layer(Activations::Tanh, 0.01);

        // objective: sum of outputs plus penalty
        let objective = |d: &mut Dense| d.forward(x.clone(), true).sum() + d.penalty();

        d.forward(x.clone(), true);
        d.backward(Array2::ones((2, 2)));
        let analytic = d.grad_w.clone();

        let h = 1e-6;
        for i in 0..3 {
            for j in 0..2 {
                let original = d.w[[i, j]];
                d.w[[i, j]] = original + h;
                let up = objective(&mut d);
                d.w[[i, j]] = original - h;
                let down = objective(&mut d);
                d.w[[i, j]] = original;

                let numeric = (up - down) / (2. * h);
                assert!((numeric - analytic[[i, j]]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn penalty_is_zero_without_l2() {
        assert_eq!(layer(Activations::Relu, 0.).penalty(), 0.);
        assert!(layer(Activations::Relu, 0.001).penalty() > 0.);
    }

    #[test]
    fn params_expose_kernel_then_bias() {
        let mut d = layer(Activations::Identity, 0.);
        let params = d.params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].value.shape(), &[3, 2]);
        assert_eq!(params[1].value.shape(), &[2]);
    }
}
