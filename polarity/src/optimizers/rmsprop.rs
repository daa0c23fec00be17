use ndarray::{ArrayD, Zip};

use super::{Optimizer, Param};

pub struct RmsProp {
    pub learning_rate: f64,
    pub rho: f64,
    pub epsilon: f64,
    averages: Vec<ArrayD<f64>>,
}

impl RmsProp {
    pub fn new(learning_rate: f64) -> RmsProp {
        RmsProp {
            learning_rate,
            rho: 0.9,
            epsilon: 1e-7,
            averages: vec![],
        }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, params: Vec<Param<'_>>) {
        let (lr, rho, eps) = (self.learning_rate, self.rho, self.epsilon);

        for (i, mut p) in params.into_iter().enumerate() {
            if self.averages.len() <= i {
                self.averages.push(ArrayD::zeros(p.value.raw_dim()));
            }

            Zip::from(&mut p.value)
                .and(&p.grad)
                .and(&mut self.averages[i])
                .for_each(|w, &g, a| {
                    *a = rho * *a + (1. - rho) * g * g;
                    *w -= lr * g / (a.sqrt() + eps);
                });
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, rate: f64) {
        self.learning_rate = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn step_direction_opposes_gradient() {
        let mut w: Array1<f64> = array![0.0, 0.0];
        let g: Array1<f64> = array![1.0, -1.0];
        let mut opt = RmsProp::new(0.01);
        opt.step(vec![Param::new(w.view_mut().into_dyn(), g.view().into_dyn())]);
        assert!(w[0] < 0. && w[1] > 0.);
    }
}
