use ndarray::{ArrayD, Zip};

use super::{Optimizer, Param};

pub struct Adam {
    pub learning_rate: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    t: i32,
    moments: Vec<(ArrayD<f64>, ArrayD<f64>)>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
            t: 0,
            moments: vec![],
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: Vec<Param<'_>>) {
        self.t += 1;
        let (b1, b2, eps) = (self.beta_1, self.beta_2, self.epsilon);
        let lr_t = self.learning_rate * (1. - b2.powi(self.t)).sqrt() / (1. - b1.powi(self.t));

        for (i, mut p) in params.into_iter().enumerate() {
            if self.moments.len() <= i || self.moments[i].0.shape() != p.value.shape() {
                let zeros = ArrayD::zeros(p.value.raw_dim());
                if self.moments.len() <= i {
                    self.moments.push((zeros.clone(), zeros));
                } else {
                    self.moments[i] = (zeros.clone(), zeros);
                }
            }
            let (m, v) = &mut self.moments[i];

            Zip::from(&mut p.value)
                .and(&p.grad)
                .and(m)
                .and(v)
                .for_each(|w, &g, m, v| {
                    *m = b1 * *m + (1. - b1) * g;
                    *v = b2 * *v + (1. - b2) * g * g;
                    *w -= lr_t * *m / (v.sqrt() + eps);
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
