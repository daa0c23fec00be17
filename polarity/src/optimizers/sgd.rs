use ndarray::{ArrayD, Zip};

use super::{Optimizer, Param};

pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Vec<ArrayD<f64>>,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd {
            learning_rate,
            momentum,
            velocity: vec![],
        }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: Vec<Param<'_>>) {
        let (lr, momentum) = (self.learning_rate, self.momentum);

        for (i, mut p) in params.into_iter().enumerate() {
            if self.velocity.len() <= i {
                self.velocity.push(ArrayD::zeros(p.value.raw_dim()));
            }

            Zip::from(&mut p.value)
                .and(&p.grad)
                .and(&mut self.velocity[i])
                .for_each(|w, &g, v| {
                    *v = momentum * *v - lr * g;
                    *w += *v;
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
