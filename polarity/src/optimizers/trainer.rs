use std::path::Path;

use log::{debug, info};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Hyper;
use crate::encode::Inputs;
use crate::error::{Error, Result};
use crate::f::weighted_average;
use crate::nn::Sequential;
use crate::plot;

/// Per-epoch metrics recorded by [`Trainer::fit`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct History {
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl History {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    /// Names of the recorded series.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["loss", "accuracy"];
        if !self.val_loss.is_empty() {
            keys.extend(["val_loss", "val_accuracy"]);
        }
        keys
    }

    /// The series early stopping watches: validation loss when present.
    pub fn monitored(&self) -> &Vec<f64> {
        if self.val_loss.is_empty() {
            &self.loss
        } else {
            &self.val_loss
        }
    }
}

pub struct Trainer<'a> {
    model: &'a mut Sequential,
    hyper: Hyper,
    early_terminate: Box<dyn Fn(&Vec<f64>) -> bool>,
    verbose: bool,
    pub history: History,
}

impl Trainer<'_> {
    pub fn new(model: &mut Sequential) -> Trainer {
        Trainer {
            model,
            hyper: Hyper::new(),
            early_terminate: Box::new(|_| false),
            verbose: false,
            history: History::default(),
        }
    }

    pub fn override_hyper(&mut self, hyper: Hyper) -> &mut Self {
        self.hyper = hyper;
        self
    }

    pub fn verbose(&mut self) -> &mut Self {
        self.verbose = true;
        self
    }

    pub fn set_learning_rate(&mut self, rate: f64) -> &mut Self {
        self.model.set_learning_rate(rate);
        self
    }

    pub fn set_epochs(&mut self, epochs: usize) -> &mut Self {
        self.hyper.epochs = epochs;
        self
    }

    pub fn set_batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.hyper.batch_size = batch_size.max(1);
        self
    }

    pub fn set_shuffle(&mut self, shuffle: bool) -> &mut Self {
        self.hyper.shuffle = shuffle;
        self
    }

    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.hyper.seed = Some(seed);
        self
    }

    /// Stops once the monitored loss improved by less than `min_delta` on
    /// average over the last `patience` epochs.
    pub fn until(&mut self, patience: usize, min_delta: f64) -> &mut Self {
        self.hyper.patience = patience;
        self.hyper.min_delta = min_delta;

        let early_terminate = move |losses: &Vec<f64>| {
            let len = losses.len();

            if patience == 0 || patience + 2 > len {
                return false;
            }

            let deltas = ((len - patience)..len)
                .rev()
                .map(|i| losses[i - 1] - losses[i])
                .collect::<Vec<f64>>();

            let avg_delta = deltas.iter().sum::<f64>() / deltas.len() as f64;
            debug!("avg delta {}", avg_delta);

            avg_delta < min_delta
        };

        self.early_terminate = Box::new(early_terminate);
        self
    }

    pub fn until_some(
        &mut self,
        early_terminate: impl Fn(&Vec<f64>) -> bool + 'static,
    ) -> &mut Self {
        self.early_terminate = Box::new(early_terminate);
        self
    }

    /// Runs `epochs` passes of shuffled mini-batch updates over `(x, y)`,
    /// evaluating on `validation` after every epoch when given.
    pub fn fit<X: Inputs>(
        &mut self,
        x: &X,
        y: &Array2<f64>,
        validation: Option<(&X, &Array2<f64>)>,
    ) -> Result<&mut Self> {
        let n = x.samples();
        if n == 0 {
            return Err(Error::Empty("training set"));
        }
        if y.nrows() != n {
            return Err(Error::Shape(format!("{} samples but {} targets", n, y.nrows())));
        }

        let mut rng = match self.hyper.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut order = (0..n).collect::<Vec<usize>>();
        let batch_size = self.hyper.batch_size.max(1);

        for epoch in 0..self.hyper.epochs {
            if self.hyper.shuffle {
                order.shuffle(&mut rng);
            }

            let (mut loss, mut accuracy, mut seen) = (0., 0., 0.);
            for batch in order.chunks(batch_size) {
                let batch_x = x.gather(batch);
                let batch_y = y.select(Axis(0), batch);
                let e = self.model.train_batch(batch_x, &batch_y)?;

                let w = batch.len() as f64;
                loss = weighted_average(loss, seen, e.loss, w);
                accuracy = weighted_average(accuracy, seen, e.accuracy, w);
                seen += w;
            }

            self.history.loss.push(loss);
            self.history.accuracy.push(accuracy);

            let mut line = format!(
                "({}/{}) loss = {:.4} accuracy = {:.4}",
                epoch + 1,
                self.hyper.epochs,
                loss,
                accuracy
            );

            if let Some((val_x, val_y)) = validation {
                let e = self.model.evaluate(val_x, val_y, batch_size)?;
                self.history.val_loss.push(e.loss);
                self.history.val_accuracy.push(e.accuracy);
                line.push_str(&format!(
                    " val_loss = {:.4} val_accuracy = {:.4}",
                    e.loss, e.accuracy
                ));
            }

            if self.verbose {
                info!("{}", line);
            } else {
                debug!("{}", line);
            }

            if (self.early_terminate)(self.history.monitored()) {
                info!("Early termination condition met after {} epochs.", epoch + 1);
                break;
            }
        }

        Ok(self)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Writes the loss and accuracy curves as `<stem>_loss.html` and
    /// `<stem>_accuracy.html` in `dir`.
    pub fn loss_graph(&mut self, dir: &Path, stem: &str) -> Result<&mut Self> {
        plot::training_curves(&self.history, dir, stem)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layers;
    use crate::loss::Losses;
    use crate::optimizers::Optimizers;
    use crate::Activations;
    use ndarray::array;

    fn xor_like() -> (Array2<f64>, Array2<f64>) {
        let x = array![[1., 0., 0.], [0., 1., 0.], [1., 0., 1.], [0., 1., 1.]];
        let y = array![[1.], [0.], [1.], [0.]];
        (x, y)
    }

    fn model() -> Sequential {
        let mut nn = Sequential::new(3);
        nn.layer(Layers::dense(8, Activations::Relu))
            .layer(Layers::dense(1, Activations::Sigmoid))
            .set_seed(21)
            .weave()
            .compile(Optimizers::Adam { learning_rate: 0.05 }, Losses::BinaryCrossEntropy);
        nn
    }

    #[test]
    fn records_one_entry_per_epoch() {
        let (x, y) = xor_like();
        let mut nn = model();
        let mut trainer = nn.get_trainer();
        trainer
            .set_epochs(6)
            .set_batch_size(2)
            .set_seed(1)
            .fit(&x, &y, Some((&x, &y)))
            .unwrap();

        let h = trainer.history();
        assert_eq!(h.epochs(), 6);
        assert_eq!(h.val_accuracy.len(), 6);
        assert_eq!(h.keys(), vec!["loss", "accuracy", "val_loss", "val_accuracy"]);
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = xor_like();
        let mut nn = model();
        nn.get_trainer()
            .set_epochs(200)
            .set_batch_size(4)
            .set_seed(2)
            .fit(&x, &y, None)
            .unwrap();

        let e = nn.evaluate(&x, &y, 4).unwrap();
        assert_eq!(e.accuracy, 1.);
        assert!(e.loss < 0.1, "loss {}", e.loss);
    }

    #[test]
    fn until_stops_on_plateau() {
        let (x, y) = xor_like();
        let mut nn = model();
        let mut trainer = nn.get_trainer();
        trainer
            .set_epochs(500)
            .set_batch_size(4)
            .set_seed(3)
            .until(3, 1.)
            .fit(&x, &y, None)
            .unwrap();

        // a loss can never drop by 1.0 per epoch for three epochs running here
        assert_eq!(trainer.history().epochs(), 5);
    }

    #[test]
    fn rejects_mismatched_targets() {
        let (x, _) = xor_like();
        let mut nn = model();
        let err = nn
            .get_trainer()
            .fit(&x, &Array2::zeros((3, 1)), None)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Shape(_)));
    }
}
