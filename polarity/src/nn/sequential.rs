use std::fs;
use std::path::Path;

use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{self, Deserialize, Serialize};

use crate::encode::Inputs;
use crate::error::{Error, Result};
use crate::f;
use crate::layers::{Layer, Layers, Woven};
use crate::loss::Losses;
use crate::optimizers::{Optimizer, Optimizers, Trainer};

pub type Web = Vec<Woven>;

/// Loss (including regularization) and binary accuracy over a dataset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
}

/// A stack of layers applied in order.
///
/// ```ignore
/// let mut nn = Sequential::new(10000);
/// nn.layer(Layers::dense(16, Activations::Relu))
///     .layer(Layers::dense(16, Activations::Relu))
///     .layer(Layers::dense(1, Activations::Sigmoid))
///     .weave()
///     .compile(Optimizers::adam(), Losses::BinaryCrossEntropy);
/// ```
#[derive(Serialize, Deserialize)]
pub struct Sequential {
    d_in: usize,
    layers: Vec<Layers>,
    web: Web,
    seed: Option<u64>,
    pub loss: Losses,
    pub optimizer: Optimizers,
    #[serde(skip)]
    state: Option<Box<dyn Optimizer>>,
}

impl Sequential {
    pub fn new(d_in: usize) -> Sequential {
        Sequential {
            d_in,
            layers: Vec::new(),
            web: Web::new(),
            seed: None,
            loss: Losses::BinaryCrossEntropy,
            optimizer: Optimizers::default(),
            state: None,
        }
    }

    pub fn from_layers(d_in: usize, layers: &[Layers]) -> Sequential {
        let mut nn = Sequential::new(d_in);
        nn.layers = layers.to_vec();
        nn
    }

    pub fn layer(&mut self, layer: Layers) -> &mut Self {
        self.layers.push(layer);
        self
    }

    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_loss(&mut self, loss: Losses) -> &mut Self {
        self.loss = loss;
        self
    }

    pub fn set_learning_rate(&mut self, rate: f64) -> &mut Self {
        match &mut self.optimizer {
            Optimizers::Adam { learning_rate }
            | Optimizers::RmsProp { learning_rate }
            | Optimizers::Sgd { learning_rate, .. } => *learning_rate = rate,
        }
        if let Some(state) = self.state.as_mut() {
            state.set_learning_rate(rate);
        }
        self
    }

    /// Instantiates fresh weights for every layer definition.
    pub fn weave(&mut self) -> &mut Self {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.web.clear();
        let mut p_dim = self.d_in;
        for layer in self.layers.iter() {
            self.web.push(layer.wake(p_dim, &mut rng));
            p_dim = layer.output_dim(p_dim);
        }
        self
    }

    /// Sets the optimizer and loss and resets optimizer state.
    pub fn compile(&mut self, optimizer: Optimizers, loss: Losses) -> &mut Self {
        self.optimizer = optimizer;
        self.loss = loss;
        self.state = Some(optimizer.wake());
        self
    }

    pub fn d_in(&self) -> usize {
        self.d_in
    }

    pub fn d_out(&self) -> usize {
        self.layers
            .iter()
            .fold(self.d_in, |p_dim, layer| layer.output_dim(p_dim))
    }

    pub fn layers(&self) -> &[Layers] {
        &self.layers
    }

    pub fn web(&self) -> &Web {
        &self.web
    }

    fn ready(&self, x_features: usize) -> Result<()> {
        if self.web.is_empty() {
            return Err(Error::NotReady("call weave() before use"));
        }
        if x_features != self.d_in {
            return Err(Error::Shape(format!(
                "model expects {} input features, got {}",
                self.d_in, x_features
            )));
        }
        Ok(())
    }

    /// Targets need one row per sample and one column per output unit.
    fn check_targets(&self, samples: usize, y: &Array2<f64>) -> Result<()> {
        if y.nrows() != samples {
            return Err(Error::Shape(format!(
                "{} samples but {} targets",
                samples,
                y.nrows()
            )));
        }
        if y.ncols() != self.d_out() {
            return Err(Error::Shape(format!(
                "model has {} outputs, targets have {} columns",
                self.d_out(),
                y.ncols()
            )));
        }
        Ok(())
    }

    fn propagate(&mut self, mut x: Array2<f64>, training: bool) -> Array2<f64> {
        for layer in self.web.iter_mut() {
            x = layer.forward(x, training);
        }
        x
    }

    pub fn forward(&mut self, x: Array2<f64>, training: bool) -> Result<Array2<f64>> {
        self.ready(x.ncols())?;
        Ok(self.propagate(x, training))
    }

    /// Propagates the loss gradient back through the stack, leaving
    /// parameter gradients on each layer.
    pub fn backwards(&mut self, pred: &Array2<f64>, target: &Array2<f64>) -> Result<()> {
        if pred.shape() != target.shape() {
            return Err(Error::Shape(format!(
                "predictions {:?} but targets {:?}",
                pred.shape(),
                target.shape()
            )));
        }
        let mut grad_output = self.loss.wake().d(pred, target);
        for layer in self.web.iter_mut().rev() {
            grad_output = layer.backward(grad_output);
        }
        Ok(())
    }

    /// Sum of every layer's regularization term.
    pub fn penalty(&self) -> f64 {
        self.web.iter().map(|l| l.penalty()).sum()
    }

    /// One optimization step on a single batch. Returns the batch loss and
    /// accuracy as measured before the update.
    pub fn train_batch(&mut self, x: Array2<f64>, y: &Array2<f64>) -> Result<Evaluation> {
        self.ready(x.ncols())?;
        self.check_targets(x.nrows(), y)?;
        if self.state.is_none() {
            return Err(Error::NotReady("call compile() before training"));
        }

        let pred = self.propagate(x, true);
        let loss = self.loss.wake().a(&pred, y).mean().unwrap_or(0.) + self.penalty();
        let accuracy = f::binary_accuracy(&pred, y);

        self.backwards(&pred, y)?;

        if let Some(state) = self.state.as_mut() {
            let params = self.web.iter_mut().flat_map(|l| l.params()).collect();
            state.step(params);
        }

        Ok(Evaluation { loss, accuracy })
    }

    /// Inference-mode outputs, computed `batch_size` rows at a time.
    pub fn predict<X: Inputs>(&mut self, x: &X, batch_size: usize) -> Result<Array2<f64>> {
        self.ready(x.features())?;

        let n = x.samples();
        let mut out = Array2::zeros((n, self.d_out()));
        let rows = (0..n).collect::<Vec<usize>>();

        for (i, batch) in rows.chunks(batch_size.max(1)).enumerate() {
            let start = i * batch_size.max(1);
            let pred = self.propagate(x.gather(batch), false);
            out.slice_mut(s![start..start + batch.len(), ..]).assign(&pred);
        }

        Ok(out)
    }

    pub fn evaluate<X: Inputs>(
        &mut self,
        x: &X,
        y: &Array2<f64>,
        batch_size: usize,
    ) -> Result<Evaluation> {
        if x.samples() == 0 {
            return Err(Error::Empty("evaluation set"));
        }
        self.check_targets(x.samples(), y)?;

        let pred = self.predict(x, batch_size)?;
        let per_sample = self.loss.wake().a(&pred, y);

        Ok(Evaluation {
            loss: per_sample.mean().unwrap_or(0.) + self.penalty(),
            accuracy: f::binary_accuracy(&pred, y),
        })
    }

    pub fn get_trainer(&mut self) -> Trainer {
        Trainer::new(self)
    }

    pub fn dump(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Restores weights and configuration. Optimizer moments start fresh.
    pub fn load(serialized: &[u8]) -> Result<Sequential> {
        let mut nn: Sequential = bincode::deserialize(serialized)?;
        nn.state = Some(nn.optimizer.wake());
        Ok(nn)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.dump()?)?;
        Ok(())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Sequential> {
        Sequential::load(&fs::read(path)?)
    }
}
