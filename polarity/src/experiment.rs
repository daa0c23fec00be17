//! Named model variants, the explore-then-retrain protocol and the final
//! comparison table.
//!
//! Every experiment first trains on the training split minus a hold-out
//! head of `validation_size` reviews, recording validation curves. A fresh
//! model with the same definition is then trained on the whole training
//! split for `final_epochs` and scored on the test split.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use log::{info, warn};
use ndarray::{s, Array1, Array2};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};

use crate::dataset::Imdb;
use crate::encode::{vectorize_labels, MultiHot, OutOfRange};
use crate::error::{Error, Result};
use crate::layers::Layers;
use crate::nn::{Evaluation, Sequential};
use crate::optimizers::{History, Optimizers};
use crate::plot;
use crate::{Activations, Losses};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub name: String,
    pub layers: Vec<Layers>,
    pub loss: Losses,
    pub optimizer: Optimizers,
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_size: usize,
    pub final_epochs: usize,
}

impl ExperimentConfig {
    /// Adam, binary cross-entropy, 20 exploration epochs of 512 reviews with
    /// 10000 held out, 8 final epochs.
    pub fn new(name: &str, layers: Vec<Layers>) -> ExperimentConfig {
        ExperimentConfig {
            name: name.to_string(),
            layers,
            loss: Losses::BinaryCrossEntropy,
            optimizer: Optimizers::adam(),
            epochs: 20,
            batch_size: 512,
            validation_size: 10000,
            final_epochs: 8,
        }
    }

    pub fn loss(mut self, loss: Losses) -> Self {
        self.loss = loss;
        self
    }

    pub fn optimizer(mut self, optimizer: Optimizers) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn epochs(mut self, epochs: usize, final_epochs: usize) -> Self {
        self.epochs = epochs;
        self.final_epochs = final_epochs;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validation_size(mut self, validation_size: usize) -> Self {
        self.validation_size = validation_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::Layer(format!("{} has no layers", self.name)));
        }
        if self.batch_size == 0 {
            return Err(Error::Layer(format!("{} has a batch size of 0", self.name)));
        }
        self.layers.iter().try_for_each(Layers::validate)
    }

    /// A freshly initialised, compiled model for inputs of width `d_in`.
    pub fn build(&self, d_in: usize, seed: Option<u64>) -> Sequential {
        let mut nn = Sequential::from_layers(d_in, &self.layers);
        if let Some(seed) = seed {
            nn.set_seed(seed);
        }
        nn.weave().compile(self.optimizer, self.loss);
        nn
    }
}

fn hidden(units: &[usize], activation: Activations) -> Vec<Layers> {
    let mut layers = units
        .iter()
        .map(|u| Layers::dense(*u, activation))
        .collect::<Vec<Layers>>();
    layers.push(Layers::dense(1, Activations::Sigmoid));
    layers
}

/// The ten IMDB classifier variants: width, depth, activation, loss and
/// regularization changes around a 16-16 relu baseline.
pub fn catalog() -> Vec<ExperimentConfig> {
    use Activations::{Relu, Sigmoid, Tanh};

    let l2 = vec![
        Layers::dense_l2(16, Relu, 0.001),
        Layers::dense_l2(16, Relu, 0.001),
        Layers::dense(1, Sigmoid),
    ];
    let dropout = vec![
        Layers::dense(16, Relu),
        Layers::dropout(0.5),
        Layers::dense(16, Relu),
        Layers::dropout(0.5),
        Layers::dense(1, Sigmoid),
    ];
    let hyper = vec![
        Layers::dense_l2(32, Relu, 0.0001),
        Layers::dropout(0.5),
        Layers::dense_l2(32, Relu, 0.0001),
        Layers::dropout(0.5),
        Layers::dense_l2(16, Relu, 0.0001),
        Layers::dropout(0.5),
        Layers::dense(1, Sigmoid),
    ];

    vec![
        ExperimentConfig::new("baseline", hidden(&[16, 16], Relu)).epochs(20, 4),
        ExperimentConfig::new("three_layers", hidden(&[16, 16, 16], Relu)).epochs(20, 12),
        ExperimentConfig::new("units_32", hidden(&[32, 32], Relu)),
        ExperimentConfig::new("units_64", hidden(&[64, 64], Relu)),
        ExperimentConfig::new("units_128", hidden(&[128, 128], Relu)),
        ExperimentConfig::new("mse", hidden(&[16, 16], Relu)).loss(Losses::MeanSquaredError),
        ExperimentConfig::new("tanh", hidden(&[16, 16], Tanh)),
        ExperimentConfig::new("l2", l2),
        ExperimentConfig::new("dropout", dropout),
        ExperimentConfig::new("hyper", hyper).loss(Losses::MeanSquaredError),
    ]
}

/// The experiments named in `names`, in that order. An empty list selects
/// everything.
pub fn select(experiments: &[ExperimentConfig], names: &[String]) -> Result<Vec<ExperimentConfig>> {
    if names.is_empty() {
        return Ok(experiments.to_vec());
    }
    names
        .iter()
        .map(|name| {
            experiments
                .iter()
                .find(|e| &e.name == name)
                .cloned()
                .ok_or_else(|| Error::UnknownExperiment(name.clone()))
        })
        .collect()
}

/// Multi-hot inputs and label columns for both splits.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub x_train: MultiHot,
    pub y_train: Array2<f64>,
    pub x_test: MultiHot,
    pub y_test: Array2<f64>,
}

impl Prepared {
    pub fn new(imdb: &Imdb, num_words: usize) -> Result<Prepared> {
        Ok(Prepared {
            x_train: MultiHot::encode(&imdb.train.sequences[..], num_words, OutOfRange::Reject)?,
            y_train: vectorize_labels(&imdb.train.labels),
            x_test: MultiHot::encode(&imdb.test.sequences[..], num_words, OutOfRange::Reject)?,
            y_test: vectorize_labels(&imdb.test.labels),
        })
    }

    pub fn dimension(&self) -> usize {
        self.x_train.dimension()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Outcome {
    pub name: String,
    pub history: History,
    pub test: Evaluation,
}

/// Reviews held out for validation: `validation_size` when that leaves
/// something to train on, otherwise half of the split.
pub fn holdout(validation_size: usize, len: usize) -> usize {
    if validation_size < len {
        validation_size
    } else {
        len / 2
    }
}

/// Runs one experiment. With `out_dir`, the exploration curves are written
/// as `<name>_loss.html` / `<name>_accuracy.html`, and with `save_model` the
/// retrained model as `<name>.bin`.
pub fn run(
    experiment: &ExperimentConfig,
    data: &Prepared,
    out_dir: Option<&Path>,
    save_model: bool,
    seed: Option<u64>,
) -> Result<Outcome> {
    info!("Running experiment {}", experiment.name);
    experiment.validate()?;
    if data.x_train.len() < 2 {
        return Err(Error::Empty("training set needs at least two reviews"));
    }

    let n_val = holdout(experiment.validation_size, data.x_train.len());
    if n_val != experiment.validation_size {
        warn!(
            "{}: holding out {} of {} training reviews instead of {}",
            experiment.name,
            n_val,
            data.x_train.len(),
            experiment.validation_size
        );
    }
    let (x_val, partial_x) = data.x_train.split_at(n_val);
    let y_val = data.y_train.slice(s![..n_val, ..]).to_owned();
    let partial_y = data.y_train.slice(s![n_val.., ..]).to_owned();
    let validation = if n_val > 0 { Some((&x_val, &y_val)) } else { None };

    let mut explore = experiment.build(data.dimension(), seed);
    let history = {
        let mut trainer = explore.get_trainer();
        trainer
            .set_epochs(experiment.epochs)
            .set_batch_size(experiment.batch_size)
            .verbose();
        if let Some(seed) = seed {
            trainer.set_seed(seed);
        }
        trainer.fit(&partial_x, &partial_y, validation)?;
        if let Some(dir) = out_dir {
            trainer.loss_graph(dir, &experiment.name)?;
        }
        trainer.history.clone()
    };

    let mut model = experiment.build(data.dimension(), seed);
    {
        let mut trainer = model.get_trainer();
        trainer
            .set_epochs(experiment.final_epochs)
            .set_batch_size(experiment.batch_size);
        if let Some(seed) = seed {
            trainer.set_seed(seed);
        }
        trainer.fit(&data.x_train, &data.y_train, None)?;
    }

    let test = model.evaluate(&data.x_test, &data.y_test, experiment.batch_size)?;
    info!(
        "{}: test loss = {:.4} test accuracy = {:.4}",
        experiment.name, test.loss, test.accuracy
    );

    if let (Some(dir), true) = (out_dir, save_model) {
        fs::create_dir_all(dir)?;
        model.save(dir.join(format!("{}.bin", experiment.name)))?;
    }

    Ok(Outcome {
        name: experiment.name.clone(),
        history,
        test,
    })
}

/// One line of the comparison table, in percent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub loss: f64,
    pub accuracy: f64,
}

impl SummaryRow {
    pub fn new(name: &str, loss: f64, accuracy: f64) -> SummaryRow {
        SummaryRow {
            name: name.to_string(),
            loss: loss * 100.,
            accuracy: accuracy * 100.,
        }
    }
}

impl From<&Outcome> for SummaryRow {
    fn from(outcome: &Outcome) -> Self {
        SummaryRow::new(&outcome.name, outcome.test.loss, outcome.test.accuracy)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    /// Rows for the outcomes named in `names`, in that order. Names without
    /// an outcome are skipped; an empty list keeps every outcome.
    pub fn compare(outcomes: &[Outcome], names: &[String]) -> Summary {
        let rows = if names.is_empty() {
            outcomes.iter().map(SummaryRow::from).collect()
        } else {
            names
                .iter()
                .filter_map(|name| outcomes.iter().find(|o| &o.name == name))
                .map(SummaryRow::from)
                .collect()
        };
        Summary { rows }
    }

    fn column(&self, f: impl Fn(&SummaryRow) -> f64) -> Array1<f64> {
        self.rows.iter().map(f).collect()
    }

    pub fn best_accuracy(&self) -> Option<&SummaryRow> {
        let i = self.column(|r| r.accuracy).argmax().ok()?;
        self.rows.get(i)
    }

    pub fn lowest_loss(&self) -> Option<&SummaryRow> {
        let i = self.column(|r| r.loss).argmin().ok()?;
        self.rows.get(i)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = WriterBuilder::new().from_writer(File::create(path)?);
        for row in self.rows.iter() {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes `summary.csv` and `summary.html` into `dir`.
    pub fn report(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let csv = dir.join("summary.csv");
        let html = dir.join("summary.html");
        self.write_csv(&csv)?;
        plot::summary_scatter(&self.rows, &html)?;

        for row in self.rows.iter() {
            info!("{:<16} loss = {:>7.2} accuracy = {:>6.2}", row.name, row.loss, row.accuracy);
        }
        if let Some(best) = self.best_accuracy() {
            info!("Highest accuracy: {} ({:.2})", best.name, best.accuracy);
        }
        if let Some(best) = self.lowest_loss() {
            info!("Lowest loss: {} ({:.2})", best.name, best.loss);
        }

        Ok((csv, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn tiny(name: &str) -> ExperimentConfig {
        ExperimentConfig::new(name, hidden(&[8], Activations::Relu))
            .optimizer(Optimizers::Adam { learning_rate: 0.01 })
            .epochs(3, 2)
            .batch_size(32)
            .validation_size(40)
    }

    fn outcome(name: &str, loss: f64, accuracy: f64) -> Outcome {
        Outcome {
            name: name.to_string(),
            history: History::default(),
            test: Evaluation { loss, accuracy },
        }
    }

    #[test]
    fn catalog_names_are_unique() {
        let experiments = catalog();
        let mut names = experiments.iter().map(|e| e.name.clone()).collect::<Vec<String>>();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), experiments.len());
        assert_eq!(experiments.len(), 10);
    }

    #[test]
    fn catalog_models_end_in_a_single_sigmoid() {
        for e in catalog() {
            assert_eq!(
                e.layers.last(),
                Some(&Layers::dense(1, Activations::Sigmoid)),
                "{}",
                e.name
            );
            assert_eq!(e.build(50, Some(1)).d_out(), 1);
        }
    }

    #[test]
    fn hyper_uses_mse_and_dropout() {
        let hyper = select(&catalog(), &["hyper".to_string()]).unwrap().remove(0);
        assert_eq!(hyper.loss, Losses::MeanSquaredError);
        assert_eq!(hyper.layers.len(), 7);
        assert_eq!(hyper.layers[1], Layers::dropout(0.5));
    }

    #[test]
    fn selecting_an_unknown_name_fails() {
        let err = select(&catalog(), &["units_256".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownExperiment(n) if n == "units_256"));
    }

    #[test]
    fn run_records_exploration_and_scores_test() {
        let imdb = Imdb::synthetic(200, 60, 64, 7).unwrap();
        let data = Prepared::new(&imdb, 64).unwrap();
        let dir = TempDir::new("polarity-run").unwrap();

        let outcome = run(&tiny("tiny"), &data, Some(dir.path()), true, Some(3)).unwrap();
        assert_eq!(outcome.history.epochs(), 3);
        assert_eq!(outcome.history.val_accuracy.len(), 3);
        assert!((0. ..=1.).contains(&outcome.test.accuracy));
        assert!(dir.path().join("tiny_loss.html").exists());
        assert!(dir.path().join("tiny.bin").exists());
    }

    #[test]
    fn run_without_validation_skips_val_curves() {
        let imdb = Imdb::synthetic(100, 20, 64, 8).unwrap();
        let data = Prepared::new(&imdb, 64).unwrap();
        let outcome = run(&tiny("nv").validation_size(0), &data, None, false, Some(3)).unwrap();
        assert!(outcome.history.val_loss.is_empty());
    }

    #[test]
    fn holdout_leaves_reviews_to_train_on() {
        assert_eq!(holdout(10000, 25000), 10000);
        assert_eq!(holdout(10000, 4000), 2000);
        assert_eq!(holdout(10000, 10000), 5000);
        assert_eq!(holdout(0, 3), 0);
    }

    #[test]
    fn catalog_baseline_runs_on_a_small_corpus() {
        let imdb = Imdb::synthetic(4000, 2000, 10000, 113).unwrap();
        let data = Prepared::new(&imdb, 10000).unwrap();
        let baseline = select(&catalog(), &["baseline".to_string()]).unwrap().remove(0);
        assert_eq!(baseline.validation_size, 10000);

        let outcome = run(&baseline.epochs(2, 1), &data, None, false, Some(113)).unwrap();
        assert_eq!(outcome.history.epochs(), 2);
        assert_eq!(outcome.history.val_loss.len(), 2);
    }

    #[test]
    fn a_single_review_is_rejected_before_training() {
        let imdb = Imdb::synthetic(1, 5, 64, 2).unwrap();
        let data = Prepared::new(&imdb, 64).unwrap();
        assert!(matches!(
            run(&tiny("one"), &data, None, false, Some(1)),
            Err(Error::Empty(_))
        ));
    }

    #[test]
    fn invalid_layers_fail_the_run() {
        let imdb = Imdb::synthetic(50, 10, 64, 3).unwrap();
        let data = Prepared::new(&imdb, 64).unwrap();
        let mut e = tiny("nan");
        e.layers.insert(1, Layers::dropout(f64::NAN));
        assert!(matches!(
            run(&e, &data, None, false, None),
            Err(Error::Layer(_))
        ));
    }

    #[test]
    fn summary_scales_to_percent_and_ranks() {
        let outcomes = vec![
            outcome("dropout", 0.33, 0.87),
            outcome("hyper", 0.09, 0.88),
            outcome("tanh", 0.41, 0.85),
        ];
        let names = vec!["tanh".to_string(), "hyper".to_string(), "missing".to_string()];
        let summary = Summary::compare(&outcomes, &names);

        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].name, "tanh");
        assert!((summary.rows[1].accuracy - 88.).abs() < 1e-9);
        assert_eq!(summary.best_accuracy().unwrap().name, "hyper");
        assert_eq!(summary.lowest_loss().unwrap().name, "hyper");
    }

    #[test]
    fn empty_summary_has_no_best() {
        let summary = Summary::default();
        assert!(summary.best_accuracy().is_none());
        assert!(summary.lowest_loss().is_none());
    }

    #[test]
    fn report_writes_csv_with_header() {
        let dir = TempDir::new("polarity-summary").unwrap();
        let summary = Summary::compare(&[outcome("l2", 0.3, 0.875)], &[]);
        let (csv, html) = summary.report(dir.path()).unwrap();

        let text = fs::read_to_string(csv).unwrap();
        assert!(text.starts_with("name,loss,accuracy"));
        assert!(text.contains("l2,30"));
        assert!(html.exists());
    }
}
