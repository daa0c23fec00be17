use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::imdb::DEFAULT_SEED;
use crate::error::Result;
use crate::experiment::{self, ExperimentConfig};

/// Where reviews come from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// A tokenized dump written by `Imdb::save_json`.
    Json { path: PathBuf },
    /// The raw `aclImdb` directory. Without `word_index` the public index is
    /// downloaded into the output directory.
    Acl {
        dir: PathBuf,
        word_index: Option<PathBuf>,
    },
    Synthetic { train: usize, test: usize },
}

/// Configuration of a `polarity` run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Vocabulary size and width of the multi-hot vectors.
    pub num_words: usize,
    pub seed: Option<u64>,
    pub data: DataSource,
    pub output_dir: PathBuf,
    pub save_models: bool,
    pub experiments: Vec<ExperimentConfig>,
    /// Experiments tabulated in the final summary.
    pub compare: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            num_words: 10000,
            seed: Some(DEFAULT_SEED),
            data: DataSource::Json {
                path: PathBuf::from("data/imdb.json"),
            },
            output_dir: PathBuf::from("out"),
            save_models: false,
            experiments: experiment::catalog(),
            compare: ["dropout", "hyper", "mse", "l2", "tanh"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Constructs [`Config`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b: Config = serde_yaml::from_reader(rdr)?;
        for experiment in b.experiments.iter() {
            experiment.validate()?;
        }
        Ok(b)
    }

    /// Saves [`Config`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn default_compares_five_catalog_entries() {
        let config = Config::default();
        let selected = experiment::select(&config.experiments, &config.compare).unwrap();
        assert_eq!(selected.len(), 5);
        assert_eq!(config.num_words, 10000);
    }

    #[test]
    fn yaml_round_trip() {
        let dir = TempDir::new("polarity-config").unwrap();
        let path = dir.path().join("polarity.yaml");

        let mut config = Config::default();
        config.data = DataSource::Acl {
            dir: PathBuf::from("aclImdb"),
            word_index: None,
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn nan_dropout_rate_is_rejected_on_load() {
        let dir = TempDir::new("polarity-config").unwrap();
        let path = dir.path().join("nan.yaml");

        let mut config = Config::default();
        config.experiments[0].layers.insert(1, crate::layers::Layers::dropout(f64::NAN));
        config.save(&path).unwrap();

        assert!(matches!(Config::load(&path), Err(crate::Error::Layer(_))));
    }

    #[test]
    fn hand_written_yaml_parses() {
        let dir = TempDir::new("polarity-config").unwrap();
        let path = dir.path().join("small.yaml");
        std::fs::write(
            &path,
            r#"
num_words: 200
seed: ~
data:
  synthetic:
    train: 300
    test: 100
output_dir: out
save_models: true
experiments:
  - name: small
    layers:
      - dense: {units: 8, activation: relu}
      - dropout: {rate: 0.25}
      - dense: {units: 1, activation: sigmoid}
    loss: binary_cross_entropy
    optimizer:
      rms_prop: {learning_rate: 0.001}
    epochs: 5
    batch_size: 64
    validation_size: 50
    final_epochs: 3
compare: [small]
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.data, DataSource::Synthetic { train: 300, test: 100 });
        assert_eq!(config.experiments[0].layers.len(), 3);
        assert_eq!(
            config.experiments[0].optimizer,
            crate::optimizers::Optimizers::RmsProp { learning_rate: 0.001 }
        );
    }
}
