use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::info;
use rand::rngs::StdRng;
use rand::{seq::SliceRandom, SeedableRng};
use serde::{self, Deserialize, Serialize};

use super::WordIndex;
use crate::error::{Error, Result};

pub const PAD: u32 = 0;
pub const START: u32 = 1;
pub const OOV: u32 = 2;
/// Word rank `r` is stored as token `r + INDEX_FROM`.
pub const INDEX_FROM: u32 = 3;
pub const DEFAULT_SEED: u64 = 113;

#[derive(Serialize, Deserialize)]
struct Record {
    tokens: Vec<u32>,
    label: u8,
}

#[derive(Serialize, Deserialize)]
struct Dump {
    train: Vec<Record>,
    test: Vec<Record>,
}

/// Tokenized reviews and their labels (`0` negative, `1` positive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reviews {
    pub sequences: Vec<Vec<u32>>,
    pub labels: Vec<u8>,
}

impl Reviews {
    pub fn new() -> Reviews {
        Reviews::default()
    }

    pub fn insert(&mut self, tokens: Vec<u32>, label: u8) -> &mut Self {
        self.sequences.push(tokens);
        self.labels.push(label);
        self
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Largest token id over all reviews.
    pub fn max_token(&self) -> Option<u32> {
        self.sequences.iter().filter_map(|s| s.iter().max()).max().copied()
    }

    /// `(first n, rest)`. The head is the hold-out validation set.
    pub fn split_at(&self, n: usize) -> (Reviews, Reviews) {
        let n = n.min(self.len());
        (
            Reviews {
                sequences: self.sequences[..n].to_vec(),
                labels: self.labels[..n].to_vec(),
            },
            Reviews {
                sequences: self.sequences[n..].to_vec(),
                labels: self.labels[n..].to_vec(),
            },
        )
    }

    /// Replaces every token `>= num_words` with [`OOV`].
    pub fn limit_vocabulary(&mut self, num_words: usize) -> Result<&mut Self> {
        if num_words <= INDEX_FROM as usize {
            return Err(Error::Vocabulary(num_words));
        }
        for sequence in self.sequences.iter_mut() {
            for token in sequence.iter_mut() {
                if *token as usize >= num_words {
                    *token = OOV;
                }
            }
        }
        Ok(self)
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|l| **l == 1).count()
    }

    fn shuffle(&mut self, seed: u64) {
        let mut pairs = self
            .sequences
            .drain(..)
            .zip(self.labels.drain(..))
            .collect::<Vec<(Vec<u32>, u8)>>();
        pairs.shuffle(&mut StdRng::seed_from_u64(seed));
        let (sequences, labels) = pairs.into_iter().unzip();
        self.sequences = sequences;
        self.labels = labels;
    }

    fn from_records(records: Vec<Record>, path: &Path) -> Result<Reviews> {
        let mut reviews = Reviews::new();
        for (i, r) in records.into_iter().enumerate() {
            if r.label > 1 {
                return Err(Error::Dataset {
                    path: path.to_path_buf(),
                    reason: format!("review {} has label {}", i, r.label),
                });
            }
            reviews.insert(r.tokens, r.label);
        }
        Ok(reviews)
    }

    fn to_records(&self) -> Vec<Record> {
        self.sequences
            .iter()
            .zip(self.labels.iter())
            .map(|(tokens, label)| Record {
                tokens: tokens.clone(),
                label: *label,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imdb {
    pub train: Reviews,
    pub test: Reviews,
}

impl Imdb {
    /// Reads a tokenized dump `{"train": [{"tokens": [..], "label": 0}], "test": [..]}`
    /// keeping the `num_words` most frequent words.
    pub fn load_json(path: impl AsRef<Path>, num_words: usize) -> Result<Imdb> {
        let path = path.as_ref();
        let dump: Dump = serde_json::from_reader(BufReader::new(File::open(path)?))?;

        let mut imdb = Imdb {
            train: Reviews::from_records(dump.train, path)?,
            test: Reviews::from_records(dump.test, path)?,
        };
        imdb.train.limit_vocabulary(num_words)?;
        imdb.test.limit_vocabulary(num_words)?;

        info!(
            "Loaded {} training and {} test reviews from {}",
            imdb.train.len(),
            imdb.test.len(),
            path.display()
        );
        Ok(imdb)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let dump = Dump {
            train: self.train.to_records(),
            test: self.test.to_records(),
        };
        serde_json::to_writer(BufWriter::new(File::create(path)?), &dump)?;
        Ok(())
    }

    /// Tokenizes the raw `aclImdb/{train,test}/{neg,pos}/*.txt` layout.
    /// Each split is shuffled, the training split with `seed` and the test
    /// split with `2 * seed`.
    pub fn from_acl_dir(
        dir: impl AsRef<Path>,
        word_index: &WordIndex,
        num_words: usize,
        seed: u64,
    ) -> Result<Imdb> {
        if num_words <= INDEX_FROM as usize {
            return Err(Error::Vocabulary(num_words));
        }
        let dir = dir.as_ref();

        let mut imdb = Imdb {
            train: read_split(&dir.join("train"), word_index, num_words)?,
            test: read_split(&dir.join("test"), word_index, num_words)?,
        };
        imdb.train.shuffle(seed);
        imdb.test.shuffle(seed.wrapping_mul(2));

        info!(
            "Tokenized {} training and {} test reviews from {}",
            imdb.train.len(),
            imdb.test.len(),
            dir.display()
        );
        Ok(imdb)
    }
}

fn review_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect::<Vec<PathBuf>>();
    files.sort();
    Ok(files)
}

fn read_split(dir: &Path, word_index: &WordIndex, num_words: usize) -> Result<Reviews> {
    let mut reviews = Reviews::new();
    for (label, polarity) in [(0u8, "neg"), (1u8, "pos")] {
        for file in review_files(&dir.join(polarity))? {
            let text = fs::read_to_string(&file)?;
            reviews.insert(word_index.encode(&text, num_words), label);
        }
    }
    Ok(reviews)
}
