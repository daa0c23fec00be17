//! A small learnable stand-in for the review corpus.
//!
//! Word ranks are split into a positive cue band, a negative cue band and
//! neutral filler. A review draws mostly filler plus a handful of cues that
//! favour its label, with some cues from the other band mixed in.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::imdb::{Imdb, Reviews, INDEX_FROM, START};
use crate::error::{Error, Result};

fn bands(num_words: usize) -> (Range<u32>, Range<u32>, Range<u32>) {
    let first = INDEX_FROM;
    let width = (num_words as u32 - first) / 4;
    let positive = first..first + width;
    let negative = first + width..first + 2 * width;
    let neutral = first + 2 * width..num_words as u32;
    (positive, negative, neutral)
}

/// `n` reviews with every token in `[0, num_words)`.
pub fn generate(n: usize, num_words: usize, seed: u64) -> Result<Reviews> {
    if num_words < INDEX_FROM as usize + 8 {
        return Err(Error::Vocabulary(num_words));
    }

    let (positive, negative, neutral) = bands(num_words);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut reviews = Reviews::new();

    for _ in 0..n {
        let label: u8 = rng.gen_range(0..=1);
        let (cues, noise) = match label {
            1 => (&positive, &negative),
            _ => (&negative, &positive),
        };

        let length = rng.gen_range(20..60);
        let mut tokens = Vec::with_capacity(length + 1);
        tokens.push(START);
        for _ in 0..length {
            let roll: f64 = rng.gen();
            let band = if roll < 0.15 {
                cues
            } else if roll < 0.2 {
                noise
            } else {
                &neutral
            };
            tokens.push(rng.gen_range(band.clone()));
        }

        reviews.insert(tokens, label);
    }

    Ok(reviews)
}

impl Imdb {
    pub fn synthetic(train: usize, test: usize, num_words: usize, seed: u64) -> Result<Imdb> {
        Ok(Imdb {
            train: generate(train, num_words, seed)?,
            test: generate(test, num_words, seed.wrapping_add(1))?,
        })
    }
}
