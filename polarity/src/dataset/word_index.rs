use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::imdb::{INDEX_FROM, OOV, START};
use crate::error::Result;

/// Word to frequency rank (1 is the most frequent word).
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    words: HashMap<String, u32>,
    reverse: HashMap<u32, String>,
}

impl WordIndex {
    pub fn from_map(words: HashMap<String, u32>) -> WordIndex {
        let reverse = words.iter().map(|(w, r)| (*r, w.clone())).collect();
        WordIndex { words, reverse }
    }

    /// Reads a JSON object of `{"word": rank}`.
    pub fn load(path: impl AsRef<Path>) -> Result<WordIndex> {
        let words: HashMap<String, u32> =
            serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(WordIndex::from_map(words))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn rank(&self, word: &str) -> Option<u32> {
        self.words.get(word).copied()
    }

    /// Start token followed by one token per word; unknown words and words
    /// outside the `num_words` vocabulary become [`OOV`].
    pub fn encode(&self, text: &str, num_words: usize) -> Vec<u32> {
        let mut tokens = vec![START];
        for word in tokenize(text) {
            let token = self
                .rank(&word)
                .and_then(|rank| rank.checked_add(INDEX_FROM))
                .filter(|token| (*token as usize) < num_words)
                .unwrap_or(OOV);
            tokens.push(token);
        }
        tokens
    }

    /// Inverse of [`WordIndex::encode`]; reserved and unknown ids print as `?`.
    pub fn decode(&self, tokens: &[u32]) -> String {
        tokens
            .iter()
            .map(|t| {
                t.checked_sub(INDEX_FROM)
                    .and_then(|rank| self.reverse.get(&rank))
                    .map_or("?", String::as_str)
            })
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// Lowercases, drops `<br />` markup and splits on anything that is not
/// alphanumeric or an apostrophe.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace("<br />", " ")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
