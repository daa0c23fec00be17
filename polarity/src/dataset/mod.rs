#[cfg(feature = "download")]
pub mod download;
pub mod imdb;
pub mod synthetic;
mod word_index;

pub use imdb::{Imdb, Reviews};
pub use word_index::{tokenize, WordIndex};
