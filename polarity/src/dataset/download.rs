use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::error::Result;

pub const WORD_INDEX_URL: &str =
    "https://storage.googleapis.com/tensorflow/tf-keras-datasets/imdb_word_index.json";

fn download_file(url: &str, directory: &Path) -> Result<PathBuf> {
    let filename = url.split('/').last().unwrap_or("download");
    let filepath = directory.join(filename);
    if !filepath.exists() {
        info!("Downloading {} to {}", url, filepath.display());
        let resp = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
        fs::write(&filepath, resp)?;
    }
    Ok(filepath)
}

/// Path to the cached word index JSON, downloading it on first use.
pub fn fetch_word_index(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    download_file(WORD_INDEX_URL, dir)
}
