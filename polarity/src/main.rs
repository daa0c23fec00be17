use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use polarity::config::{Config, DataSource};
use polarity::dataset::imdb::DEFAULT_SEED;
use polarity::dataset::{Imdb, WordIndex};
use polarity::experiment::{self, Prepared, Summary};

/// Train and compare small dense sentiment classifiers on IMDB reviews.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML run configuration; defaults run the full catalog
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    create_config: Option<PathBuf>,

    /// Tokenized JSON dump of the dataset
    #[arg(long)]
    data: Option<PathBuf>,

    /// Raw aclImdb directory; the tokenized result is cached next to the outputs
    #[arg(long)]
    acl_dir: Option<PathBuf>,

    /// Word index JSON (downloaded when omitted)
    #[arg(long)]
    word_index: Option<PathBuf>,

    /// Use a synthetic corpus of this many training reviews
    #[arg(long)]
    synthetic: Option<usize>,

    /// Output directory for charts, models and the summary
    #[arg(long)]
    out: Option<PathBuf>,

    /// Run only these experiments (comma separated)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Print the first N training reviews decoded back to words
    #[arg(long)]
    decode: Option<usize>,

    #[arg(long)]
    num_words: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

fn configure(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(path) = &args.data {
        config.data = DataSource::Json { path: path.clone() };
    }
    if let Some(dir) = &args.acl_dir {
        config.data = DataSource::Acl {
            dir: dir.clone(),
            word_index: args.word_index.clone(),
        };
    }
    if let Some(train) = args.synthetic {
        config.data = DataSource::Synthetic {
            train,
            test: train / 2,
        };
    }
    if let Some(out) = &args.out {
        config.output_dir = out.clone();
    }
    if let Some(num_words) = args.num_words {
        config.num_words = num_words;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    Ok(config)
}

#[cfg(feature = "download")]
fn word_index(path: Option<&PathBuf>, config: &Config) -> Result<WordIndex> {
    let path = match path {
        Some(path) => path.clone(),
        None => polarity::dataset::download::fetch_word_index(&config.output_dir)?,
    };
    Ok(WordIndex::load(path)?)
}

#[cfg(not(feature = "download"))]
fn word_index(path: Option<&PathBuf>, _config: &Config) -> Result<WordIndex> {
    match path {
        Some(path) => Ok(WordIndex::load(path)?),
        None => bail!("--word-index is required when built without the download feature"),
    }
}

fn load_data(config: &Config, args: &Args) -> Result<Imdb> {
    let seed = config.seed.unwrap_or(DEFAULT_SEED);
    let imdb = match &config.data {
        DataSource::Json { path } => Imdb::load_json(path, config.num_words)?,
        DataSource::Acl { dir, word_index: index } => {
            let words = word_index(index.as_ref().or(args.word_index.as_ref()), config)?;
            let imdb = Imdb::from_acl_dir(dir, &words, config.num_words, seed)?;
            let cache = config.output_dir.join("imdb.json");
            imdb.save_json(&cache)?;
            info!("Cached tokenized reviews at {}", cache.display());
            imdb
        }
        DataSource::Synthetic { train, test } => {
            Imdb::synthetic(*train, *test, config.num_words, seed)?
        }
    };

    if imdb.train.is_empty() || imdb.test.is_empty() {
        bail!("both the training and the test split need reviews");
    }
    Ok(imdb)
}

fn preview(imdb: &Imdb, config: &Config, args: &Args, n: usize) -> Result<()> {
    if let DataSource::Synthetic { .. } = config.data {
        warn!("Synthetic reviews have no words to decode");
        return Ok(());
    }
    let words = word_index(args.word_index.as_ref(), config)?;
    for (tokens, label) in imdb.train.sequences.iter().zip(imdb.train.labels.iter()).take(n) {
        let polarity = if *label == 1 { "positive" } else { "negative" };
        println!("[{}] {}", polarity, words.decode(tokens));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(path) = &args.create_config {
        Config::default().save(path)?;
        info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = configure(&args)?;
    fs::create_dir_all(&config.output_dir)?;

    let imdb = load_data(&config, &args)?;
    info!(
        "{} training reviews ({} positive), {} test reviews",
        imdb.train.len(),
        imdb.train.positives(),
        imdb.test.len()
    );
    if let Some(n) = args.decode {
        preview(&imdb, &config, &args, n)?;
    }

    let data = Prepared::new(&imdb, config.num_words)?;
    let experiments = experiment::select(&config.experiments, &args.only)?;

    let mut outcomes = vec![];
    for e in experiments.iter() {
        outcomes.push(experiment::run(
            e,
            &data,
            Some(config.output_dir.as_path()),
            config.save_models,
            config.seed,
        )?);
    }

    let history = config.output_dir.join("history.json");
    serde_json::to_writer_pretty(BufWriter::new(File::create(&history)?), &outcomes)?;

    let summary = Summary::compare(&outcomes, &config.compare);
    if summary.rows.is_empty() {
        warn!("None of the compared experiments ran; skipping the summary");
    } else {
        let (csv, html) = summary.report(&config.output_dir)?;
        info!("Summary written to {} and {}", csv.display(), html.display());
    }

    Ok(())
}
