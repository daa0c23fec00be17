use polarity::dataset::Imdb;
use polarity::experiment::{self, Prepared, Summary};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let num_words = 1000;
    let imdb = Imdb::synthetic(6000, 2000, num_words, 113).unwrap();
    let data = Prepared::new(&imdb, num_words).unwrap();

    let out = std::env::temp_dir().join("polarity-synthetic");
    let names = ["dropout", "hyper", "mse", "l2", "tanh"].map(String::from);

    let outcomes = experiment::select(&experiment::catalog(), &names)
        .unwrap()
        .into_iter()
        .map(|e| {
            let e = e.epochs(10, 4).batch_size(256).validation_size(2000);
            experiment::run(&e, &data, Some(out.as_path()), false, Some(7)).unwrap()
        })
        .collect::<Vec<_>>();

    Summary::compare(&outcomes, &names).report(&out).unwrap();
}
