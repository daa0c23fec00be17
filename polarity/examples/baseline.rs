use polarity::dataset::{Imdb, WordIndex};
use polarity::layers::Layers;
use polarity::{Activations, Losses, MultiHot, Optimizers, OutOfRange, Sequential};

// cargo run --example baseline -- imdb.json [imdb_word_index.json]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().collect::<Vec<String>>();
    let num_words = 10000;
    let imdb = Imdb::load_json(&args[1], num_words).unwrap();

    if let Some(path) = args.get(2) {
        let words = WordIndex::load(path).unwrap();
        println!("{}", words.decode(&imdb.train.sequences[0]));
    }

    let x_train = MultiHot::encode(&imdb.train.sequences[..], num_words, OutOfRange::Reject).unwrap();
    let x_test = MultiHot::encode(&imdb.test.sequences[..], num_words, OutOfRange::Reject).unwrap();
    let y_train = polarity::vectorize_labels(&imdb.train.labels);
    let y_test = polarity::vectorize_labels(&imdb.test.labels);

    let mut nn = Sequential::new(num_words);
    nn.layer(Layers::dense(16, Activations::Relu))
        .layer(Layers::dense(16, Activations::Relu))
        .layer(Layers::dense(1, Activations::Sigmoid))
        .weave()
        .compile(Optimizers::adam(), Losses::BinaryCrossEntropy);

    nn.get_trainer()
        .set_epochs(4)
        .set_batch_size(512)
        .verbose()
        .fit(&x_train, &y_train, None)
        .unwrap();

    let results = nn.evaluate(&x_test, &y_test, 512).unwrap();
    println!("test loss {:.4} accuracy {:.4}", results.loss, results.accuracy);
}
