mod activation;
pub mod config;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod experiment;
pub mod f;
pub mod layers;
mod loss;
pub mod nn;
pub mod optimizers;
pub mod plot;

pub use activation::{Activation, Activations};
pub use config::Config;
pub use encode::{vectorize_labels, vectorize_sequences, Inputs, MultiHot, OutOfRange};
pub use error::{Error, Result};
pub use layers::Layers;
pub use loss::{Loss, Losses};
pub use nn::{Evaluation, Sequential};
pub use optimizers::{History, Optimizers};
