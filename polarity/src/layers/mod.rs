mod dense;
mod dropout;
pub mod types;

pub use dense::Dense;
pub use dropout::Dropout;
pub use types::{Layer, Layers, Woven};
