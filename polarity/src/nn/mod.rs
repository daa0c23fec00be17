mod sequential;

pub use sequential::{Evaluation, Sequential, Web};
