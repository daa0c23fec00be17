mod adam;
mod optimizer;
mod rmsprop;
mod sgd;
mod trainer;

pub use adam::Adam;
pub use optimizer::{Hyper, Optimizer, Optimizers, Param};
pub use rmsprop::RmsProp;
pub use sgd::Sgd;
pub use trainer::{History, Trainer};
