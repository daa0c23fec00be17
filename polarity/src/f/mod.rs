pub mod averages;
pub mod metrics;

pub use averages::*;
pub use metrics::*;
