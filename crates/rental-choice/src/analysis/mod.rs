pub mod calendar;
pub mod domain;
pub mod hosts;
pub mod imputation;
pub mod model;
pub mod partition;
pub mod pipeline;
pub mod reconcile;
pub mod revenue;
pub mod stats;

pub use domain::{StrListing, StrProperty};
pub use pipeline::{run, AnalysisBundle, AnalysisInputs, Diagnostics};
