pub mod cli;
pub mod compare;
pub mod extract;
pub mod io;
mod logging;
pub mod sequence;

pub use compare::{StepPair, compare_pair, pair_steps};
pub use extract::{ExtractionRunnerArgs, extraction_pipeline};
