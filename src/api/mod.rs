mod accumulator;
mod config;
mod engine;
mod result;
mod snapshot;

pub use accumulator::{MAX_BIN_COUNT, MAX_ZONE_COUNT};
pub use config::HistogramConfig;
pub use engine::{ConfigureOutcome, EngineState, HistogramEngine, RecomputeStats};
pub use result::{HistogramBin, HistogramResult, RecomputeDiagnostics};
pub use snapshot::EngineSnapshot;
