pub mod engine;
pub mod types;

pub use engine::{PredictionStats, TtaEngine};
pub use types::{Label, UnknownReason, Verdict, VerdictStatus, CLASS_NAMES};
