pub mod classifier;
pub mod manager;

pub use classifier::{ImageClassifier, OnnxClassifier, ProbabilityVector};
pub use manager::{ModelManager, ModelStats};
