pub mod config;
pub mod dataset;
pub mod image;
pub mod models;
pub mod tta;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::{Config, TtaConfig};
pub use tta::{TtaEngine, Verdict};
pub use utils::error::ClassifyError;

pub type Result<T> = std::result::Result<T, ClassifyError>;
