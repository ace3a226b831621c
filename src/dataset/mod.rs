pub mod cleanup;

pub use cleanup::{clean_dataset, CleanupOptions, CleanupReport};
