pub mod config;
pub mod error;
pub mod types;

pub use config::CarebookConfig;
pub use error::{CarebookError, Result};
pub use types::*;
