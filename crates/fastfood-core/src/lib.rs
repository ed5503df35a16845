pub mod config;
pub mod duration;
pub mod env;
pub mod error;
pub mod types;

pub use config::{OpsConfig, StackConfig};
pub use env::{CacheSettings, DatabaseSettings, Environment, Mode};
pub use error::{ConfigError, OpsError, OpsResult};
pub use types::*;
