pub mod cache;
pub mod config;
mod invalidation;

pub use cache::{CacheStats, LoadingCache};
pub use config::{AcceleratorConfig, ConfigError};
