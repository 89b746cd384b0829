pub mod env;
mod loader;

pub use env::{AppConfig, ConfigError, DirectoryConfig, GeminiConfig, PipelineConfig};
pub use loader::load_config;
