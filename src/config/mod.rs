pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, GeminiConfig};
pub use loader::load_config;
