// Configuration management module
// TOML settings file plus the interactive setup command

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CONFIG_DIR_ENV, Config, ConfigError, CorpusConfig, MAX_TOP_K, OllamaConfig, RetrievalConfig,
    ServerConfig,
};
