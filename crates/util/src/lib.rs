//! Configuration loading, path helpers, and user-facing message formatting shared by the
//! engine and the CLI.

pub mod config;
pub mod notice;
mod path_processing;

pub use config::{ConsoleConfig, ConfigError, default_config_path, load_config, load_config_from_path};
pub use notice::{Notice, NoticeAction, NoticeLevel, format_api_error};
pub use path_processing::expand_tilde;
