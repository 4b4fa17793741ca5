//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    CONFIG_ENV, default_config_path, default_failure_store_path, default_log_path,
    default_rulebook_path, path_has_symlink_ancestor,
};
pub use types::{Config, LogLevel};
pub use xml::{LoadResult, create_template_config, load_config_from_xml_path, load_or_init};

/// Containers recognized when the config names none.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "webm"];

pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 10;
