//! Core library for `vfo`, a video file organizer.
//!
//! A run scans an inbox, guesses each video's title and episode numbers from its
//! file name, finds the matching series in a user-written rule book and in the
//! library folders, applies that series' rules to pick a destination, then copies
//! the file there and removes the source.
//!
//! Stages, leaf first: [`entries`] and [`folders`] model the filesystem, [`fuzzy`]
//! scores names, [`matchers`] resolves metadata, rules and folder, [`rules`] plans
//! the destination, [`transfer`] copies and cleans up, and [`pipeline`] ties one
//! run together under the [`lock::RunGuard`].

pub mod app;
pub mod cli;
pub mod config;
pub mod entries;
pub mod errors;
pub mod failures;
pub mod folders;
pub mod fs_ops;
pub mod fuzzy;
pub mod lock;
pub mod logging;
pub mod matchers;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod rules;
pub mod shutdown;
pub mod transfer;

pub use config::types::{Config, LogLevel};
pub use config::{default_config_path, default_log_path, load_config_from_xml_path, path_has_symlink_ancestor};
pub use entries::{Inbox, MediaFile, ScanFilter, VideoExtensions};
pub use errors::{MatchError, RuleParseError, VfoError};
pub use failures::{FailureStore, JsonFailureStore};
pub use folders::FolderIndex;
pub use lock::RunGuard;
pub use metadata::{GuessExtractor, MediaKind, Metadata, MetadataExtractor};
pub use pipeline::{RunSummary, run};
pub use rules::{Rule, RuleBook};
pub use transfer::{TransferPlan, TransferSession};
