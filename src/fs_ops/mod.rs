//! Filesystem helpers: durable copy-and-rename for library transfers and io::Error
//! adapters with actionable hints.

mod atomic;
mod copy;
mod helpers;
mod io_copy;
mod util;

pub use copy::safe_copy_and_rename;
pub use helpers::{io_error_with_help, io_error_with_help_io};
