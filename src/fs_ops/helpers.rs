//! io::Error adapters that add the operation, the path and a short hint.
//!
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;   // anyhow
//!   File::open(p).map_err(io_error_with_help_io("open file", p))?;           // io

use anyhow::anyhow;
use std::io;
use std::path::Path;

#[cfg(unix)]
fn hint_for_os_code(code: i32) -> Option<&'static str> {
    match code {
        libc::EACCES | libc::EPERM => Some("permission denied; check ownership of the inbox and library"),
        libc::ENOENT => Some("path not found; it may have been moved while the run was in progress"),
        libc::ENOSPC => Some("library volume is full"),
        libc::EROFS => Some("read-only filesystem"),
        libc::EXDEV => Some("cross-filesystem rename"),
        libc::EBUSY => Some("resource busy; another process may be using the file"),
        libc::ENAMETOOLONG => Some("file name too long; shorten the format-title template"),
        libc::ELOOP => Some("too many symbolic link levels"),
        libc::EMFILE | libc::ENFILE => Some("too many open files"),
        _ => None,
    }
}

#[cfg(not(unix))]
fn hint_for_os_code(code: i32) -> Option<&'static str> {
    // Win32 error codes
    match code {
        5 => Some("access denied; check permissions"),
        2 | 3 => Some("path not found"),
        32 => Some("sharing violation; the file is open in another program"),
        112 => Some("library volume is full"),
        206 => Some("path too long; shorten the format-title template"),
        _ => None,
    }
}

fn hint_for_kind(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied"),
        io::ErrorKind::NotFound => Some("path not found"),
        io::ErrorKind::AlreadyExists => Some("already exists"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    let hint = match e.raw_os_error() {
        Some(code) => hint_for_os_code(code),
        None => hint_for_kind(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    msg
}

/// For anyhow::Result code paths.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// For io::Result code paths; keeps the original ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}
