use owo_colors::OwoColorize;

use crate::pipeline::RunSummary;

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when output is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix). Used for the per-file
/// "source -> destination" lines which users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Print the per-file results and the totals line for a finished run.
pub fn print_summary(summary: &RunSummary, dry_run: bool) {
    let verb = if dry_run { "would move" } else { "moved" };
    for (src, dest) in &summary.moved {
        print_user(&format!("{} {verb} -> {}", src.display(), dest.display()));
    }
    for (name, reason) in &summary.failed {
        print_warn(&format!("{name}: {reason}"));
    }
    let totals = format!(
        "{} {verb}, {} failed, {} skipped",
        summary.moved.len(),
        summary.failed.len(),
        summary.skipped
    );
    if summary.failed.is_empty() && summary.delete_failures == 0 {
        print_success(&totals);
    } else {
        print_info(&totals);
    }
    if summary.delete_failures > 0 {
        print_warn(&format!(
            "{} source path(s) could not be deleted; see the log for details",
            summary.delete_failures
        ));
    }
}
