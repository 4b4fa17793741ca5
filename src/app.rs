//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler, validates
//! paths, and runs the placement pipeline once.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::cli::Args;
use crate::config::{LoadResult, default_config_path, load_or_init};
use crate::errors::VfoError;
use crate::failures::JsonFailureStore;
use crate::logging::init_tracing;
use crate::metadata::GuessExtractor;
use crate::output as out;
use crate::{pipeline, shutdown};

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(&args);
        return Ok(());
    }

    // Create template config if none exists (before logging init)
    let (mut cfg, cfg_path) = match load_or_init(args.config.as_deref())? {
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template vfo config was written to: {}", path.display()));
            out::print_info(
                "Edit it to set `input_dir`, one or more `series_dir` entries and the `rulebook` path, \
                 then describe your series in the rule book.",
            );
            out::print_info("Then re-run this command. To use a different location set VFO_CONFIG or pass --config.");
            return Ok(());
        }
        LoadResult::Loaded(cfg, path) => (*cfg, path),
    };

    // CLI wins
    args.apply_overrides(&mut cfg);

    // Initialize logging and capture the guard so we can drop it on signal
    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e:#}"));
        e
    })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            if shutdown::is_requested() {
                // Second interrupt: stop waiting for the current file.
                if let Ok(mut g) = guard_slot.lock() {
                    let _ = g.take();
                }
                std::process::exit(130);
            }
            shutdown::request();
            out::print_warn("Received interrupt; finishing the current file, press Ctrl-C again to abort");
        })
        .context("install interrupt handler")?;
    }

    debug!(config = %cfg_path.display(), ?args, "starting vfo");

    // Main run (so we can drop guard after)
    let result = (|| -> Result<()> {
        cfg.validate()?;
        let mut store = JsonFailureStore::open(&cfg.failure_store)?;
        let summary = pipeline::run(&cfg, &GuessExtractor, &mut store)?;
        if summary.locked_out {
            out::print_warn("Another vfo run holds the lock; nothing was done.");
            return Ok(());
        }
        out::print_summary(&summary, cfg.dry_run);
        if summary.interrupted {
            return Err(VfoError::Interrupted.into());
        }
        Ok(())
    })();

    if let Err(e) = &result {
        match e.downcast_ref::<VfoError>() {
            Some(ve) => error!(code = ve.code(), error = %ve, "run failed"),
            None => error!(error = %format!("{e:#}"), "run failed"),
        }
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn print_config_location(args: &Args) {
    if let Some(p) = &args.config {
        out::print_info(&format!("Using --config (explicit):\n  {}\n", p.display()));
        return;
    }
    if let Ok(cfg_env) = std::env::var(crate::config::CONFIG_ENV) {
        out::print_info(&format!("Using VFO_CONFIG (explicit):\n  {}\n", cfg_env));
        out::print_info("To override, unset VFO_CONFIG or set it to another file.");
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default vfo config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path."),
    }
}
