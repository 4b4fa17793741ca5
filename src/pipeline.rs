//! One organizer run, end to end.
//!
//! Order of work:
//! 1. take the run lock (a timeout ends the run quietly),
//! 2. scan the inbox and build the folder index and rule book,
//! 3. per media file on the rayon pool: hash, failure-store check, match, plan,
//! 4. fail later files that plan a destination an earlier file already claimed,
//! 5. record new failures and persist the store,
//! 6. keep release directories holding any unplaced video out of the delete queue,
//! 7. copy every planned file, then run the deferred deletions.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::entries::{Inbox, MediaFile, ScanFilter, VideoExtensions, videos_under};
use crate::errors::MatchError;
use crate::failures::FailureStore;
use crate::folders::FolderIndex;
use crate::lock::RunGuard;
use crate::matchers::Matcher;
use crate::metadata::MetadataExtractor;
use crate::rules::{PlanContext, RuleBook, plan_transfer};
use crate::shutdown;
use crate::transfer::TransferSession;

/// What a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Another run held the lock; nothing was touched.
    pub locked_out: bool,
    /// Ctrl-C arrived before every file was handled.
    pub interrupted: bool,
    /// (source, destination) for each copied file, in transfer order.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// (file name, reason) for files that failed this run.
    pub failed: Vec<(String, String)>,
    /// Files skipped because of an earlier recorded failure or an interrupt.
    pub skipped: usize,
    pub deleted: usize,
    pub delete_failures: usize,
}

/// Run the placement pipeline once.
pub fn run(
    cfg: &Config,
    extractor: &dyn MetadataExtractor,
    store: &mut dyn FailureStore,
) -> Result<RunSummary> {
    let Some(guard) = RunGuard::acquire(&cfg.lock_file, cfg.lock_timeout)
        .context("acquire run lock")?
    else {
        return Ok(RunSummary {
            locked_out: true,
            ..Default::default()
        });
    };
    debug!(lock = %guard.path().display(), "run lock held");

    let filter = ScanFilter {
        ignore: cfg.ignore.clone(),
        whitelist: cfg.whitelist.clone(),
    };
    let exts = VideoExtensions::new(&cfg.video_extensions);
    let inbox = Inbox::scan(&cfg.input_dir, exts.clone(), &filter)?;
    let folders = FolderIndex::build(&cfg.series_dirs, &cfg.ignore)?;
    let rulebook = RuleBook::load(&cfg.rulebook)
        .with_context(|| format!("load rule book '{}'", cfg.rulebook.display()))?;
    let mut files = inbox.into_media_files();
    info!(
        media = files.len(),
        folders = folders.len(),
        series = rulebook.len(),
        dry_run = cfg.dry_run,
        "run started"
    );

    let ctx = PlanContext { dry_run: cfg.dry_run };
    let matcher = Matcher::new(extractor, &rulebook, &folders);
    {
        let lookup: &dyn FailureStore = &*store;
        files
            .par_iter_mut()
            .for_each(|f| evaluate(f, &matcher, lookup, &ctx));
    }

    claim_destinations(&mut files);
    record_failures(&files, store, cfg.dry_run)?;
    contain_releases(&mut files, &exts);

    let mut summary = RunSummary::default();
    let mut session = TransferSession::new(cfg.dry_run);
    let mut interrupted_roots: HashSet<PathBuf> = HashSet::new();
    for f in &files {
        if let Some(err) = f.error() {
            match err {
                MatchError::PreviouslyFailed(_) => summary.skipped += 1,
                other => summary.failed.push((f.name.clone(), other.to_string())),
            }
            continue;
        }
        if f.plan.is_none() {
            summary.skipped += 1;
            continue;
        }
        if shutdown::is_requested() {
            summary.interrupted = true;
            summary.skipped += 1;
            if let Some(root) = f.plan.as_ref().and_then(|p| p.delete_root.as_ref()) {
                interrupted_roots.insert(root.clone());
            }
            continue;
        }
        let dest = session.transfer(f)?;
        summary.moved.push((f.path.clone(), dest.to_path_buf()));
    }
    if summary.interrupted {
        warn!("interrupt received; remaining files left in the inbox");
        for root in &interrupted_roots {
            session.hold_root(root);
        }
    }

    debug!(queued = session.queued().len(), "transfers done");
    let report = session.finish();
    summary.deleted = report.deleted.len();
    summary.delete_failures = report.failed.len();
    info!(
        moved = summary.moved.len(),
        failed = summary.failed.len(),
        skipped = summary.skipped,
        deleted = summary.deleted,
        delete_failures = summary.delete_failures,
        "run finished"
    );
    Ok(summary)
}

/// Hash, check the failure store, match and plan one file. Failures stay on the file.
fn evaluate(file: &mut MediaFile, matcher: &Matcher<'_>, store: &dyn FailureStore, ctx: &PlanContext) {
    if shutdown::is_requested() {
        return;
    }
    let hash = match file.hash() {
        Ok(h) => h.to_string(),
        Err(e) => {
            let err = MatchError::Hash {
                path: file.path.clone(),
                reason: e.to_string(),
            };
            warn!(file = %file.name, error = %e, "hashing failed");
            file.fail(err);
            return;
        }
    };
    if let Some(message) = store.lookup(&file.name, &hash) {
        info!(file = %file.name, reason = %message, "skipping previously failed file");
        file.fail(MatchError::PreviouslyFailed(message));
        return;
    }
    if let Err(e) = matcher.match_file(file) {
        file.fail(e);
        return;
    }
    match plan_transfer(file, ctx) {
        Ok(plan) => {
            debug!(file = %file.name, dest = %plan.destination.display(), "planned");
            file.plan = Some(plan);
        }
        Err(e) => {
            info!(file = %file.name, reason = %e, "planning failed");
            file.fail(e);
        }
    }
}

/// Write this run's new failures; a dry run records nothing.
fn record_failures(files: &[MediaFile], store: &mut dyn FailureStore, dry_run: bool) -> Result<()> {
    if dry_run {
        return Ok(());
    }
    for f in files {
        if let Some(err) = f.error()
            && err.is_recordable()
            && let Ok(hash) = f.hash()
        {
            store.record(&f.name, hash, &err.to_string());
        }
    }
    store.persist()
}

/// Two files planning the same destination would overwrite each other; the first
/// in scan order keeps it and the rest fail.
fn claim_destinations(files: &mut [MediaFile]) {
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    for f in files.iter_mut() {
        let Some(plan) = f.plan.as_ref() else {
            continue;
        };
        if let Some(owner) = claimed.get(&plan.destination) {
            let err = MatchError::DestinationClaimed {
                dest: plan.destination.clone(),
                claimed_by: owner.clone(),
            };
            warn!(file = %f.name, reason = %err, "destination collision");
            f.plan = None;
            f.fail(err);
        } else {
            claimed.insert(plan.destination.clone(), f.name.clone());
        }
    }
}

/// A release directory is only deleted whole when every video under it, at any
/// depth, is placed by this run. Otherwise its placed files delete only themselves.
fn contain_releases(files: &mut [MediaFile], exts: &VideoExtensions) {
    let planned: HashSet<&Path> = files
        .iter()
        .filter_map(|f| f.plan.as_ref())
        .map(|p| p.source.as_path())
        .collect();
    let roots: HashSet<&Path> = files
        .iter()
        .filter_map(|f| f.plan.as_ref()?.delete_root.as_deref())
        .collect();

    let mut held: HashSet<PathBuf> = HashSet::new();
    for root in roots {
        match videos_under(root, exts) {
            Ok(videos) => {
                if let Some(stray) = videos.iter().find(|v| !planned.contains(v.as_path())) {
                    info!(release = %root.display(), unplaced = %stray.display(), "release holds unplaced video");
                    held.insert(root.to_path_buf());
                }
            }
            Err(e) => {
                warn!(release = %root.display(), error = %e, "could not walk release; keeping it");
                held.insert(root.to_path_buf());
            }
        }
    }
    if held.is_empty() {
        return;
    }
    for f in files.iter_mut() {
        if let Some(plan) = f.plan.as_mut()
            && plan.delete_root.as_ref().is_some_and(|r| held.contains(r))
        {
            debug!(file = %f.name, "deleting only this file from its release");
            plan.delete_root = None;
        }
    }
}
