//! End-to-end runs of the placement pipeline against temp inbox/library trees.

use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use std::path::PathBuf;

use vfo::{Config, FailureStore, GuessExtractor, JsonFailureStore, RunSummary};

struct Layout {
    td: TempDir,
    cfg: Config,
}

impl Layout {
    fn new(rulebook: &str, series: &[&str]) -> Self {
        let td = TempDir::new().unwrap();
        td.child("inbox").create_dir_all().unwrap();
        for s in series {
            td.child("series").child(s).create_dir_all().unwrap();
        }
        td.child("series").create_dir_all().unwrap();
        td.child("rule_book.xml")
            .write_str(&format!("<rulebook>\n{rulebook}\n</rulebook>\n"))
            .unwrap();
        let mut cfg = Config::new(
            td.child("inbox").path(),
            vec![td.child("series").to_path_buf()],
            td.child("rule_book.xml").path(),
        );
        cfg.failure_store = td.child("state").child("failures.json").to_path_buf();
        cfg.lock_file = td.child("vfo.lock").to_path_buf();
        Self { td, cfg }
    }

    fn inbox(&self, rel: &str) -> PathBuf {
        self.td.child("inbox").child(rel).to_path_buf()
    }

    fn series(&self, rel: &str) -> PathBuf {
        self.td.child("series").child(rel).to_path_buf()
    }

    fn put(&self, rel: &str, bytes: &[u8]) {
        let p = self.inbox(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, bytes).unwrap();
    }

    fn run(&self) -> RunSummary {
        let mut store = JsonFailureStore::open(&self.cfg.failure_store).unwrap();
        vfo::run(&self.cfg, &GuessExtractor, &mut store).unwrap()
    }

    fn store(&self) -> JsonFailureStore {
        JsonFailureStore::open(&self.cfg.failure_store).unwrap()
    }
}

#[test]
fn season_rule_creates_then_reuses_season_dir() {
    let l = Layout::new(r#"<series name="Westworld">season</series>"#, &["Westworld"]);
    l.put("Westworld.S02E05.720p.mkv", b"e5");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    let dest = l.series("Westworld/Season 2/Westworld.S02E05.720p.mkv");
    assert_eq!(fs::read(&dest).unwrap(), b"e5");
    assert!(!l.inbox("Westworld.S02E05.720p.mkv").exists());

    // Second episode: the existing season directory is reused, not recreated.
    l.put("Westworld.S02E06.720p.mkv", b"e6");
    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert!(l.series("Westworld/Season 2/Westworld.S02E06.720p.mkv").exists());
    let season_dirs = fs::read_dir(l.series("Westworld")).unwrap().count();
    assert_eq!(season_dirs, 1);
}

#[test]
fn existing_season_folder_with_suffix_is_used() {
    let l = Layout::new(r#"<series name="Lost">season</series>"#, &["Lost/season 1 (2004)"]);
    l.put("Lost.S01E02.mkv", b"x");
    l.run();
    assert!(l.series("Lost/season 1 (2004)/Lost.S01E02.mkv").exists());
    assert!(!l.series("Lost/Season 1").exists());
}

#[test]
fn episode_only_and_format_title_rename() {
    let l = Layout::new(
        r#"<series name="Show">episode-only parent-dir format-title "{{title}} - {{episode}}"</series>"#,
        &["Show"],
    );
    l.put("Show.S01E05.mkv", b"x");
    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert!(l.series("Show/Show - 15.mkv").exists());
}

#[test]
fn missing_sub_dir_fails_but_parent_dir_succeeds() {
    let l = Layout::new(
        r#"<series name="Lost">sub-dir Specials</series>
<series name="Fringe">parent-dir</series>"#,
        &["Lost", "Fringe"],
    );
    l.put("Lost.S00E01.mkv", b"special");
    l.put("Fringe.S01E01.mkv", b"pilot");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert!(l.series("Fringe/Fringe.S01E01.mkv").exists());
    assert_eq!(s.failed.len(), 1);
    assert_eq!(s.failed[0].0, "Lost.S00E01.mkv");
    assert!(s.failed[0].1.contains("no destination resolved"));
    assert!(l.inbox("Lost.S00E01.mkv").exists());
}

#[test]
fn failed_file_is_skipped_by_content_not_name() {
    let l = Layout::new(r#"<series name="Westworld">season</series>"#, &["Westworld"]);
    l.put("Unknown.Show.S01E01.mkv", b"same bytes");

    let s = l.run();
    assert_eq!(s.failed.len(), 1);
    assert_eq!(l.store().len(), 1);

    // Renamed, same bytes: skipped with the stored reason, not re-recorded.
    fs::rename(l.inbox("Unknown.Show.S01E01.mkv"), l.inbox("Renamed.S01E01.mkv")).unwrap();
    let s = l.run();
    assert_eq!(s.skipped, 1);
    assert!(s.failed.is_empty());
    assert_eq!(l.store().len(), 1);
    let hash = vfo::entries::hash_file(&l.inbox("Renamed.S01E01.mkv")).unwrap();
    let stored = l.store().lookup("Renamed.S01E01.mkv", &hash).unwrap();
    assert!(stored.contains("Unknown.Show.S01E01.mkv"));

    // Changed bytes: processed (and failing) again.
    fs::write(l.inbox("Renamed.S01E01.mkv"), b"different bytes").unwrap();
    let s = l.run();
    assert_eq!(s.skipped, 0);
    assert_eq!(s.failed.len(), 1);
    assert_eq!(l.store().len(), 2);
}

#[test]
fn release_directory_removed_once_after_all_members_move() {
    let l = Layout::new(r#"<series name="Westworld">season</series>"#, &["Westworld"]);
    l.put("Westworld.S01.1080p/Westworld.S01E01.mkv", b"1");
    l.put("Westworld.S01.1080p/Westworld.S01E02.mkv", b"2");
    l.put("Westworld.S01.1080p/release.nfo", b"nfo");

    let s = l.run();
    assert_eq!(s.moved.len(), 2);
    assert_eq!(s.deleted, 1);
    assert_eq!(s.delete_failures, 0);
    assert!(!l.inbox("Westworld.S01.1080p").exists());
    assert!(l.series("Westworld/Season 1/Westworld.S01E01.mkv").exists());
    assert!(l.series("Westworld/Season 1/Westworld.S01E02.mkv").exists());
}

#[test]
fn release_with_failed_member_is_kept() {
    let l = Layout::new(r#"<series name="Westworld">season</series>"#, &["Westworld"]);
    l.put("Pack/Westworld.S01E01.mkv", b"1");
    l.put("Pack/Mystery.S01E01.mkv", b"2");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert_eq!(s.failed.len(), 1);
    assert!(l.inbox("Pack").exists());
    assert!(!l.inbox("Pack/Westworld.S01E01.mkv").exists());
    assert!(l.inbox("Pack/Mystery.S01E01.mkv").exists());
}

#[test]
fn ignored_and_non_video_entries_are_untouched() {
    let mut l = Layout::new(r#"<series name="Westworld">parent-dir</series>"#, &["Westworld"]);
    l.cfg.ignore = vec!["incomplete".into()];
    l.put("incomplete/Westworld.S01E03.mkv", b"partial");
    l.put("notes.txt", b"hi");
    l.put("Westworld.S01E04.mkv", b"4");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert!(l.inbox("incomplete/Westworld.S01E03.mkv").exists());
    assert!(l.inbox("notes.txt").exists());
    assert!(l.series("Westworld/Westworld.S01E04.mkv").exists());
}

#[test]
fn dry_run_changes_nothing() {
    let mut l = Layout::new(r#"<series name="Westworld">season</series>"#, &["Westworld"]);
    l.cfg.dry_run = true;
    l.put("Westworld.S03E01.mkv", b"x");
    l.put("Nobody.S01E01.mkv", b"y");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert_eq!(
        s.moved[0].1,
        l.series("Westworld/Season 3/Westworld.S03E01.mkv")
    );
    assert_eq!(s.failed.len(), 1);
    assert!(!l.series("Westworld/Season 3").exists());
    assert!(l.inbox("Westworld.S03E01.mkv").exists());
    assert!(!l.cfg.failure_store.exists(), "dry run records no failures");
}

#[test]
fn movies_are_left_in_the_inbox() {
    let l = Layout::new(r#"<series name="Blade Runner">parent-dir</series>"#, &["Blade Runner"]);
    l.put("Blade.Runner.1982.mkv", b"m");
    let s = l.run();
    assert!(s.moved.is_empty());
    assert!(s.failed[0].1.contains("no rule handler"));
    assert!(l.inbox("Blade.Runner.1982.mkv").exists());
}

#[test]
fn release_with_video_beyond_walk_depth_is_kept() {
    let l = Layout::new(r#"<series name="Westworld">season</series>"#, &["Westworld"]);
    l.put("Westworld.S01/Westworld.S01E01.mkv", b"1");
    l.put("Westworld.S01/a/b/Westworld.S01E02.mkv", b"2");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert!(l.series("Westworld/Season 1/Westworld.S01E01.mkv").exists());
    assert!(!l.inbox("Westworld.S01/Westworld.S01E01.mkv").exists());
    assert_eq!(fs::read(l.inbox("Westworld.S01/a/b/Westworld.S01E02.mkv")).unwrap(), b"2");
}

#[test]
fn second_file_for_the_same_destination_fails() {
    let l = Layout::new(
        r#"<series name="Show">episode-only parent-dir format-title "{{title}} - {{episode}}"</series>"#,
        &["Show"],
    );
    l.put("Show.S01E05.mkv", b"AAAA");
    l.put("Show.S01E05.720p.mkv", b"BBBB");

    let s = l.run();
    assert_eq!(s.moved.len(), 1);
    assert_eq!(s.failed.len(), 1);
    assert!(s.failed[0].1.contains("already claimed"));
    // Scan order is by name: the 720p release sorts first and keeps the destination.
    assert_eq!(s.failed[0].0, "Show.S01E05.mkv");
    assert_eq!(fs::read(l.series("Show/Show - 15.mkv")).unwrap(), b"BBBB");
    assert_eq!(fs::read(l.inbox("Show.S01E05.mkv")).unwrap(), b"AAAA");
    assert_eq!(l.store().len(), 1);
}

#[test]
fn copy_failure_aborts_before_any_deletion() {
    let l = Layout::new(r#"<series name="Westworld">parent-dir</series>"#, &["Westworld"]);
    l.put("Westworld.S01E01.mkv", b"1");
    l.put("Westworld.S01E02.mkv", b"2");
    // A non-empty directory where the second file should land cannot be replaced.
    fs::create_dir_all(l.series("Westworld/Westworld.S01E02.mkv/keep")).unwrap();

    let mut store = JsonFailureStore::open(&l.cfg.failure_store).unwrap();
    let err = vfo::run(&l.cfg, &GuessExtractor, &mut store).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<vfo::VfoError>(),
        Some(vfo::VfoError::CopyFailed { .. })
    ));
    assert!(l.series("Westworld/Westworld.S01E01.mkv").exists());
    assert!(l.inbox("Westworld.S01E01.mkv").exists());
    assert!(l.inbox("Westworld.S01E02.mkv").exists());
}
