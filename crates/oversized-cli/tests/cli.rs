//! End-to-end tests for the git-oversized binary
//!
//! Each test drives the real binary inside a scratch `git init` repository.
//! Remote-touching paths are exercised elsewhere against a mock backend;
//! here `init --offline` keeps everything local.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn git_repo() -> TempDir {
    let td = TempDir::new().unwrap();
    let status = std::process::Command::new("git")
        .args(["init", "-q"])
        .current_dir(td.path())
        .status()
        .unwrap();
    assert!(status.success());
    td
}

fn oversized(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("git-oversized").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success());
}

fn pointer_sha256(pointer: &[u8]) -> String {
    let text = std::str::from_utf8(pointer).unwrap();
    let field = "\"sha256\":\"";
    let start = text.find(field).unwrap() + field.len();
    text[start..start + 64].to_string()
}

fn init_offline(dir: &Path) {
    oversized(dir)
        .args(["init", "--bucket", "demo-bucket", "--prefix", "team/demo", "--offline"])
        .assert()
        .success();
}

#[test]
fn test_init_persists_config_and_installs_filter() {
    let repo = git_repo();
    init_offline(repo.path());

    let config = fs::read_to_string(repo.path().join(".git/config")).unwrap();
    assert!(config.contains("[oversized]"));
    assert!(config.contains("bucket = demo-bucket"));
    assert!(config.contains("prefix = team/demo"));
    assert!(config.contains("[filter \"oversized\"]"));
    assert!(config.contains("git-oversized filter-clean %f"));
    assert!(config.contains("required = true"));

    assert!(repo.path().join(".git/oversized/objects").is_dir());
    assert!(repo.path().join(".git/oversized/tmp").is_dir());
}

#[test]
fn test_init_rejects_bad_bucket_name() {
    let repo = git_repo();
    oversized(repo.path())
        .args(["init", "--bucket", "Not_A_Valid_Bucket", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bucket"));
}

#[test]
fn test_track_and_untrack_edit_gitattributes() {
    let repo = git_repo();

    oversized(repo.path())
        .args(["track", "*.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracking *.bin"));

    let attrs = fs::read_to_string(repo.path().join(".gitattributes")).unwrap();
    assert_eq!(attrs, "*.bin filter=oversized\n");

    oversized(repo.path())
        .args(["untrack", "*.bin"])
        .assert()
        .success();

    let attrs = fs::read_to_string(repo.path().join(".gitattributes")).unwrap();
    assert_eq!(attrs, "");
}

#[test]
fn test_filter_clean_emits_pointer_and_stores_object() {
    let repo = git_repo();
    let body = vec![0xABu8; 10_000];

    let assert = oversized(repo.path())
        .arg("filter-clean")
        .write_stdin(body.clone())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"magic\":\"oversized-v001\""))
        .stdout(predicate::str::contains("\"length\":10000"));

    // Exactly one object landed in the store.
    let pointer = assert.get_output().stdout.clone();
    let objects: Vec<_> = fs::read_dir(repo.path().join(".git/oversized/objects"))
        .unwrap()
        .collect();
    assert_eq!(objects.len(), 1);

    // Smudging the pointer back yields the original bytes.
    let restored = oversized(repo.path())
        .arg("filter-smudge")
        .write_stdin(pointer)
        .assert()
        .success();
    assert_eq!(restored.get_output().stdout, body);
}

#[test]
fn test_filter_clean_is_idempotent() {
    let repo = git_repo();

    let first = oversized(repo.path())
        .arg("filter-clean")
        .write_stdin("some large file body")
        .assert()
        .success();
    let pointer = first.get_output().stdout.clone();

    let second = oversized(repo.path())
        .arg("filter-clean")
        .write_stdin(pointer.clone())
        .assert()
        .success();
    assert_eq!(second.get_output().stdout, pointer);
}

#[test]
fn test_filter_smudge_passes_plain_content_through() {
    let repo = git_repo();

    let out = oversized(repo.path())
        .arg("filter-smudge")
        .write_stdin("just a text file\n")
        .assert()
        .success();
    assert_eq!(out.get_output().stdout, b"just a text file\n");
}

#[test]
fn test_status_reports_counts() {
    let repo = git_repo();
    init_offline(repo.path());

    oversized(repo.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("bucket"))
        .stdout(predicate::str::contains("local objects"));
}

#[test]
fn test_status_without_init_points_at_init() {
    let repo = git_repo();

    oversized(repo.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("git oversized init"));
}

#[test]
fn test_gc_dry_run_lists_orphans_without_deleting() {
    let repo = git_repo();
    init_offline(repo.path());

    // Store an object nothing references.
    oversized(repo.path())
        .arg("filter-clean")
        .write_stdin("orphaned body")
        .assert()
        .success();

    oversized(repo.path())
        .args(["gc", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would remove 1 object"));

    let objects: Vec<_> = fs::read_dir(repo.path().join(".git/oversized/objects"))
        .unwrap()
        .collect();
    assert_eq!(objects.len(), 1);
}

#[test]
fn test_gc_keeps_committed_pointer_and_removes_orphan() {
    let repo = git_repo();
    init_offline(repo.path());

    // Clean a body into the store and commit the resulting pointer record.
    let cleaned = oversized(repo.path())
        .arg("filter-clean")
        .write_stdin("keep this body")
        .assert()
        .success();
    let pointer = cleaned.get_output().stdout.clone();
    let kept_hex = pointer_sha256(&pointer);

    fs::write(repo.path().join("kept.bin"), &pointer).unwrap();
    git(repo.path(), &["add", "kept.bin"]);
    git(repo.path(), &["commit", "-q", "-m", "add kept.bin"]);

    // A second object nothing references.
    oversized(repo.path())
        .arg("filter-clean")
        .write_stdin("orphan body")
        .assert()
        .success();

    oversized(repo.path())
        .args(["gc", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 objects"));

    // Exactly the committed object survives.
    let names: Vec<String> = fs::read_dir(repo.path().join(".git/oversized/objects"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![kept_hex]);
}

#[test]
fn test_gc_yes_removes_orphans() {
    let repo = git_repo();
    init_offline(repo.path());

    oversized(repo.path())
        .arg("filter-clean")
        .write_stdin("orphaned body")
        .assert()
        .success();

    oversized(repo.path())
        .args(["gc", "--yes"])
        .assert()
        .success();

    let objects: Vec<_> = fs::read_dir(repo.path().join(".git/oversized/objects"))
        .unwrap()
        .collect();
    assert!(objects.is_empty());
}

#[test]
fn test_verify_reports_intact_store() {
    let repo = git_repo();
    init_offline(repo.path());

    oversized(repo.path())
        .arg("filter-clean")
        .write_stdin("verified body")
        .assert()
        .success();

    oversized(repo.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("All objects intact (1 checked)"));
}

#[test]
fn test_completions_generate() {
    Command::cargo_bin("git-oversized")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("git-oversized"));
}

#[test]
fn test_outside_a_repository_fails_cleanly() {
    let td = TempDir::new().unwrap();
    oversized(td.path())
        .arg("status")
        .assert()
        .failure()
        .code(1);
}
