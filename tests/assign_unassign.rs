//! End-to-end coverage of the assignment engine against real repositories.

mod common;

use common::*;
use divvy::core::{assign, NullSink};
use tempfile::TempDir;

#[test]
fn assign_commits_to_staging_and_copies_into_workspace() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    let outcome = assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();

    assert_eq!(outcome.assigned, vec!["a.txt"]);
    assert!(outcome.failed.is_empty());
    assert!(outcome.workspace_created);

    // Staging is clean and the change is historical.
    assert_eq!(git_stdout(&repo, &["status", "--porcelain"]), "");
    let subject = git_stdout(&repo, &["log", "-1", "--format=%s"]);
    assert_eq!(subject, "Assign a.txt to ws");
    let body = git_stdout(&repo, &["log", "-1", "--format=%B"]);
    assert!(body.contains("Divvy: a.txt -> ws"));

    // The workspace has the file content.
    let ws = workspace_dir(&repo, "ws");
    assert!(ws.exists());
    assert_eq!(read(&ws, "a.txt"), "1\n");
}

#[test]
fn assign_to_existing_workspace_leaves_uncommitted_copy() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "seed.txt", "s\n");
    assign::assign(&ctx, "ws", &["seed.txt".to_string()], &mut NullSink).unwrap();

    write(&repo, "b.txt", "b\n");
    let outcome = assign::assign(&ctx, "ws", &["b.txt".to_string()], &mut NullSink).unwrap();
    assert_eq!(outcome.assigned, vec!["b.txt"]);
    assert!(!outcome.workspace_created);

    // Existing workspace: the copy is an uncommitted change.
    let ws = workspace_dir(&repo, "ws");
    assert_eq!(read(&ws, "b.txt"), "b\n");
    let porcelain = git_stdout(&ws, &["status", "--porcelain"]);
    assert!(porcelain.contains("b.txt"), "expected b.txt pending, got: {porcelain}");
}

#[test]
fn assign_rejects_paths_without_pending_changes() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    let outcome = assign::assign(
        &ctx,
        "ws",
        &["a.txt".to_string(), "missing.txt".to_string()],
        &mut NullSink,
    )
    .unwrap();

    assert_eq!(outcome.assigned, vec!["a.txt"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "missing.txt");
}

#[test]
fn assign_all_pending_takes_every_path() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "one.txt", "1\n");
    write(&repo, "two.txt", "2\n");
    let outcome = assign::assign(&ctx, "ws", &[], &mut NullSink).unwrap();

    assert_eq!(outcome.assigned.len(), 2);
    assert_eq!(git_stdout(&repo, &["status", "--porcelain"]), "");
}

#[test]
fn assign_then_unassign_round_trips_a_modified_file() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    // Track the file on staging, then seed a workspace before touching it,
    // so the workspace holds an uncommitted copy of the assignment.
    write(&repo, "a.txt", "old\n");
    git(&repo, &["add", "a.txt"]);
    git(&repo, &["commit", "-m", "Track a.txt"]);
    write(&repo, "seed.txt", "s\n");
    assign::assign(&ctx, "ws", &["seed.txt".to_string()], &mut NullSink).unwrap();

    write(&repo, "a.txt", "new\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    let ws = workspace_dir(&repo, "ws");
    assert_eq!(read(&ws, "a.txt"), "new\n");

    let outcome = assign::unassign(&ctx, "ws", Some("a.txt"), &mut NullSink).unwrap();
    assert_eq!(outcome.reverted, vec!["a.txt"]);

    // Staging content restored exactly; no trace left in the workspace.
    assert_eq!(read(&repo, "a.txt"), "old\n");
    assert_eq!(read(&ws, "a.txt"), "old\n");
    let porcelain = git_stdout(&ws, &["status", "--porcelain"]);
    assert!(!porcelain.contains("a.txt"), "workspace still dirty: {porcelain}");
}

#[test]
fn unassign_restores_old_content_in_a_workspace_created_by_the_assignment() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "old\n");
    git(&repo, &["add", "a.txt"]);
    git(&repo, &["commit", "-m", "Track a.txt"]);

    // The assignment itself creates the workspace, so its branch history
    // contains the assigned content.
    write(&repo, "a.txt", "new\n");
    let outcome = assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    assert!(outcome.workspace_created);

    assign::unassign(&ctx, "ws", Some("a.txt"), &mut NullSink).unwrap();

    assert_eq!(read(&repo, "a.txt"), "old\n");
    let ws = workspace_dir(&repo, "ws");
    assert_eq!(read(&ws, "a.txt"), "old\n");
}

#[test]
fn unassign_removes_a_new_file_from_a_workspace_created_by_the_assignment() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "f.txt", "f\n");
    let outcome = assign::assign(&ctx, "ws", &["f.txt".to_string()], &mut NullSink).unwrap();
    assert!(outcome.workspace_created);

    assign::unassign(&ctx, "ws", Some("f.txt"), &mut NullSink).unwrap();

    assert!(!repo.join("f.txt").exists());
    assert!(!workspace_dir(&repo, "ws").join("f.txt").exists());
}

#[test]
fn unassign_removes_files_created_by_the_assignment() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "seed.txt", "s\n");
    assign::assign(&ctx, "ws", &["seed.txt".to_string()], &mut NullSink).unwrap();

    write(&repo, "fresh.txt", "f\n");
    assign::assign(&ctx, "ws", &["fresh.txt".to_string()], &mut NullSink).unwrap();
    let ws = workspace_dir(&repo, "ws");
    assert!(ws.join("fresh.txt").exists());

    assign::unassign(&ctx, "ws", Some("fresh.txt"), &mut NullSink).unwrap();

    assert!(!repo.join("fresh.txt").exists());
    assert!(!ws.join("fresh.txt").exists());
}

#[test]
fn unassign_all_reverts_every_assignment_newest_first() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    for name in ["one.txt", "two.txt", "three.txt"] {
        write(&repo, name, name);
        assign::assign(&ctx, "ws", &[name.to_string()], &mut NullSink).unwrap();
    }

    let outcome = assign::unassign(&ctx, "ws", None, &mut NullSink).unwrap();
    assert_eq!(outcome.reverted, vec!["three.txt", "two.txt", "one.txt"]);

    // Nothing active remains.
    let active = assign::active_assignments(&ctx, "ws", None).unwrap();
    assert!(active.is_empty());

    // A second unassign has nothing to do and says so.
    let err = assign::unassign(&ctx, "ws", None, &mut NullSink).unwrap_err();
    assert!(err.to_string().contains("No active assignments"));
}

#[test]
fn unassign_all_requires_a_clean_staging_worktree() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();

    write(&repo, "unrelated.txt", "pending\n");
    let err = assign::unassign(&ctx, "ws", None, &mut NullSink).unwrap_err();
    assert!(err.to_string().contains("uncommitted changes"));
}

#[test]
fn unassign_errors_when_nothing_matches() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();

    let err = assign::unassign(&ctx, "ws", Some("other.txt"), &mut NullSink).unwrap_err();
    assert!(err.to_string().contains("No active assignment"));
}

#[test]
fn active_assignments_skip_reverted_commits() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    assert_eq!(assign::active_assignments(&ctx, "ws", None).unwrap().len(), 1);

    assign::unassign(&ctx, "ws", Some("a.txt"), &mut NullSink).unwrap();
    assert!(assign::active_assignments(&ctx, "ws", None).unwrap().is_empty());

    // Re-assigning the same path creates a fresh active assignment.
    write(&repo, "a.txt", "2\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    assert_eq!(assign::active_assignments(&ctx, "ws", None).unwrap().len(), 1);
}

#[test]
fn assignments_for_other_workspaces_are_untouched() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    assign::assign(&ctx, "alpha", &["a.txt".to_string()], &mut NullSink).unwrap();
    write(&repo, "b.txt", "2\n");
    assign::assign(&ctx, "beta", &["b.txt".to_string()], &mut NullSink).unwrap();

    let outcome = assign::unassign(&ctx, "beta", None, &mut NullSink).unwrap();
    assert_eq!(outcome.reverted, vec!["b.txt"]);
    assert_eq!(assign::active_assignments(&ctx, "alpha", None).unwrap().len(), 1);
}
