//! Lifecycle coverage: the applied flag as work moves between a workspace
//! and the staging branch.

mod common;

use common::*;
use divvy::core::status::{self, Applied};
use divvy::core::{apply, assign, NullSink};
use tempfile::TempDir;

fn single_status(ctx: &divvy::core::StagingContext) -> status::WorkspaceStatus {
    let all = status::collect(ctx).unwrap();
    assert_eq!(all.len(), 1, "expected exactly one workspace");
    all.into_iter().next().unwrap()
}

#[test]
fn fresh_workspace_is_up_to_date() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "f.txt", "f\n");
    assign::assign(&ctx, "ws", &["f.txt".to_string()], &mut NullSink).unwrap();

    let st = single_status(&ctx);
    assert_eq!(st.name, "ws");
    assert_eq!(st.unmerged, 0);
    assert_eq!(st.applied, Applied::UpToDate);
    assert!(st.is_applied());
    assert!(!st.dirty);
    assert_eq!(st.ahead, None);
    assert_eq!(st.behind, None);
}

#[test]
fn workspace_commit_flips_to_not_applied_until_applied() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "1\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    let ws = workspace_dir(&repo, "ws");
    assert_eq!(single_status(&ctx).applied, Applied::UpToDate);

    // Independent work in the workspace: edit the assigned file and commit.
    write(&ws, "a.txt", "2\n");
    commit_all(&ws, "Bump a.txt");

    let st = single_status(&ctx);
    assert_eq!(st.unmerged, 1);
    assert_eq!(st.applied, Applied::No { unmatched: 1 });
    assert!(!st.is_applied());

    let outcome = apply::apply(&ctx, "ws", &mut NullSink).unwrap();
    assert_eq!(outcome.picked.len(), 1);
    assert_eq!(read(&repo, "a.txt"), "2\n");

    // The workspace commit now has a patch-identity twin on staging.
    let st = single_status(&ctx);
    assert_eq!(st.unmerged, 1);
    assert_eq!(st.applied, Applied::PatchMatched);
    assert!(st.is_applied());
}

#[test]
fn pending_assignment_explains_divergence() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "f.txt", "f\n");
    assign::assign(&ctx, "ws", &["f.txt".to_string()], &mut NullSink).unwrap();
    let ws = workspace_dir(&repo, "ws");

    write(&ws, "feature.txt", "feature\n");
    commit_all(&ws, "Add feature");

    // A later assignment to the same workspace sits on staging; the
    // workspace branch has not absorbed it.
    write(&repo, "g.txt", "g\n");
    assign::assign(&ctx, "ws", &["g.txt".to_string()], &mut NullSink).unwrap();

    let st = single_status(&ctx);
    assert_eq!(st.unmerged, 1);
    assert_eq!(st.applied, Applied::Assigned);
    assert!(st.is_applied());
}

#[test]
fn apply_with_nothing_unmerged_picks_nothing() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "f.txt", "f\n");
    assign::assign(&ctx, "ws", &["f.txt".to_string()], &mut NullSink).unwrap();

    let outcome = apply::apply(&ctx, "ws", &mut NullSink).unwrap();
    assert!(outcome.picked.is_empty());
}

#[test]
fn apply_unknown_workspace_errors() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    let err = apply::apply(&ctx, "nowhere", &mut NullSink).unwrap_err();
    assert!(err.to_string().contains("No workspace named 'nowhere'"));
}

#[test]
fn apply_picks_multiple_commits_in_graph_order() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "f.txt", "f\n");
    assign::assign(&ctx, "ws", &["f.txt".to_string()], &mut NullSink).unwrap();
    let ws = workspace_dir(&repo, "ws");

    write(&ws, "first.txt", "1\n");
    commit_all(&ws, "First");
    write(&ws, "second.txt", "2\n");
    commit_all(&ws, "Second");

    let outcome = apply::apply(&ctx, "ws", &mut NullSink).unwrap();
    assert_eq!(outcome.picked.len(), 2);

    // Oldest first: staging history shows First before Second.
    let subjects = git_stdout(&repo, &["log", "--format=%s", "-2"]);
    let subjects: Vec<&str> = subjects.lines().collect();
    assert_eq!(subjects, vec!["Second", "First"]);
    assert_eq!(read(&repo, "first.txt"), "1\n");
    assert_eq!(read(&repo, "second.txt"), "2\n");
}

#[test]
fn unapply_reverts_assignments_like_unassign_all() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "a\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    write(&repo, "b.txt", "b\n");
    assign::assign(&ctx, "ws", &["b.txt".to_string()], &mut NullSink).unwrap();

    let outcome = apply::unapply(&ctx, "ws", &mut NullSink).unwrap();
    assert_eq!(outcome.reverted, vec!["b.txt", "a.txt"]);
    assert!(!repo.join("a.txt").exists());
    assert!(!repo.join("b.txt").exists());
}

#[test]
fn apply_then_unapply_reverts_assignments_and_keeps_applied_commits() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "a.txt", "a\n");
    assign::assign(&ctx, "ws", &["a.txt".to_string()], &mut NullSink).unwrap();
    let ws = workspace_dir(&repo, "ws");

    write(&ws, "feature.txt", "feature\n");
    commit_all(&ws, "Add feature");

    let applied = apply::apply(&ctx, "ws", &mut NullSink).unwrap();
    assert_eq!(applied.picked.len(), 1);
    assert_eq!(read(&repo, "feature.txt"), "feature\n");

    // Unapply operates on assignment commits alone: the assigned file is
    // reverted, the cherry-picked workspace commit stays on staging.
    let outcome = apply::unapply(&ctx, "ws", &mut NullSink).unwrap();
    assert_eq!(outcome.reverted, vec!["a.txt"]);
    assert!(!repo.join("a.txt").exists());
    assert!(!ws.join("a.txt").exists());
    assert_eq!(read(&repo, "feature.txt"), "feature\n");
}

#[test]
fn merged_upstream_tracks_the_integration_branch() {
    let tmp = TempDir::new().unwrap();
    let repo = init_staging_repo(tmp.path());
    let ctx = ctx(&repo);

    write(&repo, "f.txt", "f\n");
    assign::assign(&ctx, "ws", &["f.txt".to_string()], &mut NullSink).unwrap();

    let st = single_status(&ctx);
    assert!(!st.merged_upstream, "no integration branch exists yet");

    // An integration branch containing the workspace tip marks it merged.
    git(&repo, &["branch", "main", "ws"]);
    let st = single_status(&ctx);
    assert!(st.merged_upstream);
}
