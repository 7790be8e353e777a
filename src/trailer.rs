//! Assignment trailer encoding and parsing.
//!
//! Ownership of a staged change is recorded directly in history: an
//! assignment commit's message ends with a trailer line of the form
//!
//! ```text
//! Divvy: <path> -> <workspace>
//! ```
//!
//! The `Divvy:` prefix keeps the trailer from colliding with naturally
//! occurring commit messages; a line is only recognized when the whole line
//! has exactly this shape. `git log --grep` narrows candidate commits, but
//! the strict parse here is authoritative.

use regex::Regex;
use std::sync::OnceLock;

/// A parsed assignment trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub path: String,
    pub workspace: String,
}

fn trailer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy path group: on a path that itself contains " -> ", the
    // rightmost arrow separates path from workspace.
    RE.get_or_init(|| Regex::new(r"(?m)^Divvy: (.+) -> (\S+)$").expect("valid trailer regex"))
}

fn revert_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"This reverts commit ([0-9a-f]{40})").expect("valid revert regex")
    })
}

/// The trailer line for an assignment.
pub fn format_trailer(path: &str, workspace: &str) -> String {
    format!("Divvy: {path} -> {workspace}")
}

/// The full commit message for an assignment commit.
pub fn assignment_message(path: &str, workspace: &str) -> String {
    format!(
        "Assign {path} to {workspace}\n\n{}\n",
        format_trailer(path, workspace)
    )
}

/// Parse the assignment trailer out of a commit message, if present.
/// When a message somehow carries several trailer lines, the last one wins.
pub fn parse_trailer(message: &str) -> Option<Assignment> {
    trailer_re()
        .captures_iter(message)
        .last()
        .map(|caps| Assignment {
            path: caps[1].to_string(),
            workspace: caps[2].to_string(),
        })
}

/// The SHA named by a `git revert` commit message, if this is one.
pub fn reverted_sha(message: &str) -> Option<String> {
    revert_re()
        .captures(message)
        .map(|caps| caps[1].to_string())
}

/// `git log --grep` pattern (extended regexp) matching assignment commits
/// for a workspace, optionally narrowed to a single path.
pub fn grep_pattern(path: Option<&str>, workspace: &str) -> String {
    match path {
        Some(path) => format!(
            "^Divvy: {} -> {}$",
            ere_escape(path),
            ere_escape(workspace)
        ),
        None => format!("^Divvy: .* -> {}$", ere_escape(workspace)),
    }
}

/// `git log --grep` pattern matching revert commits.
pub fn revert_grep_pattern() -> String {
    "^This reverts commit [0-9a-f]+".to_string()
}

/// Escape a literal string for POSIX extended regular expressions.
fn ere_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
