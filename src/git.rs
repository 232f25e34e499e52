use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};

/// Metadata key for the commit hash.
pub const KEY_HASH: &str = "git-hash";
/// Metadata key for the commit date (ISO-8601).
pub const KEY_DATE: &str = "git-date";
/// Metadata key for the commit author name.
pub const KEY_AUTHOR: &str = "git-author";
/// Metadata key for the uncommitted working-tree diff.
pub const KEY_DIFF: &str = "git-diff";

/// Field separator used in the `git log` format string.
const LOG_SEPARATOR: &str = " || ";

/// A snapshot of the repository state at save time.
///
/// Produced fresh by [`query`] on every save; never cached. The three
/// identity fields are always present together — if any of the underlying
/// git queries fails, the whole snapshot is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Full hash of the latest commit.
    #[serde(rename = "git-hash")]
    pub hash: String,
    /// Commit date, ISO-8601.
    #[serde(rename = "git-date")]
    pub date: String,
    /// Commit author name.
    #[serde(rename = "git-author")]
    pub author: String,
    /// Raw `git diff HEAD` output, present only when the working tree has
    /// uncommitted changes.
    #[serde(rename = "git-diff", skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl CommitInfo {
    /// The embedded key/value pairs, in key order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            (KEY_HASH, self.hash.as_str()),
            (KEY_DATE, self.date.as_str()),
            (KEY_AUTHOR, self.author.as_str()),
        ];
        if let Some(ref diff) = self.diff {
            fields.push((KEY_DIFF, diff.as_str()));
        }
        fields
    }

    /// Whether the working tree had uncommitted changes at query time.
    pub fn is_dirty(&self) -> bool {
        self.diff.is_some()
    }
}

/// Query the repository surrounding the current working directory.
///
/// Returns `None` when there is no repository, git is not installed, or
/// either query exits non-zero. Partial info is never returned.
pub fn query(quiet: bool) -> Option<CommitInfo> {
    query_in(None, quiet)
}

/// Query the repository surrounding `dir` (or the process CWD when `None`).
pub fn query_in(dir: Option<&Path>, quiet: bool) -> Option<CommitInfo> {
    let format_arg = format!("--format=%H{LOG_SEPARATOR}%ad{LOG_SEPARATOR}%an");
    let log_line = run_git(dir, &["log", "-1", "--date=iso8601", &format_arg])?;

    let mut parts = log_line.trim().splitn(3, LOG_SEPARATOR);
    let hash = parts.next()?.trim().to_string();
    let date = parts.next()?.trim().to_string();
    let author = parts.next()?.trim().to_string();
    if hash.is_empty() || date.is_empty() || author.is_empty() {
        log::debug!("unexpected git log output: {log_line:?}");
        return None;
    }

    let diff_text = run_git(dir, &["diff", "HEAD"])?;
    let diff = if diff_text.trim().is_empty() {
        None
    } else {
        if !quiet {
            log::warn!("working tree has uncommitted changes; embedding the diff");
        }
        Some(diff_text)
    };

    Some(CommitInfo {
        hash,
        date,
        author,
        diff,
    })
}

/// Run a git subcommand, returning its stdout on exit code 0.
fn run_git(dir: Option<&Path>, args: &[&str]) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.args(args).stderr(Stdio::null());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) => {
            log::debug!("failed to spawn git: {e}");
            return None;
        }
    };
    if !output.status.success() {
        log::debug!("git {} exited with {}", args.join(" "), output.status);
        return None;
    }
    // Diff output is whatever bytes the worktree holds; decode lossily so
    // a latin-1 edit can't turn a successful query into "no repository".
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
