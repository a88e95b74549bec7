//! Change collection from a git working copy.
//!
//! Everything shells out to the `git` binary. Output is forced to UTF-8
//! regardless of the system locale, and git is never allowed to prompt.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tracing::{debug, instrument};

use prgen_shared::{ChangeSet, PrgenError, Result};

/// Hash of the empty tree, used as the diff base when history is shorter
/// than the requested range.
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Log format: subject and body of every commit.
const LOG_FORMAT: &str = "--pretty=format:Commit: %s%nDesc: %b%n";

// ---------------------------------------------------------------------------
// ChangeRange
// ---------------------------------------------------------------------------

/// Which commits a change set covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRange {
    /// The last `n` commits up to `HEAD`.
    LastCommits(u32),
    /// Everything reachable from `to` but not from `from`.
    Between { from: String, to: String },
}

impl ChangeRange {
    /// `Between` with `to` defaulting to `HEAD` when empty.
    pub fn between(from: impl Into<String>, to: Option<String>) -> Self {
        Self::Between {
            from: from.into(),
            to: to.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| "HEAD".into()),
        }
    }

    /// Short label for prompts and logs, e.g. `main...HEAD`.
    pub fn describe(&self) -> String {
        match self {
            Self::LastCommits(n) => format!("últimos {n} commits"),
            Self::Between { from, to } => format!("{from}...{to}"),
        }
    }
}

impl std::fmt::Display for ChangeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

// ---------------------------------------------------------------------------
// Change sets
// ---------------------------------------------------------------------------

/// Collect logs, `--stat` and the filtered diff for `range`.
///
/// `ignore` patterns are excluded from the diff only; stats stay complete so
/// checklist keywords still see every touched file.
#[instrument(skip_all, fields(repo = %repo.display(), range = %range))]
pub fn collect(repo: &Path, range: &ChangeRange, ignore: &[String]) -> Result<ChangeSet> {
    let (base, tip, logs) = match range {
        ChangeRange::LastCommits(n) => {
            let n = (*n).max(1);
            let logs = git(repo, &["log", format!("-n{n}").as_str(), LOG_FORMAT])?;
            (last_commits_base(repo, n)?, "HEAD".to_string(), logs)
        }
        ChangeRange::Between { from, to } => {
            let logs = git(repo, &["log", format!("{from}..{to}").as_str(), LOG_FORMAT])?;
            (from.clone(), to.clone(), logs)
        }
    };

    let stats = git(repo, &["diff", "--stat", base.as_str(), tip.as_str()])?;
    let mut diff_args = vec!["diff".to_string(), base, tip];
    diff_args.extend(exclude_pathspecs(ignore));
    let diff = git(repo, &diff_args)?;

    debug!(logs_len = logs.len(), stats_len = stats.len(), diff_len = diff.len(), "changes collected");
    Ok(ChangeSet { logs, stats, diff })
}

/// Staged changes (`git diff --cached`). `logs` is left empty.
#[instrument(skip_all, fields(repo = %repo.display()))]
pub fn staged(repo: &Path, ignore: &[String]) -> Result<ChangeSet> {
    let stats = git(repo, &["diff", "--cached", "--stat"])?;
    let mut diff_args = vec!["diff".to_string(), "--cached".to_string()];
    diff_args.extend(exclude_pathspecs(ignore));
    let diff = git(repo, &diff_args)?;

    Ok(ChangeSet {
        logs: String::new(),
        stats,
        diff,
    })
}

/// Whether anything is staged for commit.
pub fn has_staged_changes(repo: &Path) -> Result<bool> {
    let output = run(repo, &["diff", "--cached", "--quiet"], None)?;
    match output.status.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(failure(&["diff", "--cached", "--quiet"], &output)),
    }
}

// ---------------------------------------------------------------------------
// Repository state
// ---------------------------------------------------------------------------

/// Current branch name (`HEAD` when detached).
pub fn current_branch(repo: &Path) -> Result<String> {
    git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Full hash of `HEAD`.
pub fn head_hash(repo: &Path) -> Result<String> {
    let hash = git(repo, &["rev-parse", "HEAD"])?;
    if hash.is_empty() {
        return Err(PrgenError::git("git rev-parse HEAD returned empty output"));
    }
    Ok(hash)
}

/// Whether `dir` is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    run(dir, &["rev-parse", "--is-inside-work-tree"], None)
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create a commit from the staged changes. The message is passed on stdin,
/// so multi-line messages keep their formatting.
#[instrument(skip_all, fields(repo = %repo.display()))]
pub fn commit(repo: &Path, message: &str) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        return Err(PrgenError::validation("commit message is empty"));
    }
    let args = ["commit", "-F", "-"];
    let output = run(repo, &args, Some(message))?;
    if !output.status.success() {
        return Err(failure(&args, &output));
    }
    debug!(subject = message.lines().next().unwrap_or_default(), "commit created");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `HEAD~n`, or the empty tree when the history has `n` commits or fewer.
fn last_commits_base(repo: &Path, n: u32) -> Result<String> {
    let count: u32 = git(repo, &["rev-list", "--count", "HEAD"])?
        .parse()
        .map_err(|e| PrgenError::git(format!("unexpected rev-list output: {e}")))?;
    if count > n {
        Ok(format!("HEAD~{n}"))
    } else {
        Ok(EMPTY_TREE.to_string())
    }
}

fn exclude_pathspecs(ignore: &[String]) -> Vec<String> {
    let patterns: Vec<String> = ignore
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| format!(":(exclude){p}"))
        .collect();
    if patterns.is_empty() {
        return patterns;
    }
    let mut args = vec!["--".to_string(), ".".to_string()];
    args.extend(patterns);
    args
}

/// Run git and return trimmed stdout, failing on a non-zero exit.
fn git<S: AsRef<str>>(repo: &Path, args: &[S]) -> Result<String> {
    let output = run(repo, args, None)?;
    if !output.status.success() {
        return Err(failure(args, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

fn run<S: AsRef<str>>(repo: &Path, args: &[S], stdin: Option<&str>) -> Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args([
        "-c",
        "core.quotepath=false",
        "-c",
        "i18n.logOutputEncoding=UTF-8",
        "-c",
        "i18n.commitEncoding=UTF-8",
    ])
    .args(args.iter().map(AsRef::as_ref))
    .current_dir(repo)
    .env("LANG", "C.UTF-8")
    .env("LC_ALL", "C.UTF-8")
    .env("GIT_TERMINAL_PROMPT", "0")
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let Some(input) = stdin else {
        return cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| PrgenError::git(format!("failed to run git: {e}")));
    };

    let mut child = cmd
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| PrgenError::git(format!("failed to run git: {e}")))?;
    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(input.as_bytes())
            .map_err(|e| PrgenError::git(format!("failed to write to git stdin: {e}")))?;
    }
    child
        .wait_with_output()
        .map_err(|e| PrgenError::git(format!("failed to wait for git: {e}")))
}

fn failure<S: AsRef<str>>(args: &[S], output: &Output) -> PrgenError {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let stderr = String::from_utf8_lossy(&output.stderr);
    PrgenError::git(format!("git {} failed: {}", args.join(" "), stderr.trim()))
}
