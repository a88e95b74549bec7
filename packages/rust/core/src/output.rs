//! Saving generated PR documents.
//!
//! Layout:
//! ```text
//! <save_path>/
//! └── <repo> - PR/
//!     └── <dd-mm-yyyy>/
//!         └── PR_<short-hash>.md
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use prgen_shared::{PrgenError, Result};

/// Hash characters kept in the file name.
const SHORT_HASH_LEN: usize = 7;

/// Target path for a document, without touching the filesystem.
pub fn document_path(save_root: &Path, repo_name: &str, date: NaiveDate, head_hash: &str) -> PathBuf {
    let short: String = head_hash.chars().take(SHORT_HASH_LEN).collect();
    let short = if short.is_empty() { "unknown".to_string() } else { short };

    save_root
        .join(format!("{repo_name} - PR"))
        .join(date.format("%d-%m-%Y").to_string())
        .join(format!("PR_{short}.md"))
}

/// Write `content` to `path` atomically, creating parent directories.
///
/// The content goes to a hidden temp file in the same directory first and is
/// then renamed over the target, so readers never see a partial document.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| PrgenError::validation(format!("no parent directory for {}", path.display())))?;
    std::fs::create_dir_all(dir).map_err(|e| PrgenError::io(dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| PrgenError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| PrgenError::io(path, e))?;

    debug!(size = content.len(), "document written");
    Ok(())
}

/// Save a PR document under today's folder. Returns the final path.
pub fn save_document(save_root: &Path, repo_name: &str, head_hash: &str, content: &str) -> Result<PathBuf> {
    let today = chrono::Local::now().date_naive();
    let path = document_path(save_root, repo_name, today, head_hash);
    write_atomic(&path, content)?;
    info!(path = %path.display(), "PR document saved");
    Ok(path)
}

/// Repository name used in the output folder: the last component of `dir`.
pub fn repo_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "repo".to_string())
}
