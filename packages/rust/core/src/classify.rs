//! Project classification from marker files.
//!
//! Marker files are not mutually exclusive (a Laravel app ships a
//! `package.json` too), so the table below is an ordered decision list:
//! the first row with a present marker wins.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, instrument};

use prgen_shared::ProjectCategory;

/// Decision list, highest priority first. Adding a category is one row.
const MARKERS: &[(ProjectCategory, &[&str])] = &[
    (ProjectCategory::Laravel, &["artisan"]),
    (ProjectCategory::Dolibarr, &["main.inc.php"]),
    (ProjectCategory::Go, &["go.mod"]),
    (
        ProjectCategory::Python,
        &["requirements.txt", "pyproject.toml", "setup.py"],
    ),
    (ProjectCategory::Node, &["package.json"]),
];

// ---------------------------------------------------------------------------
// MarkerSnapshot
// ---------------------------------------------------------------------------

/// Which file/directory names exist at the root of the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSnapshot {
    names: BTreeSet<String>,
}

impl MarkerSnapshot {
    /// Build a snapshot from an explicit list of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// List the entries of `dir`. An unreadable directory yields an empty
    /// snapshot, which classifies as [`ProjectCategory::Generic`].
    pub fn from_dir(dir: &Path) -> Self {
        match std::fs::read_dir(dir) {
            Ok(entries) => Self {
                names: entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect(),
            },
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "cannot list directory for markers");
                Self::default()
            }
        }
    }

    /// Whether `name` was present.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Pick the project category for a snapshot. Never fails.
pub fn classify(snapshot: &MarkerSnapshot) -> ProjectCategory {
    MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| snapshot.contains(m)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

/// Classify the project rooted at `dir`.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn detect_dir(dir: &Path) -> ProjectCategory {
    let category = classify(&MarkerSnapshot::from_dir(dir));
    debug!(%category, "project classified");
    category
}
