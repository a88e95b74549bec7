//! Core domain types shared by the cleanup pipeline and its collaborators.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProjectCategory
// ---------------------------------------------------------------------------

/// The kind of codebase a change belongs to.
///
/// Exactly one category is computed per run; [`ProjectCategory::Generic`] is
/// the fallback when no marker file is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectCategory {
    Laravel,
    Dolibarr,
    Go,
    Python,
    Node,
    #[default]
    Generic,
}

impl ProjectCategory {
    /// Every category, in classifier priority order (fallback last).
    pub const ALL: [ProjectCategory; 6] = [
        Self::Laravel,
        Self::Dolibarr,
        Self::Go,
        Self::Python,
        Self::Node,
        Self::Generic,
    ];

    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Laravel => "laravel",
            Self::Dolibarr => "dolibarr",
            Self::Go => "go",
            Self::Python => "python",
            Self::Node => "node",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectCategory {
    type Err = crate::PrgenError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| {
                crate::PrgenError::validation(format!(
                    "unknown project type '{s}': expected one of laravel, dolibarr, go, python, node, generic"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Opaque change description handed over by the change source.
///
/// None of these fields are parsed structurally; `stats` is only ever
/// scanned for keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Commit subjects and bodies.
    pub logs: String,
    /// `git diff --stat` output.
    pub stats: String,
    /// Unified diff text.
    pub diff: String,
}

impl ChangeSet {
    /// Cut `diff` down to at most `max_chars` characters, appending a notice.
    ///
    /// Returns `true` when the diff was truncated.
    pub fn truncate_diff(&mut self, max_chars: usize) -> bool {
        match self.diff.char_indices().nth(max_chars) {
            Some((cut, _)) => {
                self.diff.truncate(cut);
                self.diff
                    .push_str("\n\n...(diff truncado por límite de configuración)...");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Laravel".parse::<ProjectCategory>().unwrap(), ProjectCategory::Laravel);
        assert_eq!(" node ".parse::<ProjectCategory>().unwrap(), ProjectCategory::Node);
        assert!("cobol".parse::<ProjectCategory>().is_err());
    }

    #[test]
    fn category_display_matches_serde() {
        for category in ProjectCategory::ALL {
            let value = toml::Value::try_from(category).expect("serialize");
            assert_eq!(value.as_str(), Some(category.as_str()));
            assert_eq!(category.to_string(), category.as_str());
        }
    }

    #[test]
    fn default_category_is_generic() {
        assert_eq!(ProjectCategory::default(), ProjectCategory::Generic);
    }

    #[test]
    fn truncate_diff_respects_char_boundaries() {
        let mut changes = ChangeSet {
            diff: "añadido ñandú".into(),
            ..Default::default()
        };
        assert!(changes.truncate_diff(3));
        assert!(changes.diff.starts_with("aña\n\n"));
        assert!(changes.diff.ends_with("configuración)..."));
    }

    #[test]
    fn truncate_diff_leaves_short_diffs_alone() {
        let mut changes = ChangeSet {
            diff: "+ one line".into(),
            ..Default::default()
        };
        assert!(!changes.truncate_diff(100));
        assert_eq!(changes.diff, "+ one line");
    }
}
