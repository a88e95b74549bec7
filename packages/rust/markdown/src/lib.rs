//! Normalization pipeline for model-generated Markdown.
//!
//! A raw model response is untrusted free text. [`process`] turns it into a
//! canonical document body by running three passes in a fixed order:
//! 1. [`clean`]: drop separator lines, normalize bullets, collapse blank lines
//! 2. [`repair_headers`]: rewrite heading variants to their canonical lines
//! 3. [`remove_hallucinations`]: strip checklist / "changes made" sections
//!
//! Every function here is total and side-effect free.

mod cleanup;
mod headings;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

pub use cleanup::{clean, remove_hallucinations};
pub use headings::{CanonicalHeading, repair_headers};

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full cleanup pipeline on a raw model response.
///
/// Header repair relies on spacing that [`clean`] has only lightly touched,
/// and hallucination removal relies on headings already being canonical, so
/// the order is not negotiable.
#[instrument(skip_all, fields(raw_len = raw.len()))]
pub fn process(raw: &str) -> String {
    let text = clean(raw);
    let text = repair_headers(&text);
    let text = remove_hallucinations(&text);
    let text = text.trim().to_string();

    debug!(
        final_len = text.len(),
        headings = CanonicalHeading::ALL
            .iter()
            .filter(|h| text.contains(h.as_str()))
            .count(),
        "model output cleaned"
    );

    text
}

// ---------------------------------------------------------------------------
// Commit messages
// ---------------------------------------------------------------------------

/// Tidy a suggested commit message: trim, then strip wrapping backticks or a
/// code fence (with optional language tag).
pub fn tidy_commit_message(raw: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A```[\w-]*[ \t]*\n(.*?)\n?```\z").expect("valid regex")
    });

    let trimmed = raw.trim();
    let unfenced = match FENCE_RE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => trimmed,
    };

    // Only unwrap when the backticks wrap the whole message.
    let unfenced = unfenced.trim();
    let inner = unfenced.trim_matches('`');
    if inner.contains('`') {
        unfenced.to_string()
    } else {
        inner.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    // --- End-to-end pipeline ---

    #[test]
    fn process_repairs_a_messy_response() {
        let raw = "## resumen del cambio\n---\n\n\n\n* Se agregó el endpoint `/api/roles`.\n* Se actualizó el modelo.\n\n## Checklist\n- [ ] tests\n- [x] lint";
        let result = process(raw);

        assert_eq!(
            result,
            "## 📌 Resumen del cambio\n\n- Se agregó el endpoint `/api/roles`.\n- Se actualizó el modelo."
        );
    }

    #[test]
    fn process_messy_fixture() {
        let raw = load_fixture("llm/messy_response.md");
        let result = process(&raw);

        // Decorative rules gone
        assert!(!result.lines().any(|l| l.trim() == "---" || l.trim() == "==="));
        // Bullets normalized
        assert!(!result.lines().any(|l| l.trim_start().starts_with("* ")));
        assert!(result.contains("- Nuevo método `assignRole`"));
        // Headings canonical, in order
        let positions: Vec<usize> = CanonicalHeading::ALL
            .iter()
            .map(|h| result.find(h.as_str()).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        // Hallucinated trailing sections gone
        assert!(!result.to_lowercase().contains("checklist"));
        assert!(!result.contains("Cambios realizados"));
        // No triple newlines anywhere
        assert!(!result.contains("\n\n\n"));
        assert_eq!(result, result.trim());
    }

    #[test]
    fn process_clean_fixture_is_stable() {
        let raw = load_fixture("llm/clean_response.md");
        let once = process(&raw);
        assert_eq!(once, raw.trim());
        assert_eq!(process(&once), once);
    }

    #[test]
    fn process_keeps_sections_after_prose_mentioning_checklist() {
        let raw = "## 📌 Resumen del cambio\n**Nota:** se ajustó el checklist de _QA_\n\n## 🔍 ¿Qué problema soluciona?\nBug.";
        assert_eq!(process(raw), raw);
    }

    #[test]
    fn process_handles_empty_and_headerless_input() {
        assert_eq!(process(""), "");
        assert_eq!(process("   \n\n"), "");
        assert_eq!(process("just one line"), "just one line");
    }

    // --- Commit messages ---

    #[test]
    fn tidy_commit_message_strips_backticks() {
        assert_eq!(tidy_commit_message("  `feat: add login`  "), "feat: add login");
        assert_eq!(
            tidy_commit_message("```\nfix(api): handle 500\n\nbody line\n```"),
            "fix(api): handle 500\n\nbody line"
        );
        assert_eq!(
            tidy_commit_message("```text\nchore: bump deps\n```"),
            "chore: bump deps"
        );
    }

    #[test]
    fn tidy_commit_message_keeps_inline_code() {
        assert_eq!(
            tidy_commit_message("refactor: rename `UserService`"),
            "refactor: rename `UserService`"
        );
    }
}
