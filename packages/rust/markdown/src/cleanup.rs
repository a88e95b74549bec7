//! Line-level cleanup passes for raw model output.
//!
//! Each pass is a function `&str -> String`. [`crate::process`] chains them
//! with header repair in the one order that is correct.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Pass 1: Normalize text (separators, bullets, blank lines)
// ---------------------------------------------------------------------------

/// Remove decorative separator lines, normalize `*` bullets to `- `, and
/// collapse runs of blank lines to a single blank line.
///
/// Idempotent: `clean(&clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    static SEPARATOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[-=]{3,}$").expect("valid regex"));
    static BULLET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*\*\s+").expect("valid regex"));

    let lines: Vec<_> = text
        .split('\n')
        .filter(|line| !SEPARATOR_RE.is_match(line.trim()))
        .map(|line| BULLET_RE.replace(line, "- "))
        .collect();

    collapse_blank_lines(&lines.join("\n"))
}

/// Collapse runs of 3+ newlines into exactly 2.
fn collapse_blank_lines(text: &str) -> String {
    static MULTI_NEWLINE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_NEWLINE_RE.replace_all(text, "\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Strip hallucinated sections
// ---------------------------------------------------------------------------

/// Remove sections the model was told not to write (its own checklist or a
/// "changes made" list).
///
/// Everything from the offending heading to the end of the text is dropped:
/// those sections are always the last thing the model emits, so the rest of
/// the document is treated as their body.
pub fn remove_hallucinations(text: &str) -> String {
    static HALLUCINATED_RE: LazyLock<Regex> = LazyLock::new(|| {
        // A markdown heading (`## ...`), or a line wrapped entirely in emphasis
        // (`**Checklist**`). `#42` and bold lead-ins are prose.
        Regex::new(
            r"(?ims)^[ \t]*(?:#{1,6}[ \t][^\n]*(?:cambios realizados|changes made|checklist)[^\n]*|[*_]{1,3}[^*_\n]*(?:cambios realizados|changes made|checklist)[^*_\n]*[*_]{1,3}[ \t:]*$)(?:\n.*)?",
        )
        .expect("valid regex")
    });

    match HALLUCINATED_RE.find(text) {
        Some(m) => text[..m.start()].to_string(),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
