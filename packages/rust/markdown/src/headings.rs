//! Canonical section headings and the header repair pass.
//!
//! Models are inconsistent about how they format the four required section
//! titles (emoji or not, `##` or `**`, accents dropped, shouting). Every
//! recognizable variant is rewritten to one exact line, because section
//! injection later anchors on those exact strings.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// CanonicalHeading
// ---------------------------------------------------------------------------

/// The four required sections of a PR description, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalHeading {
    Summary,
    Problem,
    HowToTest,
    Considerations,
}

impl CanonicalHeading {
    /// All headings in the order their patterns are consulted.
    pub const ALL: [CanonicalHeading; 4] = [
        Self::Summary,
        Self::Problem,
        Self::HowToTest,
        Self::Considerations,
    ];

    /// The exact line every recognized variant is rewritten to.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "## 📌 Resumen del cambio",
            Self::Problem => "## 🔍 ¿Qué problema soluciona?",
            Self::HowToTest => "## 🚀 ¿Cómo probarlo?",
            Self::Considerations => "## ⚠️ Consideraciones adicionales",
        }
    }

    /// Keyword phrase recognized in a heading line, written without accents.
    fn phrase(&self) -> &'static str {
        match self {
            Self::Summary => "resumen del cambio",
            Self::Problem => "que problema soluciona",
            Self::HowToTest => "como probarlo",
            Self::Considerations => "consideraciones adicionales",
        }
    }

    /// Whether a (trimmed) line is a variant of this heading.
    pub fn matches(&self, line: &str) -> bool {
        HEADER_RULES
            .iter()
            .find(|(heading, _)| heading == self)
            .is_some_and(|(_, re)| re.is_match(line.trim()))
    }

    /// Recognize a line as one of the canonical headings, first match wins.
    pub fn recognize(line: &str) -> Option<CanonicalHeading> {
        let trimmed = line.trim();
        HEADER_RULES
            .iter()
            .find(|(_, re)| re.is_match(trimmed))
            .map(|(heading, _)| *heading)
    }
}

impl std::fmt::Display for CanonicalHeading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pattern template
// ---------------------------------------------------------------------------

/// Compiled recognizers, one per heading, in priority order.
static HEADER_RULES: LazyLock<Vec<(CanonicalHeading, Regex)>> = LazyLock::new(|| {
    CanonicalHeading::ALL
        .into_iter()
        .map(|heading| {
            let re = Regex::new(&heading_pattern(heading.phrase())).expect("valid regex");
            (heading, re)
        })
        .collect()
});

/// Build the recognizer for a keyword phrase.
///
/// Shape: line start, 1-3 `#` or 1-3 emphasis markers, any run of non-letters
/// (emoji, `¿`, punctuation, spaces), then the phrase. Case-insensitive;
/// vowels and `n` also match their accented forms.
fn heading_pattern(phrase: &str) -> String {
    let mut keyword = String::new();
    for ch in phrase.chars() {
        match ch {
            'a' => keyword.push_str("[aáàä]"),
            'e' => keyword.push_str("[eéèë]"),
            'i' => keyword.push_str("[iíìï]"),
            'o' => keyword.push_str("[oóòö]"),
            'u' => keyword.push_str("[uúùü]"),
            'n' => keyword.push_str("[nñ]"),
            ' ' => keyword.push_str(r"\s+"),
            other => keyword.push_str(&regex::escape(&other.to_string())),
        }
    }
    format!(r"(?i)^(?:#{{1,3}}|[*_]{{1,3}})[^\p{{L}}]*{keyword}")
}

// ---------------------------------------------------------------------------
// Pass 2: Repair headers
// ---------------------------------------------------------------------------

/// Rewrite every recognizable heading variant to its canonical line.
///
/// A recognized heading always ends up with exactly one blank line before it
/// (none at the very start of the text). The result is trimmed.
///
/// Idempotent: `repair_headers(&repair_headers(x)) == repair_headers(x)`.
pub fn repair_headers(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        match CanonicalHeading::recognize(line) {
            Some(heading) => {
                let prev_blank = out.last().is_some_and(|prev| prev.trim().is_empty());
                if !prev_blank {
                    out.push("");
                }
                out.push(heading.as_str());
            }
            None => out.push(line),
        }
    }

    out.join("\n").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_variants_map_to_one_line() {
        let variants = [
            "### Resumen del cambio",
            "**resumen del cambio**",
            "## 📌 resumen del cambio",
            "## 📌 Resumen del cambio",
            "# RESUMEN DEL CAMBIO",
            "##   📌📌 -- Resumen   del cambio:",
            "  ## Resumen del cambio  ",
        ];
        for variant in variants {
            assert_eq!(
                repair_headers(variant),
                "## 📌 Resumen del cambio",
                "variant {variant:?}"
            );
        }
    }

    #[test]
    fn problem_variants_tolerate_accents_and_inverted_question_mark() {
        for variant in [
            "## ¿Qué problema soluciona?",
            "## que problema soluciona",
            "### 🔍 ¿QUÉ PROBLEMA SOLUCIONA?",
            "**¿Qué problema soluciona?**",
        ] {
            assert_eq!(repair_headers(variant), "## 🔍 ¿Qué problema soluciona?");
        }
    }

    #[test]
    fn how_to_test_and_considerations_variants() {
        for variant in ["## Como probarlo", "## 🚀 ¿Cómo probarlo?", "__cómo probarlo__"] {
            assert_eq!(repair_headers(variant), "## 🚀 ¿Cómo probarlo?");
        }
        for variant in [
            "## Consideraciones adicionales",
            "## ⚠ Consideraciones Adicionales",
            "### ⚠️⚠️ consideraciones adicionales",
        ] {
            assert_eq!(repair_headers(variant), "## ⚠️ Consideraciones adicionales");
        }
    }

    #[test]
    fn canonical_lines_recognize_themselves() {
        for heading in CanonicalHeading::ALL {
            assert_eq!(CanonicalHeading::recognize(heading.as_str()), Some(heading));
            assert!(heading.matches(heading.as_str()));
        }
    }

    #[test]
    fn prose_and_bullets_are_not_headings() {
        for line in [
            "Resumen del cambio: se agregó un endpoint.",
            "- como probarlo en staging",
            "#### ",
            "## Notas",
        ] {
            assert_eq!(CanonicalHeading::recognize(line), None, "line {line:?}");
        }
    }

    #[test]
    fn heading_gets_a_blank_line_before_it() {
        let input = "Intro text\n## Resumen del cambio\nBody";
        assert_eq!(
            repair_headers(input),
            "Intro text\n\n## 📌 Resumen del cambio\nBody"
        );
    }

    #[test]
    fn existing_blank_line_is_not_doubled() {
        let input = "Intro text\n\n**Cómo probarlo**\n1. Paso";
        assert_eq!(
            repair_headers(input),
            "Intro text\n\n## 🚀 ¿Cómo probarlo?\n1. Paso"
        );
    }

    #[test]
    fn result_is_trimmed() {
        let input = "\n\n## resumen del cambio\ntexto\n\n";
        assert_eq!(repair_headers(input), "## 📌 Resumen del cambio\ntexto");
    }

    #[test]
    fn repair_headers_is_idempotent() {
        let inputs = [
            "",
            "## Resumen del cambio\nA\n## Qué problema soluciona\nB\n**como probarlo**\nC",
            "texto\n\n\n### ⚠️ consideraciones adicionales\n\nNinguna",
            "no headings at all",
        ];
        for input in inputs {
            let once = repair_headers(input);
            assert_eq!(repair_headers(&once), once, "not idempotent for {input:?}");
        }
    }
}
