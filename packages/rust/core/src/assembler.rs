//! Final PR document assembly.
//!
//! Takes a cleaned model body (see [`prgen_markdown::process`]) and splices in
//! the sections the tool owns: task references, per-run notes, the technical
//! checklist and the merge checklist.

use tracing::{debug, instrument};

use prgen_markdown::CanonicalHeading;
use prgen_shared::ProjectCategory;

use crate::checklist;

/// Heading placed above the auto-ticked technical checklist.
pub const TECHNICAL_HEADING: &str = "## 🛠️ Cambios realizados";

const TASKS_HEADING: &str = "## 🗂️ Referencias de tareas";
const NOTES_HEADING: &str = "## 📝 Instrucciones adicionales";

// ---------------------------------------------------------------------------
// OptionalSection
// ---------------------------------------------------------------------------

/// A section injected into the body only when it has content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalSection {
    /// Full heading line, e.g. `## 📝 Instrucciones adicionales`.
    pub heading: String,
    /// Section body, already formatted.
    pub body: String,
    /// Canonical heading the section is inserted before. `None` appends.
    pub anchor: Option<CanonicalHeading>,
}

impl OptionalSection {
    /// Task references, one `- <id>` per id, placed before the problem section.
    ///
    /// Blank ids are dropped; returns `None` when nothing is left.
    pub fn task_references<S: AsRef<str>>(ids: &[S]) -> Option<Self> {
        let lines: Vec<String> = ids
            .iter()
            .map(|id| id.as_ref().trim())
            .filter(|id| !id.is_empty())
            .map(|id| format!("- {id}"))
            .collect();

        if lines.is_empty() {
            return None;
        }

        Some(Self {
            heading: TASKS_HEADING.to_string(),
            body: lines.join("\n"),
            anchor: Some(CanonicalHeading::Problem),
        })
    }

    /// Free-form notes from the developer, placed before the considerations.
    pub fn notes(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        Some(Self {
            heading: NOTES_HEADING.to_string(),
            body: text.to_string(),
            anchor: Some(CanonicalHeading::Considerations),
        })
    }

    fn render(&self) -> String {
        format!("{}\n{}", self.heading, self.body)
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Assemble the final document for `category`, computing both checklists.
#[instrument(skip_all, fields(%category, sections = sections.len()))]
pub fn assemble(
    body: &str,
    category: ProjectCategory,
    stats: &str,
    sections: &[OptionalSection],
) -> String {
    let technical = checklist::technical(category, stats);
    assemble_with(body, sections, &technical, checklist::merge(category))
}

/// Assemble with precomputed checklist text.
///
/// Each section is inserted right before the first line that starts with its
/// anchor heading, or appended after a blank line when the anchor is missing. The
/// technical and merge checklists always go last, in that order.
pub fn assemble_with(
    body: &str,
    sections: &[OptionalSection],
    technical: &str,
    merge: &str,
) -> String {
    let mut doc = body.to_string();

    for section in sections {
        let anchored = section
            .anchor
            .and_then(|anchor| heading_offset(&doc, anchor).map(|pos| (anchor, pos)));

        match anchored {
            Some((anchor, pos)) => {
                debug!(heading = %section.heading, %anchor, "section inserted before anchor");
                doc.insert_str(pos, &format!("{}\n\n", section.render()));
            }
            None => {
                debug!(heading = %section.heading, "section appended");
                doc.push_str("\n\n");
                doc.push_str(&section.render());
            }
        }
    }

    let mut out = doc.trim().to_string();
    out.push_str("\n\n");
    out.push_str(TECHNICAL_HEADING);
    out.push('\n');
    out.push_str(technical);
    out.push_str("\n\n");
    out.push_str(merge);

    out.trim().to_string()
}

/// Byte offset of the first line starting with `heading`.
fn heading_offset(doc: &str, heading: CanonicalHeading) -> Option<usize> {
    let line = heading.as_str();
    if doc.starts_with(line) {
        return Some(0);
    }
    doc.match_indices('\n')
        .map(|(i, _)| i + 1)
        .find(|&start| doc[start..].starts_with(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "## 📌 Resumen del cambio\nSe agregó el endpoint de roles.\n\n\
## 🔍 ¿Qué problema soluciona?\nLos roles no se podían asignar.\n\n\
## 🚀 ¿Cómo probarlo?\n1. Crear un rol.\n\n\
## ⚠️ Consideraciones adicionales\nNinguna.";

    #[test]
    fn task_references_format_and_filter() {
        let section = OptionalSection::task_references(&["TK-1", "  ", " TK-2 "]).unwrap();
        assert_eq!(section.heading, "## 🗂️ Referencias de tareas");
        assert_eq!(section.body, "- TK-1\n- TK-2");
        assert_eq!(section.anchor, Some(CanonicalHeading::Problem));

        assert!(OptionalSection::task_references(&["", " "]).is_none());
        assert!(OptionalSection::task_references::<&str>(&[]).is_none());
    }

    #[test]
    fn notes_are_trimmed_and_blank_is_none() {
        let section = OptionalSection::notes("\n  Revisar permisos  \n").unwrap();
        assert_eq!(section.body, "Revisar permisos");
        assert_eq!(section.anchor, Some(CanonicalHeading::Considerations));
        assert!(OptionalSection::notes(" \n\t").is_none());
    }

    #[test]
    fn task_section_lands_right_before_problem() {
        let tasks = OptionalSection::task_references(&["TK-123"]).unwrap();
        let doc = assemble(BODY, ProjectCategory::Generic, "", &[tasks]);

        assert!(doc.contains(
            "## 🗂️ Referencias de tareas\n- TK-123\n\n## 🔍 ¿Qué problema soluciona?"
        ));
        let summary = doc.find("Resumen del cambio").unwrap();
        let tasks = doc.find("Referencias de tareas").unwrap();
        assert!(summary < tasks);
    }

    #[test]
    fn notes_land_before_considerations() {
        let notes = OptionalSection::notes("No tocar la migración vieja.").unwrap();
        let doc = assemble(BODY, ProjectCategory::Generic, "", &[notes]);

        assert!(doc.contains(
            "## 📝 Instrucciones adicionales\nNo tocar la migración vieja.\n\n## ⚠️ Consideraciones adicionales"
        ));
    }

    #[test]
    fn missing_anchor_appends_after_blank_line() {
        let body = "## 📌 Resumen del cambio\nSolo resumen.";
        let tasks = OptionalSection::task_references(&["TK-9"]).unwrap();
        let doc = assemble_with(body, &[tasks], "- [ ] x", "## ✅ Merge");

        assert_eq!(
            doc,
            "## 📌 Resumen del cambio\nSolo resumen.\n\n\
## 🗂️ Referencias de tareas\n- TK-9\n\n\
## 🛠️ Cambios realizados\n- [ ] x\n\n\
## ✅ Merge"
        );
    }

    #[test]
    fn only_first_anchor_occurrence_is_used() {
        let body = "## 🔍 ¿Qué problema soluciona?\nA\n\n## 🔍 ¿Qué problema soluciona?\nB";
        let tasks = OptionalSection::task_references(&["TK-1"]).unwrap();
        let doc = assemble_with(body, &[tasks], "", "");
        assert_eq!(doc.matches("Referencias de tareas").count(), 1);
        assert!(doc.starts_with("## 🗂️ Referencias de tareas\n- TK-1\n\n## 🔍"));
    }

    #[test]
    fn quoted_heading_inside_a_section_is_not_an_anchor() {
        let notes = OptionalSection::notes("Ver \"## 🔍 ¿Qué problema soluciona?\" abajo.").unwrap();
        let tasks = OptionalSection::task_references(&["TK-7"]).unwrap();
        let body = "## ⚠️ Consideraciones adicionales\nX\n\n## 🔍 ¿Qué problema soluciona?\nA";
        let doc = assemble_with(body, &[notes, tasks], "", "");

        assert!(doc.contains("- TK-7\n\n## 🔍 ¿Qué problema soluciona?\nA"));
        assert!(doc.contains("Ver \"## 🔍 ¿Qué problema soluciona?\" abajo."));
        let tasks_at = doc.find("Referencias de tareas").unwrap();
        assert!(doc.find("Instrucciones adicionales").unwrap() < tasks_at);
    }

    #[test]
    fn checklists_are_appended_in_order() {
        let stats = " app/Http/Controllers/RoleController.php | 12 +++";
        let doc = assemble(BODY, ProjectCategory::Laravel, stats, &[]);

        let technical = doc.find("## 🛠️ Cambios realizados\n- [x] Nuevo endpoint").unwrap();
        let merge = doc.find("## ✅ Checklist antes de hacer merge").unwrap();
        let considerations = doc.find("## ⚠️ Consideraciones adicionales").unwrap();
        assert!(considerations < technical && technical < merge);
        assert!(doc.ends_with("- [ ] Revisado por al menos 1 desarrollador"));
    }

    #[test]
    fn generic_category_gets_single_manual_item() {
        let doc = assemble("", ProjectCategory::Generic, "whatever", &[]);
        assert!(doc.starts_with(
            "## 🛠️ Cambios realizados\n- [ ] Revisión manual de cambios genéricos\n\n"
        ));
    }

    #[test]
    fn all_sections_together() {
        let sections: Vec<OptionalSection> = [
            OptionalSection::task_references(&["TK-1", "TK-2"]),
            OptionalSection::notes("Desplegar primero en staging."),
        ]
        .into_iter()
        .flatten()
        .collect();
        let doc = assemble(BODY, ProjectCategory::Node, "src/app.ts | 3 +-", &sections);

        let order = [
            "## 📌 Resumen del cambio",
            "## 🗂️ Referencias de tareas",
            "## 🔍 ¿Qué problema soluciona?",
            "## 🚀 ¿Cómo probarlo?",
            "## 📝 Instrucciones adicionales",
            "## ⚠️ Consideraciones adicionales",
            "## 🛠️ Cambios realizados",
            "## ✅ Checklist antes de hacer merge",
        ];
        let positions: Vec<usize> = order.iter().map(|h| doc.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{doc}");
        assert!(!doc.contains("\n\n\n"));
    }
}
