//! Prompt construction for every generation command.
//!
//! Templates are plain files with `{{.Name}}` placeholders. A missing or
//! unreadable template is not an error: each prompt kind has an embedded
//! fallback rendered through the same substitution.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use prgen_shared::{ProjectCategory, PromptsConfig};

/// Diff characters kept inside the PR prompt.
pub const PROMPT_DIFF_CHARS: usize = 6000;

const TEAM_EXTRA_HEADING: &str = "### INSTRUCCIONES ADICIONALES DEL EQUIPO";
const RUN_NOTES_HEADING: &str = "### INSTRUCCIONES ADICIONALES";

// ---------------------------------------------------------------------------
// Embedded templates
// ---------------------------------------------------------------------------

const DEFAULT_PR_PROMPT: &str = r#"Actúa como un TECH LEAD / ARQUITECTO DE SOFTWARE experto en {{.ProjectType}}.
Tu tarea es escribir la documentación técnica de este PR.

DATOS:
- Rama: {{.Branch}}
- Archivos Modificados:
{{.Stats}}
- Mensajes de Commit:
{{.Logs}}
- Diff del código:
{{.Diff}}

INSTRUCCIONES DE FORMATO (ESTRICTO):
1. NO escribas saludos ni introducciones.
2. NO uses subrayados ni líneas de separación (ej: "---") debajo de los títulos.
3. NO generes checkboxes, ni listas de cambios, ni checklists. Solo texto narrativo.
4. Usa listas Markdown estándar con guiones ("- Item").
5. Si el mensaje de commit es vago ("fix", "update", "changes", etc.),
   IGNORA el mensaje y analiza el diff para determinar qué cambió realmente.

ESTRUCTURA Y CONTENIDO REQUERIDO:

## 📌 Resumen del cambio
(Escribe al menos 5 párrafos detallados. Menciona nombres de archivos, funciones y métodos modificados.
Básate en el diff, no en el mensaje de commit, para explicar qué cambió realmente.)

## 🔍 ¿Qué problema soluciona?
(Enfócate en el valor técnico y de negocio. Infiere el propósito real del cambio desde el diff).

## 🚀 ¿Cómo probarlo?
1. Cambia a la rama {{.Branch}}.
(Lista los pasos numerados. Si incluyes código usa bloques markdown. Si hay migraciones pon el comando exacto).

## ⚠️ Consideraciones adicionales
(Menciona comandos extra si son necesarios: npm run build, composer install, actualizaciones de BD, permisos o riesgos de seguridad. Si no hay, pon "Ninguna")."#;

const DEFAULT_COMMIT_PROMPT: &str = "Genera un mensaje de commit en Conventional Commits para estos cambios staged.

Archivos: {{.Stats}}

Diff:
{{.Diff}}

Responde ÚNICAMENTE con el mensaje de commit. Sin explicaciones.";

const DEFAULT_REVIEW_PROMPT: &str = "Eres un senior code reviewer. Analiza el siguiente diff y reporta:
1. Posibles bugs o casos no manejados
2. Problemas de seguridad (SQL injection, secrets, auth)
3. Manejo de errores faltante
4. Sugerencias de refactor

Ref: {{.Branch}}
Archivos: {{.Stats}}
Diff:
{{.Diff}}";

const BRANCH_PROMPT: &str = "You are an expert in Git and development team conventions.
Your task is to suggest 5 branch names for the following task.

TASK DESCRIPTION:
{{.Description}}

RULES:
1. Respond ONLY with the list of branch names. No explanations or extra text.
2. Branch names must be in ENGLISH. Use kebab-case (lowercase, hyphens). No spaces or extra slashes.
3. Valid prefixes (choose the most accurate):
   feature/   → new feature
   fix/        → bug fix
   hotfix/     → urgent production fix
   refactor/   → code change without new functionality
   chore/      → maintenance, deps, scripts, config
   docs/       → documentation only
   test/       → only tests
   ci/         → pipelines or CI/CD configuration
4. If the description mentions a ticket number (e.g., TK-123, JIRA-456), include it after the prefix.
5. Maximum 50 characters per branch name.
6. Order from most to least descriptive.
7. Next to each option show: → git checkout -b <nombre>

RESPONSE FORMAT (no markdown, plain text only):
  feature/description-in-english          → git checkout -b feature/description-in-english
  fix/description-in-english              → git checkout -b fix/description-in-english
  ...
";

// ---------------------------------------------------------------------------
// PromptContext
// ---------------------------------------------------------------------------

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub category: ProjectCategory,
    /// Branch name, or a `from...to` range description.
    pub branch: &'a str,
    pub logs: &'a str,
    pub stats: &'a str,
    pub diff: &'a str,
    /// Per-run developer notes (`--notes` and friends).
    pub notes: &'a str,
}

impl PromptContext<'_> {
    fn render(&self, template: &str) -> String {
        template
            .replace("{{.ProjectType}}", self.category.as_str())
            .replace("{{.Branch}}", self.branch)
            .replace("{{.Logs}}", self.logs)
            .replace("{{.Stats}}", self.stats)
            .replace("{{.Diff}}", self.diff)
    }
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Resolves template files and renders prompts.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    base: PathBuf,
    extra: Option<PathBuf>,
    commit: PathBuf,
    review: PathBuf,
}

impl PromptBuilder {
    /// Build from the `[prompts]` config section. An empty `extra` disables it.
    pub fn from_config(prompts: &PromptsConfig) -> Self {
        Self {
            base: PathBuf::from(&prompts.base),
            extra: (!prompts.extra.trim().is_empty()).then(|| PathBuf::from(&prompts.extra)),
            commit: PathBuf::from(&prompts.commit),
            review: PathBuf::from(&prompts.review),
        }
    }

    /// Full PR prompt: base template, then team instructions, then run notes.
    ///
    /// The diff is cut to [`PROMPT_DIFF_CHARS`] inside the prompt.
    #[instrument(skip_all, fields(category = %ctx.category, branch = ctx.branch))]
    pub fn pr(&self, ctx: &PromptContext<'_>) -> String {
        let diff = truncate_for_prompt(ctx.diff, PROMPT_DIFF_CHARS);
        let ctx = PromptContext { diff: &diff, ..ctx.clone() };

        let mut prompt = ctx.render(&load_template(&self.base, DEFAULT_PR_PROMPT));

        if let Some(extra) = self.extra.as_deref().and_then(read_optional) {
            prompt.push_str(&format!("\n\n{TEAM_EXTRA_HEADING}\n{extra}"));
        }
        let notes = ctx.notes.trim();
        if !notes.is_empty() {
            prompt.push_str(&format!("\n\n{RUN_NOTES_HEADING}\n{notes}"));
        }

        debug!(prompt_len = prompt.len(), "PR prompt built");
        prompt
    }

    /// Commit-message prompt for staged changes.
    pub fn commit(&self, ctx: &PromptContext<'_>) -> String {
        ctx.render(&load_template(&self.commit, DEFAULT_COMMIT_PROMPT))
    }

    /// Code-review prompt. `ctx.branch` carries the reviewed range.
    pub fn review(&self, ctx: &PromptContext<'_>) -> String {
        ctx.render(&load_template(&self.review, DEFAULT_REVIEW_PROMPT))
    }
}

/// Branch-name suggestion prompt. Not configurable.
pub fn branch_prompt(description: &str) -> String {
    BRANCH_PROMPT.replace("{{.Description}}", description.trim())
}

/// Cut `diff` to `max_chars` characters with a visible notice.
pub fn truncate_for_prompt(diff: &str, max_chars: usize) -> String {
    match diff.char_indices().nth(max_chars) {
        Some((cut, _)) => format!(
            "{}\n\n[... diff truncado por longitud: se muestran los primeros {max_chars} caracteres ...]",
            &diff[..cut]
        ),
        None => diff.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_template(path: &Path, fallback: &'static str) -> String {
    match std::fs::read_to_string(path) {
        Ok(template) => {
            debug!(path = %path.display(), "using prompt template file");
            template
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "prompt template unavailable, using embedded default");
            fallback.to_string()
        }
    }
}

/// Read a file that may legitimately be absent. Blank content counts as absent.
fn read_optional(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
