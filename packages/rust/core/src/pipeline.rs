//! End-to-end flows behind each command: collect → prompt → generate → clean
//! → assemble → save.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use prgen_git::ChangeRange;
use prgen_llm::LlmClient;
use prgen_shared::{AppConfig, ChangeSet, PrgenError, ProjectCategory, Result};

use crate::assembler::{self, OptionalSection};
use crate::classify;
use crate::output;
use crate::prompt::{self, PromptBuilder, PromptContext};

/// Body used instead of a model answer in dry-run mode.
pub const DRY_RUN_BODY: &str = "### [DRY-RUN: sin respuesta de IA] ###";

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a phase finished, with a short result line.
    fn done(&self, message: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _message: &str) {}
}

// ---------------------------------------------------------------------------
// PR description
// ---------------------------------------------------------------------------

/// Input for [`generate_pr`].
#[derive(Debug, Clone)]
pub struct PrRequest {
    /// Working copy root.
    pub repo: PathBuf,
    pub range: ChangeRange,
    /// Forced category; detected from marker files when `None`.
    pub project: Option<ProjectCategory>,
    /// Per-run notes, already resolved from their source.
    pub notes: String,
    /// Task ids for the references section.
    pub tasks: Vec<String>,
    /// Skip the model call and use [`DRY_RUN_BODY`].
    pub dry_run: bool,
}

/// Everything gathered before the model is called.
#[derive(Debug, Clone)]
pub struct PrDraft {
    pub category: ProjectCategory,
    /// Branch name or range label.
    pub branch: String,
    pub head_hash: String,
    pub changes: ChangeSet,
    pub prompt: String,
}

/// Result of [`generate_pr`].
#[derive(Debug)]
pub struct PrOutcome {
    pub category: ProjectCategory,
    /// Final Markdown document.
    pub document: String,
    /// Where the document was saved.
    pub path: PathBuf,
    pub elapsed: Duration,
}

/// Detect the project, collect changes and build the PR prompt.
#[instrument(skip_all, fields(repo = %request.repo.display(), range = %request.range))]
pub fn prepare_pr(
    request: &PrRequest,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<PrDraft> {
    progress.phase("Detectando proyecto");
    let category = request
        .project
        .unwrap_or_else(|| classify::detect_dir(&request.repo));
    progress.done(&format!("Proyecto detectado: {}", category.as_str().to_uppercase()));

    progress.phase("Leyendo git log y diff");
    let head_hash = prgen_git::head_hash(&request.repo)?;
    let branch = match &request.range {
        ChangeRange::LastCommits(_) => prgen_git::current_branch(&request.repo)?,
        between => between.describe(),
    };
    let mut changes = prgen_git::collect(&request.repo, &request.range, &config.diff.ignore)?;
    if changes.truncate_diff(config.diff.max_chars) {
        warn!(max_chars = config.diff.max_chars, "diff truncated to configured limit");
    }
    progress.done(&format!("Rama: {branch} | diff: {} chars", changes.diff.chars().count()));

    progress.phase("Construyendo prompt");
    let prompt = PromptBuilder::from_config(&config.prompts).pr(&PromptContext {
        category,
        branch: &branch,
        logs: &changes.logs,
        stats: &changes.stats,
        diff: &changes.diff,
        notes: &request.notes,
    });
    progress.done("Prompt construido");

    Ok(PrDraft {
        category,
        branch,
        head_hash,
        changes,
        prompt,
    })
}

/// Run the full PR flow and save the resulting document.
///
/// 1. Prepare (detect, collect, prompt)
/// 2. Generate (or dry-run placeholder)
/// 3. Clean the model output
/// 4. Inject optional sections and checklists
/// 5. Save under `output.save_path`
#[instrument(skip_all, fields(repo = %request.repo.display(), dry_run = request.dry_run))]
pub async fn generate_pr(
    request: &PrRequest,
    config: &AppConfig,
    client: &LlmClient,
    progress: &dyn ProgressReporter,
) -> Result<PrOutcome> {
    let start = Instant::now();
    let draft = prepare_pr(request, config, progress)?;

    let raw = if request.dry_run {
        warn!("dry run: skipping model call");
        DRY_RUN_BODY.to_string()
    } else {
        progress.phase(&format!("Generando PR con {}", client.name()));
        let raw = client.generate(&draft.prompt).await?;
        progress.done("Respuesta recibida del LLM");
        raw
    };

    progress.phase("Limpiando y formateando respuesta");
    let body = prgen_markdown::process(&raw);
    let sections: Vec<OptionalSection> = [
        OptionalSection::task_references(request.tasks.as_slice()),
        OptionalSection::notes(&request.notes),
    ]
    .into_iter()
    .flatten()
    .collect();
    let document = assembler::assemble(&body, draft.category, &draft.changes.stats, &sections);
    progress.done("Formato aplicado");

    progress.phase("Guardando archivo");
    let repo_dir = request
        .repo
        .canonicalize()
        .map_err(|e| PrgenError::io(&request.repo, e))?;
    let path = output::save_document(
        std::path::Path::new(&config.output.save_path),
        &output::repo_name(&repo_dir),
        &draft.head_hash,
        &document,
    )?;
    progress.done(&format!("PR guardado: {}", path.display()));

    let outcome = PrOutcome {
        category: draft.category,
        document,
        path,
        elapsed: start.elapsed(),
    };

    info!(
        category = %outcome.category,
        path = %outcome.path.display(),
        elapsed_ms = outcome.elapsed.as_millis(),
        "PR pipeline complete"
    );

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Commit message
// ---------------------------------------------------------------------------

/// Result of [`generate_commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing is staged; no prompt was built.
    NothingStaged,
    /// Dry run: the prompt that would have been sent.
    DryRun { prompt: String },
    /// A suggested message, committed when `applied`.
    Suggested { message: String, applied: bool },
}

/// Suggest a Conventional Commits message for the staged changes, and
/// optionally commit with it.
#[instrument(skip_all, fields(repo = %repo.display(), apply = apply, dry_run = dry_run))]
pub async fn generate_commit(
    repo: &std::path::Path,
    config: &AppConfig,
    client: &LlmClient,
    apply: bool,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<CommitOutcome> {
    if !prgen_git::has_staged_changes(repo)? {
        warn!("no staged changes");
        return Ok(CommitOutcome::NothingStaged);
    }

    progress.phase("Leyendo cambios staged");
    let mut changes = prgen_git::staged(repo, &config.diff.ignore)?;
    changes.truncate_diff(config.diff.max_chars);
    progress.done("Cambios staged leídos");

    let prompt = PromptBuilder::from_config(&config.prompts).commit(&PromptContext {
        category: classify::detect_dir(repo),
        stats: &changes.stats,
        diff: &changes.diff,
        ..PromptContext::default()
    });

    if dry_run {
        return Ok(CommitOutcome::DryRun { prompt });
    }

    progress.phase(&format!("Generando mensaje con {}", client.name()));
    let raw = client.generate(&prompt).await?;
    let message = prgen_markdown::tidy_commit_message(&raw);
    if message.is_empty() {
        return Err(PrgenError::validation("the model returned an empty commit message"));
    }
    progress.done("Mensaje generado");

    if apply {
        prgen_git::commit(repo, &message)?;
        info!("commit created from suggestion");
    }

    Ok(CommitOutcome::Suggested {
        message,
        applied: apply,
    })
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// Result of [`generate_review`]. `review` is `None` in dry-run mode.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub prompt: String,
    pub review: Option<String>,
}

/// Ask the model for a code review of `range`.
#[instrument(skip_all, fields(repo = %repo.display(), range = %range))]
pub async fn generate_review(
    repo: &std::path::Path,
    range: &ChangeRange,
    config: &AppConfig,
    client: &LlmClient,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<ReviewOutcome> {
    progress.phase("Leyendo cambios");
    let mut changes = prgen_git::collect(repo, range, &config.diff.ignore)?;
    changes.truncate_diff(config.diff.max_chars);
    let label = range.describe();
    progress.done(&format!("Cambios leídos ({label})"));

    let prompt = PromptBuilder::from_config(&config.prompts).review(&PromptContext {
        category: classify::detect_dir(repo),
        branch: &label,
        logs: &changes.logs,
        stats: &changes.stats,
        diff: &changes.diff,
        notes: "",
    });

    if dry_run {
        return Ok(ReviewOutcome { prompt, review: None });
    }

    progress.phase(&format!("Analizando con {}", client.name()));
    let review = client.generate(&prompt).await?.trim().to_string();
    progress.done("Revisión completa");

    Ok(ReviewOutcome {
        prompt,
        review: Some(review),
    })
}

// ---------------------------------------------------------------------------
// Branch names
// ---------------------------------------------------------------------------

/// Suggest branch names for a task description.
#[instrument(skip_all)]
pub async fn suggest_branches(
    description: &str,
    client: &LlmClient,
    progress: &dyn ProgressReporter,
) -> Result<String> {
    if description.trim().is_empty() {
        return Err(PrgenError::validation("a task description is required"));
    }

    progress.phase(&format!("Generando sugerencias con {}", client.name()));
    let suggestions = client
        .generate(&prompt::branch_prompt(description))
        .await?
        .trim()
        .to_string();
    progress.done("Sugerencias listas");

    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;
    use std::sync::Mutex;

    use prgen_llm::MockClient;

    /// Records every progress event.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn done(&self, message: &str) {
            self.events.lock().unwrap().push(format!("done:{message}"));
        }
    }

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// A Laravel-looking repo with one feature commit on `main`.
    fn laravel_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        run_git(repo, &["init"]);
        run_git(repo, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(repo, &["config", "user.name", "test-user"]);
        run_git(repo, &["config", "user.email", "test@example.com"]);
        run_git(repo, &["config", "commit.gpgsign", "false"]);

        std::fs::write(repo.join("artisan"), "#!/usr/bin/env php\n").unwrap();
        run_git(repo, &["add", "."]);
        run_git(repo, &["commit", "-m", "chore: skeleton"]);

        std::fs::create_dir_all(repo.join("app/Http/Controllers")).unwrap();
        std::fs::write(
            repo.join("app/Http/Controllers/RoleController.php"),
            "<?php\nclass RoleController {}\n",
        )
        .unwrap();
        run_git(repo, &["add", "."]);
        run_git(repo, &["commit", "-m", "feat: role controller"]);
        dir
    }

    fn config_with_output(save: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.output.save_path = save.to_string_lossy().into_owned();
        config.prompts.base = save.join("missing-base.md").to_string_lossy().into_owned();
        config.prompts.extra = String::new();
        config
    }

    fn request(repo: &Path) -> PrRequest {
        PrRequest {
            repo: repo.to_path_buf(),
            range: ChangeRange::LastCommits(1),
            project: None,
            notes: String::new(),
            tasks: vec![],
            dry_run: false,
        }
    }

    #[test]
    fn prepare_pr_detects_and_collects() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let draft = prepare_pr(&request(repo.path()), &config_with_output(out.path()), &SilentProgress)
            .unwrap();

        assert_eq!(draft.category, ProjectCategory::Laravel);
        assert_eq!(draft.branch, "main");
        assert_eq!(draft.head_hash.len(), 40);
        assert!(draft.changes.stats.contains("RoleController.php"));
        assert!(draft.prompt.contains("experto en laravel"));
        assert!(draft.prompt.contains("feat: role controller"));
    }

    #[test]
    fn project_override_wins() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let req = PrRequest {
            project: Some(ProjectCategory::Go),
            ..request(repo.path())
        };
        let draft = prepare_pr(&req, &config_with_output(out.path()), &SilentProgress).unwrap();
        assert_eq!(draft.category, ProjectCategory::Go);
    }

    #[tokio::test]
    async fn generate_pr_with_mock_assembles_and_saves() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let config = config_with_output(out.path());
        let req = PrRequest {
            tasks: vec!["TK-42".into()],
            notes: "Probar con usuario admin.".into(),
            ..request(repo.path())
        };
        let progress = RecordingProgress::default();

        let outcome = generate_pr(&req, &config, &LlmClient::Mock(MockClient::default()), &progress)
            .await
            .unwrap();

        let doc = &outcome.document;
        assert_eq!(outcome.category, ProjectCategory::Laravel);
        assert!(doc.contains("## 🗂️ Referencias de tareas\n- TK-42\n\n## 🔍 ¿Qué problema soluciona?"));
        assert!(doc.contains("## 📝 Instrucciones adicionales\nProbar con usuario admin.\n\n## ⚠️"));
        assert!(doc.contains("- [x] Nuevo endpoint en el controlador"));
        assert!(doc.contains("php artisan test"));
        assert_eq!(std::fs::read_to_string(&outcome.path).unwrap(), *doc);
        assert!(outcome.path.starts_with(out.path()));
        assert!(
            outcome
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("PR_")
        );

        let events = progress.events.lock().unwrap();
        assert!(events.iter().any(|e| e == "phase:Generando PR con mock"));
        assert!(events.last().unwrap().starts_with("done:PR guardado"));
    }

    #[tokio::test]
    async fn generate_pr_cleans_messy_model_output() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let messy = "**resumen del cambio**\n---\n* Nuevo controlador\n\n\n\n## Checklist\n- [x] listo";
        let client = LlmClient::Mock(MockClient::with_response(messy));

        let outcome = generate_pr(&request(repo.path()), &config_with_output(out.path()), &client, &SilentProgress)
            .await
            .unwrap();

        assert!(outcome.document.starts_with("## 📌 Resumen del cambio\n- Nuevo controlador\n\n## 🛠️ Cambios realizados"));
        assert!(!outcome.document.contains("- [x] listo"));
    }

    #[tokio::test]
    async fn dry_run_uses_placeholder_body() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let req = PrRequest {
            dry_run: true,
            ..request(repo.path())
        };
        let client = LlmClient::Mock(MockClient::with_response("should not appear"));

        let outcome = generate_pr(&req, &config_with_output(out.path()), &client, &SilentProgress)
            .await
            .unwrap();
        assert!(outcome.document.starts_with(DRY_RUN_BODY));
        assert!(!outcome.document.contains("should not appear"));
    }

    #[tokio::test]
    async fn commit_flow_suggests_and_applies() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let config = config_with_output(out.path());
        let client = LlmClient::Mock(MockClient::with_response("```\nfix(roles): validar nombre\n```"));

        let nothing = generate_commit(repo.path(), &config, &client, false, false, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(nothing, CommitOutcome::NothingStaged);

        std::fs::write(repo.path().join("routes.php"), "<?php\n").unwrap();
        run_git(repo.path(), &["add", "routes.php"]);

        let dry = generate_commit(repo.path(), &config, &client, false, true, &SilentProgress)
            .await
            .unwrap();
        assert!(matches!(dry, CommitOutcome::DryRun { ref prompt } if prompt.contains("routes.php")));

        let applied = generate_commit(repo.path(), &config, &client, true, false, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(
            applied,
            CommitOutcome::Suggested {
                message: "fix(roles): validar nombre".into(),
                applied: true,
            }
        );
        assert!(!prgen_git::has_staged_changes(repo.path()).unwrap());
    }

    #[tokio::test]
    async fn review_flow_and_dry_run() {
        let repo = laravel_repo();
        let out = tempfile::tempdir().unwrap();
        let config = config_with_output(out.path());
        let client = LlmClient::Mock(MockClient::with_response("  1. Falta validar input.  "));
        let range = ChangeRange::LastCommits(1);

        let dry = generate_review(repo.path(), &range, &config, &client, true, &SilentProgress)
            .await
            .unwrap();
        assert!(dry.review.is_none());
        assert!(dry.prompt.contains("RoleController.php"));

        let done = generate_review(repo.path(), &range, &config, &client, false, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(done.review.as_deref(), Some("1. Falta validar input."));
    }

    #[tokio::test]
    async fn branch_suggestions_require_description() {
        let client = LlmClient::Mock(MockClient::with_response("feature/google-oauth-login\n"));
        let err = suggest_branches("  ", &client, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, PrgenError::Validation { .. }));

        let names = suggest_branches("agregar login con google", &client, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(names, "feature/google-oauth-login");
    }
}
