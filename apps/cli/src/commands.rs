//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use prgen_core::pipeline::{self, CommitOutcome, PrRequest, ProgressReporter};
use prgen_core::{NotesSource, notes};
use prgen_git::ChangeRange;
use prgen_llm::{LlmClient, MockClient};
use prgen_shared::{AppConfig, ProjectCategory, init_config, load_config, mask_secret};

use crate::clipboard;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// prgen: AI-written pull request descriptions from your git history.
#[derive(Parser)]
#[command(
    name = "prgen",
    version,
    about = "Generate pull request descriptions from git commits using your preferred LLM.",
    long_about = None
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Running without a subcommand is `generate`. These flags are ignored
    /// when a subcommand is given.
    #[command(flatten)]
    pub generate: GenerateArgs,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a PR description from recent commits (default).
    #[command(visible_aliases = ["gen", "g"])]
    Generate(GenerateArgs),

    /// Suggest a Conventional Commits message for the staged changes.
    Commit {
        /// Run `git commit` with the suggested message.
        #[arg(long)]
        apply: bool,

        /// Print the prompt and exit without calling the model.
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        llm: LlmOverrides,
    },

    /// Ask the model for a code review of recent changes.
    Review {
        #[command(flatten)]
        range: RangeArgs,

        /// Print the prompt and exit without calling the model.
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        llm: LlmOverrides,
    },

    /// Suggest branch names for a task description.
    Branch {
        /// What you are going to work on.
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        #[command(flatten)]
        llm: LlmOverrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options of the `generate` command.
#[derive(Args, Debug, Clone)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Additional instructions (inline).
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Read additional instructions from a file.
    #[arg(long)]
    pub notes_file: Option<PathBuf>,

    /// Type additional instructions, ending with a line containing only END.
    #[arg(short, long)]
    pub interactive_notes: bool,

    /// Comma-separated task ids, e.g. TK-123,TK-456.
    #[arg(long, value_delimiter = ',')]
    pub tasks: Vec<String>,

    /// Force the project type instead of detecting it.
    #[arg(long)]
    pub project: Option<ProjectCategory>,

    /// Skip the model call and use a placeholder body.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the prompt and exit.
    #[arg(long)]
    pub dump_prompt: bool,

    /// Do not copy the result to the clipboard.
    #[arg(long)]
    pub no_clipboard: bool,

    #[command(flatten)]
    pub llm: LlmOverrides,
}

/// Which commits to look at.
#[derive(Args, Debug, Clone)]
pub(crate) struct RangeArgs {
    /// Number of commits to analyze.
    #[arg(short, long, default_value_t = 1)]
    pub commits: u32,

    /// Base ref/branch to compare from.
    #[arg(long)]
    pub from: Option<String>,

    /// Target ref/branch to compare to (defaults to HEAD).
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

impl RangeArgs {
    fn to_range(&self) -> ChangeRange {
        match &self.from {
            Some(from) => ChangeRange::between(from.clone(), self.to.clone()),
            None => ChangeRange::LastCommits(self.commits),
        }
    }
}

/// Per-invocation model overrides.
#[derive(Args, Debug, Clone)]
pub(crate) struct LlmOverrides {
    /// LLM provider override (ollama, openai, groq, openrouter, mock).
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model override.
    #[arg(short, long)]
    pub model: Option<String>,
}

impl LlmOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prgen=info",
        1 => "prgen=debug",
        _ => "prgen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => cmd_generate(&cli.generate).await,
        Some(Command::Generate(args)) => cmd_generate(&args).await,
        Some(Command::Commit { apply, dry_run, llm }) => cmd_commit(apply, dry_run, &llm).await,
        Some(Command::Review { range, dry_run, llm }) => cmd_review(&range, dry_run, &llm).await,
        Some(Command::Branch { description, llm }) => cmd_branch(&description.join(" "), &llm).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Resolved config with CLI overrides applied last.
fn resolve_config(llm: &LlmOverrides) -> Result<AppConfig> {
    let mut config = load_config()?;
    llm.apply(&mut config);
    Ok(config)
}

fn current_repo() -> Result<PathBuf> {
    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    if !prgen_git::is_git_repo(&cwd) {
        return Err(eyre!("'{}' is not inside a git repository", cwd.display()));
    }
    Ok(cwd)
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn cmd_generate(args: &GenerateArgs) -> Result<()> {
    let config = resolve_config(&args.llm)?;
    let repo = current_repo()?;

    // Read stdin before the spinner takes over the terminal.
    let source = NotesSource::select(
        args.notes.clone(),
        args.notes_file.clone(),
        args.interactive_notes,
    );
    if source.is_interactive() {
        eprintln!(
            "Escribe instrucciones adicionales (termina con una línea que contenga solo '{}'):",
            notes::END_MARKER
        );
    }
    let notes = source.read()?;

    let request = PrRequest {
        repo,
        range: args.range.to_range(),
        project: args.project,
        notes,
        tasks: args.tasks.clone(),
        dry_run: args.dry_run,
    };

    info!(range = %request.range, dry_run = request.dry_run, "generating PR description");

    if args.dump_prompt {
        let draft = pipeline::prepare_pr(&request, &config, &pipeline::SilentProgress)?;
        println!("{}", draft.prompt);
        return Ok(());
    }

    let client = if args.dry_run {
        LlmClient::Mock(MockClient::default())
    } else {
        LlmClient::from_config(&config.llm)?
    };

    let reporter = CliProgress::new();
    let outcome = pipeline::generate_pr(&request, &config, &client, &reporter).await;
    reporter.finish();
    let outcome = outcome?;

    println!();
    println!("  PR description generated!");
    println!("  Project: {}", outcome.category);
    println!("  Path:    {}", outcome.path.display());
    println!("  Time:    {:.1}s", outcome.elapsed.as_secs_f64());

    if config.output.copy_to_clipboard && !args.no_clipboard {
        match clipboard::copy(&outcome.document) {
            Some(tool) => println!("  Copied to clipboard ({tool})"),
            None => println!("  Clipboard unavailable, open the file instead"),
        }
    }
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// commit / review / branch
// ---------------------------------------------------------------------------

async fn cmd_commit(apply: bool, dry_run: bool, llm: &LlmOverrides) -> Result<()> {
    let config = resolve_config(llm)?;
    let repo = current_repo()?;
    let client = if dry_run {
        LlmClient::Mock(MockClient::default())
    } else {
        LlmClient::from_config(&config.llm)?
    };

    let reporter = CliProgress::new();
    let outcome = pipeline::generate_commit(&repo, &config, &client, apply, dry_run, &reporter).await;
    reporter.finish();

    match outcome? {
        CommitOutcome::NothingStaged => {
            eprintln!("No hay cambios staged. Usa 'git add <archivos>' primero.");
        }
        CommitOutcome::DryRun { prompt } => {
            println!("{prompt}");
        }
        CommitOutcome::Suggested { message, applied } => {
            print_boxed("Mensaje sugerido", &message);
            if applied {
                println!("Commit creado.");
            } else {
                let subject = message.lines().next().unwrap_or_default();
                println!("Para aplicarlo:");
                println!("  git commit -m {subject:?}");
                println!("\nO ejecuta:");
                println!("  prgen commit --apply");
            }
        }
    }

    Ok(())
}

async fn cmd_review(range: &RangeArgs, dry_run: bool, llm: &LlmOverrides) -> Result<()> {
    let config = resolve_config(llm)?;
    let repo = current_repo()?;
    let client = if dry_run {
        LlmClient::Mock(MockClient::default())
    } else {
        LlmClient::from_config(&config.llm)?
    };

    let reporter = CliProgress::new();
    let outcome =
        pipeline::generate_review(&repo, &range.to_range(), &config, &client, dry_run, &reporter).await;
    reporter.finish();
    let outcome = outcome?;

    println!();
    println!("{}", outcome.review.as_deref().unwrap_or(&outcome.prompt));
    println!();
    Ok(())
}

async fn cmd_branch(description: &str, llm: &LlmOverrides) -> Result<()> {
    let config = resolve_config(llm)?;
    let client = LlmClient::from_config(&config.llm)?;

    let reporter = CliProgress::new();
    let suggestions = pipeline::suggest_branches(description, &client, &reporter).await;
    reporter.finish();

    print_boxed("Sugerencias de rama", &suggestions?);
    println!("Para crear la rama elegida:");
    println!("  git checkout -b <nombre-elegido>");
    println!();
    Ok(())
}

fn print_boxed(title: &str, body: &str) {
    let rule = "─".repeat(60);
    println!();
    println!("┌─ {title} {}", "─".repeat(56usize.saturating_sub(title.chars().count())));
    println!("{body}");
    println!("└{rule}");
    println!();
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    println!(
        "# API key ({}): {}",
        config.llm.api_key_env.join(" | "),
        mask_secret(config.llm.api_key().as_deref())
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(format!("{name}..."));
    }

    fn done(&self, message: &str) {
        self.spinner.println(format!(" ✔ {message}"));
    }
}
