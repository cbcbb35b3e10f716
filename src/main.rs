use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use notetag::classifier::{
    Classifier, ClassifierError, MetadataGenerator, MetadataGeneratorBuilder, OpenAiClientBuilder,
};
use notetag::{AuditLog, ConfigError, DocumentProcessor, FsStorage, MergeMode, RunConfig, RunContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// notetag - generate YAML front matter for Markdown notes
#[derive(Parser)]
#[command(name = "notetag")]
#[command(about = "Generate, merge or replace YAML front matter in a folder of Markdown notes")]
#[command(version)]
struct Cli {
    /// Merge generated metadata into existing front matter
    #[arg(long, visible_alias = "opt1")]
    merge: bool,

    /// Replace existing front matter with generated metadata
    #[arg(long, visible_alias = "opt2")]
    replace: bool,

    /// Use fixed metadata instead of calling the classification service
    #[arg(long)]
    test: bool,

    /// Reference note whose `tags` form the known vocabulary
    #[arg(long, value_name = "PATH", default_value = "config/reference.md")]
    reference: PathBuf,

    /// Prompt template with `{reference}` and `{target_content}` placeholders
    #[arg(long, value_name = "PATH", default_value = "config/prompt.md")]
    prompt: PathBuf,

    /// Folder of notes to process
    #[arg(long, value_name = "DIR", default_value = "notes")]
    notes_dir: PathBuf,

    /// Folder for the action and novel label logs
    #[arg(long, value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Chat model to use (overrides OPENAI_MODEL)
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Resolves the flags into run parameters.
    fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let mode =
            MergeMode::from_flags(self.merge, self.replace).ok_or(ConfigError::ConflictingModes)?;

        Ok(RunConfig {
            mode,
            test_mode: self.test,
            reference_path: self.reference.clone(),
            prompt_path: self.prompt.clone(),
            notes_dir: self.notes_dir.clone(),
            log_dir: self.log_dir.clone(),
        })
    }
}

fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Sends log output to stderr, honoring `RUST_LOG` when it is set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad flags, missing or malformed inputs and a missing or
/// invalid service configuration. Everything else is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ConfigError>().is_some()
        || matches!(
            error.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::MissingApiKey | ClassifierError::InvalidUrl(_))
        )
}

/// Runs one pass over the notes folder.
///
/// Per-note failures do not fail the run; they are listed after the summary.
fn run(cli: &Cli) -> Result<()> {
    let config = cli.run_config()?;
    let context = RunContext::load(&config)?;
    let classifier = build_classifier(cli)?;
    let audit = AuditLog::create(&config.log_dir).with_context(|| {
        format!("Failed to create log files in {}", config.log_dir.display())
    })?;

    info!(
        mode = %config.mode,
        test_mode = config.test_mode,
        vocabulary = context.vocabulary.len(),
        notes_dir = %config.notes_dir.display(),
        "starting run"
    );

    let processor =
        DocumentProcessor::new(context, classifier, Arc::new(FsStorage), Arc::new(audit));
    let summary = processor.process_folder(&config.notes_dir);

    println!("Processed notes: {summary}");
    for failure in &summary.failures {
        eprintln!("  {}: {}", failure.path.display(), failure.message);
    }

    Ok(())
}

/// Builds the metadata generator.
///
/// Test mode never talks to the service, so no client (and no API key) is
/// needed for it.
fn build_classifier(cli: &Cli) -> Result<Arc<dyn Classifier>> {
    if cli.test {
        return Ok(Arc::new(MetadataGeneratorBuilder::new().build()));
    }

    let mut builder = OpenAiClientBuilder::new();
    if let Some(model) = &cli.model {
        builder = builder.model(model.clone());
    }
    let client = builder
        .build()
        .context("Failed to configure the classification client")?;

    Ok(Arc::new(MetadataGenerator::new(Arc::new(client))))
}
