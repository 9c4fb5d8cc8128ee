//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use templatesmith_editor::TemplateEditor;
use templatesmith_fetcher::{FetchProgress, TemplateFetcher, builtin_catalog};
use templatesmith_shared::{
    AppConfig, EditRequest, EditorConfig, FetchConfig, FetchOutcome, FetchReport, init_config,
    load_config,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Templatesmith: fetch and edit print templates.
#[derive(Parser)]
#[command(
    name = "templatesmith",
    version,
    about = "Download the published print templates and edit them with plain-language instructions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
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
    /// Download every template in the built-in catalog.
    Fetch {
        /// Output directory (defaults to `fetcher.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Storage prefix the template names are appended to.
        #[arg(long)]
        base_url: Option<String>,

        /// Maximum simultaneous downloads.
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Apply a plain-language edit to a local template file.
    Edit {
        /// Template file to edit.
        file: PathBuf,

        /// What to change.
        #[arg(short, long)]
        prompt: String,

        /// API key (defaults to the variable named by `editor.api_key_env`).
        #[arg(long)]
        api_key: Option<String>,

        /// Output path (defaults to `<stem>_modified<ext>` next to the input).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "templatesmith=info",
        1 => "templatesmith=debug",
        _ => "templatesmith=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
        Command::Fetch {
            out,
            base_url,
            concurrency,
        } => cmd_fetch(out, base_url, concurrency).await,
        Command::Edit {
            file,
            prompt,
            api_key,
            out,
        } => cmd_edit(&file, &prompt, api_key, out).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fetch(
    out: Option<PathBuf>,
    base_url: Option<String>,
    concurrency: Option<usize>,
) -> Result<()> {
    let config = load_config()?;
    let fetch_config = fetch_config_with_overrides(&config, out, base_url, concurrency);

    info!(
        base_url = %fetch_config.base_url,
        out = %fetch_config.output_dir.display(),
        concurrency = fetch_config.concurrency,
        "fetching template catalog"
    );

    let fetcher = TemplateFetcher::new(fetch_config)?;
    let catalog = builtin_catalog();
    let progress = CliProgress::new();
    let started = Instant::now();

    let report = fetcher.fetch_all(&catalog, &progress).await?;

    println!();
    println!("  Download complete!");
    println!("  Saved:   {}", report.succeeded);
    println!("  Failed:  {}", report.failed.len());
    println!("  Path:    {}", fetcher.output_dir().display());
    println!("  Time:    {:.1}s", started.elapsed().as_secs_f64());
    if !report.failed.is_empty() {
        println!();
        println!("  Failed templates:");
        for name in &report.failed {
            println!("    - {name}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_edit(
    file: &Path,
    prompt: &str,
    api_key: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;
    let editor = TemplateEditor::from_config(EditorConfig::from(&config))?;

    let document = tokio::fs::read_to_string(file)
        .await
        .wrap_err_with(|| format!("failed to read template {}", file.display()))?;
    let source_filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let request = EditRequest::new(document, prompt)
        .with_credential(api_key)
        .with_source_filename(source_filename);

    let spinner = CliProgress::spinner(format!("Editing with {}...", editor.model()));
    let result = editor.apply_edit(request).await;
    spinner.finish_and_clear();
    let result = result?;

    let out_path = out.unwrap_or_else(|| {
        file.parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&result.output_filename)
    });
    if out_path == file {
        return Err(eyre!(
            "refusing to overwrite the input template {}",
            file.display()
        ));
    }

    tokio::fs::write(&out_path, &result.content)
        .await
        .wrap_err_with(|| format!("failed to write {}", out_path.display()))?;

    println!();
    println!("  Template edited!");
    println!("  Output:      {}", out_path.display());
    println!(
        "  Tokens:      {} prompt + {} completion = {}",
        result.usage.prompt_units, result.usage.completion_units, result.usage.total_units
    );
    if let Some(warning) = result.truncation {
        println!(
            "  Warning:     output is {} chars, input was {}; check for truncation",
            warning.output_len, warning.input_len
        );
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Runtime fetch settings with command-line overrides applied.
fn fetch_config_with_overrides(
    config: &AppConfig,
    out: Option<PathBuf>,
    base_url: Option<String>,
    concurrency: Option<usize>,
) -> FetchConfig {
    let mut fetch_config = FetchConfig::from(config);
    if let Some(out) = out {
        fetch_config.output_dir = out;
    }
    if let Some(base_url) = base_url {
        fetch_config.base_url = base_url;
    }
    if let Some(concurrency) = concurrency {
        fetch_config.concurrency = concurrency.max(1);
    }
    fetch_config
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Fetch progress rendered as an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    fn spinner(message: String) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner
    }
}

impl FetchProgress for CliProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    fn entry_done(&self, outcome: &FetchOutcome, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
        if outcome.succeeded {
            self.bar.set_message(outcome.name.clone());
        } else {
            self.bar.println(format!(
                "  ✗ {} ({})",
                outcome.name,
                outcome.error.as_deref().unwrap_or("failed")
            ));
        }
    }

    fn finish(&self, report: &FetchReport) {
        self.bar.finish_with_message(format!(
            "{} saved, {} failed",
            report.succeeded,
            report.failed.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fetch_without_arguments() {
        let cli = Cli::try_parse_from(["templatesmith", "fetch"]).unwrap();
        match cli.command {
            Command::Fetch {
                out,
                base_url,
                concurrency,
            } => {
                assert!(out.is_none());
                assert!(base_url.is_none());
                assert!(concurrency.is_none());
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn cli_parses_edit() {
        let cli = Cli::try_parse_from([
            "templatesmith",
            "-v",
            "edit",
            "invoice.fo.vm",
            "--prompt",
            "add a GSTIN column",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Edit { file, prompt, .. } => {
                assert_eq!(file, PathBuf::from("invoice.fo.vm"));
                assert_eq!(prompt, "add a GSTIN column");
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn edit_requires_prompt() {
        assert!(Cli::try_parse_from(["templatesmith", "edit", "a.xml"]).is_err());
    }

    #[test]
    fn fetch_overrides_apply() {
        let config = AppConfig::default();
        let fc = fetch_config_with_overrides(
            &config,
            Some(PathBuf::from("/tmp/t")),
            Some("http://localhost:9000/".into()),
            Some(0),
        );
        assert_eq!(fc.output_dir, PathBuf::from("/tmp/t"));
        assert_eq!(fc.base_url, "http://localhost:9000/");
        assert_eq!(fc.concurrency, 1);

        let fc = fetch_config_with_overrides(&config, None, None, None);
        assert_eq!(fc.output_dir, PathBuf::from("templates"));
        assert_eq!(fc.concurrency, 10);
    }
}
