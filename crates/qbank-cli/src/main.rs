mod commands;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use commands::{build::BuildArgs, lint_ru::LintArgs};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "qbank", version, about = "Question bank content tools")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress console logs (results are still printed)
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Also write a daily-rolling debug log into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate task bundles, build per-locale banks and index manifests
    Build {
        #[arg(long)]
        questions_root: Option<PathBuf>,
        /// Locale to build; repeat for several (default: from config)
        #[arg(long = "locale")]
        locales: Vec<String>,
        #[arg(long)]
        blueprint_id: Option<String>,
        #[arg(long)]
        bank_version: Option<String>,
        /// keep | epoch | now | literal timestamp
        #[arg(long)]
        generated_at: Option<String>,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        /// Write banks and indexes (dry run otherwise)
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Replace anglicisms in Russian content using the glossary table
    LintRu {
        #[arg(long)]
        content_root: Option<PathBuf>,
        #[arg(long)]
        glossary: Option<PathBuf>,
        /// Directory for per-file unified diffs
        #[arg(long, conflicts_with = "no_report")]
        report_dir: Option<PathBuf>,
        /// Do not write diff reports
        #[arg(long, default_value_t = false)]
        no_report: bool,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Add a derived familyId to question documents that lack one
    FixFamilyId {
        #[arg(long)]
        content_root: Option<PathBuf>,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },

    /// Re-hash every file listed in the locale manifests
    Verify {
        #[arg(long)]
        questions_root: Option<PathBuf>,
        #[arg(long = "locale")]
        locales: Vec<String>,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Dump JSON Schemas of manifests and reports
    Schema {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = self.name();
        info!(event = "command_start", cmd = cmd_name);

        let result = match self {
            Commands::Build {
                questions_root,
                locales,
                blueprint_id,
                bank_version,
                generated_at,
                format,
                apply,
            } => commands::build::run_build(
                BuildArgs {
                    questions_root,
                    locales,
                    blueprint_id,
                    bank_version,
                    generated_at,
                    format,
                    apply,
                },
                use_color,
            ),
            Commands::LintRu {
                content_root,
                glossary,
                report_dir,
                no_report,
                format,
                apply,
            } => commands::lint_ru::run_lint_ru(
                LintArgs {
                    content_root,
                    glossary,
                    report_dir,
                    no_report,
                    format,
                    apply,
                },
                use_color,
            ),
            Commands::FixFamilyId {
                content_root,
                format,
                apply,
            } => commands::fix_family_id::run_fix_family_id(content_root, format, apply, use_color),
            Commands::Verify {
                questions_root,
                locales,
                format,
            } => commands::verify::run_verify(questions_root, locales, format, use_color),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };

        match &result {
            Ok(_) => info!(event = "command_finish", cmd = cmd_name),
            Err(e) => error!(event = "command_failed", cmd = cmd_name, error = %e),
        }

        result
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Build { .. } => "build",
            Commands::LintRu { .. } => "lint-ru",
            Commands::FixFamilyId { .. } => "fix-family-id",
            Commands::Verify { .. } => "verify",
            Commands::Schema { .. } => "schema",
        }
    }
}

/// Console layer on stderr, plus a debug file layer when `log_dir` is set.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_tracing(quiet: bool, ansi: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console_filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = rolling::daily(dir, "qbank.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let use_color = !cli.no_color && std::io::stdout().is_terminal() && !no_color_env;
    let ansi = !cli.no_color && std::io::stderr().is_terminal() && !no_color_env;
    let _guard = init_tracing(cli.quiet, ansi, cli.log_dir.as_deref());

    cli.cmd.run(use_color)
}
