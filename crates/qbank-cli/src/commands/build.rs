use super::{paint, write_json, Style};
use qbank_domain::LocaleStatus;
use qbank_services::{run_pipeline, GeneratedAt, PipelineConfig};
use std::path::PathBuf;

pub struct BuildArgs {
    pub questions_root: Option<PathBuf>,
    pub locales: Vec<String>,
    pub blueprint_id: Option<String>,
    pub bank_version: Option<String>,
    pub generated_at: Option<String>,
    pub format: String,
    pub apply: bool,
}

pub fn run_build(args: BuildArgs, use_color: bool) -> color_eyre::Result<()> {
    let cfg = qbank_config::load_config()?;
    let locales = if args.locales.is_empty() {
        cfg.locales()
    } else {
        args.locales
    };
    let generated_at = args
        .generated_at
        .or_else(|| cfg.generated_at.clone())
        .map(|s| s.parse::<GeneratedAt>())
        .transpose()?
        .unwrap_or_default();
    let pipeline = PipelineConfig {
        questions_root: args.questions_root.unwrap_or_else(|| cfg.questions_root()),
        blueprint_id: args.blueprint_id.unwrap_or_else(|| cfg.blueprint_id()),
        bank_version: args.bank_version.unwrap_or_else(|| cfg.bank_version()),
        locales,
        apply: args.apply,
        generated_at,
        source_date_epoch: std::env::var("SOURCE_DATE_EPOCH").ok(),
    };
    tracing::debug!(event = "build_args", root = %pipeline.questions_root.display(), locales = ?pipeline.locales, apply = pipeline.apply);

    let run = run_pipeline(&pipeline)?;

    if args.format == "json" {
        write_json(&run.report)?;
    } else {
        for l in &run.report.locales {
            match &l.status {
                LocaleStatus::Built { tasks, questions } => crate::ui_ok!(
                    "{}: {} ({} tasks, {} questions)",
                    l.locale,
                    paint("built", Style::Good, use_color),
                    tasks,
                    questions
                ),
                LocaleStatus::Skipped { reason } => crate::ui_warn!(
                    "{}: {} ({})",
                    l.locale,
                    paint("skipped", Style::Warn, use_color),
                    reason
                ),
                LocaleStatus::Failed { error } => crate::ui_err!(
                    "{}: {}: {}",
                    l.locale,
                    paint("failed", Style::Bad, use_color),
                    error
                ),
            }
        }
        if run.report.root_index_written {
            crate::ui_ok!(
                "root index written to {}",
                paint(
                    &pipeline.questions_root.join("index.json").display().to_string(),
                    Style::Path,
                    use_color
                )
            );
        } else if !args.apply && run.root.is_some() {
            crate::ui_info!("dry run: nothing written, pass --apply to write banks and indexes");
        }
    }

    let failed = run.report.failed();
    if failed > 0 {
        color_eyre::eyre::bail!("{failed} locale(s) failed to build");
    }
    Ok(())
}
