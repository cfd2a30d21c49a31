use super::{paint, write_json, Style};
use qbank_services::{lint_tree, load_glossary, LintOptions};
use std::path::PathBuf;

pub struct LintArgs {
    pub content_root: Option<PathBuf>,
    pub glossary: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub no_report: bool,
    pub format: String,
    pub apply: bool,
}

pub fn run_lint_ru(args: LintArgs, use_color: bool) -> color_eyre::Result<()> {
    let cfg = qbank_config::load_config()?;
    let content_root = args.content_root.unwrap_or_else(|| cfg.lint_content_root());
    let glossary = args.glossary.unwrap_or_else(|| cfg.glossary());
    let report_dir = if args.no_report {
        None
    } else {
        Some(args.report_dir.unwrap_or_else(|| cfg.report_dir()))
    };
    tracing::debug!(event = "lint_args", root = %content_root.display(), glossary = %glossary.display(), report_dir = ?report_dir, apply = args.apply);

    let entries = load_glossary(&glossary)?;
    let report = lint_tree(
        &content_root,
        &entries,
        &LintOptions {
            apply: args.apply,
            report_dir: report_dir.clone(),
        },
    )?;

    if args.format == "json" {
        return write_json(&report);
    }

    if report.files.is_empty() {
        crate::ui_ok!("no glossary replacements needed ({} files checked)", report.checked);
        return Ok(());
    }
    for file in &report.files {
        crate::ui_out!(
            "{}: {} replacement(s)",
            paint(&file.file, Style::Path, use_color),
            file.replacements.len()
        );
        for r in &file.replacements {
            crate::ui_out!(
                "  {}: {} -> {}",
                r.path,
                paint(&r.source_text, Style::Bad, use_color),
                paint(&r.replacement_text, Style::Good, use_color)
            );
        }
    }
    let total: usize = report.files.iter().map(|f| f.replacements.len()).sum();
    if let Some(dir) = report_dir.as_ref() {
        crate::ui_info!("diffs written to {}", dir.display());
    }
    if args.apply {
        crate::ui_ok!("{} replacement(s) applied in {} file(s)", total, report.files.len());
    } else {
        crate::ui_info!(
            "dry run: {} replacement(s) in {} file(s), pass --apply to write",
            total,
            report.files.len()
        );
    }
    Ok(())
}
