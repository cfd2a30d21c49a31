use super::{paint, write_json, Style};
use qbank_services::backfill_tree;
use std::path::PathBuf;

pub fn run_fix_family_id(
    content_root: Option<PathBuf>,
    format: String,
    apply: bool,
    use_color: bool,
) -> color_eyre::Result<()> {
    let cfg = qbank_config::load_config()?;
    let root = content_root.unwrap_or_else(|| cfg.backfill_content_root());
    tracing::debug!(event = "fix_family_id_args", root = %root.display(), apply = apply);

    let report = backfill_tree(&root, apply)?;
    if format == "json" {
        return write_json(&report);
    }

    if report.updates.is_empty() {
        crate::ui_ok!("familyId already set everywhere ({} files checked)", report.checked);
        return Ok(());
    }
    for u in &report.updates {
        crate::ui_out!(
            "{}: {:?} -> {}",
            paint(&u.path, Style::Path, use_color),
            u.previous.as_deref().unwrap_or(""),
            paint(&u.new, Style::Good, use_color)
        );
    }
    if apply {
        crate::ui_ok!("familyId written to {} file(s)", report.updates.len());
    } else {
        crate::ui_info!(
            "dry run: {} file(s) need familyId, pass --apply to write",
            report.updates.len()
        );
    }
    Ok(())
}
