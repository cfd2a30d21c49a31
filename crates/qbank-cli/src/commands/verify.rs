use super::{paint, write_json, Style};
use qbank_domain::VerifyStatus;
use qbank_services::verify_locales;
use std::path::PathBuf;

pub fn run_verify(
    questions_root: Option<PathBuf>,
    locales: Vec<String>,
    format: String,
    use_color: bool,
) -> color_eyre::Result<()> {
    let cfg = qbank_config::load_config()?;
    let root = questions_root.unwrap_or_else(|| cfg.questions_root());
    let locales = if locales.is_empty() {
        cfg.locales()
    } else {
        locales
    };

    let report = verify_locales(&root, &locales)?;
    let failures = report.failures().count();

    if format == "json" {
        write_json(&report)?;
    } else {
        for e in report.failures() {
            match e.status {
                VerifyStatus::Missing => crate::ui_err!(
                    "{} {}: {}",
                    e.locale,
                    e.path,
                    paint("missing", Style::Bad, use_color)
                ),
                _ => crate::ui_err!(
                    "{} {}: {} (expected {}, actual {})",
                    e.locale,
                    e.path,
                    paint("mismatch", Style::Bad, use_color),
                    e.expected,
                    e.actual.as_deref().unwrap_or("-")
                ),
            }
        }
        if failures == 0 {
            crate::ui_ok!("{} file(s) match their manifests", report.checked);
        }
    }

    if failures > 0 {
        color_eyre::eyre::bail!("{failures} of {} file(s) failed verification", report.checked);
    }
    Ok(())
}
