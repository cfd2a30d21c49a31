use std::fs;
use std::path::PathBuf;

pub fn run_schema(out_dir: Option<PathBuf>) -> color_eyre::Result<()> {
    let out_dir = match out_dir {
        Some(dir) => dir,
        None => qbank_config::load_config()?.schema_dir(),
    };
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(qbank_domain::LocaleManifest, "locale_index.schema.json");
    dump!(qbank_domain::RootManifest, "root_index.schema.json");
    dump!(qbank_domain::BuildReport, "build_report.schema.json");
    dump!(qbank_domain::LintReport, "lint_report.schema.json");
    dump!(qbank_domain::BackfillReport, "backfill_report.schema.json");
    dump!(qbank_domain::VerifyReport, "verify_report.schema.json");
    crate::ui_ok!("schemas written to {}", out_dir.display());
    Ok(())
}
