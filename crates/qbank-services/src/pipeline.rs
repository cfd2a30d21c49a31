//! Bank and index aggregation over every configured locale.

use crate::{
    bank::{build_bank, render_bank, write_bank, BANK_FILE},
    hash::{sha256_bytes, sha256_file},
    index::{
        labels_entry, locale_manifest, manifest_files, resolve_generated_at, root_manifest,
        GeneratedAt, INDEX_FILE,
    },
    util::{json_files_in, logical_path, write_text},
    Result,
};
use color_eyre::eyre::{eyre, Report, WrapErr};
use qbank_core::{to_pretty_json, QbankError};
use qbank_domain::{
    AssetRef, BuildReport, LocaleManifest, LocaleReport, LocaleStatus, LocaleSummary,
    RootManifest, TaskBundleEntry,
};
use qbank_validate::{load_task_questions, task_id_from_path};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything the pipeline needs; no module-level constants are consulted.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub questions_root: PathBuf,
    pub blueprint_id: String,
    pub bank_version: String,
    pub locales: Vec<String>,
    /// Write artifacts to disk. When false everything is computed but nothing
    /// is written.
    pub apply: bool,
    pub generated_at: GeneratedAt,
    pub source_date_epoch: Option<String>,
}

/// In-memory result of building one locale.
#[derive(Debug, Clone)]
pub struct LocaleBuild {
    pub locale: String,
    pub summary: LocaleSummary,
    pub manifest: LocaleManifest,
    pub bank_json: String,
}

#[derive(Debug, Clone)]
pub enum LocaleOutcome {
    Built(Box<LocaleBuild>),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: BuildReport,
    pub builds: Vec<LocaleBuild>,
    pub root: Option<RootManifest>,
}

/// Build banks and manifests for every configured locale, then the root
/// manifest. A broken locale is reported as failed and the remaining locales
/// are still processed; the root manifest is only produced when no locale
/// failed.
pub fn run_pipeline(cfg: &PipelineConfig) -> Result<PipelineRun> {
    if !cfg.questions_root.is_dir() {
        return Err(Report::new(QbankError::MissingDir(
            cfg.questions_root.display().to_string(),
        ))
        .wrap_err("questions assets dir not found"));
    }
    tracing::info!(event = "pipeline_start", root = %cfg.questions_root.display(), apply = cfg.apply);

    let mut reports = Vec::new();
    let mut builds: Vec<LocaleBuild> = Vec::new();
    for locale in &cfg.locales {
        let status = match build_locale(cfg, locale) {
            LocaleOutcome::Built(build) => {
                let status = LocaleStatus::Built {
                    tasks: build.summary.tasks,
                    questions: build.summary.questions,
                };
                builds.push(*build);
                status
            }
            LocaleOutcome::Skipped(reason) => {
                tracing::warn!(event = "locale_skipped", locale = %locale, reason = %reason);
                LocaleStatus::Skipped { reason }
            }
            LocaleOutcome::Failed(error) => {
                tracing::error!(event = "locale_failed", locale = %locale, error = %error);
                LocaleStatus::Failed { error }
            }
        };
        reports.push(LocaleReport {
            locale: locale.clone(),
            status,
        });
    }

    let failed = reports
        .iter()
        .any(|r| matches!(r.status, LocaleStatus::Failed { .. }));
    let mut root = None;
    let mut root_index_written = false;
    if builds.is_empty() {
        tracing::warn!(event = "root_index_skipped", "no locales processed, root index will not be written");
    } else if failed {
        tracing::warn!(event = "root_index_skipped", "some locales failed, root index will not be written");
    } else {
        let root_path = cfg.questions_root.join(INDEX_FILE);
        let generated_at = resolve_generated_at(
            &cfg.generated_at,
            &root_path,
            cfg.source_date_epoch.as_deref(),
        );
        let locales: BTreeMap<String, LocaleSummary> = builds
            .iter()
            .map(|b| (b.locale.clone(), b.summary.clone()))
            .collect();
        let manifest = root_manifest(&cfg.blueprint_id, &cfg.bank_version, generated_at, locales);
        if cfg.apply {
            write_text(&root_path, &to_pretty_json(&manifest)?)?;
            root_index_written = true;
            tracing::info!(event = "root_index_written", path = %root_path.display());
        }
        root = Some(manifest);
    }

    Ok(PipelineRun {
        report: BuildReport {
            apply: cfg.apply,
            locales: reports,
            root_index_written,
        },
        builds,
        root,
    })
}

/// Build one locale. Nothing is written unless every task bundle validates.
pub fn build_locale(cfg: &PipelineConfig, locale: &str) -> LocaleOutcome {
    let locale_dir = cfg.questions_root.join(locale);
    let tasks_dir = locale_dir.join("tasks");
    if !tasks_dir.is_dir() {
        return LocaleOutcome::Skipped(format!(
            "tasks dir not found at {}",
            tasks_dir.display()
        ));
    }
    let task_files = match json_files_in(&tasks_dir) {
        Ok(files) => files,
        Err(e) => return LocaleOutcome::Failed(format!("{e:#}")),
    };
    if task_files.is_empty() {
        return LocaleOutcome::Skipped(format!(
            "no task JSON files found in {}",
            tasks_dir.display()
        ));
    }

    tracing::info!(event = "locale_build", locale = locale, tasks = task_files.len());
    match assemble_locale(cfg, locale, &task_files) {
        Ok(build) => LocaleOutcome::Built(Box::new(build)),
        Err(e) => LocaleOutcome::Failed(format!("{e:#}")),
    }
}

fn assemble_locale(
    cfg: &PipelineConfig,
    locale: &str,
    task_files: &[PathBuf],
) -> Result<LocaleBuild> {
    let locale_dir = cfg.questions_root.join(locale);

    let mut bundles = Vec::with_capacity(task_files.len());
    let mut entries = Vec::with_capacity(task_files.len());
    for file in task_files {
        let task_id = task_id_from_path(file)
            .ok_or_else(|| eyre!("{}: cannot derive task id from file name", file.display()))?;
        let questions = load_task_questions(file, locale, &task_id)?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        entries.push(TaskBundleEntry {
            task_id,
            path: logical_path(locale, &format!("tasks/{name}")),
            sha256: sha256_file(file)?,
            question_count: questions.len(),
        });
        bundles.push(questions);
    }

    let bank = build_bank(bundles);
    let bank_json = render_bank(&bank)?;
    let bank_ref = AssetRef {
        path: logical_path(locale, BANK_FILE),
        sha256: sha256_bytes(bank_json.as_bytes()),
    };
    let meta = labels_entry(&locale_dir, locale)?;

    let summary = LocaleSummary {
        tasks: entries.len(),
        questions: bank.len(),
        files: manifest_files(&bank_ref, meta.as_ref(), &entries),
        bank: bank_ref,
        meta,
        task_bundles: entries,
    };
    let manifest = locale_manifest(locale, &cfg.blueprint_id, &cfg.bank_version, &summary);

    if cfg.apply {
        let index_json = to_pretty_json(&manifest)?;
        commit_locale(&locale_dir, &bank_json, &index_json)
            .wrap_err_with(|| format!("locale {locale}: failed to write bank and index"))?;
        tracing::info!(
            event = "locale_written",
            locale = locale,
            questions = summary.questions,
            path = %locale_dir.join(INDEX_FILE).display()
        );
    }

    Ok(LocaleBuild {
        locale: locale.to_string(),
        summary,
        manifest,
        bank_json,
    })
}

/// Stage bank and index next to their targets, then move them into place.
/// The index goes first, so a failed commit never leaves a fresh bank behind.
fn commit_locale(locale_dir: &Path, bank_json: &str, index_json: &str) -> Result<()> {
    let bank_path = locale_dir.join(BANK_FILE);
    let index_path = locale_dir.join(INDEX_FILE);
    let bank_tmp = staging_path(&bank_path);
    let index_tmp = staging_path(&index_path);

    let staged = write_bank(&bank_tmp, bank_json).and_then(|_| write_text(&index_tmp, index_json));
    if let Err(e) = staged {
        discard(&[&bank_tmp, &index_tmp]);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&index_tmp, &index_path) {
        discard(&[&bank_tmp, &index_tmp]);
        return Err(e).wrap_err_with(|| format!("failed to replace {}", index_path.display()));
    }
    if let Err(e) = std::fs::rename(&bank_tmp, &bank_path) {
        discard(&[&bank_tmp, &index_path]);
        return Err(e).wrap_err_with(|| format!("failed to replace {}", bank_path.display()));
    }
    Ok(())
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn discard(paths: &[&Path]) {
    for p in paths {
        if let Err(e) = std::fs::remove_file(p) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(event = "cleanup_failed", path = %p.display(), error = %e);
            }
        }
    }
}
