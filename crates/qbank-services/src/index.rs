use crate::{hash::sha256_file, util::logical_path, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::eyre::{eyre, Report};
use qbank_domain::{
    AssetRef, FileEntry, FileKind, LocaleManifest, LocaleSummary, RootManifest, TaskBundleEntry,
    LOCALE_INDEX_SCHEMA, ROOT_INDEX_SCHEMA,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

pub const INDEX_FILE: &str = "index.json";
pub const LABELS_REL: &str = "meta/task_labels.json";

/// How the root manifest's `generatedAt` is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeneratedAt {
    /// Reuse the previous root manifest's value, else fall back to `Epoch`.
    #[default]
    Keep,
    /// `SOURCE_DATE_EPOCH` if set, else the Unix epoch.
    Epoch,
    Now,
    Fixed(String),
}

impl FromStr for GeneratedAt {
    type Err = Report;

    /// `keep`, `epoch`, `now`, or an RFC 3339 timestamp used verbatim.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "keep" => GeneratedAt::Keep,
            "epoch" => GeneratedAt::Epoch,
            "now" => GeneratedAt::Now,
            other => {
                DateTime::parse_from_rfc3339(other).map_err(|e| {
                    eyre!("invalid generatedAt {other:?}: expected keep, epoch, now or an RFC 3339 timestamp ({e})")
                })?;
                GeneratedAt::Fixed(other.to_string())
            }
        })
    }
}

fn iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn epoch_stamp(source_date_epoch: Option<&str>) -> String {
    let secs = source_date_epoch
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    let ts = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default();
    iso_millis(ts)
}

/// Resolve `generatedAt` for a root manifest about to be written at
/// `root_index_path`.
pub fn resolve_generated_at(
    mode: &GeneratedAt,
    root_index_path: &Path,
    source_date_epoch: Option<&str>,
) -> String {
    match mode {
        GeneratedAt::Now => iso_millis(Utc::now()),
        GeneratedAt::Fixed(s) => s.clone(),
        GeneratedAt::Epoch => epoch_stamp(source_date_epoch),
        GeneratedAt::Keep => previous_generated_at(root_index_path)
            .unwrap_or_else(|| epoch_stamp(source_date_epoch)),
    }
}

fn previous_generated_at(root_index_path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(root_index_path).ok()?;
    let v: serde_json::Value = serde_json::from_str(&text).ok()?;
    v.get("generatedAt")
        .and_then(|g| g.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Hash the optional label file of a locale. Absence is not an error.
pub fn labels_entry(locale_dir: &Path, locale: &str) -> Result<Option<AssetRef>> {
    let labels = locale_dir.join(LABELS_REL);
    if !labels.is_file() {
        tracing::warn!(
            event = "labels_missing",
            locale = locale,
            path = %labels.display(),
            "no meta/task_labels.json for locale"
        );
        return Ok(None);
    }
    Ok(Some(AssetRef {
        path: logical_path(locale, LABELS_REL),
        sha256: sha256_file(&labels)?,
    }))
}

/// Collect manifest entries for one locale, keyed by logical path.
pub fn manifest_files(
    bank: &AssetRef,
    meta: Option<&AssetRef>,
    tasks: &[TaskBundleEntry],
) -> BTreeMap<String, FileEntry> {
    let mut files = BTreeMap::new();
    if let Some(meta) = meta {
        files.insert(
            meta.path.clone(),
            FileEntry {
                kind: FileKind::Meta,
                sha256: meta.sha256.clone(),
                task_id: None,
                question_count: None,
            },
        );
    }
    files.insert(
        bank.path.clone(),
        FileEntry {
            kind: FileKind::Bank,
            sha256: bank.sha256.clone(),
            task_id: None,
            question_count: None,
        },
    );
    for t in tasks {
        files.insert(
            t.path.clone(),
            FileEntry {
                kind: FileKind::Task,
                sha256: t.sha256.clone(),
                task_id: Some(t.task_id.clone()),
                question_count: Some(t.question_count),
            },
        );
    }
    files
}

pub fn locale_manifest(
    locale: &str,
    blueprint_id: &str,
    bank_version: &str,
    summary: &LocaleSummary,
) -> LocaleManifest {
    LocaleManifest {
        schema: LOCALE_INDEX_SCHEMA.to_string(),
        locale: locale.to_string(),
        blueprint_id: blueprint_id.to_string(),
        bank_version: bank_version.to_string(),
        files: summary.files.clone(),
    }
}

pub fn root_manifest(
    blueprint_id: &str,
    bank_version: &str,
    generated_at: String,
    locales: BTreeMap<String, LocaleSummary>,
) -> RootManifest {
    RootManifest {
        schema: ROOT_INDEX_SCHEMA.to_string(),
        blueprint_id: blueprint_id.to_string(),
        bank_version: bank_version.to_string(),
        generated_at,
        locales,
    }
}
