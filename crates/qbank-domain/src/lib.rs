use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema tag of `<questions-root>/<locale>/index.json`.
pub const LOCALE_INDEX_SCHEMA: &str = "questions-locale-index-v2";
/// Schema tag of `<questions-root>/index.json`.
pub const ROOT_INDEX_SCHEMA: &str = "questions-index-v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Task,
    Bank,
    Meta,
}

/// One hashed asset inside a locale manifest, keyed by its logical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub kind: FileKind,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocaleManifest {
    pub schema: String,
    pub locale: String,
    pub blueprint_id: String,
    pub bank_version: String,
    /// Logical path (`questions/<locale>/...`) to entry, sorted by path.
    pub files: BTreeMap<String, FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssetRef {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskBundleEntry {
    pub task_id: String,
    pub path: String,
    pub sha256: String,
    pub question_count: usize,
}

/// Per-locale block of the root manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocaleSummary {
    pub tasks: usize,
    pub questions: usize,
    pub bank: AssetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<AssetRef>,
    pub task_bundles: Vec<TaskBundleEntry>,
    pub files: BTreeMap<String, FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RootManifest {
    pub schema: String,
    pub blueprint_id: String,
    pub bank_version: String,
    pub generated_at: String,
    pub locales: BTreeMap<String, LocaleSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LocaleStatus {
    Built { tasks: usize, questions: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocaleReport {
    pub locale: String,
    #[serde(flatten)]
    pub status: LocaleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub apply: bool,
    pub locales: Vec<LocaleReport>,
    pub root_index_written: bool,
}

impl BuildReport {
    pub fn failed(&self) -> usize {
        self.locales
            .iter()
            .filter(|l| matches!(l.status, LocaleStatus::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRecord {
    pub path: String,
    pub source_text: String,
    pub replacement_text: String,
    pub glossary_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LintFileReport {
    pub file: String,
    pub replacements: Vec<ReplacementRecord>,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    pub apply: bool,
    pub checked: usize,
    pub files: Vec<LintFileReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FamilyUpdate {
    pub path: String,
    pub previous: Option<String>,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BackfillReport {
    pub apply: bool,
    pub checked: usize,
    pub updates: Vec<FamilyUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    Ok,
    Mismatch,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VerifyEntry {
    pub locale: String,
    pub path: String,
    pub status: VerifyStatus,
    pub expected: String,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VerifyReport {
    pub checked: usize,
    pub entries: Vec<VerifyEntry>,
}

impl VerifyReport {
    pub fn failures(&self) -> impl Iterator<Item = &VerifyEntry> {
        self.entries.iter().filter(|e| e.status != VerifyStatus::Ok)
    }
}
