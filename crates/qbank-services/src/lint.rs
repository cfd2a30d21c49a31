//! Glossary lint for Russian content: replaces disfavored terms with the
//! preferred ones from a markdown table, keeping the casing of the match.

use crate::{
    util::{json_files_sorted, write_text},
    Result,
};
use color_eyre::eyre::{eyre, WrapErr};
use qbank_core::to_pretty_json;
use qbank_domain::{LintFileReport, LintReport, ReplacementRecord};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use similar::TextDiff;
use std::path::{Path, PathBuf};

const HEADER_CELL: &str = "англицизм";

#[derive(Debug, Clone)]
pub struct GlossaryEntry {
    pub source: String,
    pub replacement: String,
    pattern: Regex,
}

impl GlossaryEntry {
    /// Whole-word, case-insensitive matcher for `source`.
    pub fn new(source: &str, replacement: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(source)))
            .wrap_err_with(|| format!("invalid glossary term {source:?}"))?;
        Ok(Self {
            source: source.to_string(),
            replacement: replacement.to_string(),
            pattern,
        })
    }
}

/// Parse `| source | replacement |` rows. Separator rows, the header row and
/// rows with an empty cell are skipped.
pub fn parse_glossary(text: &str) -> Result<Vec<GlossaryEntry>> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let stripped = line.trim();
        if !stripped.starts_with('|') {
            continue;
        }
        let cells: Vec<&str> = stripped
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim())
            .collect();
        if cells.len() < 2 {
            continue;
        }
        if cells[0].chars().all(|c| matches!(c, '-' | ':' | ' ')) {
            continue;
        }
        if cells[0].to_lowercase() == HEADER_CELL {
            continue;
        }
        let (source, replacement) = (cells[0], cells[1]);
        if source.is_empty() || replacement.is_empty() {
            continue;
        }
        entries.push(GlossaryEntry::new(source, replacement)?);
    }
    Ok(entries)
}

pub fn load_glossary(path: &Path) -> Result<Vec<GlossaryEntry>> {
    if !path.exists() {
        return Err(eyre!("Glossary file not found: {}", path.display()));
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read glossary {}", path.display()))?;
    let entries = parse_glossary(&text)?;
    tracing::debug!(event = "glossary_loaded", entries = entries.len(), path = %path.display());
    Ok(entries)
}

fn is_all_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

fn is_cased(c: char) -> bool {
    c.is_uppercase() || c.is_lowercase()
}

/// Every cased run starts with an uppercase letter followed only by lowercase.
fn is_title(s: &str) -> bool {
    let mut prev_cased = false;
    let mut any = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            any = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            any = true;
        } else {
            prev_cased = false;
        }
    }
    any
}

fn to_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if is_cased(c) {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Carry the casing pattern of `original` over to `replacement`.
pub fn match_case(original: &str, replacement: &str) -> String {
    if is_all_upper(original) {
        return replacement.to_uppercase();
    }
    if is_title(original) {
        return to_title(replacement);
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    replacement.to_string()
}

/// Apply every entry, in table order, to one string.
pub fn apply_glossary(
    text: &str,
    entries: &[GlossaryEntry],
    path: &str,
) -> (String, Vec<ReplacementRecord>) {
    let mut records = Vec::new();
    let mut updated = text.to_string();
    for entry in entries {
        let next = entry
            .pattern
            .replace_all(&updated, |caps: &Captures<'_>| {
                let matched = &caps[0];
                let replaced = match_case(matched, &entry.replacement);
                records.push(ReplacementRecord {
                    path: path.to_string(),
                    source_text: matched.to_string(),
                    replacement_text: replaced.clone(),
                    glossary_source: entry.source.clone(),
                });
                replaced
            })
            .into_owned();
        updated = next;
    }
    (updated, records)
}

/// Rewrite every string in `node`, returning the new document and the list of
/// replacements. `node` itself is left untouched.
pub fn lint_value(
    node: &Value,
    entries: &[GlossaryEntry],
    path: &str,
) -> (Value, Vec<ReplacementRecord>) {
    match node {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            let mut records = Vec::new();
            for (key, value) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let (new_value, sub) = lint_value(value, entries, &child);
                out.insert(key.clone(), new_value);
                records.extend(sub);
            }
            (Value::Object(out), records)
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            let mut records = Vec::new();
            for (index, value) in items.iter().enumerate() {
                let (new_value, sub) = lint_value(value, entries, &format!("{path}[{index}]"));
                out.push(new_value);
                records.extend(sub);
            }
            (Value::Array(out), records)
        }
        Value::String(s) => {
            let (updated, records) = apply_glossary(s, entries, path);
            (Value::String(updated), records)
        }
        other => (other.clone(), Vec::new()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    pub apply: bool,
    pub report_dir: Option<PathBuf>,
}

pub fn unified_diff(label: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(label, label)
        .to_string()
}

/// Lint one JSON file. Returns `None` when nothing had to change.
pub fn lint_file(
    path: &Path,
    entries: &[GlossaryEntry],
    opts: &LintOptions,
) -> Result<Option<LintFileReport>> {
    let original = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let data: Value = serde_json::from_str(&original)
        .wrap_err_with(|| format!("{}: invalid JSON", path.display()))?;

    let (updated, records) = lint_value(&data, entries, "");
    if records.is_empty() {
        return Ok(None);
    }

    let new_text = to_pretty_json(&updated)?;
    let label = path.display().to_string();
    let diff = unified_diff(&label, &original, &new_text);

    if opts.apply {
        write_text(path, &new_text)?;
        tracing::info!(event = "lint_applied", path = %label, replacements = records.len());
    }
    if let Some(dir) = opts.report_dir.as_deref() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.json".to_string());
        write_text(&dir.join(format!("{name}.diff")), &diff)?;
    }

    Ok(Some(LintFileReport {
        file: label,
        replacements: records,
        diff,
    }))
}

/// Lint every `*.json` under `content_root`.
pub fn lint_tree(
    content_root: &Path,
    entries: &[GlossaryEntry],
    opts: &LintOptions,
) -> Result<LintReport> {
    if !content_root.is_dir() {
        return Err(eyre!("content root not found: {}", content_root.display()));
    }
    let files = json_files_sorted(content_root)?;
    let mut reports = Vec::new();
    for path in &files {
        if let Some(report) = lint_file(path, entries, opts)? {
            reports.push(report);
        }
    }
    Ok(LintReport {
        apply: opts.apply,
        checked: files.len(),
        files: reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GLOSSARY: &str = "| Англицизм | Предпочтительный термин |\n| --- | --- |\n| ladder | лестница |\n";

    #[test]
    fn match_case_preserves_common_patterns() {
        assert_eq!(match_case("ladder", "лестница"), "лестница");
        assert_eq!(match_case("Ladder", "лестница"), "Лестница");
        assert_eq!(match_case("LADDER", "лестница"), "ЛЕСТНИЦА");
        assert_eq!(match_case("Hard hat", "защитная каска"), "Защитная каска");
        assert_eq!(match_case("Hard Hat", "защитная каска"), "Защитная Каска");
        assert_eq!(match_case("LaDder", "лестница"), "Лестница");
        assert_eq!(match_case("lADDER", "лестница"), "лестница");
    }

    #[test]
    fn parses_table_skipping_header_and_separator() {
        let text = format!("# Glossary\n\n{GLOSSARY}| |empty|\n| only |\n| welding torch | сварочная горелка |\n");
        let entries = parse_glossary(&text).unwrap();
        let pairs: Vec<_> = entries
            .iter()
            .map(|e| (e.source.as_str(), e.replacement.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("ladder", "лестница"), ("welding torch", "сварочная горелка")]
        );
    }

    #[test]
    fn apply_glossary_records_whole_word_replacements() {
        let entries = parse_glossary(GLOSSARY).unwrap();
        let (updated, records) = apply_glossary("Use a Ladder, not ladders", &entries, "stem");
        assert_eq!(updated, "Use a Лестница, not ladders");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "stem");
        assert_eq!(records[0].source_text, "Ladder");
        assert_eq!(records[0].glossary_source, "ladder");
    }

    #[test]
    fn cyrillic_terms_match_on_word_boundaries() {
        let entries = vec![GlossaryEntry::new("чек-лист", "контрольный список").unwrap()];
        let (updated, records) = apply_glossary("Проверьте Чек-лист и чек-листы", &entries, "");
        assert_eq!(updated, "Проверьте Контрольный список и чек-листы");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn lint_value_is_pure_and_tracks_paths() {
        let entries = parse_glossary(GLOSSARY).unwrap();
        let doc = json!({
            "id": "Q-X_sample_1",
            "stem": "Inspect the ladder",
            "choices": [{"id": "A", "text": "LADDER"}, {"id": "B", "text": "rope"}],
            "weight": 2
        });
        let (updated, records) = lint_value(&doc, &entries, "");
        assert_eq!(doc["stem"], "Inspect the ladder");
        assert_eq!(updated["stem"], "Inspect the лестница");
        assert_eq!(updated["choices"][0]["text"], "ЛЕСТНИЦА");
        assert_eq!(updated["weight"], 2);
        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["stem", "choices[0].text"]);
    }

    #[test]
    fn dry_run_reports_diff_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let glossary = tmp.path().join("glossary.md");
        std::fs::write(&glossary, GLOSSARY).unwrap();
        let entries = load_glossary(&glossary).unwrap();

        let question = tmp.path().join("question.json");
        let original = serde_json::to_string(&json!({"id": "Q-X_sample_1", "stem": "Inspect the ladder"})).unwrap();
        std::fs::write(&question, &original).unwrap();

        let report_dir = tmp.path().join("reports");
        let opts = LintOptions {
            apply: false,
            report_dir: Some(report_dir.clone()),
        };
        let report = lint_file(&question, &entries, &opts).unwrap().expect("changed");
        assert!(report.diff.contains("лестница"));
        assert!(!report.diff.contains("familyId"));
        assert!(!report.replacements.is_empty());
        assert_eq!(std::fs::read_to_string(&question).unwrap(), original);
        let saved = std::fs::read_to_string(report_dir.join("question.json.diff")).unwrap();
        assert_eq!(saved, report.diff);
    }

    #[test]
    fn apply_rewrites_file_and_second_pass_is_clean() {
        let tmp = tempfile::tempdir().unwrap();
        let entries = parse_glossary(GLOSSARY).unwrap();
        let question = tmp.path().join("q.json");
        std::fs::write(&question, r#"{"stem": "ladder"}"#).unwrap();
        let opts = LintOptions {
            apply: true,
            report_dir: None,
        };
        let report = lint_tree(tmp.path(), &entries, &opts).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&question).unwrap(),
            "{\n  \"stem\": \"лестница\"\n}\n"
        );
        let again = lint_tree(tmp.path(), &entries, &opts).unwrap();
        assert!(again.files.is_empty());
        assert_eq!(again.checked, 1);
    }

    #[test]
    fn missing_glossary_is_an_error() {
        let err = load_glossary(Path::new("/nonexistent/glossary_ru.md")).unwrap_err();
        assert!(format!("{err}").contains("Glossary file not found"));
    }
}
