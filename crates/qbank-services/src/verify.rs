use crate::{
    hash::sha256_file,
    index::INDEX_FILE,
    util::resolve_logical,
    Result,
};
use color_eyre::eyre::{eyre, WrapErr};
use qbank_domain::{VerifyEntry, VerifyReport, VerifyStatus};
use serde_json::Value;
use std::path::Path;

/// Expected digests listed in a locale manifest's `files` object. Values may
/// be a digest string or an object carrying `sha256` (or `hash`).
pub fn expected_digests(manifest: &Value) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = manifest
        .get("files")
        .and_then(Value::as_object)
        .map(|files| {
            files
                .iter()
                .filter_map(|(path, v)| {
                    let sha = match v {
                        Value::String(s) => Some(s.as_str()),
                        Value::Object(o) => o
                            .get("sha256")
                            .or_else(|| o.get("hash"))
                            .and_then(Value::as_str),
                        _ => None,
                    }?;
                    (!sha.is_empty()).then(|| (path.clone(), sha.to_lowercase()))
                })
                .collect()
        })
        .unwrap_or_default();
    out.sort();
    out
}

/// Re-hash every file listed in the locale manifests of `locales`.
pub fn verify_locales(questions_root: &Path, locales: &[String]) -> Result<VerifyReport> {
    if !questions_root.is_dir() {
        return Err(eyre!(
            "questions assets dir not found at {}",
            questions_root.display()
        ));
    }
    let mut entries = Vec::new();
    for locale in locales {
        let index_path = questions_root.join(locale).join(INDEX_FILE);
        if !index_path.is_file() {
            tracing::warn!(event = "verify_no_index", locale = %locale, path = %index_path.display());
            continue;
        }
        let text = std::fs::read_to_string(&index_path)
            .wrap_err_with(|| format!("failed to read {}", index_path.display()))?;
        let manifest: Value = serde_json::from_str(&text)
            .wrap_err_with(|| format!("{}: invalid JSON", index_path.display()))?;

        for (path, expected) in expected_digests(&manifest) {
            let file = resolve_logical(questions_root, &path).ok_or_else(|| {
                eyre!(
                    "{}: listed path {path:?} escapes the questions root",
                    index_path.display()
                )
            })?;
            let (status, actual) = if !file.is_file() {
                (VerifyStatus::Missing, None)
            } else {
                let actual = sha256_file(&file)?;
                let status = if actual == expected {
                    VerifyStatus::Ok
                } else {
                    VerifyStatus::Mismatch
                };
                (status, Some(actual))
            };
            if status != VerifyStatus::Ok {
                tracing::warn!(
                    event = "integrity_miss",
                    locale = %locale,
                    path = %path,
                    expected = %expected,
                    actual = actual.as_deref().unwrap_or("missing")
                );
            }
            entries.push(VerifyEntry {
                locale: locale.clone(),
                path,
                status,
                expected,
                actual,
            });
        }
    }
    Ok(VerifyReport {
        checked: entries.len(),
        entries,
    })
}
