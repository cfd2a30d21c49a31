use crate::{
    util::{json_files_sorted, write_text},
    Result,
};
use color_eyre::eyre::{eyre, WrapErr};
use qbank_core::{family_id, to_pretty_json};
use qbank_domain::{BackfillReport, FamilyUpdate};
use serde_json::{Map, Value};
use std::path::Path;

/// Insert `familyId` when the document has an `id` but no usable `familyId`.
///
/// Returns `(previous, new)` when the document changed. A non-empty string
/// `familyId` is never replaced, even if it disagrees with the id.
pub fn ensure_family_id(doc: &mut Map<String, Value>) -> Option<(Option<String>, String)> {
    let question_id = match doc.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return None,
    };
    let previous = match doc.get("familyId") {
        Some(Value::String(current)) if !current.is_empty() => return None,
        Some(Value::String(current)) => Some(current.clone()),
        _ => None,
    };
    let desired = family_id(&question_id);
    doc.insert("familyId".to_string(), Value::String(desired.clone()));
    Some((previous, desired))
}

pub fn process_file(path: &Path, apply: bool) -> Result<Option<FamilyUpdate>> {
    let original = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let mut data: Value = serde_json::from_str(&original)
        .wrap_err_with(|| format!("{}: invalid JSON", path.display()))?;
    let Some(doc) = data.as_object_mut() else {
        tracing::debug!(event = "family_skip", path = %path.display(), reason = "not an object");
        return Ok(None);
    };
    let Some((previous, new)) = ensure_family_id(doc) else {
        return Ok(None);
    };
    if apply {
        write_text(path, &to_pretty_json(&data)?)?;
    }
    Ok(Some(FamilyUpdate {
        path: path.display().to_string(),
        previous,
        new,
    }))
}

/// Backfill every `*.json` under `content_root`.
pub fn backfill_tree(content_root: &Path, apply: bool) -> Result<BackfillReport> {
    if !content_root.is_dir() {
        return Err(eyre!("content root not found: {}", content_root.display()));
    }
    let files = json_files_sorted(content_root)?;
    let mut updates = Vec::new();
    for path in &files {
        if let Some(update) = process_file(path, apply)? {
            tracing::info!(
                event = "family_id",
                path = %update.path,
                new = %update.new,
                apply = apply
            );
            updates.push(update);
        }
    }
    Ok(BackfillReport {
        apply,
        checked: files.len(),
        updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn process_file_adds_family_id_only_on_apply() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("question.json");
        std::fs::write(&file, r#"{"id": "Q-A-3_sample_10000001", "stem": "text"}"#).unwrap();

        let update = process_file(&file, false).unwrap().expect("update");
        assert_eq!(update.new, "Q-A-3_sample");
        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert!(on_disk.get("familyId").is_none());

        let update = process_file(&file, true).unwrap().expect("update");
        assert_eq!(update.previous, None);
        let text = std::fs::read_to_string(&file).unwrap();
        let written: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(written["familyId"], "Q-A-3_sample");
        assert!(text.ends_with("}\n"));

        // second run is a no-op
        assert!(process_file(&file, true).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), text);
    }

    #[test]
    fn existing_family_id_is_never_overwritten() {
        let mut doc = json!({"id": "Q-1_a_2", "familyId": "something-else"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(ensure_family_id(&mut doc).is_none());
        assert_eq!(doc["familyId"], "something-else");
    }

    #[test]
    fn empty_family_id_counts_as_absent() {
        let mut doc = json!({"id": "SINGLE", "familyId": ""}).as_object().cloned().unwrap();
        let (previous, new) = ensure_family_id(&mut doc).unwrap();
        assert_eq!(previous.as_deref(), Some(""));
        assert_eq!(new, "SINGLE");
    }

    #[test]
    fn documents_without_id_or_not_objects_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.json"), r#"{"stem": "x"}"#).unwrap();
        std::fs::write(tmp.path().join("b.json"), r#"[{"id": "Q_1"}]"#).unwrap();
        std::fs::write(tmp.path().join("c.json"), r#"{"id": "Q_1"}"#).unwrap();
        let report = backfill_tree(tmp.path(), false).unwrap();
        assert_eq!(report.checked, 3);
        assert_eq!(report.updates.len(), 1);
        assert!(report.updates[0].path.ends_with("c.json"));
    }
}
