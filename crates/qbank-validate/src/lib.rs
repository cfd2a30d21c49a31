use qbank_core::{scalar_text, Choice, Question, REQUIRED_FIELDS};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a task bundle was rejected. Every variant names the file; question
/// level variants also carry the 0-based question index.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{}: failed to read task file: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: expected JSON array of questions, got {found}", path.display())]
    NotArray { path: PathBuf, found: &'static str },
    #[error("{}: question #{index} is not an object", path.display())]
    NotObject { path: PathBuf, index: usize },
    #[error("{}: question #{index} is missing required fields: {}", path.display(), fields.join(", "))]
    MissingFields {
        path: PathBuf,
        index: usize,
        fields: Vec<&'static str>,
    },
    #[error("{}: question #{index} has empty '{field}'", path.display())]
    EmptyField {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },
    #[error("{}: question #{index} has taskId={found:?}, expected {expected:?}", path.display())]
    TaskIdMismatch {
        path: PathBuf,
        index: usize,
        found: String,
        expected: String,
    },
    #[error("{}: question #{index} has invalid 'choices'", path.display())]
    InvalidChoices { path: PathBuf, index: usize },
    #[error("{}: question #{index} choice #{choice} is not an object", path.display())]
    ChoiceNotObject {
        path: PathBuf,
        index: usize,
        choice: usize,
    },
    #[error("{}: question #{index} choice #{choice} needs scalar 'id' and 'text'", path.display())]
    ChoiceMissingField {
        path: PathBuf,
        index: usize,
        choice: usize,
    },
    #[error("{}: question #{index} has duplicate choice id {id:?}", path.display())]
    DuplicateChoice {
        path: PathBuf,
        index: usize,
        id: String,
    },
    #[error("{}: question #{index} has correctId={correct:?} which is not present in choices {choices:?}", path.display())]
    DanglingCorrect {
        path: PathBuf,
        index: usize,
        correct: String,
        choices: Vec<String>,
    },
}

/// Logical task id of a bundle: the file name without `.json`.
pub fn task_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Read and validate one task bundle.
pub fn load_task_questions(
    path: &Path,
    locale: &str,
    task_id: &str,
) -> Result<Vec<Question>, TaskError> {
    let text = std::fs::read_to_string(path).map_err(|source| TaskError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| TaskError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let questions = validate_task_value(&value, path, task_id)?;
    tracing::debug!(
        event = "task_validated",
        locale = locale,
        task_id = task_id,
        questions = questions.len(),
        path = %path.display()
    );
    Ok(questions)
}

/// Validate an already parsed task bundle. `path` is only used in errors.
pub fn validate_task_value(
    value: &Value,
    path: &Path,
    task_id: &str,
) -> Result<Vec<Question>, TaskError> {
    let items = value.as_array().ok_or_else(|| TaskError::NotArray {
        path: path.to_path_buf(),
        found: json_type_name(value),
    })?;

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| TaskError::NotObject {
            path: path.to_path_buf(),
            index,
        })?;
        questions.push(validate_question(obj, path, index, task_id)?);
    }
    Ok(questions)
}

fn validate_question(
    obj: &Map<String, Value>,
    path: &Path,
    index: usize,
    task_id: &str,
) -> Result<Question, TaskError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|k| !obj.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(TaskError::MissingFields {
            path: path.to_path_buf(),
            index,
            fields: missing,
        });
    }
    for field in REQUIRED_FIELDS {
        if is_blank(&obj[field]) {
            return Err(TaskError::EmptyField {
                path: path.to_path_buf(),
                index,
                field,
            });
        }
    }

    let found = scalar_text(&obj["taskId"]).unwrap_or_else(|| obj["taskId"].to_string());
    if found != task_id {
        return Err(TaskError::TaskIdMismatch {
            path: path.to_path_buf(),
            index,
            found,
            expected: task_id.to_string(),
        });
    }

    let choices = match obj["choices"].as_array() {
        Some(c) if !c.is_empty() => c,
        _ => {
            return Err(TaskError::InvalidChoices {
                path: path.to_path_buf(),
                index,
            })
        }
    };

    let mut parsed: Vec<Choice> = Vec::with_capacity(choices.len());
    for (choice, c) in choices.iter().enumerate() {
        if !c.is_object() {
            return Err(TaskError::ChoiceNotObject {
                path: path.to_path_buf(),
                index,
                choice,
            });
        }
        let c = Choice::from_value(c).ok_or_else(|| TaskError::ChoiceMissingField {
            path: path.to_path_buf(),
            index,
            choice,
        })?;
        if parsed.iter().any(|p| p.id == c.id) {
            return Err(TaskError::DuplicateChoice {
                path: path.to_path_buf(),
                index,
                id: c.id,
            });
        }
        parsed.push(c);
    }

    let question = Question {
        id: scalar_text(&obj["id"]).unwrap_or_else(|| obj["id"].to_string()),
        task_id: task_id.to_string(),
        record: obj.clone(),
    };
    let correct = question
        .correct_id()
        .unwrap_or_else(|| obj["correctId"].to_string());
    if !parsed.iter().any(|c| c.id == correct) {
        let choices: BTreeSet<String> = parsed.into_iter().map(|c| c.id).collect();
        return Err(TaskError::DanglingCorrect {
            path: path.to_path_buf(),
            index,
            correct,
            choices: choices.into_iter().collect(),
        });
    }
    Ok(question)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(id: &str, task: &str, correct: &str, choices: Value) -> Value {
        json!({
            "id": id,
            "taskId": task,
            "stem": "Какой электрод?",
            "choices": choices,
            "correctId": correct,
        })
    }

    fn ab() -> Value {
        json!([{"id": "A", "text": "one"}, {"id": "B", "text": "two"}])
    }

    fn run(v: Value) -> Result<Vec<Question>, TaskError> {
        validate_task_value(&v, Path::new("ru/tasks/A-1.json"), "A-1")
    }

    #[test]
    fn accepts_valid_bundle() {
        let qs = run(json!([q("q1", "A-1", "B", ab()), q("q2", "A-1", "A", ab())])).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].id, "q1");
        assert_eq!(qs[1].correct_id().as_deref(), Some("A"));
        assert_eq!(qs[0].record["choices"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn rejects_non_array() {
        let err = run(json!({"id": "q1"})).unwrap_err();
        assert!(matches!(err, TaskError::NotArray { found: "object", .. }));
    }

    #[test]
    fn rejects_task_id_mismatch() {
        let err = run(json!([q("q1", "A-2", "A", ab())])).unwrap_err();
        assert!(matches!(err, TaskError::TaskIdMismatch { index: 0, .. }));
        let msg = err.to_string();
        assert!(msg.contains("A-1.json"), "{msg}");
        assert!(msg.contains("question #0"), "{msg}");
        assert!(msg.contains("\"A-2\""), "{msg}");
    }

    #[test]
    fn rejects_dangling_correct_id() {
        let err = run(json!([q("q1", "A-1", "A", ab()), q("q2", "A-1", "Z", ab())])).unwrap_err();
        match err {
            TaskError::DanglingCorrect {
                index,
                correct,
                choices,
                ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(correct, "Z");
                assert_eq!(choices, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_choice_ids() {
        let dup = json!([{"id": "A", "text": "one"}, {"id": "A", "text": "two"}]);
        let err = run(json!([q("q1", "A-1", "A", dup)])).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateChoice { ref id, .. } if id == "A"));
    }

    #[test]
    fn rejects_missing_and_empty_fields() {
        let err = run(json!([{"id": "q1", "taskId": "A-1"}])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("stem, choices, correctId"), "{msg}");

        let err = run(json!([q("", "A-1", "A", ab())])).unwrap_err();
        assert!(matches!(err, TaskError::EmptyField { field: "id", .. }));
    }

    #[test]
    fn rejects_bad_choices() {
        let err = run(json!([q("q1", "A-1", "A", json!([]))])).unwrap_err();
        assert!(matches!(err, TaskError::InvalidChoices { .. }));

        let err = run(json!([q("q1", "A-1", "A", json!(["A"]))])).unwrap_err();
        assert!(matches!(err, TaskError::ChoiceNotObject { choice: 0, .. }));

        let err = run(json!([q("q1", "A-1", "A", json!([{"id": "A"}]))])).unwrap_err();
        assert!(matches!(err, TaskError::ChoiceMissingField { .. }));

        let nested = json!([{"id": "A", "text": {"ru": "один"}}]);
        let err = run(json!([q("q1", "A-1", "A", nested)])).unwrap_err();
        assert!(matches!(err, TaskError::ChoiceMissingField { choice: 0, .. }));
    }

    #[test]
    fn numeric_choice_ids_match_textual_correct_id() {
        let choices = json!([{"id": 1, "text": "one"}, {"id": 2, "text": "two"}]);
        let qs = run(json!([q("q1", "A-1", "2", choices)])).unwrap();
        assert_eq!(qs.len(), 1);
    }

    #[test]
    fn loads_from_disk_and_reports_bad_json() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("A-1.json");
        std::fs::write(&good, serde_json::to_string(&json!([q("q1", "A-1", "A", ab())])).unwrap()).unwrap();
        let task_id = task_id_from_path(&good).unwrap();
        assert_eq!(task_id, "A-1");
        assert_eq!(load_task_questions(&good, "ru", &task_id).unwrap().len(), 1);

        let bad = tmp.path().join("B-1.json");
        std::fs::write(&bad, "[{").unwrap();
        let err = load_task_questions(&bad, "ru", "B-1").unwrap_err();
        assert!(matches!(err, TaskError::Json { .. }));
    }
}
