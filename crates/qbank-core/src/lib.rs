use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Fields every question record must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "taskId", "stem", "choices", "correctId"];

/// One validated quiz item.
///
/// The original JSON object is kept verbatim in `record` (field order included)
/// so that writing a bank never drops fields the tools do not know about.
/// `id` and `task_id` are cached textual renderings used for ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub task_id: String,
    pub record: Map<String, Value>,
}

impl Question {
    /// Canonical bank ordering key.
    pub fn sort_key(&self) -> (&str, &str) {
        (self.id.as_str(), self.task_id.as_str())
    }

    pub fn correct_id(&self) -> Option<String> {
        self.record.get("correctId").and_then(scalar_text)
    }
}

impl Serialize for Question {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

/// A single answer option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

impl Choice {
    /// Read a choice from a JSON object; `None` when `id` or `text` is absent.
    pub fn from_value(v: &Value) -> Option<Choice> {
        let obj = v.as_object()?;
        let id = obj.get("id").and_then(scalar_text)?;
        let text = obj.get("text").and_then(scalar_text)?;
        Some(Choice { id, text })
    }
}

/// Textual rendering of a scalar JSON value, used to compare ids that may be
/// written as numbers in some task files. Containers and null yield `None`.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Derive the family id of a question: drop the last `_`-separated segment.
///
/// `"Q-A-2_example_20000014"` becomes `"Q-A-2_example"`; ids without an
/// underscore are their own family.
pub fn family_id(question_id: &str) -> String {
    match question_id.rsplit_once('_') {
        Some((family, _seed)) => family.to_string(),
        None => question_id.to_string(),
    }
}

/// Serialize a JSON value the way every artifact in the content tree is
/// written: two-space indent, non-ASCII left as is, trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut s = serde_json::to_string_pretty(value)?;
    s.push('\n');
    Ok(s)
}

/// Errors raised outside a single task bundle.
#[derive(Debug, Error)]
pub enum QbankError {
    #[error("directory not found: {0}")]
    MissingDir(String),
}
