use crate::{util::write_text, Result};
use qbank_core::{to_pretty_json, Question};
use std::path::Path;

/// File name of the locale bank next to `tasks/`.
pub const BANK_FILE: &str = "bank.v1.json";

/// Merge task bundles into one bank ordered by `(id, taskId)`.
///
/// The sort is stable, so questions sharing both keys keep their bundle order.
pub fn build_bank(tasks: impl IntoIterator<Item = Vec<Question>>) -> Vec<Question> {
    let mut all: Vec<Question> = tasks.into_iter().flatten().collect();
    all.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    all
}

pub fn render_bank(bank: &[Question]) -> Result<String> {
    to_pretty_json(bank)
}

pub fn write_bank(path: &Path, rendered: &str) -> Result<()> {
    write_text(path, rendered)?;
    tracing::debug!(event = "bank_written", path = %path.display(), bytes = rendered.len());
    Ok(())
}
