//! High-level operations over the question content tree.
//! Intentionally thin: the CLI calls these and only formats the results.

pub use qbank_core::Result;

pub mod bank;
pub mod family;
pub mod hash;
pub mod index;
pub mod lint;
pub mod pipeline;
pub mod util;
pub mod verify;

pub use family::backfill_tree;
pub use index::GeneratedAt;
pub use lint::{load_glossary, lint_tree, match_case, GlossaryEntry, LintOptions};
pub use pipeline::{run_pipeline, LocaleOutcome, PipelineConfig, PipelineRun};
pub use verify::verify_locales;
