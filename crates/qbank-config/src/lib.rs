use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_QUESTIONS_ROOT: &str = "app-android/src/main/assets/questions";
pub const DEFAULT_BLUEPRINT_ID: &str = "welder_ip_sk_202404";
pub const DEFAULT_BANK_VERSION: &str = "v1";
pub const DEFAULT_LOCALES: [&str; 2] = ["en", "ru"];
pub const DEFAULT_CONTENT_ROOT: &str = "content/questions";
pub const DEFAULT_GLOSSARY: &str = "docs/glossary_ru.md";
pub const DEFAULT_REPORT_DIR: &str = "logs/diffs/ru_lint";
pub const DEFAULT_SCHEMA_DIR: &str = "./docs/assets/schemas";

const CONFIG_FILE: &str = "qbank.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QbankConfig {
    pub questions_root: Option<String>,
    pub blueprint_id: Option<String>,
    pub bank_version: Option<String>,
    pub locales: Option<Vec<String>>,
    pub generated_at: Option<String>,
    pub lint: Option<LintCfg>,
    pub backfill: Option<BackfillCfg>,
    pub schema: Option<SchemaCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LintCfg {
    pub content_root: Option<String>,
    pub glossary: Option<String>,
    pub report_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackfillCfg {
    pub content_root: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl QbankConfig {
    pub fn questions_root(&self) -> PathBuf {
        PathBuf::from(
            self.questions_root
                .as_deref()
                .unwrap_or(DEFAULT_QUESTIONS_ROOT),
        )
    }

    pub fn blueprint_id(&self) -> String {
        self.blueprint_id
            .clone()
            .unwrap_or_else(|| DEFAULT_BLUEPRINT_ID.to_string())
    }

    pub fn bank_version(&self) -> String {
        self.bank_version
            .clone()
            .unwrap_or_else(|| DEFAULT_BANK_VERSION.to_string())
    }

    pub fn locales(&self) -> Vec<String> {
        self.locales
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCALES.iter().map(|s| s.to_string()).collect())
    }

    /// Content root shared by the linter and the backfiller; the section
    /// specific value wins.
    pub fn lint_content_root(&self) -> PathBuf {
        PathBuf::from(
            self.lint
                .as_ref()
                .and_then(|l| l.content_root.as_deref())
                .unwrap_or(DEFAULT_CONTENT_ROOT),
        )
    }

    pub fn backfill_content_root(&self) -> PathBuf {
        PathBuf::from(
            self.backfill
                .as_ref()
                .and_then(|b| b.content_root.as_deref())
                .or_else(|| self.lint.as_ref().and_then(|l| l.content_root.as_deref()))
                .unwrap_or(DEFAULT_CONTENT_ROOT),
        )
    }

    pub fn glossary(&self) -> PathBuf {
        PathBuf::from(
            self.lint
                .as_ref()
                .and_then(|l| l.glossary.as_deref())
                .unwrap_or(DEFAULT_GLOSSARY),
        )
    }

    pub fn report_dir(&self) -> PathBuf {
        PathBuf::from(
            self.lint
                .as_ref()
                .and_then(|l| l.report_dir.as_deref())
                .unwrap_or(DEFAULT_REPORT_DIR),
        )
    }

    pub fn schema_dir(&self) -> PathBuf {
        PathBuf::from(
            self.schema
                .as_ref()
                .and_then(|s| s.out_dir.as_deref())
                .unwrap_or(DEFAULT_SCHEMA_DIR),
        )
    }
}

/// Load `qbank.toml`. Search order: CWD, then `$CONFIG_DIR/qbank/qbank.toml`.
/// Fields set by an earlier file win; missing files are fine.
pub fn load_config() -> Result<QbankConfig, ConfigError> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        candidates.push(p.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        candidates.push(base.join("qbank").join(CONFIG_FILE));
    }
    load_config_from(&candidates)
}

pub fn load_config_from(paths: &[PathBuf]) -> Result<QbankConfig, ConfigError> {
    let mut merged = QbankConfig::default();
    for path in paths {
        if let Some(cfg) = read_config_file(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_config_file(path: &Path) -> Result<Option<QbankConfig>, ConfigError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    toml::from_str::<QbankConfig>(&s)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
}

fn merge(mut a: QbankConfig, b: QbankConfig) -> QbankConfig {
    if a.questions_root.is_none() {
        a.questions_root = b.questions_root;
    }
    if a.blueprint_id.is_none() {
        a.blueprint_id = b.blueprint_id;
    }
    if a.bank_version.is_none() {
        a.bank_version = b.bank_version;
    }
    if a.locales.is_none() {
        a.locales = b.locales;
    }
    if a.generated_at.is_none() {
        a.generated_at = b.generated_at;
    }
    a.lint = merge_opt(a.lint, b.lint, merge_lint);
    a.backfill = merge_opt(a.backfill, b.backfill, merge_backfill);
    a.schema = merge_opt(a.schema, b.schema, merge_schema);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_lint(mut a: LintCfg, b: LintCfg) -> LintCfg {
    if a.content_root.is_none() {
        a.content_root = b.content_root;
    }
    if a.glossary.is_none() {
        a.glossary = b.glossary;
    }
    if a.report_dir.is_none() {
        a.report_dir = b.report_dir;
    }
    a
}

fn merge_backfill(mut a: BackfillCfg, b: BackfillCfg) -> BackfillCfg {
    if a.content_root.is_none() {
        a.content_root = b.content_root;
    }
    a
}

fn merge_schema(mut a: SchemaCfg, b: SchemaCfg) -> SchemaCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = QbankConfig::default();
        assert_eq!(cfg.blueprint_id(), DEFAULT_BLUEPRINT_ID);
        assert_eq!(cfg.bank_version(), "v1");
        assert_eq!(cfg.locales(), vec!["en".to_string(), "ru".to_string()]);
        assert_eq!(cfg.questions_root(), PathBuf::from(DEFAULT_QUESTIONS_ROOT));
    }

    #[test]
    fn first_file_wins_per_field() {
        let tmp = std::env::temp_dir().join(format!("qbank-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        let first = tmp.join("first.toml");
        let second = tmp.join("second.toml");
        std::fs::write(&first, "bank_version = \"v2\"\n[lint]\nglossary = \"g.md\"\n").unwrap();
        std::fs::write(
            &second,
            "bank_version = \"v9\"\nlocales = [\"ru\"]\n[lint]\nglossary = \"other.md\"\nreport_dir = \"r\"\n",
        )
        .unwrap();
        let missing = tmp.join("missing.toml");

        let cfg = load_config_from(&[missing, first, second]).unwrap();
        assert_eq!(cfg.bank_version(), "v2");
        assert_eq!(cfg.locales(), vec!["ru".to_string()]);
        assert_eq!(cfg.glossary(), PathBuf::from("g.md"));
        assert_eq!(cfg.report_dir(), PathBuf::from("r"));
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn malformed_file_is_reported() {
        let tmp = std::env::temp_dir().join(format!("qbank-cfg-bad-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        let bad = tmp.join("bad.toml");
        std::fs::write(&bad, "locales = 3 = 4").unwrap();
        let err = load_config_from(&[bad]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        std::fs::remove_dir_all(&tmp).ok();
    }
}
