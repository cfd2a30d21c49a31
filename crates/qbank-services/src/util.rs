use crate::Result;
use color_eyre::eyre::WrapErr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix of every logical asset path recorded in manifests.
pub const QUESTIONS_PREFIX: &str = "questions/";

/// All `*.json` files under `root`, recursively, in sorted path order.
pub fn json_files_sorted(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.wrap_err_with(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && has_json_ext(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// `*.json` files directly inside `dir`, sorted by name.
pub fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).wrap_err_with(|| format!("failed to list {}", dir.display()))? {
        let p = entry?.path();
        if p.is_file() && has_json_ext(&p) {
            files.push(p);
        }
    }
    files.sort();
    Ok(files)
}

fn has_json_ext(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// `questions/<locale>/<rel>` with forward slashes.
pub fn logical_path(locale: &str, rel: &str) -> String {
    format!("{QUESTIONS_PREFIX}{locale}/{}", rel.replace('\\', "/"))
}

/// Resolve a logical path back to a file under `questions_root`.
/// `None` when a segment would leave the root (`..`, a drive or a backslash).
pub fn resolve_logical(questions_root: &Path, logical: &str) -> Option<PathBuf> {
    let rel = logical.strip_prefix(QUESTIONS_PREFIX).unwrap_or(logical);
    let mut out = questions_root.to_path_buf();
    for seg in rel.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if seg == ".." || seg.contains('\\') || seg.contains(':') {
            return None;
        }
        out.push(seg);
    }
    Some(out)
}

/// Write `contents` in one call, creating the parent directory first.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).wrap_err_with(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_paths_round_trip() {
        let lp = logical_path("ru", "tasks/A-1.json");
        assert_eq!(lp, "questions/ru/tasks/A-1.json");
        let root = Path::new("/data/questions");
        assert_eq!(
            resolve_logical(root, &lp),
            Some(root.join("ru").join("tasks").join("A-1.json"))
        );
    }

    #[test]
    fn logical_paths_stay_under_root() {
        let root = Path::new("/data/questions");
        assert_eq!(
            resolve_logical(root, "questions/ru/./bank.v1.json"),
            Some(root.join("ru").join("bank.v1.json"))
        );
        assert_eq!(resolve_logical(root, "questions/../../etc/passwd"), None);
        assert_eq!(resolve_logical(root, "questions/ru/..\\secret.json"), None);
        assert_eq!(resolve_logical(root, "questions/C:/x.json"), None);
    }

    #[test]
    fn walk_errors_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = json_files_sorted(&tmp.path().join("gone")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to walk"), "{err:#}");
    }

    #[test]
    fn lists_json_only_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("ru");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join("b.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("a.JSON"), "{}").unwrap();
        std::fs::write(tmp.path().join("notes.md"), "").unwrap();
        std::fs::write(nested.join("c.json"), "{}").unwrap();

        let top = json_files_in(tmp.path()).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top[0].ends_with("a.JSON"));

        let all = json_files_sorted(tmp.path()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[2].ends_with("ru/c.json"));
    }
}
