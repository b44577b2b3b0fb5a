//! CLI Input Loading
//!
//! The `text` and `annotations` positionals accept either a literal value
//! or a `file://<path>` reference.

use anyhow::{Context, Result};

const FILE_PREFIX: &str = "file://";

/// Resolve an argument to its content: `file://<path>` reads the file as
/// UTF-8 (exact contents, no trimming), anything else passes through
/// unchanged.
pub fn load_content(arg: &str) -> Result<String> {
    match arg.strip_prefix(FILE_PREFIX) {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path)),
        None => Ok(arg.to_owned()),
    }
}

/// Resolve an argument to parsed JSON, with the same `file://` handling.
/// The value is passed through as-is; annotation records are not schema
/// checked here.
pub fn load_json(arg: &str) -> Result<serde_json::Value> {
    let raw = load_content(arg)?;
    serde_json::from_str(&raw).context("failed to parse annotations as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_literal_passes_through() {
        assert_eq!(load_content("plain text").unwrap(), "plain text");
    }

    #[test]
    fn test_file_reference_returns_exact_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "line one\nline two\n").unwrap();
        let arg = format!("file://{}", file.path().display());
        assert_eq!(load_content(&arg).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn test_missing_file_fails() {
        let err = load_content("file:///nonexistent/report.md").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/report.md"));
    }

    #[test]
    fn test_inline_json_array() {
        let value = load_json(r#"[{"path": "src/main.rs", "start_line": 1}]"#).unwrap();
        assert_eq!(value, json!([{"path": "src/main.rs", "start_line": 1}]));
    }

    #[test]
    fn test_file_json_matches_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"path": "src/main.rs", "start_line": 1}}]"#).unwrap();
        let arg = format!("file://{}", file.path().display());
        assert_eq!(
            load_json(&arg).unwrap(),
            json!([{"path": "src/main.rs", "start_line": 1}])
        );
    }

    #[test]
    fn test_malformed_json_fails() {
        let err = load_json("[not json").unwrap_err();
        assert!(err.to_string().contains("parse annotations"));
    }
}
