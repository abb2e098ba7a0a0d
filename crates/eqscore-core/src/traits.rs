//! Submission source trait and its filesystem and in-memory implementations.
//!
//! The batch engine pulls answer sheets through `SubmissionSource`, so the
//! same pipeline can read from disk, from memory in tests, or from whatever
//! storage a host service plugs in.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::AnswerSheet;

/// Supplies answer sheets by key.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Human-readable source name (e.g. "filesystem").
    fn name(&self) -> &str;

    /// Fetch the answer sheet stored under `key`.
    async fn fetch(&self, key: &str) -> Result<AnswerSheet>;
}

/// Reads JSON answer sheets from a directory; keys are file names.
pub struct FsSubmissionSource {
    root: PathBuf,
}

impl FsSubmissionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List `.json` keys in the root directory, sorted.
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("failed to read directory: {}", self.root.display()))?;

        let mut keys = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl SubmissionSource for FsSubmissionSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch(&self, key: &str) -> Result<AnswerSheet> {
        let path = self.root.join(key);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse answer sheet: {}", path.display()))
    }
}

/// Serves answer sheets held in memory.
#[derive(Default)]
pub struct MemorySubmissionSource {
    sheets: HashMap<String, AnswerSheet>,
}

impl MemorySubmissionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, key: impl Into<String>, sheet: AnswerSheet) -> Self {
        self.sheets.insert(key.into(), sheet);
        self
    }
}

#[async_trait]
impl SubmissionSource for MemorySubmissionSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, key: &str) -> Result<AnswerSheet> {
        self.sheets
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no submission under key '{key}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;

    #[tokio::test]
    async fn memory_source_returns_stored_sheet() {
        let source = MemorySubmissionSource::new().with_sheet(
            "alice",
            AnswerSheet {
                candidate_id: Some("alice".into()),
                answers: vec![Answer {
                    question_id: "q1".into(),
                    value: "3".into(),
                }],
            },
        );
        let sheet = source.fetch("alice").await.unwrap();
        assert_eq!(sheet.answers.len(), 1);
        assert!(source.fetch("bob").await.is_err());
    }

    #[tokio::test]
    async fn fs_source_lists_and_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"answers": [{"question_id": "q1", "value": "2"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"answers": []}"#).unwrap();
        std::fs::write(dir.path().join("readme.md"), "skip me").unwrap();

        let source = FsSubmissionSource::new(dir.path());
        assert_eq!(source.list_keys().await.unwrap(), vec!["a.json", "b.json"]);

        let sheet = source.fetch("b.json").await.unwrap();
        assert_eq!(sheet.responses()["q1"], "2");
        assert!(sheet.candidate_id.is_none());
    }

    #[tokio::test]
    async fn fs_source_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let source = FsSubmissionSource::new(dir.path());
        let err = source.fetch("bad.json").await.unwrap_err();
        assert!(err.to_string().contains("failed to parse answer sheet"));
    }
}
