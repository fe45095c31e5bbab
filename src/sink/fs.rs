//! Filesystem sink
//!
//! Layout under the output directory:
//! - `dataset.jsonl`: one JSON record per line, appended
//! - `key_value_store/<key>`: diagnostics and `RUN_SUMMARY.json`

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{JobSink, RUN_SUMMARY_KEY};
use crate::extraction::JobRecord;
use crate::scrape_engine::stats::RunSummary;

pub const DATASET_FILE: &str = "dataset.jsonl";
pub const KEY_VALUE_DIR: &str = "key_value_store";

#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Create the output directories
    pub async fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(KEY_VALUE_DIR))
            .await
            .with_context(|| format!("Failed to create output directory {}", root.display()))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.root.join(DATASET_FILE)
    }

    /// Path for a key, sanitized so keys can never escape the store
    #[must_use]
    pub fn key_path(&self, key: &str) -> PathBuf {
        let name = sanitize_filename::sanitize(key);
        let name = if name.is_empty() { "unnamed".to_string() } else { name };
        self.root.join(KEY_VALUE_DIR).join(name)
    }

    async fn write_key(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.key_path(key);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[async_trait]
impl JobSink for FsSink {
    async fn push_records(&self, records: &[JobRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record).context("Failed to serialize record")?;
            buf.push(b'\n');
        }

        let path = self.dataset_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.write_all(&buf)
            .await
            .with_context(|| format!("Failed to append to {}", path.display()))?;
        file.flush().await?;
        Ok(())
    }

    async fn save_diagnostic(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        log::debug!("Saving diagnostic {key} ({content_type}, {} bytes)", bytes.len());
        self.write_key(key, bytes).await
    }

    async fn save_summary(&self, summary: &RunSummary) -> Result<()> {
        let json = serde_json::to_vec_pretty(summary).context("Failed to serialize run summary")?;
        self.write_key(RUN_SUMMARY_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(n: usize) -> JobRecord {
        JobRecord {
            title: format!("Job {n}"),
            company: "Acme".to_string(),
            location: String::new(),
            salary: "Not specified".to_string(),
            job_type: "Not specified".to_string(),
            posted_date: String::new(),
            description_html: String::new(),
            description_text: String::new(),
            url: format!("https://jobs.test/job/{n}"),
            scraped_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn appends_json_lines_across_pushes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FsSink::create(dir.path()).await.expect("sink");

        sink.push_records(&[record(1), record(2)]).await.expect("push");
        sink.push_records(&[record(3)]).await.expect("push");

        let content = tokio::fs::read_to_string(sink.dataset_path()).await.expect("read");
        let titles: Vec<String> = content
            .lines()
            .map(|l| serde_json::from_str::<JobRecord>(l).expect("record").title)
            .collect();
        assert_eq!(titles, vec!["Job 1", "Job 2", "Job 3"]);
    }

    #[tokio::test]
    async fn diagnostic_keys_are_sanitized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FsSink::create(dir.path()).await.expect("sink");

        sink.save_diagnostic("../escape/page.html", b"<html></html>", "text/html")
            .await
            .expect("save");

        let path = sink.key_path("../escape/page.html");
        assert!(path.starts_with(dir.path().join(KEY_VALUE_DIR)));
        assert_eq!(tokio::fs::read(&path).await.expect("read"), b"<html></html>");
    }
}
