//! In-memory sink for tests and embedding

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::JobSink;
use crate::extraction::JobRecord;
use crate::scrape_engine::stats::RunSummary;

#[derive(Debug, Clone)]
pub struct StoredDiagnostic {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<JobRecord>>,
    /// Size of each `push_records` call, in order
    pushes: Mutex<Vec<usize>>,
    diagnostics: Mutex<Vec<StoredDiagnostic>>,
    summary: Mutex<Option<RunSummary>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<JobRecord> {
        self.records.lock().await.clone()
    }

    pub async fn pushes(&self) -> Vec<usize> {
        self.pushes.lock().await.clone()
    }

    pub async fn diagnostics(&self) -> Vec<StoredDiagnostic> {
        self.diagnostics.lock().await.clone()
    }

    pub async fn diagnostic_keys(&self) -> Vec<String> {
        self.diagnostics
            .lock()
            .await
            .iter()
            .map(|d| d.key.clone())
            .collect()
    }

    pub async fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().await.clone()
    }
}

#[async_trait]
impl JobSink for MemorySink {
    async fn push_records(&self, records: &[JobRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.records.lock().await.extend_from_slice(records);
        self.pushes.lock().await.push(records.len());
        Ok(())
    }

    async fn save_diagnostic(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.diagnostics.lock().await.push(StoredDiagnostic {
            key: key.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    async fn save_summary(&self, summary: &RunSummary) -> Result<()> {
        *self.summary.lock().await = Some(summary.clone());
        Ok(())
    }
}
