//! Extraction result set
//!
//! Image bytes are handed to the sink as soon as they are captured; the
//! result set only keeps what was written and where.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uishot_core::{CaptureRecord, CaptureState, Category, Result};
use uuid::Uuid;

/// A persisted capture record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureEntry {
    pub id: Uuid,
    pub category: Category,
    pub state: CaptureState,
    pub size_bytes: u64,
    /// One path per written encoding
    pub paths: Vec<PathBuf>,
}

impl CaptureEntry {
    pub fn from_record(record: &CaptureRecord, paths: Vec<PathBuf>) -> Self {
        Self {
            id: record.id,
            category: record.category,
            state: record.state,
            size_bytes: record.bytes.len() as u64,
            paths,
        }
    }
}

/// How processing of one URL ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UrlStatus {
    Completed,
    Failed { reason: String },
}

/// Everything captured for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlOutcome {
    pub url: String,
    #[serde(flatten)]
    pub status: UrlStatus,
    pub captures: Vec<CaptureEntry>,
}

impl UrlOutcome {
    pub fn completed(url: impl Into<String>, captures: Vec<CaptureEntry>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Completed,
            captures,
        }
    }

    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Failed {
                reason: reason.into(),
            },
            captures: Vec::new(),
        }
    }

    /// Failed URL that still lists what was persisted before the failure
    pub fn failed_with(
        url: impl Into<String>,
        reason: impl Into<String>,
        captures: Vec<CaptureEntry>,
    ) -> Self {
        Self {
            captures,
            ..Self::failed(url, reason)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, UrlStatus::Failed { .. })
    }

    /// Records captured for a category
    pub fn count(&self, category: Category) -> usize {
        self.captures
            .iter()
            .filter(|c| c.category == category)
            .count()
    }

    /// `Buttons: 2, Links: 4, Image Links: 0`
    pub fn summary_line(&self) -> String {
        Category::ALL
            .iter()
            .map(|category| format!("{}: {}", category.label(), self.count(*category)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Outcomes of a whole run, in target order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<UrlOutcome>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSet {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: UrlOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// First outcome recorded for `url`
    pub fn get(&self, url: &str) -> Option<&UrlOutcome> {
        self.outcomes.iter().find(|o| o.url == url)
    }

    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.captures.len()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// `done: 12 records from 2/3 urls (1 failed)`
    pub fn summary(&self) -> String {
        format!(
            "done: {} records from {}/{} urls ({} failed)",
            self.total_records(),
            self.completed_count(),
            self.outcomes.len(),
            self.failed_count()
        )
    }

    /// Write the result set as pretty JSON
    pub async fn write_manifest(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(n: u128, category: Category, state: CaptureState) -> CaptureEntry {
        CaptureEntry {
            id: Uuid::from_u128(n),
            category,
            state,
            size_bytes: 10,
            paths: vec![PathBuf::from(format!("{}.png", n))],
        }
    }

    #[test]
    fn test_summary_line_lists_every_category() {
        let outcome = UrlOutcome::completed(
            "https://example.com",
            vec![
                entry(1, Category::Button, CaptureState::Normal),
                entry(1, Category::Button, CaptureState::Hover),
                entry(2, Category::TextLink, CaptureState::Normal),
            ],
        );
        assert_eq!(outcome.summary_line(), "Buttons: 2, Links: 1, Image Links: 0");
        assert_eq!(outcome.count(Category::ImageLink), 0);
    }

    #[test]
    fn test_result_set_totals() {
        let mut results = ResultSet::new();
        results.push(UrlOutcome::failed("https://down.test", "timeout"));
        results.push(UrlOutcome::completed(
            "https://up.test",
            vec![entry(1, Category::Button, CaptureState::Normal)],
        ));
        results.finish();

        assert_eq!(results.total_records(), 1);
        assert_eq!(results.completed_count(), 1);
        assert_eq!(results.failed_count(), 1);
        assert!(results.get("https://down.test").unwrap().is_failed());
        assert!(results.finished_at.is_some());
        assert_eq!(results.summary(), "done: 1 records from 1/2 urls (1 failed)");
    }

    #[test]
    fn test_failed_outcome_keeps_partial_captures() {
        let mut results = ResultSet::new();
        results.push(UrlOutcome::failed_with(
            "https://half.test",
            "query failed",
            vec![entry(1, Category::Button, CaptureState::Normal)],
        ));

        let outcome = results.get("https://half.test").unwrap();
        assert!(outcome.is_failed());
        assert_eq!(outcome.count(Category::Button), 1);
        assert_eq!(results.summary(), "done: 1 records from 0/1 urls (1 failed)");
    }

    #[tokio::test]
    async fn test_write_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/manifest.json");

        let mut results = ResultSet::new();
        results.push(UrlOutcome::failed("https://down.test", "timeout"));
        results.write_manifest(&path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: ResultSet = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.outcomes.len(), 1);
        assert!(content.contains("\"status\": \"failed\""));
        assert!(content.contains("\"reason\": \"timeout\""));
    }
}
