//! File-backed report persistence: one JSON pair per calendar date.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};

use crate::models::report::DailyReport;

const REPORT_PREFIX: &str = "ai_news_report_";
const SIMPLIFIED_PREFIX: &str = "ai_news_simplified_";
const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{REPORT_PREFIX}{}.json", date.format(DATE_FORMAT)))
    }

    fn simplified_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{SIMPLIFIED_PREFIX}{}.json", date.format(DATE_FORMAT)))
    }

    /// Writes the full and simplified files, replacing any earlier report for
    /// the same date. Each file is renamed into place so readers never see a
    /// partial document.
    pub async fn save(&self, report: &DailyReport) -> Result<(), StoreError> {
        let date = report.collection_date;
        write_json(&self.report_path(date), report).await?;
        info!("Report saved to {}", self.report_path(date).display());
        write_json(&self.simplified_path(date), &report.simplified()).await?;
        info!(
            "Simplified report saved to {}",
            self.simplified_path(date).display()
        );
        Ok(())
    }

    pub async fn load(&self, date: NaiveDate) -> Result<Option<DailyReport>, StoreError> {
        let path = self.report_path(date);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Dates with a full report on disk, oldest first.
    pub async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut dates = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(date) = name.to_str().and_then(parse_report_file_name) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }

    pub async fn latest(&self) -> Result<Option<DailyReport>, StoreError> {
        for date in self.list_dates().await?.into_iter().rev() {
            match self.load(date).await {
                Ok(Some(report)) => return Ok(Some(report)),
                Ok(None) => continue,
                Err(e) => {
                    error!("Failed to read report for {date}: {e}");
                    continue;
                }
            }
        }
        Ok(None)
    }

    /// Removes both files for `date`. Returns false when no report existed.
    pub async fn delete(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let existed = match fs::remove_file(self.report_path(date)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(self.simplified_path(date)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if existed {
            info!("Deleted report for {date}");
        }
        Ok(existed)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

fn parse_report_file_name(name: &str) -> Option<NaiveDate> {
    let stamp = name.strip_prefix(REPORT_PREFIX)?.strip_suffix(".json")?;
    NaiveDate::parse_from_str(stamp, DATE_FORMAT).ok()
}
