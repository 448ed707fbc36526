//! Paper downloads for verified links.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use futures::{StreamExt, stream};
use paperlink_core::columns;
use paperlink_core::schema::cells::{cell_i32, cell_str};
use reqwest::{StatusCode, Url};
use tracing::{info, warn};

use crate::FetchError;
use crate::verify::Reachability;

/// Written to the output folder after every run.
pub const LOG_FILE_NAME: &str = "download_log.txt";
const DEFAULT_EXTENSION: &str = ".pdf";

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Downloads in flight at once.
    pub concurrency: usize,
    /// Pause after each download, per worker.
    pub delay: Duration,
    /// Maximum length of the title part of a filename, in characters.
    pub max_name_len: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            concurrency: 1,
            delay: Duration::from_millis(500),
            max_name_len: 100,
        }
    }
}

/// Counts for one download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub log_path: PathBuf,
}

struct Job {
    url: String,
    file_name: String,
    label: String,
}

/// Filesystem-safe name for a paper.
///
/// Keeps alphanumeric characters and spaces from the title, trims trailing
/// whitespace, turns spaces into underscores and caps the length. The year is
/// prefixed when known; the extension comes from the URL path (`.pdf` if the
/// path has none).
pub fn safe_file_name(title: &str, year: Option<i32>, url: &str, max_len: usize) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    let mut name: String = kept.trim_end().replace(' ', "_").chars().take(max_len).collect();
    if let Some(year) = year {
        name = format!("{year}_{name}");
    }
    format!("{name}{}", url_extension(url))
}

/// Suffix `_2`, `_3`, ... before the extension until `name` is unused in
/// this run. Two rows with the same year and title would otherwise write
/// the same file.
fn unique_file_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) => name.split_at(dot),
        None => (name.as_str(), ""),
    };
    let unique = (2..)
        .map(|k| format!("{stem}_{k}{ext}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_default();
    taken.insert(unique.clone());
    unique
}

/// `.ext` of the URL path, or `.pdf`.
fn url_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Downloads reachable papers into a folder.
pub struct Fetcher {
    client: reqwest::Client,
    config: DownloadConfig,
}

impl Fetcher {
    pub fn new(config: DownloadConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Download every reachable row of a verified table into `out_dir`.
    ///
    /// Requires `Download_Link` and `Title`. When an `Exists` column is
    /// present only `Yes` rows are attempted. Individual failures are
    /// counted, never returned; a summary log is written to
    /// `out_dir/download_log.txt`.
    pub async fn download_table(
        &self,
        batches: &[RecordBatch],
        source: &Path,
        out_dir: &Path,
    ) -> Result<DownloadSummary, FetchError> {
        let first = batches.first().ok_or(FetchError::NoBatches)?;
        let schema = first.schema();
        let missing: Vec<String> = [columns::DOWNLOAD_LINK, columns::TITLE]
            .into_iter()
            .filter(|c| schema.index_of(c).is_err())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(FetchError::MissingColumns(missing));
        }
        let table = concat_batches(&schema, batches)?;

        let (attempted, jobs) = self.plan(&table);

        if !out_dir.exists() {
            tokio::fs::create_dir_all(out_dir).await?;
            info!(dir = %out_dir.display(), "created output folder");
        }

        info!(count = attempted, dir = %out_dir.display(), "downloading papers");
        let results: Vec<bool> = stream::iter(jobs)
            .map(|job| self.fetch_one(job, out_dir))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        let succeeded = results.iter().filter(|ok| **ok).count();
        // Rows without a link count as failures.
        let failed = attempted - succeeded;

        let log_path = out_dir.join(LOG_FILE_NAME);
        let summary = DownloadSummary {
            attempted,
            succeeded,
            failed,
            log_path: log_path.clone(),
        };
        tokio::fs::write(&log_path, render_log(&summary, source)).await?;
        info!(attempted, succeeded, failed, log = %log_path.display(), "download run complete");
        Ok(summary)
    }

    /// Rows to attempt, and a job for each one that has a link.
    fn plan(&self, table: &RecordBatch) -> (usize, Vec<Job>) {
        let link_col = table.column_by_name(columns::DOWNLOAD_LINK);
        let title_col = table.column_by_name(columns::TITLE);
        let year_col = table.column_by_name(columns::YEAR);
        let exists_col = table.column_by_name(columns::EXISTS);

        let mut attempted = 0;
        let mut jobs = Vec::new();
        let mut taken = HashSet::new();
        for row in 0..table.num_rows() {
            if let Some(col) = exists_col
                && cell_str(col.as_ref(), row) != Some(Reachability::Yes.as_str())
            {
                continue;
            }
            attempted += 1;
            let Some(url) = link_col.and_then(|c| cell_str(c.as_ref(), row)) else {
                continue;
            };
            let title = title_col
                .and_then(|c| cell_str(c.as_ref(), row))
                .map(str::to_string)
                .unwrap_or_else(|| url_stem(url));
            let year = year_col.and_then(|c| cell_i32(c.as_ref(), row));
            let file_name = safe_file_name(&title, year, url, self.config.max_name_len);
            jobs.push(Job {
                file_name: unique_file_name(file_name, &mut taken),
                url: url.to_string(),
                label: title,
            });
        }
        (attempted, jobs)
    }

    async fn fetch_one(&self, job: Job, out_dir: &Path) -> bool {
        let ok = match self.get_bytes(&job.url).await {
            Ok(bytes) => match tokio::fs::write(out_dir.join(&job.file_name), &bytes).await {
                Ok(()) => {
                    info!(file = %job.file_name, "downloaded");
                    true
                }
                Err(err) => {
                    warn!(title = %job.label, error = %err, "failed to write paper");
                    false
                }
            },
            Err(reason) => {
                warn!(title = %job.label, url = %job.url, reason = %reason, "failed to download");
                false
            }
        };
        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }
        ok
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let resp = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(format!("HTTP status code {}", status.as_u16()));
        }
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

/// Last path segment of a URL without its extension.
fn url_stem(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn render_log(summary: &DownloadSummary, source: &Path) -> String {
    format!(
        "Download Summary:\n\
         Date: {}\n\
         Source file: {}\n\
         Total papers attempted: {}\n\
         Successfully downloaded: {}\n\
         Failed to download: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        source.display(),
        summary.attempted,
        summary.succeeded,
        summary.failed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use arrow::array::{ArrayRef, Int32Array, StringArray};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn fetcher() -> Fetcher {
        Fetcher::new(DownloadConfig {
            timeout: Duration::from_secs(2),
            concurrency: 2,
            delay: Duration::ZERO,
            max_name_len: 100,
        })
        .unwrap()
    }

    #[test]
    fn file_name_from_title() {
        assert_eq!(
            safe_file_name(
                "Krill: a review (part 1)  ",
                Some(2006),
                "https://documents.ats.aq/ATCM29/wp/ATCM29_wp007_e.doc",
                100
            ),
            "2006_Krill_a_review_part_1.doc"
        );
    }

    #[test]
    fn file_name_without_year_or_extension() {
        assert_eq!(
            safe_file_name("Report", None, "https://example.org/papers/report", 100),
            "Report.pdf"
        );
    }

    #[test]
    fn file_name_length_capped() {
        let title = "a".repeat(250);
        let name = safe_file_name(&title, Some(2021), "https://x.org/a.docx", 100);
        assert_eq!(name, format!("2021_{}.docx", "a".repeat(100)));
    }

    #[test]
    fn file_name_keeps_unicode_letters() {
        assert_eq!(
            safe_file_name("Informe Antártico", None, "https://x.org/a.pdf", 100),
            "Informe_Antártico.pdf"
        );
    }

    #[test]
    fn repeated_names_get_suffixes() {
        let mut taken = HashSet::new();
        let names: Vec<String> = ["2006_Krill.doc", "2006_Krill.doc", "2006_Krill.doc", "2006_Ice.doc"]
            .into_iter()
            .map(|n| unique_file_name(n.to_string(), &mut taken))
            .collect();
        assert_eq!(
            names,
            vec!["2006_Krill.doc", "2006_Krill_2.doc", "2006_Krill_3.doc", "2006_Ice.doc"]
        );
    }

    #[tokio::test]
    async fn same_title_and_year_download_to_separate_files() {
        let base = testing::serve().await;
        let tmp = TempDir::new().unwrap();
        let batch = RecordBatch::try_from_iter(vec![
            ("Title", Arc::new(StringArray::from(vec!["Krill", "Krill"])) as ArrayRef),
            ("Year", Arc::new(Int32Array::from(vec![2002, 2002])) as ArrayRef),
            (
                "Download_Link",
                Arc::new(StringArray::from(vec![
                    format!("{base}/ok/ip010.pdf"),
                    format!("{base}/ok/ip010_alt.pdf"),
                ])) as ArrayRef,
            ),
        ])
        .unwrap();
        let summary = fetcher()
            .download_table(&[batch], Path::new("in.csv"), tmp.path())
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert!(tmp.path().join("2002_Krill.pdf").exists());
        assert!(tmp.path().join("2002_Krill_2.pdf").exists());
    }

    #[tokio::test]
    async fn empty_table_writes_zero_summary() {
        let tmp = TempDir::new().unwrap();
        let schema = Arc::new(arrow::datatypes::Schema::new(vec![
            arrow::datatypes::Field::new("Title", arrow::datatypes::DataType::Utf8, true),
            arrow::datatypes::Field::new("Download_Link", arrow::datatypes::DataType::Utf8, true),
            arrow::datatypes::Field::new("Exists", arrow::datatypes::DataType::Utf8, true),
        ]));
        let summary = fetcher()
            .download_table(&[RecordBatch::new_empty(schema)], Path::new("in.csv"), tmp.path())
            .await
            .unwrap();
        assert_eq!(summary.attempted, 0);
        let log = std::fs::read_to_string(&summary.log_path).unwrap();
        assert!(log.contains("Total papers attempted: 0\n"));
    }

    #[test]
    fn stem_fallback() {
        assert_eq!(url_stem("https://x.org/ATCM29/wp/ATCM29_wp007_e.doc"), "ATCM29_wp007_e");
    }

    #[tokio::test]
    async fn missing_columns_abort() {
        let tmp = TempDir::new().unwrap();
        let batch = RecordBatch::try_from_iter(vec![(
            "Download_Link",
            Arc::new(StringArray::from(vec!["http://x/a.pdf"])) as ArrayRef,
        )])
        .unwrap();
        let result = fetcher()
            .download_table(&[batch], Path::new("in.csv"), tmp.path())
            .await;
        match result {
            Err(FetchError::MissingColumns(cols)) => assert_eq!(cols, vec!["Title"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
        assert!(!tmp.path().join(LOG_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn downloads_reachable_rows_and_logs() {
        let base = testing::serve().await;
        let tmp = TempDir::new().unwrap();
        let out_dir = tmp.path().join("papers");
        let batch = RecordBatch::try_from_iter(vec![
            (
                "Title",
                Arc::new(StringArray::from(vec![Some("Krill"), Some("Ice"), Some("Skipped")])) as ArrayRef,
            ),
            (
                "Year",
                Arc::new(Int32Array::from(vec![Some(2006), Some(2010), Some(2011)])) as ArrayRef,
            ),
            (
                "Download_Link",
                Arc::new(StringArray::from(vec![
                    format!("{base}/ok/wp007.doc"),
                    format!("{base}/gone/wp001.doc"),
                    format!("{base}/ok/wp002.doc"),
                ])) as ArrayRef,
            ),
            (
                "Exists",
                Arc::new(StringArray::from(vec!["Yes", "Yes", "No"])) as ArrayRef,
            ),
        ])
        .unwrap();

        let summary = fetcher()
            .download_table(&[batch], Path::new("verified.csv"), &out_dir)
            .await
            .unwrap();
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);

        let bytes = std::fs::read(out_dir.join("2006_Krill.doc")).unwrap();
        assert_eq!(bytes, testing::BODY);
        assert!(!out_dir.join("2011_Skipped.doc").exists());

        let log = std::fs::read_to_string(&summary.log_path).unwrap();
        assert!(log.starts_with("Download Summary:\n"));
        assert!(log.contains("Source file: verified.csv\n"));
        assert!(log.contains("Total papers attempted: 2\n"));
        assert!(log.contains("Successfully downloaded: 1\n"));
        assert!(log.contains("Failed to download: 1\n"));
    }

    #[tokio::test]
    async fn unreachable_network_still_writes_summary() {
        let url = testing::closed_url().await;
        let tmp = TempDir::new().unwrap();
        let batch = RecordBatch::try_from_iter(vec![
            ("Title", Arc::new(StringArray::from(vec!["Gone"])) as ArrayRef),
            ("Download_Link", Arc::new(StringArray::from(vec![url])) as ArrayRef),
        ])
        .unwrap();
        let summary = fetcher()
            .download_table(&[batch], Path::new("in.csv"), tmp.path())
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert!(summary.log_path.exists());
    }
}
