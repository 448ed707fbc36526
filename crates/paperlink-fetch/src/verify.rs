//! Link verification: check each synthesized download link with a HEAD
//! request and annotate the table with an `Exists` column.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{ArrayRef, StringArray, UInt32Array};
use arrow::compute::{concat_batches, take_record_batch};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::{StreamExt, stream};
use paperlink_core::columns;
use paperlink_core::schema::cells::{cell_i32, cell_str};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::FetchError;

/// Outcome of probing one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reachability {
    Yes,
    No,
    /// The row had no link to check.
    Unknown,
}

impl Reachability {
    pub fn as_str(self) -> &'static str {
        match self {
            Reachability::Yes => "Yes",
            Reachability::No => "No",
            Reachability::Unknown => "Unknown",
        }
    }

    /// Preference when collapsing duplicate titles: reachable first.
    fn rank(self) -> u8 {
        match self {
            Reachability::Yes => 0,
            Reachability::Unknown => 1,
            Reachability::No => 2,
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Requests in flight at once.
    pub concurrency: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            concurrency: 8,
        }
    }
}

/// Verified catalog, deduplicated by title.
pub struct VerifiedTable {
    /// Every surviving row with its `Exists` flag, newest year first.
    pub annotated: RecordBatch,
    /// Only the rows whose link answered 200.
    pub reachable: RecordBatch,
    /// Unreachable rows per (year, type).
    pub unreachable_by_year_type: BTreeMap<(i32, String), u64>,
}

impl VerifiedTable {
    pub fn total(&self) -> usize {
        self.annotated.num_rows()
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.num_rows()
    }
}

/// HEAD-request link checker.
pub struct LinkVerifier {
    client: reqwest::Client,
    concurrency: usize,
}

impl LinkVerifier {
    pub fn new(config: &VerifyConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Check one URL. Only a 200 answer counts as reachable; network errors
    /// and timeouts are [`Reachability::No`].
    pub async fn check(&self, url: &str) -> Reachability {
        match self.client.head(url).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => Reachability::Yes,
            Ok(resp) => {
                debug!(url, status = resp.status().as_u16(), "link not reachable");
                Reachability::No
            }
            Err(err) => {
                warn!(url, error = %err, "link check failed");
                Reachability::No
            }
        }
    }

    /// Check every link, preserving input order. Missing links are
    /// [`Reachability::Unknown`] and are not requested.
    pub async fn check_all(&self, links: &[Option<&str>]) -> Vec<Reachability> {
        stream::iter(links.iter().copied())
            .map(|link| async move {
                match link {
                    Some(url) => self.check(url).await,
                    None => Reachability::Unknown,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Verify the `Download_Link` of every row, then keep one row per title
    /// (preferring reachable, then unchecked, then unreachable rows) and
    /// order by year, newest first.
    pub async fn verify_table(&self, batches: &[RecordBatch]) -> Result<VerifiedTable, FetchError> {
        let first = batches.first().ok_or(FetchError::NoBatches)?;
        let table = concat_batches(&first.schema(), batches)?;
        let link_col = table
            .column_by_name(columns::DOWNLOAD_LINK)
            .ok_or_else(|| FetchError::MissingColumns(vec![columns::DOWNLOAD_LINK.to_string()]))?;

        let links: Vec<Option<&str>> = (0..table.num_rows())
            .map(|row| cell_str(link_col.as_ref(), row))
            .collect();
        info!(rows = links.len(), concurrency = self.concurrency, "checking document links");
        let flags = self.check_all(&links).await;

        let annotated = with_exists_column(&table, &flags)?;
        let order = dedup_and_order(&annotated, &flags);
        let annotated = take_record_batch(&annotated, &UInt32Array::from(order.clone()))?;
        let kept_flags: Vec<Reachability> = order.iter().map(|&i| flags[i as usize]).collect();

        let reachable_rows: Vec<u32> = kept_flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == Reachability::Yes)
            .map(|(i, _)| i as u32)
            .collect();
        let reachable = take_record_batch(&annotated, &UInt32Array::from(reachable_rows))?;

        let unreachable_by_year_type = count_unreachable(&annotated, &kept_flags);
        info!(
            total = annotated.num_rows(),
            reachable = reachable.num_rows(),
            "link verification complete"
        );
        Ok(VerifiedTable {
            annotated,
            reachable,
            unreachable_by_year_type,
        })
    }
}

fn with_exists_column(table: &RecordBatch, flags: &[Reachability]) -> Result<RecordBatch, FetchError> {
    let schema = table.schema();
    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .filter(|f| f.name() != columns::EXISTS)
        .map(|f| f.as_ref().clone())
        .collect();
    let mut cols: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .zip(table.columns())
        .filter(|(f, _)| f.name() != columns::EXISTS)
        .map(|(_, c)| c.clone())
        .collect();
    fields.push(Field::new(columns::EXISTS, DataType::Utf8, false));
    cols.push(Arc::new(StringArray::from_iter_values(flags.iter().map(|f| f.as_str()))));
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), cols)?)
}

/// Row indices after title dedup and the year sort. Rows without a title
/// are never merged with each other; rows without a year sort last.
fn dedup_and_order(table: &RecordBatch, flags: &[Reachability]) -> Vec<u32> {
    let title_col = table.column_by_name(columns::TITLE);
    let year_col = table.column_by_name(columns::YEAR);

    let mut by_preference: Vec<usize> = (0..table.num_rows()).collect();
    by_preference.sort_by_key(|&i| flags[i].rank());

    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept: Vec<usize> = by_preference
        .into_iter()
        .filter(|&row| match title_col.and_then(|c| cell_str(c.as_ref(), row)) {
            Some(title) => seen.insert(title),
            None => true,
        })
        .collect();

    let year = |row: usize| year_col.and_then(|c| cell_i32(c.as_ref(), row));
    kept.sort_by(|&a, &b| match (year(a), year(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    kept.into_iter().map(|i| i as u32).collect()
}

fn count_unreachable(table: &RecordBatch, flags: &[Reachability]) -> BTreeMap<(i32, String), u64> {
    let year_col = table.column_by_name(columns::YEAR);
    let type_col = table.column_by_name(columns::TYPE);
    let mut counts = BTreeMap::new();
    for (row, flag) in flags.iter().enumerate() {
        if *flag != Reachability::No {
            continue;
        }
        let year = year_col.and_then(|c| cell_i32(c.as_ref(), row));
        let doc_type = type_col.and_then(|c| cell_str(c.as_ref(), row));
        if let (Some(year), Some(doc_type)) = (year, doc_type) {
            *counts.entry((year, doc_type.to_string())).or_insert(0) += 1;
        }
    }
    counts
}
