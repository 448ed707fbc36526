//! Text reports for each pipeline stage.
//!
//! Stands in for charts: gap rankings, per-(year, type) count tables and
//! the ratio summaries printed after filtering, verification and download.

use std::collections::BTreeMap;

use arrow::util::pretty::pretty_format_batches;
use paperlink_core::gaps::year_type_count_batch;
use paperlink_core::{EnrichStats, GapReport};
use paperlink_fetch::DownloadSummary;

const MAX_LIST_ITEMS: usize = 10;

// ── Enrichment ──

pub fn print_enrich_stats(stats: &EnrichStats) {
    println!("Catalog rows:            {}", stats.source_rows);
    println!("Output records:          {}", stats.records);
    println!("  with document code:    {}", stats.with_identity);
    println!("  with download link:    {}", stats.with_link);
    println!("  extension variants:    {}", stats.fan_out);
}

// ── Gap analysis ──

/// Print the `top` groups with the highest share of missing numbers.
/// Expects `reports` already ranked.
pub fn print_gap_summary(reports: &[GapReport], top: usize) {
    if reports.is_empty() {
        println!("No document numbering gaps found in the dataset.");
        return;
    }
    println!(
        "Analysis complete. Found potential gaps in {} year-type combinations.",
        reports.len()
    );
    println!();
    println!("Top combinations with the highest percentage of missing numbers:");
    for r in reports.iter().take(top) {
        println!(
            "Year {}, Type {}: {} missing out of {} expected ({:.1}%)",
            r.year,
            r.doc_type,
            r.missing_count(),
            r.expected_count,
            r.gap_percentage()
        );
        println!("   {}", missing_preview(&r.missing_numbers));
    }
}

fn missing_preview(missing: &[u32]) -> String {
    let shown: Vec<String> = missing
        .iter()
        .take(MAX_LIST_ITEMS)
        .map(u32::to_string)
        .collect();
    if missing.len() <= MAX_LIST_ITEMS {
        format!("Missing numbers: [{}]", shown.join(", "))
    } else {
        format!(
            "First {MAX_LIST_ITEMS} missing numbers: [{}]...",
            shown.join(", ")
        )
    }
}

// ── Count tables ──

pub fn print_year_type_counts(
    header: &str,
    counts: &BTreeMap<(i32, String), u64>,
) -> anyhow::Result<()> {
    println!("{header}");
    if counts.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    let batch = year_type_count_batch(counts)?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

// ── Ratio summaries ──

/// `Total number of papers` followed by the kept/dropped split.
pub fn print_split(total: usize, kept: usize, kept_label: &str, dropped_label: &str) {
    println!("Total number of papers: {total}");
    println!("{kept_label}: {kept} ({})", percent(kept, total));
    println!(
        "{dropped_label}: {} ({})",
        total - kept,
        percent(total - kept, total)
    );
}

pub fn print_download_summary(summary: &DownloadSummary) {
    println!();
    println!("Download Summary:");
    println!("Total papers attempted: {}", summary.attempted);
    println!("Successfully downloaded: {}", summary.succeeded);
    println!("Failed to download: {}", summary.failed);
    println!("Download log saved to: {}", summary.log_path.display());
}

fn percent(part: usize, total: usize) -> String {
    if total == 0 {
        return "n/a".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}
