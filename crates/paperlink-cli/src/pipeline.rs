//! Pipeline stages as run by the CLI: read a table, transform it, write
//! the result and print a report.

use std::path::Path;

use anyhow::Context;
use paperlink_core::gaps::{count_by_year_type, keys_from_batches, keys_from_records};
use paperlink_core::{
    DocumentKey, EnrichOptions, EnrichedCatalog, GapReport, analyze_gaps, enrich_catalog,
    gap_report_batch, rank_by_gap,
};
use paperlink_fetch::{DownloadConfig, DownloadSummary, Fetcher, LinkVerifier, VerifyConfig};
use paperlink_store::{filter_english, read_table, write_table};

use crate::display;

/// Normalize, parse and synthesize links; write the enriched table.
pub fn enrich(input: &Path, output: &Path, options: &EnrichOptions) -> anyhow::Result<EnrichedCatalog> {
    let batches = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    let enriched = enrich_catalog(&batches, options).context("enriching catalog")?;
    write_table(output, std::slice::from_ref(&enriched.table))
        .with_context(|| format!("writing {}", output.display()))?;
    display::print_enrich_stats(&enriched.stats);
    Ok(enriched)
}

/// Gap analysis over document keys; writes the flat report and prints the
/// top groups.
pub fn gaps(keys: &[DocumentKey], output: &Path, top: usize) -> anyhow::Result<Vec<GapReport>> {
    let mut reports = analyze_gaps(keys);
    let batch = gap_report_batch(&reports).context("building gap report")?;
    write_table(output, &[batch]).with_context(|| format!("writing {}", output.display()))?;

    rank_by_gap(&mut reports);
    display::print_gap_summary(&reports, top);
    println!();
    display::print_year_type_counts("Documents by year and type:", &count_by_year_type(keys))?;
    println!("Detailed results saved to {}", output.display());
    Ok(reports)
}

/// Keys from an enriched table on disk.
pub fn keys_from_file(input: &Path) -> anyhow::Result<Vec<DocumentKey>> {
    let batches = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    Ok(keys_from_batches(&batches)?)
}

/// Keys from records enriched in this process.
pub fn keys_from_enriched(enriched: &EnrichedCatalog) -> Vec<DocumentKey> {
    keys_from_records(&enriched.records)
}

/// Keep rows with an English version.
pub fn english(input: &Path, output: &Path) -> anyhow::Result<()> {
    let batches = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    let filtered = filter_english(&batches).context("filtering English documents")?;
    write_table(output, std::slice::from_ref(&filtered.kept))
        .with_context(|| format!("writing {}", output.display()))?;

    display::print_year_type_counts("Non-English papers by year and type:", &filtered.missing_by_year_type)?;
    display::print_split(
        filtered.total,
        filtered.kept_count(),
        "Papers with English versions",
        "Papers without English versions",
    );
    Ok(())
}

/// Check every link; write the annotated table and the reachable subset.
pub async fn verify(
    input: &Path,
    annotated: &Path,
    output: &Path,
    config: &VerifyConfig,
) -> anyhow::Result<()> {
    let batches = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    let verifier = LinkVerifier::new(config).context("building HTTP client")?;
    eprintln!("Checking document links (this may take some time)...");
    let verified = verifier.verify_table(&batches).await.context("verifying links")?;

    write_table(annotated, std::slice::from_ref(&verified.annotated))
        .with_context(|| format!("writing {}", annotated.display()))?;
    write_table(output, std::slice::from_ref(&verified.reachable))
        .with_context(|| format!("writing {}", output.display()))?;

    display::print_year_type_counts(
        "Inaccessible papers by year and type:",
        &verified.unreachable_by_year_type,
    )?;
    display::print_split(
        verified.total(),
        verified.reachable_count(),
        "Papers with accessible links",
        "Papers with inaccessible links",
    );
    Ok(())
}

/// Download every reachable paper into `out_dir`.
pub async fn download(
    input: &Path,
    out_dir: &Path,
    config: DownloadConfig,
) -> anyhow::Result<DownloadSummary> {
    let batches = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    let fetcher = Fetcher::new(config).context("building HTTP client")?;
    let summary = fetcher
        .download_table(&batches, input, out_dir)
        .await
        .context("downloading papers")?;
    display::print_download_summary(&summary);
    Ok(summary)
}
