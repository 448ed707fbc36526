mod display;
mod pipeline;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use paperlink_core::links::{DEFAULT_BASE_URL, DEFAULT_LANGUAGE};
use paperlink_core::{EnrichOptions, LinkTemplate, columns};
use paperlink_fetch::{DownloadConfig, VerifyConfig};

#[derive(Parser)]
#[command(name = "paperlink", version, about = "ATCM meeting-paper catalog enrichment and retrieval")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse meetings and document codes, and synthesize download links.
    Enrich {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        links: LinkArgs,
    },
    /// Report numbering gaps per (year, type) from an enriched table.
    Gaps {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "document_number_gaps.csv")]
        output: PathBuf,
        /// Groups to print, ranked by gap percentage.
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Also print the full reports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Keep only papers with an English version.
    English {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Check which download links exist.
    Verify {
        #[arg(long)]
        input: PathBuf,
        /// Reachable rows only.
        #[arg(long)]
        output: PathBuf,
        /// All rows with their `Exists` flag.
        #[arg(long)]
        annotated: PathBuf,
        #[command(flatten)]
        http: VerifyArgs,
    },
    /// Download reachable papers.
    Download {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "papers")]
        out_dir: PathBuf,
        #[command(flatten)]
        http: DownloadArgs,
    },
    /// Run every stage in order.
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "Data/Output")]
        work_dir: PathBuf,
        #[arg(long, default_value = "papers")]
        papers_dir: PathBuf,
        #[command(flatten)]
        links: LinkArgs,
        #[command(flatten)]
        verify: VerifyArgs,
        #[command(flatten)]
        download: DownloadArgs,
    },
}

#[derive(Args)]
struct LinkArgs {
    #[arg(long, env = "PAPERLINK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Language suffix of the document filenames.
    #[arg(long, env = "PAPERLINK_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    language: String,
    /// Columns removed from the enriched table.
    #[arg(long = "drop-column", value_delimiter = ',', default_values_t = columns::OTHER_LANGUAGES.iter().map(|s| s.to_string()))]
    drop_columns: Vec<String>,
}

impl LinkArgs {
    fn options(&self) -> EnrichOptions {
        EnrichOptions {
            template: LinkTemplate::new(&self.base_url, &self.language),
            drop_columns: self.drop_columns.clone(),
            ..EnrichOptions::default()
        }
    }
}

#[derive(Args)]
struct VerifyArgs {
    #[arg(long, default_value_t = 5)]
    verify_timeout_secs: u64,
    #[arg(long, default_value_t = 8)]
    verify_concurrency: usize,
}

impl VerifyArgs {
    fn config(&self) -> VerifyConfig {
        VerifyConfig {
            timeout: Duration::from_secs(self.verify_timeout_secs),
            concurrency: self.verify_concurrency,
        }
    }
}

#[derive(Args)]
struct DownloadArgs {
    #[arg(long, default_value_t = 30)]
    download_timeout_secs: u64,
    #[arg(long, default_value_t = 1)]
    download_concurrency: usize,
    /// Pause after each download.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
}

impl DownloadArgs {
    fn config(&self) -> DownloadConfig {
        DownloadConfig {
            timeout: Duration::from_secs(self.download_timeout_secs),
            concurrency: self.download_concurrency,
            delay: Duration::from_millis(self.delay_ms),
            ..DownloadConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("paperlink v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Enrich {
            input,
            output,
            links,
        } => {
            pipeline::enrich(&input, &output, &links.options())?;
        }
        Command::Gaps {
            input,
            output,
            top,
            json,
        } => {
            let keys = pipeline::keys_from_file(&input)?;
            let reports = pipeline::gaps(&keys, &output, top)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
        Command::English { input, output } => pipeline::english(&input, &output)?,
        Command::Verify {
            input,
            output,
            annotated,
            http,
        } => pipeline::verify(&input, &annotated, &output, &http.config()).await?,
        Command::Download {
            input,
            out_dir,
            http,
        } => {
            pipeline::download(&input, &out_dir, http.config()).await?;
        }
        Command::Run {
            input,
            work_dir,
            papers_dir,
            links,
            verify,
            download,
        } => {
            std::fs::create_dir_all(&work_dir)?;
            let with_links = work_dir.join("listofpapers-WithLinks.csv");
            let english = work_dir.join("listofpapers-WithLinks-AllEnglish.csv");
            let annotated = work_dir.join("listofpapers-WithLinks-AllEnglish-Existing-Column.csv");
            let existing = work_dir.join("listofpapers-WithLinks-AllEnglish-Existing.csv");

            let enriched = pipeline::enrich(&input, &with_links, &links.options())?;
            println!();
            let keys = pipeline::keys_from_enriched(&enriched);
            pipeline::gaps(&keys, &work_dir.join("document_number_gaps.csv"), 10)?;
            println!();
            pipeline::english(&with_links, &english)?;
            println!();
            pipeline::verify(&english, &annotated, &existing, &verify.config()).await?;
            pipeline::download(&existing, &papers_dir, download.config()).await?;
        }
    }
    Ok(())
}
