//! Download link synthesis.
//!
//! The registry publishes each document at a predictable path:
//!
//! ```text
//! https://documents.ats.aq/ATCM29/wp/ATCM29_wp007_e.doc
//!                          ^^^^^^ ^^ ^^^^^^^^^^^^^^^^^^^^^
//!                          meeting type  filename
//! ```
//!
//! The preferred file format changed twice. Documents from 2002 may exist as
//! either `.pdf` or `.doc`, and documents from 2021 as either `.doc` or
//! `.docx`, so records from those years fan out into two candidate links.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::DocIdentity;
use crate::record::{CatalogRecord, Ordinal};

pub const DEFAULT_BASE_URL: &str = "https://documents.ats.aq";
pub const DEFAULT_LANGUAGE: &str = "e";

/// File formats the registry publishes documents in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Pdf,
    Doc,
    Docx,
}

impl Extension {
    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Pdf => "pdf",
            Extension::Doc => "doc",
            Extension::Docx => "docx",
        }
    }

    /// Primary extension for a meeting year, plus the alternative format for
    /// the two transition years.
    ///
    /// | year       | primary | alternative |
    /// |------------|---------|-------------|
    /// | < 2002     | pdf     |             |
    /// | 2002       | pdf     | doc         |
    /// | 2003..2020 | doc     |             |
    /// | 2021       | doc     | docx        |
    /// | > 2021     | docx    |             |
    pub fn for_year(year: i32) -> (Extension, Option<Extension>) {
        match year {
            ..2002 => (Extension::Pdf, None),
            2002 => (Extension::Pdf, Some(Extension::Doc)),
            2003..2021 => (Extension::Doc, None),
            2021 => (Extension::Doc, Some(Extension::Docx)),
            _ => (Extension::Docx, None),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Extension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(Extension::Pdf),
            "doc" => Ok(Extension::Doc),
            "docx" => Ok(Extension::Docx),
            other => Err(format!("unknown extension: {other}")),
        }
    }
}

/// Host and language used to build registry URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTemplate {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Language suffix appended to the filename (`e` for English).
    pub language: String,
}

impl Default for LinkTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_LANGUAGE)
    }
}

impl LinkTemplate {
    pub fn new(base_url: &str, language: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        }
    }

    /// Build the URL of one document variant.
    pub fn url(&self, meeting: u32, identity: &DocIdentity, ext: Extension) -> String {
        let ty = identity.type_segment();
        let mut file_name = format!("ATCM{meeting}_{ty}{}", identity.padded_number());
        if let Some(rev) = identity.revision {
            file_name.push_str(&format!("_rev{rev}"));
        }
        format!(
            "{}/ATCM{meeting}/{ty}/{file_name}_{}.{ext}",
            self.base_url, self.language
        )
    }
}

/// Parse the record's document code and synthesize its download link(s).
///
/// Returns the enriched record, followed by a second copy for transition
/// years. The identity is filled whenever the code parses; the extension and
/// link additionally need a year and a numeric meeting ordinal.
pub fn synthesize_links(mut record: CatalogRecord, template: &LinkTemplate) -> Vec<CatalogRecord> {
    record.identity = record.doc_code.as_deref().and_then(DocIdentity::parse);

    let Some(identity) = record.identity.clone() else {
        debug!(row = record.source_row, code = ?record.doc_code, "unparsed document code");
        return vec![record];
    };
    let Some(year) = record.year else {
        debug!(row = record.source_row, "no year; skipping link synthesis");
        return vec![record];
    };
    let meeting = match &record.meeting_number {
        Some(Ordinal::Numeric(n)) => *n,
        other => {
            debug!(row = record.source_row, meeting = ?other, "no numeric meeting ordinal; skipping link synthesis");
            return vec![record];
        }
    };

    let (primary, alternative) = Extension::for_year(year);
    record.extension = Some(primary);
    record.download_link = Some(template.url(meeting, &identity, primary));

    match alternative {
        Some(ext) => {
            let mut variant = record.clone();
            variant.extension = Some(ext);
            variant.download_link = Some(template.url(meeting, &identity, ext));
            vec![record, variant]
        }
        None => vec![record],
    }
}
