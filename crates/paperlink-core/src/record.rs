//! Catalog record types shared across the enrichment stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::DocIdentity;
use crate::links::Extension;

/// A meeting or CEP ordinal as found in a meeting label.
///
/// Arabic and valid Roman tokens decode to [`Ordinal::Numeric`]; anything
/// else keeps the raw token so nothing is lost. Match before doing
/// arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ordinal {
    Numeric(u32),
    Raw(String),
}

impl Ordinal {
    /// The decoded value, if the token was numeric or a valid numeral.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Ordinal::Numeric(n) => Some(*n),
            Ordinal::Raw(_) => None,
        }
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordinal::Numeric(n) => write!(f, "{n}"),
            Ordinal::Raw(s) => f.write_str(s),
        }
    }
}

/// One catalog row after enrichment.
///
/// Created once per source row by [`CatalogRecord::from_row`]; link synthesis
/// may emit a second copy that differs only in `extension` and
/// `download_link`. `source_row` ties every copy back to its catalog row so
/// the pass-through columns can be carried into the enriched table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub source_row: usize,
    pub raw_meeting_label: Option<String>,
    pub year: Option<i32>,
    pub meeting_number: Option<Ordinal>,
    pub cep_number: Option<Ordinal>,
    pub doc_code: Option<String>,
    pub identity: Option<DocIdentity>,
    pub extension: Option<Extension>,
    pub download_link: Option<String>,
    pub title: Option<String>,
}

impl CatalogRecord {
    /// Build an un-enriched record from the raw catalog fields.
    pub fn from_row(
        source_row: usize,
        meeting_label: Option<&str>,
        doc_code: Option<&str>,
        title: Option<&str>,
    ) -> Self {
        Self {
            source_row,
            raw_meeting_label: meeting_label.map(str::to_string),
            doc_code: doc_code.map(str::to_string),
            title: title.map(str::to_string),
            ..Self::default()
        }
    }

    /// Uppercase document type, when the code parsed.
    pub fn doc_type(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.doc_type.as_str())
    }

    /// Unpadded document number, when the code parsed.
    pub fn doc_number(&self) -> Option<u32> {
        self.identity.as_ref().map(|id| id.number)
    }
}
