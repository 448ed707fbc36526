//! Meeting label parsing.
//!
//! Labels look like `"ATCM XXIX (2006) - CEP IX"`: the year in parentheses,
//! the consultative meeting ordinal after `ATCM`, and optionally the
//! Committee for Environmental Protection ordinal after `CEP`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::{CatalogRecord, Ordinal};
use crate::roman::from_roman;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{4})\)").expect("year pattern"));
static ATCM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ATCM\s+([IVXL0-9]+)").expect("ATCM pattern"));
static CEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CEP\s+([IVXL0-9]+)").expect("CEP pattern"));

/// Fields extracted from a meeting label. Every field is independent; a
/// label can yield a year without an ordinal and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeetingDescriptor {
    pub year: Option<i32>,
    pub meeting_number: Option<Ordinal>,
    pub cep_number: Option<Ordinal>,
}

/// Parse a free-text meeting label.
pub fn parse_meeting_label(label: &str) -> MeetingDescriptor {
    let year = YEAR_RE
        .captures(label)
        .and_then(|c| c[1].parse::<i32>().ok());

    MeetingDescriptor {
        year,
        meeting_number: capture_ordinal(&ATCM_RE, label),
        cep_number: capture_ordinal(&CEP_RE, label),
    }
}

/// Decode an ordinal token: digits first, then Roman numerals, falling back
/// to the raw token.
pub fn parse_ordinal(token: &str) -> Ordinal {
    if !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = token.parse::<u32>()
    {
        return Ordinal::Numeric(n);
    }
    match from_roman(token) {
        Some(n) => Ordinal::Numeric(n),
        None => Ordinal::Raw(token.to_string()),
    }
}

fn capture_ordinal(re: &Regex, label: &str) -> Option<Ordinal> {
    re.captures(label).map(|c| parse_ordinal(&c[1]))
}

/// Populate `year`, `meeting_number` and `cep_number` from the record's label.
///
/// Records without a label are returned unchanged.
pub fn apply_meeting(mut record: CatalogRecord) -> CatalogRecord {
    if let Some(label) = record.raw_meeting_label.as_deref() {
        let parsed = parse_meeting_label(label);
        record.year = parsed.year;
        record.meeting_number = parsed.meeting_number;
        record.cep_number = parsed.cep_number;
    }
    record
}
