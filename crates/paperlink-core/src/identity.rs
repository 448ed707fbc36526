//! Document code parsing.
//!
//! Codes are a type prefix, a number and an optional revision:
//! `"WP042"`, `"IP010 rev. 1"`. The number is kept unpadded for numbering
//! analysis and padded to three digits only when rendering filenames.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]+)(\d+)(?:\s+rev\.\s+(\d+))?").expect("document code pattern")
});

/// Unanchored variant used when re-reading previously exported tables.
static LOOSE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)(\d+)").expect("loose document code pattern"));

/// Parsed identity of a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocIdentity {
    /// Uppercase type code: WP, IP, BP, SP, ...
    pub doc_type: String,
    pub number: u32,
    pub revision: Option<u32>,
}

impl DocIdentity {
    /// Parse a document code. Surrounding whitespace is ignored.
    pub fn parse(code: &str) -> Option<Self> {
        let caps = CODE_RE.captures(code.trim())?;
        let number = caps[2].parse().ok()?;
        let revision = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            doc_type: caps[1].to_string(),
            number,
            revision,
        })
    }

    /// Lowercase type for URL path segments.
    pub fn type_segment(&self) -> String {
        self.doc_type.to_ascii_lowercase()
    }

    /// Number zero-padded to three digits. Longer numbers are not truncated.
    pub fn padded_number(&self) -> String {
        format!("{:03}", self.number)
    }
}

impl fmt::Display for DocIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.doc_type, self.padded_number())?;
        if let Some(rev) = self.revision {
            write!(f, " rev. {rev}")?;
        }
        Ok(())
    }
}

/// Extract just the document number, searching anywhere in the code.
pub fn search_doc_number(code: &str) -> Option<u32> {
    LOOSE_CODE_RE.captures(code)?[2].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_code() {
        let id = DocIdentity::parse("WP042").unwrap();
        assert_eq!(id.doc_type, "WP");
        assert_eq!(id.number, 42);
        assert_eq!(id.revision, None);
    }

    #[test]
    fn code_with_revision() {
        let id = DocIdentity::parse("IP010 rev. 1").unwrap();
        assert_eq!(id.doc_type, "IP");
        assert_eq!(id.number, 10);
        assert_eq!(id.revision, Some(1));
    }

    #[test]
    fn leading_zeros_do_not_matter() {
        for code in ["WP7", "WP07", "WP007", "WP0007"] {
            assert_eq!(DocIdentity::parse(code).unwrap().number, 7, "{code}");
        }
    }

    #[test]
    fn padding_is_display_only() {
        let id = DocIdentity::parse("SP3").unwrap();
        assert_eq!(id.padded_number(), "003");
        assert_eq!(id.number, 3);
        assert_eq!(DocIdentity::parse("IP1234").unwrap().padded_number(), "1234");
    }

    #[test]
    fn whitespace_trimmed() {
        assert_eq!(DocIdentity::parse("  BP005  ").unwrap().number, 5);
    }

    #[test]
    fn non_matching_codes() {
        assert!(DocIdentity::parse("").is_none());
        assert!(DocIdentity::parse("wp001").is_none());
        assert!(DocIdentity::parse("042").is_none());
        assert!(DocIdentity::parse("Final Report").is_none());
        assert!(DocIdentity::parse("WP").is_none());
    }

    #[test]
    fn malformed_revision_ignored() {
        let id = DocIdentity::parse("WP012 rev.2").unwrap();
        assert_eq!(id.number, 12);
        assert_eq!(id.revision, None);
    }

    #[test]
    fn type_segment_lowercase() {
        assert_eq!(DocIdentity::parse("WP001").unwrap().type_segment(), "wp");
    }

    #[test]
    fn display_form() {
        assert_eq!(DocIdentity::parse("IP10 rev. 2").unwrap().to_string(), "IP010 rev. 2");
    }

    #[test]
    fn loose_search() {
        assert_eq!(search_doc_number("Doc WP042"), Some(42));
        assert_eq!(search_doc_number("none"), None);
    }
}
