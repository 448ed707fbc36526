//! Catalog parsing, download-link synthesis and numbering-gap analysis for
//! ATCM meeting papers.

pub mod catalog;
mod error;
pub mod gaps;
pub mod identity;
pub mod links;
pub mod meeting;
pub mod normalize;
pub mod record;
pub mod roman;
pub mod schema;

pub use catalog::{EnrichOptions, EnrichStats, EnrichedCatalog, MergeGroup, enrich_catalog};
pub use error::CatalogError;
pub use gaps::{DocumentKey, GapReport, analyze_gaps, gap_report_batch, rank_by_gap};
pub use identity::DocIdentity;
pub use links::{Extension, LinkTemplate, synthesize_links};
pub use meeting::{MeetingDescriptor, parse_meeting_label};
pub use record::{CatalogRecord, Ordinal};
pub use schema::columns;
