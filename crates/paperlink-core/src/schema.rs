/// Column names used by the catalog, the enriched table and the reports.
pub mod columns {
    // Source catalog.
    pub const MEETING: &str = "Meeting";
    pub const DOC_CODE: &str = "No.";
    pub const TITLE: &str = "Title";
    pub const ENGLISH: &str = "E";
    pub const SUBMITTED_BY: &str = "Submitted By";
    pub const AGENDA_ITEMS: &str = "Ag. Items";

    // Added by enrichment.
    pub const YEAR: &str = "Year";
    pub const MEETING_NUMBER: &str = "Meeting_Number";
    pub const CEP_NUMBER: &str = "CEP_Number";
    pub const TYPE: &str = "Type";
    pub const DOWNLOAD_LINK: &str = "Download_Link";
    pub const EXTENSION: &str = "Extension";

    // Added by link verification.
    pub const EXISTS: &str = "Exists";

    /// Availability columns for the other treaty languages.
    pub const OTHER_LANGUAGES: &[&str] = &["S", "F", "R"];
}

/// Arrow schema definitions for the enriched catalog and gap report.
pub mod catalog {
    use arrow::datatypes::{DataType, Field, Schema};

    use super::columns;

    /// Fields appended to the pass-through catalog columns by enrichment.
    pub fn enrichment_fields() -> Vec<Field> {
        vec![
            Field::new(columns::YEAR, DataType::Int32, true),
            Field::new(columns::MEETING_NUMBER, DataType::Utf8, true),
            Field::new(columns::CEP_NUMBER, DataType::Utf8, true),
            Field::new(columns::TYPE, DataType::Utf8, true),
            Field::new(columns::DOWNLOAD_LINK, DataType::Utf8, true),
            Field::new(columns::EXTENSION, DataType::Utf8, true),
        ]
    }

    /// Flat export of the numbering-gap analysis, one row per (year, type).
    pub fn gap_report_schema() -> Schema {
        Schema::new(vec![
            Field::new("Year", DataType::Int32, false),
            Field::new("Type", DataType::Utf8, false),
            Field::new("Min_Number", DataType::UInt32, false),
            Field::new("Max_Number", DataType::UInt32, false),
            Field::new("Expected_Count", DataType::UInt64, false),
            Field::new("Actual_Count", DataType::UInt64, false),
            Field::new("Missing_Count", DataType::UInt64, false),
            Field::new("Gap_Percentage", DataType::Float64, false),
            Field::new("Missing_Numbers", DataType::Utf8, false),
        ])
    }

    /// Document or gap counts keyed by (year, type).
    pub fn year_type_count_schema() -> Schema {
        Schema::new(vec![
            Field::new("Year", DataType::Int32, false),
            Field::new("Type", DataType::Utf8, false),
            Field::new("Count", DataType::UInt64, false),
        ])
    }
}

/// Cell access helpers tolerant of the string and integer encodings that
/// CSV and Parquet round trips produce.
pub mod cells {
    use arrow::array::{Array, Int32Array, Int64Array, LargeStringArray, StringArray};

    /// A non-empty string cell. Empty strings count as missing.
    pub fn cell_str(col: &dyn Array, row: usize) -> Option<&str> {
        if col.is_null(row) {
            return None;
        }
        let s = if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
            arr.value(row)
        } else if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
            arr.value(row)
        } else {
            return None;
        };
        (!s.is_empty()).then_some(s)
    }

    /// An integer cell stored as Int32, Int64, or text such as `"2006"` or
    /// `"2006.0"`.
    pub fn cell_i32(col: &dyn Array, row: usize) -> Option<i32> {
        if col.is_null(row) {
            return None;
        }
        if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
            return Some(arr.value(row));
        }
        if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
            return i32::try_from(arr.value(row)).ok();
        }
        let s = cell_str(col, row)?.trim();
        let s = s.strip_suffix(".0").unwrap_or(s);
        s.parse().ok()
    }
}
