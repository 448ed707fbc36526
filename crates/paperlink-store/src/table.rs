//! Table files: CSV and Parquet in, CSV and Parquet out.
//!
//! CSV input is read with every column as nullable Utf8 so that document
//! codes and free-text labels survive untouched; typed parsing happens in
//! `paperlink-core`. Duplicate header names are disambiguated the way
//! spreadsheet exports are usually read: `Submitted By`, `Submitted By.1`,
//! `Submitted By.2`, ...

use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::StoreError;

const CSV_BATCH_SIZE: usize = 8192;

/// On-disk table formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(TableFormat::Csv),
            Some("parquet") => Ok(TableFormat::Parquet),
            _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Read a CSV or Parquet table.
pub fn read_table(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let batches = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv(path)?,
        TableFormat::Parquet => read_parquet(path)?,
    };
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    info!(path = %path.display(), rows, "read table");
    Ok(batches)
}

/// Write batches as CSV or Parquet, replacing any existing file.
pub fn write_table(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => write_csv(path, batches)?,
        TableFormat::Parquet => write_parquet(path, batches)?,
    }
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    info!(path = %path.display(), rows, "wrote table");
    Ok(())
}

/// Read a CSV file with a header row, all columns as nullable Utf8.
pub fn read_csv(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let mut file = File::open(path)?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    file.seek(SeekFrom::Start(0))?;

    let names = dedup_headers(inferred.fields().iter().map(|f| f.name().clone()));
    let schema = Schema::new(
        names
            .into_iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    );

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(CSV_BATCH_SIZE)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    Ok(or_empty(batches, schema))
}

/// Write batches to CSV with a header row. Nulls are written as empty cells.
pub fn write_csv(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    for batch in batches {
        writer.write(batch)?;
    }
    Ok(())
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder.build()?.collect::<Result<Vec<RecordBatch>, _>>()?;
    Ok(or_empty(batches, schema))
}

/// A header-only file still yields one zero-row batch, so later stages see
/// the columns.
fn or_empty(batches: Vec<RecordBatch>, schema: SchemaRef) -> Vec<RecordBatch> {
    if batches.is_empty() {
        vec![RecordBatch::new_empty(schema)]
    } else {
        batches
    }
}

/// Write batches to a single Parquet file. All batches must share a schema.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    let first = batches.first().ok_or(StoreError::NoBatches)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(())
}

/// Make header names unique by suffixing repeats with `.1`, `.2`, ...
pub fn dedup_headers<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let names: Vec<String> = names.into_iter().collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        if taken.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let mut k = 1;
        let unique = loop {
            let candidate = format!("{name}.{k}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            k += 1;
        };
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, Int32Array, StringArray};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")).unwrap(), TableFormat::Csv);
        assert_eq!(
            TableFormat::from_path(Path::new("a.parquet")).unwrap(),
            TableFormat::Parquet
        );
        assert!(matches!(
            TableFormat::from_path(Path::new("listofpapers.xlsx")),
            Err(StoreError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn dedup_matches_spreadsheet_convention() {
        let names = ["Submitted By", "Submitted By", "Submitted By", "Title"]
            .into_iter()
            .map(String::from);
        assert_eq!(
            dedup_headers(names),
            vec!["Submitted By", "Submitted By.1", "Submitted By.2", "Title"]
        );
    }

    #[test]
    fn dedup_avoids_existing_suffix() {
        let names = ["A", "A.1", "A"].into_iter().map(String::from);
        assert_eq!(dedup_headers(names), vec!["A", "A.1", "A.2"]);
    }

    #[test]
    fn csv_columns_are_text() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            &tmp,
            "papers.csv",
            "Meeting,No.,Title,Submitted By,Submitted By\n\
             ATCM XXIX (2006) - CEP IX,WP007,Krill,UK,\n\
             ATCM XXV (2002),IP010,Tourism,,Chile\n",
        );
        let batches = read_table(&path).unwrap();
        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert!(schema.fields().iter().all(|f| f.data_type() == &DataType::Utf8));
        assert!(schema.field_with_name("Submitted By.1").is_ok());

        let code = batch.column_by_name("No.").unwrap();
        let code = code.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(code.value(0), "WP007");
    }

    #[test]
    fn missing_file_errors() {
        let result = read_table(Path::new("/nonexistent/papers.csv"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn parquet_round_trip_keeps_types() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enriched.parquet");
        let batch = RecordBatch::try_from_iter(vec![
            ("Year", Arc::new(Int32Array::from(vec![Some(2006), None])) as ArrayRef),
            ("Type", Arc::new(StringArray::from(vec![Some("WP"), None])) as ArrayRef),
        ])
        .unwrap();
        write_table(&path, &[batch]).unwrap();

        let back = read_table(&path).unwrap();
        assert_eq!(back[0].num_rows(), 2);
        assert_eq!(back[0].schema().field(0).data_type(), &DataType::Int32);
        assert!(back[0].column(1).is_null(1));
    }

    #[test]
    fn csv_round_trip_writes_nulls_as_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");
        let batch = RecordBatch::try_from_iter(vec![
            ("Year", Arc::new(Int32Array::from(vec![Some(2006), None])) as ArrayRef),
            ("Type", Arc::new(StringArray::from(vec![Some("WP"), Some("IP")])) as ArrayRef),
        ])
        .unwrap();
        write_table(&path, &[batch]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Year,Type\n2006,WP\n,IP\n");

        let back = read_table(&path).unwrap();
        assert!(back[0].column(0).is_null(1));
    }

    #[test]
    fn header_only_csv_keeps_columns() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "existing.csv", "Title,Year,Type,Download_Link,Exists\n");
        let batches = read_table(&path).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 0);
        assert!(batches[0].schema().field_with_name("Exists").is_ok());
    }

    #[test]
    fn empty_table_round_trips_through_both_formats() {
        let tmp = TempDir::new().unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new("Title", DataType::Utf8, true)]));
        let empty = RecordBatch::new_empty(schema);
        for name in ["empty.csv", "empty.parquet"] {
            let path = tmp.path().join(name);
            write_table(&path, std::slice::from_ref(&empty)).unwrap();
            let back = read_table(&path).unwrap();
            assert_eq!(back.len(), 1, "{name}");
            assert_eq!(back[0].num_rows(), 0, "{name}");
            assert_eq!(back[0].schema().field(0).name(), "Title", "{name}");
        }
    }

    #[test]
    fn parquet_needs_a_batch() {
        let tmp = TempDir::new().unwrap();
        let result = write_parquet(&tmp.path().join("x.parquet"), &[]);
        assert!(matches!(result, Err(StoreError::NoBatches)));
    }
}
