//! Column normalization for repeated catalog fields.
//!
//! Spreadsheet exports spread multi-valued fields over numbered columns
//! (`Submitted By`, `Submitted By.1`, `Submitted By.2`, ...). These are
//! folded into one comma-separated column.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::error::CatalogError;
use crate::schema::cells::cell_str;

/// Merge every column whose name starts with `prefix` into one Utf8 column
/// named `target`.
///
/// Each row's value is the `", "`-joined non-missing values of the matched
/// columns in column order, or `""` if all are missing. The matched columns
/// are removed and the merged column takes the position of the first one
/// (or is appended when nothing matched).
pub fn merge_prefixed_columns(
    batch: &RecordBatch,
    prefix: &str,
    target: &str,
) -> Result<RecordBatch, CatalogError> {
    let schema = batch.schema();
    let matched: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name().starts_with(prefix))
        .map(|(i, _)| i)
        .collect();

    let sources: Vec<ArrayRef> = matched
        .iter()
        .map(|&i| cast(batch.column(i), &DataType::Utf8))
        .collect::<Result<_, _>>()?;

    let merged: StringArray = (0..batch.num_rows())
        .map(|row| {
            let values: Vec<&str> = sources
                .iter()
                .filter_map(|col| cell_str(col.as_ref(), row))
                .collect();
            Some(values.join(", "))
        })
        .collect();

    let insert_at = matched.first().copied();
    let mut fields: Vec<Arc<Field>> = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    let merged_field = Arc::new(Field::new(target, DataType::Utf8, false));
    let merged: ArrayRef = Arc::new(merged);

    for (i, field) in schema.fields().iter().enumerate() {
        if Some(i) == insert_at {
            fields.push(merged_field.clone());
            columns.push(merged.clone());
        }
        if matched.contains(&i) || field.name() == target {
            continue;
        }
        fields.push(field.clone());
        columns.push(batch.column(i).clone());
    }
    if insert_at.is_none() {
        fields.push(merged_field);
        columns.push(merged);
    }

    debug!(prefix, target, merged = matched.len(), "merged prefixed columns");
    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        columns,
    )?)
}

/// Remove the named columns. Names that are not present are ignored.
pub fn drop_columns(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch, CatalogError> {
    let schema = batch.schema();
    let keep: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !names.contains(&f.name().as_str()))
        .map(|(i, _)| i)
        .collect();
    Ok(batch.project(&keep)?)
}
