//! Storage bridge (Arrow/Parquet)
//!
//! Run logs come in as Arrow record batches (or a Parquet file of them)
//! with one row per (method, group, run):
//!
//! | column             | type    | notes                        |
//! |--------------------|---------|------------------------------|
//! | `method`           | Utf8    |                              |
//! | `epoch`            | Int64   | non-negative                 |
//! | `run`              | Int64   | non-negative                 |
//! | `dev_performance`  | Float64 |                              |
//! | `dev_fairness`     | Float64 |                              |
//! | `test_performance` | Float64 |                              |
//! | `test_fairness`    | Float64 |                              |
//! | `artifact`         | Utf8    | nullable                     |
//! | `group`            | Int64   | optional, defaults to epoch  |
//!
//! Final tables go out as a single record batch following the report
//! projection, so they can be rendered or post-processed by columnar tools.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray,
    StringBuilder, UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::experiment::{MetricValues, RunLog, RunRecord};
use crate::schema::Column;
use crate::table::FinalTable;
use crate::{Error, Result};

/// Column names of the run log layout.
pub mod columns {
    /// Method name
    pub const METHOD: &str = "method";
    /// Epoch
    pub const EPOCH: &str = "epoch";
    /// Run index
    pub const RUN: &str = "run";
    /// Dev performance
    pub const DEV_PERFORMANCE: &str = "dev_performance";
    /// Dev fairness
    pub const DEV_FAIRNESS: &str = "dev_fairness";
    /// Test performance
    pub const TEST_PERFORMANCE: &str = "test_performance";
    /// Test fairness
    pub const TEST_FAIRNESS: &str = "test_fairness";
    /// Source artifact reference
    pub const ARTIFACT: &str = "artifact";
    /// Optional aggregation key
    pub const GROUP: &str = "group";
}

/// Schema of the run log layout (with the optional `group` column).
#[must_use]
pub fn run_log_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::METHOD, DataType::Utf8, false),
        Field::new(columns::EPOCH, DataType::Int64, false),
        Field::new(columns::RUN, DataType::Int64, false),
        Field::new(columns::DEV_PERFORMANCE, DataType::Float64, false),
        Field::new(columns::DEV_FAIRNESS, DataType::Float64, false),
        Field::new(columns::TEST_PERFORMANCE, DataType::Float64, false),
        Field::new(columns::TEST_FAIRNESS, DataType::Float64, false),
        Field::new(columns::ARTIFACT, DataType::Utf8, true),
        Field::new(columns::GROUP, DataType::Int64, true),
    ]))
}

/// Decode a run log from record batches.
///
/// # Errors
///
/// Returns `Error::StorageError` if a required column is missing, has the
/// wrong type, holds a null, or an integer column holds a negative value.
pub fn run_log_from_batches(batches: &[RecordBatch]) -> Result<RunLog> {
    let mut log = RunLog::new();
    for batch in batches {
        append_batch(&mut log, batch)?;
    }
    debug!(
        methods = log.method_count(),
        runs = log.run_count(),
        "decoded run log"
    );
    Ok(log)
}

/// Load a run log from a Parquet file.
///
/// # Errors
///
/// Returns `Error::StorageError` if the file cannot be read or does not
/// follow the run log layout.
pub fn load_run_log_parquet<P: AsRef<Path>>(path: P) -> Result<RunLog> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch = batch
            .map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        batches.push(batch);
    }

    run_log_from_batches(&batches)
}

fn append_batch(log: &mut RunLog, batch: &RecordBatch) -> Result<()> {
    let method = typed_column::<StringArray>(batch, columns::METHOD)?;
    let epoch = typed_column::<Int64Array>(batch, columns::EPOCH)?;
    let run = typed_column::<Int64Array>(batch, columns::RUN)?;
    let dev_perf = typed_column::<Float64Array>(batch, columns::DEV_PERFORMANCE)?;
    let dev_fair = typed_column::<Float64Array>(batch, columns::DEV_FAIRNESS)?;
    let test_perf = typed_column::<Float64Array>(batch, columns::TEST_PERFORMANCE)?;
    let test_fair = typed_column::<Float64Array>(batch, columns::TEST_FAIRNESS)?;
    let artifact = optional_column::<StringArray>(batch, columns::ARTIFACT)?;
    let group = optional_column::<Int64Array>(batch, columns::GROUP)?;

    for row in 0..batch.num_rows() {
        let epoch_value = non_negative(epoch, columns::EPOCH, row)?;
        let metrics = MetricValues::new(
            float_at(dev_perf, columns::DEV_PERFORMANCE, row)?,
            float_at(dev_fair, columns::DEV_FAIRNESS, row)?,
            float_at(test_perf, columns::TEST_PERFORMANCE, row)?,
            float_at(test_fair, columns::TEST_FAIRNESS, row)?,
        );
        if method.is_null(row) {
            return Err(null_error(columns::METHOD, row));
        }

        let mut builder = RunRecord::builder(
            method.value(row),
            epoch_value,
            non_negative(run, columns::RUN, row)?,
            metrics,
        );
        if let Some(artifact) = artifact.filter(|a| !a.is_null(row)) {
            builder = builder.artifact(artifact.value(row));
        }
        if let Some(group) = group.filter(|g| !g.is_null(row)) {
            builder = builder.group(non_negative(group, columns::GROUP, row)?);
        }
        log.add_run(builder.build());
    }
    Ok(())
}

fn typed_column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    optional_column(batch, name)?
        .ok_or_else(|| Error::StorageError(format!("Missing column '{name}'")))
}

fn optional_column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<Option<&'a T>> {
    let Some(column) = batch.column_by_name(name) else {
        return Ok(None);
    };
    column.as_any().downcast_ref::<T>().map(Some).ok_or_else(|| {
        Error::StorageError(format!(
            "Column '{name}' has unexpected type {:?}",
            column.data_type()
        ))
    })
}

fn null_error(name: &str, row: usize) -> Error {
    Error::StorageError(format!("Null value in column '{name}' at row {row}"))
}

fn float_at(array: &Float64Array, name: &str, row: usize) -> Result<f64> {
    if array.is_null(row) {
        return Err(null_error(name, row));
    }
    Ok(array.value(row))
}

fn non_negative(array: &Int64Array, name: &str, row: usize) -> Result<u64> {
    if array.is_null(row) {
        return Err(null_error(name, row));
    }
    let value = array.value(row);
    u64::try_from(value).map_err(|_| {
        Error::StorageError(format!("Negative value {value} in column '{name}' at row {row}"))
    })
}

/// Encode a final table as one record batch following its report projection.
///
/// # Errors
///
/// Returns `Error::Arrow` if the batch cannot be assembled.
pub fn table_to_record_batch(table: &FinalTable) -> Result<RecordBatch> {
    let names = table.metric_names();
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();

    for column in table.columns() {
        let label = column.label(names);
        let rows = table.rows();
        let (data_type, nullable, array): (DataType, bool, ArrayRef) = match column {
            Column::Method => {
                let mut b = StringBuilder::new();
                for row in rows {
                    b.append_value(&row.method);
                }
                (DataType::Utf8, false, Arc::new(b.finish()))
            }
            Column::Stat(stat) => {
                let mut b = Float64Builder::new();
                for row in rows {
                    b.append_value(row.record.stat(stat));
                }
                (DataType::Float64, false, Arc::new(b.finish()))
            }
            Column::DevDto => {
                let mut b = Float64Builder::new();
                for row in rows {
                    b.append_value(row.dev_dto);
                }
                (DataType::Float64, false, Arc::new(b.finish()))
            }
            Column::Dto => {
                let mut b = Float64Builder::new();
                for row in rows {
                    b.append_option(row.dto);
                }
                (DataType::Float64, true, Arc::new(b.finish()))
            }
            Column::EpochList => {
                let mut b = ListBuilder::new(UInt64Builder::new());
                for row in rows {
                    b.values().append_slice(row.record.epochs());
                    b.append(true);
                }
                let array = b.finish();
                (array.data_type().clone(), false, Arc::new(array))
            }
            Column::ArtifactList => {
                let mut b = ListBuilder::new(StringBuilder::new());
                for row in rows {
                    for artifact in row.record.artifacts() {
                        b.values().append_value(artifact);
                    }
                    b.append(true);
                }
                let array = b.finish();
                (array.data_type().clone(), false, Arc::new(array))
            }
        };
        fields.push(Field::new(label, data_type, nullable));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Write a final table to a Parquet file.
///
/// # Errors
///
/// Returns `Error::StorageError` if the file cannot be created or written.
pub fn write_table_parquet<P: AsRef<Path>>(table: &FinalTable, path: P) -> Result<()> {
    use parquet::arrow::ArrowWriter;

    let batch = table_to_record_batch(table)?;
    let file = File::create(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet file: {e}")))?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::StorageError(format!("Failed to write record batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::StorageError(format!("Failed to finalize Parquet file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::table::TableBuilder;

    fn create_run_batch(with_group: bool) -> RecordBatch {
        let mut schema_fields: Vec<Field> = run_log_schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["A", "A", "B"])),
            Arc::new(Int64Array::from(vec![0, 0, 3])),
            Arc::new(Int64Array::from(vec![0, 1, 0])),
            Arc::new(Float64Array::from(vec![0.8, 0.9, 0.7])),
            Arc::new(Float64Array::from(vec![0.6, 0.7, 0.5])),
            Arc::new(Float64Array::from(vec![0.81, 0.91, 0.71])),
            Arc::new(Float64Array::from(vec![0.61, 0.71, 0.51])),
            Arc::new(StringArray::from(vec![Some("a0.yaml"), Some("a1.yaml"), None])),
        ];
        if with_group {
            arrays.push(Arc::new(Int64Array::from(vec![Some(5), None, Some(9)])));
        } else {
            schema_fields.pop();
        }
        RecordBatch::try_new(Arc::new(Schema::new(schema_fields)), arrays).unwrap()
    }

    #[test]
    fn test_decode_run_log() {
        let log = run_log_from_batches(&[create_run_batch(false)]).unwrap();
        assert_eq!(log.methods().collect::<Vec<_>>(), vec!["A", "B"]);
        let a = log.runs_for_method("A").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].run_index(), 1);
        assert_eq!(a[1].artifact(), "a1.yaml");
        assert_eq!(log.runs_for_method("B").unwrap()[0].artifact(), "");
    }

    #[test]
    fn test_decode_optional_group() {
        let log = run_log_from_batches(&[create_run_batch(true)]).unwrap();
        let a = log.runs_for_method("A").unwrap();
        assert_eq!(a[0].group(), 5);
        assert_eq!(a[1].group(), 0);
    }

    #[test]
    fn test_decode_missing_column() {
        let schema = Arc::new(Schema::new(vec![Field::new("method", DataType::Utf8, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["A"]))]).unwrap();
        let err = run_log_from_batches(&[batch]).unwrap_err();
        assert!(err.to_string().contains("Missing column 'epoch'"));
    }

    #[test]
    fn test_decode_negative_epoch() {
        let batch = create_run_batch(false);
        let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();
        arrays[1] = Arc::new(Int64Array::from(vec![0, -1, 3]));
        let batch = RecordBatch::try_new(batch.schema(), arrays).unwrap();
        let err = run_log_from_batches(&[batch]).unwrap_err();
        assert!(err.to_string().contains("Negative value -1"));
    }

    #[test]
    fn test_encode_table_follows_projection() {
        let log = run_log_from_batches(&[create_run_batch(false)]).unwrap();
        let config = TableConfig::builder()
            .include_reproducibility(true)
            .build()
            .unwrap();
        let table = TableBuilder::new(config).build(&log).unwrap();
        let batch = table_to_record_batch(&table).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), table.columns().len());
        let names: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, table.column_names());
    }
}
