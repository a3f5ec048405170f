// src/process/consolidate.rs

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{new_null_array, Array, ArrayRef, Int64Array, UInt64Array},
    compute::{concat_batches, lexsort_to_indices, max, min, take, SortColumn, SortOptions},
    csv::WriterBuilder,
    datatypes::{Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use chrono::NaiveDateTime;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

/// Union of all batch schemas, fields in order of first appearance.
pub fn union_schema(batches: &[RecordBatch]) -> SchemaRef {
    let mut fields: Vec<Field> = Vec::new();
    for batch in batches {
        for f in batch.schema().fields() {
            if !fields.iter().any(|seen| seen.name() == f.name()) {
                fields.push(Field::new(f.name(), f.data_type().clone(), true));
            }
        }
    }
    Arc::new(Schema::new(fields))
}

/// Reorder `batch` to `schema`; columns it lacks are filled with nulls.
pub fn align_to_schema(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|f| match batch.column_by_name(f.name()) {
            Some(col) if col.data_type() == f.data_type() => Ok(col.clone()),
            Some(col) => Err(anyhow!(
                "column `{}` is {:?} in one file and {:?} in another",
                f.name(),
                col.data_type(),
                f.data_type()
            )),
            None => {
                debug!(column = %f.name(), "filling missing column with nulls");
                Ok(new_null_array(f.data_type(), batch.num_rows()))
            }
        })
        .collect::<Result<_>>()?;
    RecordBatch::try_new(schema.clone(), columns).context("aligning batch to union schema")
}

/// Concatenate batches in order, tolerating per-file column differences.
pub fn concat_aligned(batches: &[RecordBatch]) -> Result<RecordBatch> {
    let schema = union_schema(batches);
    let aligned = batches
        .iter()
        .map(|b| align_to_schema(b, &schema))
        .collect::<Result<Vec<_>>>()?;
    concat_batches(&schema, &aligned).context("concatenating batches")
}

/// Sort ascending by `keys` (nulls last). Keys the batch does not have are
/// skipped; rows that tie keep their incoming order.
pub fn sort_consolidated(batch: &RecordBatch, keys: &[String]) -> Result<RecordBatch> {
    let options = Some(SortOptions {
        descending: false,
        nulls_first: false,
    });

    let mut sort_columns: Vec<SortColumn> = keys
        .iter()
        .filter_map(|k| match batch.column_by_name(k) {
            Some(col) => Some(SortColumn {
                values: col.clone(),
                options,
            }),
            None => {
                debug!(key = %k, "sort key not present, skipped");
                None
            }
        })
        .collect();
    if sort_columns.is_empty() || batch.num_rows() == 0 {
        return Ok(batch.clone());
    }

    let ordinal: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        0..batch.num_rows() as u64,
    ));
    sort_columns.push(SortColumn {
        values: ordinal,
        options,
    });

    let indices = lexsort_to_indices(&sort_columns, None).context("sorting rows")?;
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<Result<Vec<_>, _>>()
        .context("reordering columns")?;
    RecordBatch::try_new(batch.schema(), columns).context("building sorted batch")
}

/// Smallest and largest value of an `Int64` column.
pub fn int_range(batch: &RecordBatch, column: &str) -> Option<(i64, i64)> {
    let values = batch
        .column_by_name(column)?
        .as_any()
        .downcast_ref::<Int64Array>()?;
    Some((min(values)?, max(values)?))
}

/// `<prefix><YYYYmmdd_HHMMSS>.csv`
pub fn output_file_name(prefix: &str, generated_at: NaiveDateTime) -> String {
    format!("{}{}.csv", prefix, generated_at.format("%Y%m%d_%H%M%S"))
}

/// Write the consolidated batch as a UTF-8, comma-separated CSV with a
/// header row into `out_dir`, returning the file path.
pub fn write_consolidated(
    out_dir: &Path,
    prefix: &str,
    batch: &RecordBatch,
    generated_at: NaiveDateTime,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {:?}", out_dir))?;
    let path = out_dir.join(output_file_name(prefix, generated_at));

    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_delimiter(b',')
        .build(file);
    writer
        .write(batch)
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), rows = batch.num_rows(), "wrote consolidated file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{array::StringArray, datatypes::DataType};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn rows(ano: Vec<i64>, mes: Vec<i64>, uf: Vec<Option<&str>>, tag: Vec<&str>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("TAG", DataType::Utf8, true),
            Field::new("UF", DataType::Utf8, true),
            Field::new("ANO", DataType::Int64, true),
            Field::new("MES", DataType::Int64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(tag)),
                Arc::new(StringArray::from(uf)),
                Arc::new(Int64Array::from(ano)),
                Arc::new(Int64Array::from(mes)),
            ],
        )
        .unwrap()
    }

    fn tags(batch: &RecordBatch) -> Vec<String> {
        let arr = batch
            .column_by_name("TAG")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        arr.iter().map(|v| v.unwrap_or("").to_string()).collect()
    }

    fn keys() -> Vec<String> {
        vec!["ANO".into(), "MES".into(), "UF".into()]
    }

    #[test]
    fn sorts_by_year_month_state() -> Result<()> {
        let b = rows(
            vec![2021, 2020, 2020, 2020, 2020],
            vec![1, 2, 1, 1, 1],
            vec![Some("AC"), Some("AC"), Some("SP"), None, Some("BA")],
            vec!["a", "b", "c", "d", "e"],
        );
        let sorted = sort_consolidated(&b, &keys())?;
        assert_eq!(tags(&sorted), vec!["e", "c", "d", "b", "a"]);
        Ok(())
    }

    #[test]
    fn ties_keep_incoming_order() -> Result<()> {
        let b = rows(
            vec![2020; 4],
            vec![1; 4],
            vec![Some("SP"); 4],
            vec!["first", "second", "third", "fourth"],
        );
        let sorted = sort_consolidated(&b, &keys())?;
        assert_eq!(tags(&sorted), vec!["first", "second", "third", "fourth"]);
        Ok(())
    }

    #[test]
    fn concat_fills_missing_columns() -> Result<()> {
        let a = rows(vec![2020], vec![1], vec![Some("SP")], vec!["a"]);
        let b = a.project(&[0, 2, 3])?; // no UF
        let all = concat_aligned(&[a, b])?;
        assert_eq!(all.num_rows(), 2);
        let uf = all.column_by_name("UF").unwrap();
        assert!(uf.is_valid(0));
        assert!(uf.is_null(1));
        Ok(())
    }

    #[test]
    fn year_range_from_int_column() {
        let b = rows(vec![2019, 2023, 2021], vec![1, 1, 1], vec![None; 3], vec!["", "", ""]);
        assert_eq!(int_range(&b, "ANO"), Some((2019, 2023)));
        assert_eq!(int_range(&b, "UF"), None);
        assert_eq!(int_range(&b, "NOPE"), None);
    }

    #[test]
    fn writes_timestamped_csv_with_header() -> Result<()> {
        let dir = tempdir()?;
        let out_dir = dir.path().join("limpos");
        let when = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let b = rows(vec![2020], vec![3], vec![Some("SP")], vec!["x"]);

        let path = write_consolidated(&out_dir, "leitos_consolidados_", &b, when)?;
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "leitos_consolidados_20240506_070809.csv"
        );
        let text = fs::read_to_string(&path)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("TAG,UF,ANO,MES"));
        assert_eq!(lines.next(), Some("x,SP,2020,3"));
        Ok(())
    }
}
