// src/process/normalize.rs

use anyhow::Result;
use arrow::{
    array::{Array, ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::warn;

use crate::config::{PipelineConfig, MONTH_COLUMN, YEAR_COLUMN};
use crate::process::{
    convert::coerce_bed_counts,
    entity_type::correct_entity_type_column,
    period::derive_period,
    text::{apply_categorical_map, clean_text_column},
    utils::{as_string_array, batch_from_columns},
};

/// A normalized batch plus what had to be patched on the way.
#[derive(Debug)]
pub struct Normalized {
    pub batch: RecordBatch,
    pub corrected_months: usize,
    pub corrected_years: usize,
}

/// Normalize a pruned batch:
/// 1) bed-count columns → non-negative `Int64`
/// 2) competence code → `ANO`/`MES` (or `fallback_year`/1 without one)
/// 3) categorical remaps, skipping the entity-type column
/// 4) entity-type correction
/// 5) trim/upper/fold the text columns
///
/// Running it again on its own output changes nothing.
pub fn normalize(
    batch: &RecordBatch,
    fallback_year: i64,
    config: &PipelineConfig,
) -> Result<Normalized> {
    let num_rows = batch.num_rows();
    let schema = batch.schema();

    // derived columns are rebuilt, never carried over
    let columns: Vec<(String, ArrayRef)> = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(f, _)| f.name() != YEAR_COLUMN && f.name() != MONTH_COLUMN)
        .map(|(f, arr)| (f.name().clone(), arr.clone()))
        .collect();

    // 1) numbers
    let mut columns = coerce_bed_counts(columns, config)?;

    // 2) period
    let period_idx = columns
        .iter()
        .position(|(name, _)| *name == config.period_column);
    let period = derive_period(period_idx.map(|i| &columns[i].1), num_rows, fallback_year)?;
    if let (Some(i), Some(padded)) = (period_idx, period.padded) {
        columns[i].1 = Arc::new(padded) as ArrayRef;
    }
    if period.corrected_months > 0 {
        warn!(
            rows = period.corrected_months,
            "records with invalid month, corrected to 1"
        );
    }
    if period.corrected_years > 0 {
        warn!(
            rows = period.corrected_years,
            fallback_year, "records with unreadable year, using file year"
        );
    }

    for (name, arr) in columns.iter_mut() {
        // 3) categorical maps
        if let Some(mapping) = config.mappings.get(name.as_str()) {
            if *name != config.entity_type_column {
                let values = as_string_array(arr)?;
                *arr = Arc::new(apply_categorical_map(&values, mapping)) as ArrayRef;
            }
        }

        // 4) legal-entity type
        if *name == config.entity_type_column {
            let values = as_string_array(arr)?;
            *arr = Arc::new(correct_entity_type_column(&values)) as ArrayRef;
        }

        // 5) free text
        if config.text_columns.contains(name) {
            let values = as_string_array(arr)?;
            *arr = Arc::new(clean_text_column(&values)) as ArrayRef;
        }
    }

    columns.push((YEAR_COLUMN.to_string(), Arc::new(period.years) as ArrayRef));
    columns.push((MONTH_COLUMN.to_string(), Arc::new(period.months) as ArrayRef));

    Ok(Normalized {
        batch: batch_from_columns(columns)?,
        corrected_months: period.corrected_months,
        corrected_years: period.corrected_years,
    })
}

/// String column `name`, if the batch has one of that type.
pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
}
