use crate::config::YEAR_COLUMN;
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;

/// Keep only the `relevant` columns the batch actually has, in `relevant`
/// order. Never adds columns; a pre-existing `ANO` is always dropped.
pub fn prune_columns(batch: &RecordBatch, relevant: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices: Vec<usize> = relevant
        .iter()
        .filter(|name| name.as_str() != YEAR_COLUMN)
        .filter_map(|name| schema.index_of(name).ok())
        .collect();

    batch
        .project(&indices)
        .context("projecting relevant columns")
}
