use crate::config::PipelineConfig;
use crate::process::utils::as_string_array;
use anyhow::Result;
use arrow::array::{ArrayRef, Int64Array};
use std::sync::Arc;

/// Parse one bed-count cell.
///
/// Anything that is not a finite number (empty, text, `NaN`) counts as 0;
/// fractions truncate toward zero and negatives clamp to 0.
pub fn parse_bed_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| (v.trunc() as i64).max(0))
        .unwrap_or(0)
}

/// Convert a column of any type into non-negative bed counts.
pub fn coerce_bed_count_column(arr: &ArrayRef) -> Result<Int64Array> {
    let strings = as_string_array(arr)?;
    Ok(strings.iter().map(|opt| Some(parse_bed_count(opt))).collect())
}

/// Replace every bed-count column (name matches a numeric keyword) with its
/// `Int64` coercion; other columns pass through.
pub fn coerce_bed_counts(
    columns: Vec<(String, ArrayRef)>,
    config: &PipelineConfig,
) -> Result<Vec<(String, ArrayRef)>> {
    columns
        .into_iter()
        .map(|(name, arr)| {
            if config.is_numeric_column(&name) {
                let coerced = coerce_bed_count_column(&arr)?;
                Ok((name, Arc::new(coerced) as ArrayRef))
            } else {
                Ok((name, arr))
            }
        })
        .collect()
}
