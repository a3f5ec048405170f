// src/process/period.rs

use crate::process::utils::as_string_array;
use anyhow::Result;
use arrow::array::{ArrayRef, Int64Array, StringArray};

/// A `YYYYMM` competence code split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCode {
    /// Code left-padded with zeros to 6 characters.
    pub padded: String,
    pub year: Option<i64>,
    pub month: Option<i64>,
}

/// Split a raw competence value into year and month.
///
/// `"202303"` → (2023, 3). Short codes are zero-padded first, so `"9912"`
/// reads as `"009912"` → (99, 12). A trailing decimal part left over from a
/// float read (`"202303.0"`) is dropped. Returns `None` for blank input.
pub fn parse_period_code(raw: &str) -> Option<PeriodCode> {
    let trimmed = raw.trim();
    let digits = trimmed.split('.').next().unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }

    let padded = format!("{:0>6}", digits);
    let chars: Vec<char> = padded.chars().collect();
    let year: String = chars[0..4].iter().collect();
    let month: String = chars[4..6].iter().collect();

    Some(PeriodCode {
        year: year.parse().ok(),
        month: month.parse().ok(),
        padded,
    })
}

/// Year/month columns derived for one batch.
#[derive(Debug)]
pub struct PeriodColumns {
    /// Rewritten competence column, when the batch had one.
    pub padded: Option<StringArray>,
    pub years: Int64Array,
    pub months: Int64Array,
    /// Rows whose month was outside 1..=12 and was forced to 1.
    pub corrected_months: usize,
    /// Rows whose year could not be read and took the fallback year.
    pub corrected_years: usize,
}

/// Derive `ANO`/`MES` from the competence column, or from `fallback_year`
/// (month 1) when the batch has none.
pub fn derive_period(
    period: Option<&ArrayRef>,
    num_rows: usize,
    fallback_year: i64,
) -> Result<PeriodColumns> {
    let Some(arr) = period else {
        return Ok(PeriodColumns {
            padded: None,
            years: Int64Array::from(vec![fallback_year; num_rows]),
            months: Int64Array::from(vec![1; num_rows]),
            corrected_months: 0,
            corrected_years: 0,
        });
    };

    let strings = as_string_array(arr)?;
    let mut padded = Vec::with_capacity(num_rows);
    let mut years = Vec::with_capacity(num_rows);
    let mut months = Vec::with_capacity(num_rows);
    let mut corrected_months = 0;
    let mut corrected_years = 0;

    for code in strings.iter().map(|opt| opt.and_then(parse_period_code)) {
        let (text, year, month) = match code {
            Some(c) => (Some(c.padded), c.year, c.month),
            None => (None, None, None),
        };

        let year = year.unwrap_or_else(|| {
            corrected_years += 1;
            fallback_year
        });
        let month = match month {
            Some(m) if (1..=12).contains(&m) => m,
            _ => {
                corrected_months += 1;
                1
            }
        };

        padded.push(text);
        years.push(year);
        months.push(month);
    }

    Ok(PeriodColumns {
        padded: Some(StringArray::from(padded)),
        years: Int64Array::from(years),
        months: Int64Array::from(months),
        corrected_months,
        corrected_years,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use std::sync::Arc;

    #[test]
    fn splits_full_code() {
        let c = parse_period_code("202303").unwrap();
        assert_eq!(c.padded, "202303");
        assert_eq!(c.year, Some(2023));
        assert_eq!(c.month, Some(3));
    }

    #[test]
    fn pads_short_codes() {
        let c = parse_period_code("9912").unwrap();
        assert_eq!(c.padded, "009912");
        assert_eq!(c.year, Some(99));
        assert_eq!(c.month, Some(12));
    }

    #[test]
    fn drops_float_suffix_and_blanks() {
        assert_eq!(parse_period_code(" 202111.0 ").unwrap().month, Some(11));
        assert_eq!(parse_period_code("   "), None);
        let c = parse_period_code("2023XX").unwrap();
        assert_eq!(c.year, Some(2023));
        assert_eq!(c.month, None);
    }

    #[test]
    fn out_of_range_months_are_forced_to_one() -> Result<()> {
        let arr: ArrayRef = Arc::new(StringArray::from(vec![
            Some("202303"),
            Some("202313"),
            Some("202300"),
            Some("2023"),
            None,
        ]));
        let p = derive_period(Some(&arr), 5, 2023)?;

        assert_eq!(p.months.values().to_vec(), vec![3, 1, 1, 1, 1]);
        // "2023" pads to "002023": year 20, month 23
        assert_eq!(p.years.values().to_vec(), vec![2023, 2023, 2023, 20, 2023]);
        assert_eq!(p.corrected_months, 4);
        assert_eq!(p.corrected_years, 1);

        let padded = p.padded.unwrap();
        assert_eq!(padded.value(3), "002023");
        assert!(padded.is_null(4));
        Ok(())
    }

    #[test]
    fn missing_period_column_uses_fallback_year() -> Result<()> {
        let p = derive_period(None, 3, 2019)?;
        assert!(p.padded.is_none());
        assert_eq!(p.years.values().to_vec(), vec![2019; 3]);
        assert_eq!(p.months.values().to_vec(), vec![1; 3]);
        assert_eq!(p.corrected_months, 0);
        Ok(())
    }
}
