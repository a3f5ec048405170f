use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, StringArray},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use glob::{glob, Pattern};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::warn;

/// Pulls the 4-digit year out of a source file name such as `Leitos_2021.csv`.
/// Returns `None` when the name does not follow `<prefix><YYYY>.<extension>`.
pub fn extract_year_from_filename(file_name: &str, prefix: &str, extension: &str) -> Option<i64> {
    let rest = file_name.strip_prefix(prefix)?;
    let stem = rest.strip_suffix(extension)?.strip_suffix('.')?;
    if stem.len() == 4 && stem.chars().all(|c| c.is_ascii_digit()) {
        stem.parse().ok()
    } else {
        None
    }
}

/// List `<dir>/<prefix>*.<extension>`, sorted by path.
pub fn discover_source_files(dir: &Path, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| anyhow!("directory path is not valid UTF-8: {:?}", dir))?;
    let pattern = format!(
        "{}/{}*.{}",
        Pattern::escape(dir_str),
        Pattern::escape(prefix),
        Pattern::escape(extension)
    );

    let mut files = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable entry: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

/// Cast any column to its string form, the way every value is printed in CSV.
pub fn as_string_array(arr: &ArrayRef) -> Result<StringArray> {
    let casted = cast(arr, &DataType::Utf8).context("casting column to Utf8")?;
    casted
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| anyhow!("cast to Utf8 did not produce a StringArray"))
}

/// Assemble a batch from named columns; every field is nullable and typed
/// after its array.
pub fn batch_from_columns(columns: Vec<(String, ArrayRef)>) -> Result<RecordBatch> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, arr)| Field::new(name, arr.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, arr)| arr).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use arrow::array::Int64Array;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn year_from_well_formed_names() {
        assert_eq!(extract_year_from_filename("Leitos_2021.csv", "Leitos_", "csv"), Some(2021));
        assert_eq!(extract_year_from_filename("Leitos_1999.csv", "Leitos_", "csv"), Some(1999));
    }

    #[test]
    fn year_rejects_other_names() {
        assert_eq!(extract_year_from_filename("Leitos_21.csv", "Leitos_", "csv"), None);
        assert_eq!(extract_year_from_filename("Leitos_2021.txt", "Leitos_", "csv"), None);
        assert_eq!(extract_year_from_filename("Leitos_20a1.csv", "Leitos_", "csv"), None);
        assert_eq!(extract_year_from_filename("Outros_2021.csv", "Leitos_", "csv"), None);
        assert_eq!(extract_year_from_filename("Leitos_2021csv", "Leitos_", "csv"), None);
    }

    #[test]
    fn discovers_only_matching_files_sorted() -> Result<()> {
        let dir = tempdir()?;
        for name in ["Leitos_2021.csv", "Leitos_2019.csv", "notes.csv", "Leitos_2020.txt"] {
            fs::write(dir.path().join(name), "COMP\n")?;
        }
        fs::create_dir(dir.path().join("Leitos_dir.csv"))?;

        let files = discover_source_files(dir.path(), "Leitos_", "csv")?;
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Leitos_2019.csv", "Leitos_2021.csv"]);
        Ok(())
    }

    #[test]
    fn numbers_cast_to_strings() -> Result<()> {
        let arr: ArrayRef = Arc::new(Int64Array::from(vec![Some(202303), None]));
        let s = as_string_array(&arr)?;
        assert_eq!(s.value(0), "202303");
        assert!(s.is_null(1));
        Ok(())
    }
}
