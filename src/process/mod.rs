// src/process/mod.rs
pub mod consolidate;
pub mod convert;
pub mod entity_type;
pub mod normalize;
pub mod period;
pub mod prune;
pub mod read;
pub mod text;
pub mod utils;

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{PipelineConfig, YEAR_COLUMN};

/// A source file that did not make it into the consolidated dataset.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a consolidation run.
#[derive(Debug)]
pub struct Consolidated {
    /// All normalized rows, sorted by year, month and state.
    pub batch: RecordBatch,
    pub files_processed: usize,
    pub skipped: Vec<SkippedFile>,
    /// First and last `ANO` present.
    pub year_range: Option<(i64, i64)>,
}

impl Consolidated {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn log_summary(&self) {
        info!(
            files = self.files_processed,
            skipped = self.skipped.len(),
            records = self.num_rows(),
            "consolidation finished"
        );
        if let Some((first, last)) = self.year_range {
            info!("period covered: {} to {}", first, last);
        }
        for s in &self.skipped {
            warn!(path = %s.path.display(), reason = %s.reason, "file skipped");
        }
    }
}

/// Read one yearly extract, prune it to the relevant columns and normalize it.
/// `year` is used when the file has no competence column.
#[tracing::instrument(level = "info", skip(path, config), fields(path = %path.as_ref().display()))]
pub fn process_file<P: AsRef<Path>>(
    path: P,
    year: i64,
    config: &PipelineConfig,
) -> Result<RecordBatch> {
    let raw = read::read_batch(&path)?;
    let pruned = prune::prune_columns(&raw, &config.relevant_columns)?;
    let normalized = normalize::normalize(&pruned, year, config)?;
    info!(rows = normalized.batch.num_rows(), "file processed");
    Ok(normalized.batch)
}

/// Process every `<prefix><YYYY>.<ext>` file in `dir` and consolidate them.
///
/// A file that fails is logged and skipped; the run carries on. Returns
/// `Ok(None)` when the directory is missing, holds no source files, or no
/// file could be processed.
pub fn process_all<P: AsRef<Path>>(dir: P, config: &PipelineConfig) -> Result<Option<Consolidated>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        error!(dir = %dir.display(), "input directory not found");
        return Ok(None);
    }

    let files =
        utils::discover_source_files(dir, &config.source_prefix, &config.source_extension)?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "no source files found");
        return Ok(None);
    }

    let mut batches = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for path in files {
        let outcome = file_year(&path, config).and_then(|year| process_file(&path, year, config));
        match outcome {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                error!(path = %path.display(), "failed to process: {:#}", e);
                skipped.push(SkippedFile {
                    path,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    if batches.is_empty() {
        warn!("no file was processed successfully");
        return Ok(None);
    }

    let all = consolidate::concat_aligned(&batches)?;
    let batch = consolidate::sort_consolidated(&all, &config.sort_columns)?;
    let year_range = consolidate::int_range(&batch, YEAR_COLUMN);

    Ok(Some(Consolidated {
        batch,
        files_processed: batches.len(),
        skipped,
        year_range,
    }))
}

fn file_year(path: &Path, config: &PipelineConfig) -> Result<i64> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("unreadable file name"))?;
    utils::extract_year_from_filename(name, &config.source_prefix, &config.source_extension)
        .ok_or_else(|| anyhow!("no 4-digit year in file name `{}`", name))
}
