//! Pre-flight check that every yearly extract carries the expected header,
//! same names in the same order.

use anyhow::Result;
use std::{collections::BTreeSet, path::Path};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::process::{read::read_headers, utils};

/// Expected column name at `position` differs from the file's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMismatch {
    pub position: usize,
    pub expected: String,
    pub found: String,
}

/// How a header differs from the expected list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderDiff {
    /// Expected but absent, sorted.
    pub missing: Vec<String>,
    /// Present but not expected, sorted.
    pub extra: Vec<String>,
    /// Index-by-index name differences over the shorter of the two lists.
    pub mismatches: Vec<PositionMismatch>,
}

/// Compare a file header against the expected columns.
pub fn compare_headers(expected: &[String], found: &[String]) -> HeaderDiff {
    let expected_set: BTreeSet<&String> = expected.iter().collect();
    let found_set: BTreeSet<&String> = found.iter().collect();

    HeaderDiff {
        missing: expected_set
            .difference(&found_set)
            .map(|s| s.to_string())
            .collect(),
        extra: found_set
            .difference(&expected_set)
            .map(|s| s.to_string())
            .collect(),
        mismatches: expected
            .iter()
            .zip(found)
            .enumerate()
            .filter(|(_, (e, f))| e != f)
            .map(|(position, (e, f))| PositionMismatch {
                position,
                expected: e.clone(),
                found: f.clone(),
            })
            .collect(),
    }
}

/// Header of one file, or why it could not be read.
#[derive(Debug, Clone)]
pub struct HeaderSource {
    /// Usually the year taken from the file name.
    pub label: String,
    pub headers: Result<Vec<String>, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Consistent,
    Mismatch(HeaderDiff),
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub label: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    pub files: Vec<FileReport>,
}

impl ConsistencyReport {
    /// True only when there is at least one file and all of them match.
    pub fn is_consistent(&self) -> bool {
        !self.files.is_empty()
            && self
                .files
                .iter()
                .all(|f| f.status == FileStatus::Consistent)
    }

    pub fn problems(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| f.status != FileStatus::Consistent)
    }

    /// Emit the per-file differences and the overall verdict.
    pub fn log(&self) {
        if self.files.is_empty() {
            warn!("no CSV files found to check");
            return;
        }

        for file in self.problems() {
            match &file.status {
                FileStatus::Unreadable(reason) => {
                    warn!(file = %file.label, "could not read header: {}", reason);
                }
                FileStatus::Mismatch(diff) => {
                    warn!(file = %file.label, "header differs from the expected columns");
                    for col in &diff.missing {
                        warn!(file = %file.label, column = %col, "expected column missing");
                    }
                    for col in &diff.extra {
                        warn!(file = %file.label, column = %col, "unexpected column");
                    }
                    for m in &diff.mismatches {
                        warn!(
                            file = %file.label,
                            position = m.position,
                            "expected '{}' | found '{}'",
                            m.expected,
                            m.found
                        );
                    }
                }
                FileStatus::Consistent => {}
            }
        }

        if self.is_consistent() {
            info!(files = self.files.len(), "all files follow the expected columns");
        } else {
            warn!(
                files = self.files.len(),
                problems = self.problems().count(),
                "column consistency problems found"
            );
        }
    }
}

/// Check every header against `expected`. An unreadable header counts as an
/// inconsistency; an empty source list is inconsistent too.
pub fn check_consistency(
    expected: &[String],
    sources: Vec<HeaderSource>,
) -> (bool, ConsistencyReport) {
    let files = sources
        .into_iter()
        .map(|src| {
            let status = match src.headers {
                Err(reason) => FileStatus::Unreadable(reason),
                Ok(headers) if headers.as_slice() == expected => FileStatus::Consistent,
                Ok(headers) => FileStatus::Mismatch(compare_headers(expected, &headers)),
            };
            FileReport {
                label: src.label,
                status,
            }
        })
        .collect();

    let report = ConsistencyReport { files };
    (report.is_consistent(), report)
}

/// Read the header of every source file in `dir` and check it.
pub fn check_directory<P: AsRef<Path>>(
    dir: P,
    config: &PipelineConfig,
) -> Result<(bool, ConsistencyReport)> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "input directory not found");
        return Ok((false, ConsistencyReport::default()));
    }

    let files =
        utils::discover_source_files(dir, &config.source_prefix, &config.source_extension)?;
    let sources = files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let label = utils::extract_year_from_filename(
                &name,
                &config.source_prefix,
                &config.source_extension,
            )
            .map(|y| y.to_string())
            .unwrap_or(name);
            HeaderSource {
                label,
                headers: read_headers(path).map_err(|e| format!("{:#}", e)),
            }
        })
        .collect();

    Ok(check_consistency(&config.expected_columns, sources))
}
