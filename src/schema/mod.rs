pub mod consistency;

pub use consistency::{
    check_consistency, check_directory, compare_headers, ConsistencyReport, FileStatus,
    HeaderDiff, HeaderSource,
};
