// Incremental merge of exports into the persistent table.

pub mod duplicates;
pub mod engine;

pub use duplicates::{DuplicateReport, IgnoreList, find_duplicates, normalize_domain};
pub use engine::{KEY_FIELD, MergeError, MergeOutcome, MergeSummary, merge_files, merge_tables};
