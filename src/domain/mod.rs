// Heuristics for finding the website an issue is about.

pub mod extract;
pub mod host;

pub use extract::{DomainExtractor, DomainSource, Extraction, Strategy};
pub use host::{SkipSet, clickable_domain, normalize_host, root_domain};
