// Shared record types: produced by the fetcher, consumed by the export.

pub mod common;
pub mod issue;

pub use common::*;
pub use issue::*;
