// src/pipeline/mod.rs
//
// The core of the scraper: merging per-page fragments into one canonical
// table, then deriving valuation fields and ranking the survivors. Both
// steps are pure transforms over in-memory data; all I/O lives elsewhere.

pub mod merge;
pub mod rank;
pub mod table;

pub use merge::merge;
pub use rank::{rank, RankOutcome};
pub use table::{BondRecord, CanonicalRow, CanonicalTable, DataQualityWarning, RankedBond};

use thiserror::Error;

/// A required column is missing from the extracted data. Fatal: the run
/// aborts before any output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required column(s): {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}
