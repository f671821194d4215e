use chrono::NaiveDate;

/// The canonical merged table: one row per instrument identifier, projected
/// to the configured kept columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    /// Name of the column whose value keys each row.
    pub index_column: String,
    /// Retained column names, in the configured order.
    pub columns: Vec<String>,
    pub rows: Vec<CanonicalRow>,
}

impl CanonicalTable {
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// One merged row. The key is always retained even when the index column is
/// not among the kept columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    /// Value of the index column; unique across the table after the merge.
    pub key: String,
    /// Cells aligned with `CanonicalTable::columns`.
    pub cells: Vec<String>,
}

/// The typed fields the ranker needs from a canonical row.
#[derive(Debug, Clone, PartialEq)]
pub struct BondRecord {
    pub identifier: String,
    /// Percent-of-par quote.
    pub price: f64,
    /// Stated annual interest rate, percent of face value.
    pub coupon_percent: f64,
    pub maturity_date: NaiveDate,
}

/// A surviving candidate with its derived valuation fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedBond {
    pub identifier: String,
    /// Passthrough cells, aligned with the canonical table's columns.
    pub cells: Vec<String>,
    pub total_cost: f64,
    pub years_to_maturity: f64,
    pub interest_dollars: f64,
    pub approximate_yield: f64,
    pub maturity_year: i32,
}

/// A record dropped during derivation, reported rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityWarning {
    pub identifier: String,
    pub reason: String,
}
