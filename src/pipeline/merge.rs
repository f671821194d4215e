use std::collections::HashMap;
use tracing::info;

use super::table::{CanonicalRow, CanonicalTable};
use super::SchemaError;
use crate::extract::RawTableFragment;

/// Merge per-page fragments into one canonical table keyed by `index_column`.
///
/// Rows are concatenated in fragment order, then deduplicated by index value
/// with the last occurrence winning; the survivor keeps the last occurrence's
/// position. The result is projected to exactly `keep_columns`, in that
/// order, with the index value always retained as the row key.
///
/// Fails with [`SchemaError`] if any fragment's header row lacks the index
/// column or one of the kept columns.
pub fn merge(
    fragments: &[RawTableFragment],
    index_column: &str,
    keep_columns: &[String],
) -> Result<CanonicalTable, SchemaError> {
    // Validate every fragment's schema up front so the error names all
    // offending columns at once.
    let mut missing: Vec<String> = Vec::new();
    for fragment in fragments {
        if !fragment.headers.iter().any(|h| h == index_column)
            && !missing.iter().any(|m| m == index_column)
        {
            missing.push(index_column.to_string());
        }
        for col in keep_columns {
            if !fragment.headers.iter().any(|h| h == col) && !missing.iter().any(|m| m == col) {
                missing.push(col.clone());
            }
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError { missing });
    }

    // Concatenate, preserving fragment order and within-fragment row order.
    let mut concatenated: Vec<CanonicalRow> = Vec::new();
    for fragment in fragments {
        let index_pos = fragment
            .headers
            .iter()
            .position(|h| h == index_column)
            .expect("index column validated above");
        let keep_positions: Vec<usize> = keep_columns
            .iter()
            .map(|col| {
                fragment
                    .headers
                    .iter()
                    .position(|h| h == col)
                    .expect("kept column validated above")
            })
            .collect();

        for row in &fragment.rows {
            let key = row.get(index_pos).cloned().unwrap_or_default();
            let cells = keep_positions
                .iter()
                .map(|&p| row.get(p).cloned().unwrap_or_default())
                .collect();
            concatenated.push(CanonicalRow { key, cells });
        }
    }

    // Deduplicate by key, last occurrence wins.
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (i, row) in concatenated.iter().enumerate() {
        last_index.insert(row.key.as_str(), i);
    }
    let rows: Vec<CanonicalRow> = concatenated
        .iter()
        .enumerate()
        .filter(|(i, row)| last_index[row.key.as_str()] == *i)
        .map(|(_, row)| row.clone())
        .collect();

    info!(
        fragments = fragments.len(),
        concatenated = concatenated.len(),
        merged = rows.len(),
        "fragments merged"
    );

    Ok(CanonicalTable {
        index_column: index_column.to_string(),
        columns: keep_columns.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(headers: &[&str], rows: &[&[&str]]) -> RawTableFragment {
        RawTableFragment {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn later_duplicate_wins() -> anyhow::Result<()> {
        let f1 = fragment(
            &["CUSIP", "PRICE"],
            &[&["A1", "98"][..], &["B2", "100"][..]],
        );
        let f2 = fragment(&["CUSIP", "PRICE"], &[&["A1", "99"][..]]);

        let table = merge(&[f1, f2], "CUSIP", &cols(&["PRICE"]))?;
        assert_eq!(table.rows.len(), 2);
        // A1's survivor sits at its last occurrence, after B2.
        assert_eq!(table.rows[0].key, "B2");
        assert_eq!(table.rows[1].key, "A1");
        assert_eq!(table.rows[1].cells, vec!["99"]);
        Ok(())
    }

    #[test]
    fn duplicate_within_one_fragment_also_dedups() -> anyhow::Result<()> {
        let f = fragment(
            &["CUSIP", "PRICE"],
            &[&["A1", "97"][..], &["A1", "98"][..]],
        );
        let table = merge(&[f], "CUSIP", &cols(&["PRICE"]))?;
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells, vec!["98"]);
        Ok(())
    }

    #[test]
    fn projects_to_exactly_kept_columns_in_order() -> anyhow::Result<()> {
        let f = fragment(
            &["RATING", "CUSIP", "PRICE", "FEATURE"],
            &[&["AA", "A1", "98", "CALLABLE"][..]],
        );
        let table = merge(&[f], "CUSIP", &cols(&["PRICE", "RATING"]))?;
        assert_eq!(table.columns, vec!["PRICE", "RATING"]);
        assert_eq!(table.rows[0].cells, vec!["98", "AA"]);
        // FEATURE is gone; the key survives outside the cells.
        assert_eq!(table.rows[0].key, "A1");
        Ok(())
    }

    #[test]
    fn index_column_retained_even_when_not_kept() -> anyhow::Result<()> {
        let f = fragment(&["CUSIP", "PRICE"], &[&["A1", "98"][..]]);
        let table = merge(&[f], "CUSIP", &cols(&["PRICE"]))?;
        assert_eq!(table.index_column, "CUSIP");
        assert_eq!(table.rows[0].key, "A1");
        Ok(())
    }

    #[test]
    fn missing_columns_reported_by_name() {
        let f = fragment(&["CUSIP", "PRICE"], &[&["A1", "98"][..]]);
        let err = merge(&[f], "CUSIP", &cols(&["PRICE", "MATURITY", "COUPON"])).unwrap_err();
        assert_eq!(err.missing, vec!["MATURITY", "COUPON"]);
        let msg = err.to_string();
        assert!(msg.contains("MATURITY"));
        assert!(msg.contains("COUPON"));
    }

    #[test]
    fn missing_index_column_is_fatal() {
        let f = fragment(&["PRICE"], &[&["98"][..]]);
        let err = merge(&[f], "CUSIP", &cols(&["PRICE"])).unwrap_err();
        assert_eq!(err.missing, vec!["CUSIP"]);
    }

    #[test]
    fn fragments_may_order_columns_differently() -> anyhow::Result<()> {
        let f1 = fragment(&["CUSIP", "PRICE"], &[&["A1", "98"][..]]);
        let f2 = fragment(&["PRICE", "CUSIP"], &[&["99", "B2"][..]]);
        let table = merge(&[f1, f2], "CUSIP", &cols(&["PRICE"]))?;
        assert_eq!(table.rows[0].cells, vec!["98"]);
        assert_eq!(table.rows[1].cells, vec!["99"]);
        assert_eq!(table.rows[1].key, "B2");
        Ok(())
    }

    #[test]
    fn empty_input_yields_empty_table() -> anyhow::Result<()> {
        let table = merge(&[], "CUSIP", &cols(&["PRICE"]))?;
        assert!(table.rows.is_empty());
        assert_eq!(table.columns, vec!["PRICE"]);
        Ok(())
    }
}
