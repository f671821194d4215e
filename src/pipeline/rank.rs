use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use super::table::{BondRecord, CanonicalRow, CanonicalTable, DataQualityWarning, RankedBond};
use super::SchemaError;

/// Column names the valuation formulas read. These are fixed properties of
/// the source listing, independent of the configured kept-column subset.
pub const PRICE_COLUMN: &str = "PRICE";
pub const COUPON_COLUMN: &str = "COUPON";
pub const MATURITY_COLUMN: &str = "MATURITY";

const MATURITY_DATE_FORMAT: &str = "%Y-%m-%d";
const SECONDS_PER_YEAR: f64 = 86_400.0 * 365.25;

/// The ranked survivors plus the records dropped for data-quality reasons.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOutcome {
    pub ranked: Vec<RankedBond>,
    pub skipped: Vec<DataQualityWarning>,
}

/// Derive valuation fields for every record, drop candidates past the
/// maturity horizon, and order the survivors.
///
/// `now` is the instant years-to-maturity is measured from; callers pass it
/// explicitly so identical inputs always produce identical output.
///
/// Ordering is descending by `(maturity_year, approximate_yield)` with a
/// stable sort, so records tying on both keys keep their merge order. A
/// record whose maturity has already passed gets a negative
/// years-to-maturity and is not specially excluded; only the horizon filter
/// removes records, and it never triggers on negative values.
pub fn rank(
    table: &CanonicalTable,
    face_value: f64,
    maturity_horizon_years: f64,
    now: NaiveDateTime,
) -> Result<RankOutcome, SchemaError> {
    let positions = required_positions(table)?;

    let mut ranked: Vec<RankedBond> = Vec::new();
    let mut skipped: Vec<DataQualityWarning> = Vec::new();
    let mut beyond_horizon = 0usize;

    for row in &table.rows {
        let record = match parse_record(row, &positions) {
            Ok(record) => record,
            Err(reason) => {
                skipped.push(DataQualityWarning {
                    identifier: row.key.clone(),
                    reason,
                });
                continue;
            }
        };

        let total_cost = record.price / 100.0 * face_value;
        let years_to_maturity = (record.maturity_date.and_hms_opt(0, 0, 0).unwrap() - now)
            .num_seconds() as f64
            / SECONDS_PER_YEAR;
        let interest_dollars = record.coupon_percent / 100.0 * face_value;

        if years_to_maturity == 0.0 {
            skipped.push(DataQualityWarning {
                identifier: record.identifier,
                reason: "zero years to maturity; approximate yield is undefined".to_string(),
            });
            continue;
        }

        let approximate_yield =
            ((face_value - total_cost) / years_to_maturity + interest_dollars) / total_cost * 100.0;
        if !approximate_yield.is_finite() {
            skipped.push(DataQualityWarning {
                identifier: record.identifier,
                reason: format!(
                    "approximate yield is not finite (price {}, years {})",
                    record.price, years_to_maturity
                ),
            });
            continue;
        }

        if years_to_maturity > maturity_horizon_years {
            beyond_horizon += 1;
            continue;
        }

        ranked.push(RankedBond {
            identifier: record.identifier,
            cells: row.cells.clone(),
            total_cost,
            years_to_maturity,
            interest_dollars,
            approximate_yield,
            maturity_year: record.maturity_date.year(),
        });
    }

    // Stable: ties on both keys keep merge order.
    ranked.sort_by(|a, b| {
        b.maturity_year
            .cmp(&a.maturity_year)
            .then_with(|| b.approximate_yield.total_cmp(&a.approximate_yield))
    });

    debug!(beyond_horizon, "records dropped by horizon filter");
    info!(
        input = table.rows.len(),
        ranked = ranked.len(),
        skipped = skipped.len(),
        "ranking complete"
    );

    Ok(RankOutcome { ranked, skipped })
}

struct RequiredPositions {
    price: usize,
    coupon: usize,
    maturity: usize,
}

fn required_positions(table: &CanonicalTable) -> Result<RequiredPositions, SchemaError> {
    let price = table.column_position(PRICE_COLUMN);
    let coupon = table.column_position(COUPON_COLUMN);
    let maturity = table.column_position(MATURITY_COLUMN);

    let missing: Vec<String> = [
        (PRICE_COLUMN, price),
        (COUPON_COLUMN, coupon),
        (MATURITY_COLUMN, maturity),
    ]
    .iter()
    .filter(|(_, pos)| pos.is_none())
    .map(|(name, _)| name.to_string())
    .collect();
    if !missing.is_empty() {
        return Err(SchemaError { missing });
    }

    Ok(RequiredPositions {
        price: price.unwrap(),
        coupon: coupon.unwrap(),
        maturity: maturity.unwrap(),
    })
}

fn parse_record(row: &CanonicalRow, positions: &RequiredPositions) -> Result<BondRecord, String> {
    let price_cell = &row.cells[positions.price];
    let price: f64 = price_cell
        .trim()
        .parse()
        .map_err(|_| format!("unparseable {} value `{}`", PRICE_COLUMN, price_cell))?;

    let coupon_cell = &row.cells[positions.coupon];
    let coupon_percent: f64 = coupon_cell
        .trim()
        .parse()
        .map_err(|_| format!("unparseable {} value `{}`", COUPON_COLUMN, coupon_cell))?;

    let maturity_cell = &row.cells[positions.maturity];
    let maturity_date = NaiveDate::parse_from_str(maturity_cell.trim(), MATURITY_DATE_FORMAT)
        .map_err(|_| format!("unparseable {} value `{}`", MATURITY_COLUMN, maturity_cell))?;

    Ok(BondRecord {
        identifier: row.key.clone(),
        price,
        coupon_percent,
        maturity_date,
    })
}
