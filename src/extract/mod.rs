// src/extract/mod.rs

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::str::FromStr;
use tracing::debug;

/// One page's extracted table. Headers repeat on every page of the source
/// listing, which is why the merge step dedups across fragments.
#[derive(Debug, Clone)]
pub struct RawTableFragment {
    /// Column names, from the header row of this page.
    pub headers: Vec<String>,
    /// Each data row, one `String` per field, aligned with `headers`.
    pub rows: Vec<Vec<String>>,
}

/// Which pages of the document to extract, in the source's "all" / "2" /
/// "1-3" notation. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRange {
    All,
    Single(usize),
    Span(usize, usize),
}

impl PageRange {
    pub fn contains(&self, page: usize) -> bool {
        match *self {
            PageRange::All => true,
            PageRange::Single(p) => page == p,
            PageRange::Span(start, end) => page >= start && page <= end,
        }
    }
}

impl FromStr for PageRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PageRange::All);
        }
        if let Some((start, end)) = s.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .with_context(|| format!("invalid page range `{}`", s))?;
            let end: usize = end
                .trim()
                .parse()
                .with_context(|| format!("invalid page range `{}`", s))?;
            if start == 0 || end < start {
                bail!("invalid page range `{}`", s);
            }
            return Ok(PageRange::Span(start, end));
        }
        let page: usize = s
            .parse()
            .with_context(|| format!("invalid page range `{}`", s))?;
        if page == 0 {
            bail!("invalid page range `{}`", s);
        }
        Ok(PageRange::Single(page))
    }
}

/// Parse the downloaded listing document into per-page table fragments.
///
/// Pages are separated by form feeds; each page carries its own header row.
/// Pages outside `range` are skipped. Pages with a header but no data rows
/// produce empty fragments, which the merge handles fine.
#[tracing::instrument(level = "info", skip(text, range))]
pub fn read_fragments(text: &str, range: &PageRange) -> Result<Vec<RawTableFragment>> {
    let mut fragments = Vec::new();

    for (idx, page) in text.split('\u{c}').enumerate() {
        let page_no = idx + 1;
        if !range.contains(page_no) {
            continue;
        }
        if page.trim().is_empty() {
            continue;
        }
        let fragment = parse_page(page)
            .with_context(|| format!("failed to parse page {} of the document", page_no))?;
        debug!(page = page_no, rows = fragment.rows.len(), "page parsed");
        fragments.push(fragment);
    }

    Ok(fragments)
}

/// Parse one page: first record is the header, the rest are data rows.
/// Short rows are padded with empty cells, long rows truncated, so every
/// row lines up with the header.
fn parse_page(page: &str) -> Result<RawTableFragment> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(page.trim_start_matches('\n').as_bytes());

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let fields: Vec<String> = record.iter().map(|s| s.trim().to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if headers.is_empty() {
            headers = fields;
        } else {
            let mut row = fields;
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
    }

    if headers.is_empty() {
        bail!("page contains no header row");
    }

    Ok(RawTableFragment { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_range_parsing() -> Result<()> {
        assert_eq!("all".parse::<PageRange>()?, PageRange::All);
        assert_eq!("ALL".parse::<PageRange>()?, PageRange::All);
        assert_eq!("2".parse::<PageRange>()?, PageRange::Single(2));
        assert_eq!("1-3".parse::<PageRange>()?, PageRange::Span(1, 3));
        assert!("0".parse::<PageRange>().is_err());
        assert!("3-1".parse::<PageRange>().is_err());
        assert!("x".parse::<PageRange>().is_err());
        Ok(())
    }

    #[test]
    fn page_range_membership() {
        assert!(PageRange::All.contains(17));
        assert!(PageRange::Single(2).contains(2));
        assert!(!PageRange::Single(2).contains(3));
        assert!(PageRange::Span(1, 3).contains(3));
        assert!(!PageRange::Span(1, 3).contains(4));
    }

    #[test]
    fn splits_on_form_feed_with_repeated_headers() -> Result<()> {
        let doc = "CUSIP,PRICE,COUPON\nA1,98,5\nB7,101,4\n\u{c}CUSIP,PRICE,COUPON\nC3,97,6\n";
        let fragments = read_fragments(doc, &PageRange::All)?;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].headers, vec!["CUSIP", "PRICE", "COUPON"]);
        assert_eq!(fragments[0].rows.len(), 2);
        assert_eq!(fragments[1].headers, vec!["CUSIP", "PRICE", "COUPON"]);
        assert_eq!(fragments[1].rows, vec![vec!["C3", "97", "6"]]);
        Ok(())
    }

    #[test]
    fn honors_page_range() -> Result<()> {
        let doc = "CUSIP,PRICE\nA1,98\n\u{c}CUSIP,PRICE\nB2,99\n\u{c}CUSIP,PRICE\nC3,100\n";
        let fragments = read_fragments(doc, &"2".parse()?)?;
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].rows, vec![vec!["B2", "99"]]);

        let fragments = read_fragments(doc, &"2-3".parse()?)?;
        assert_eq!(fragments.len(), 2);
        Ok(())
    }

    #[test]
    fn pads_short_rows_to_header_width() -> Result<()> {
        let doc = "CUSIP,PRICE,RATING\nA1,98\n";
        let fragments = read_fragments(doc, &PageRange::All)?;
        assert_eq!(fragments[0].rows, vec![vec!["A1", "98", ""]]);
        Ok(())
    }

    #[test]
    fn skips_blank_pages() -> Result<()> {
        let doc = "CUSIP,PRICE\nA1,98\n\u{c}\n\n\u{c}CUSIP,PRICE\nB2,99\n";
        let fragments = read_fragments(doc, &PageRange::All)?;
        assert_eq!(fragments.len(), 2);
        Ok(())
    }
}
