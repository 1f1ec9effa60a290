use std::collections::HashSet;

use regex::Regex;

use crate::config::TokenPattern;
use crate::error::MatchError;
use crate::model::ItemRecord;

// ---------------------------------------------------------------------------
// Structured mode
// ---------------------------------------------------------------------------

/// Pre-parsed tabular input: one header row plus data rows. How the table
/// got here (CSV, Excel, delimited text) is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Header substrings that mark a product-code column. English plus the
/// Turkish headers the source data uses ("urun_kodu", "stok_kodu").
const CODE_TOKENS: &[&str] = &[
    "code", "kod", "sku", "article", "artikel", "part", "item_no", "item no", "stok",
];

/// Header substrings that mark a description column.
const NAME_TOKENS: &[&str] = &[
    "name", "desc", "adi", "acikl", "label", "bezeichnung",
];

fn header_matches(header: &str, tokens: &[&str]) -> bool {
    let folded = header.to_lowercase();
    tokens.iter().any(|t| folded.contains(t))
}

/// Locate the code column and (optionally) the name column.
///
/// Code column: first header matching the code vocabulary but not the name
/// vocabulary ("item_name" must not win); fallback is column 0. Name
/// column: first non-code header matching the name vocabulary; fallback is
/// the first remaining column when the table has more than one.
pub fn locate_columns(headers: &[String]) -> (usize, Option<usize>) {
    let code_idx = headers
        .iter()
        .position(|h| header_matches(h, CODE_TOKENS) && !header_matches(h, NAME_TOKENS))
        .unwrap_or(0);

    let name_idx = headers
        .iter()
        .enumerate()
        .position(|(i, h)| i != code_idx && header_matches(h, NAME_TOKENS))
        .or_else(|| {
            if headers.len() > 1 {
                (0..headers.len()).find(|&i| i != code_idx)
            } else {
                None
            }
        });

    (code_idx, name_idx)
}

/// Convert a table into an ordered, deduplicated record sequence, capped
/// at `record_cap` unique records.
pub fn records_from_table(table: &RawTable, record_cap: usize) -> Result<Vec<ItemRecord>, MatchError> {
    if table.headers.is_empty() {
        return Err(MatchError::EmptyTable);
    }

    let (code_idx, name_idx) = locate_columns(&table.headers);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::new();

    for row in &table.rows {
        let code = row.get(code_idx).map(|s| s.trim()).unwrap_or("");
        let name = name_idx
            .and_then(|i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("");

        let record = ItemRecord::new(code, name);
        if record.is_blank() {
            continue;
        }
        if seen.insert((record.code.clone(), record.name.clone())) {
            records.push(record);
            if records.len() == record_cap {
                break;
            }
        }
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Unstructured mode
// ---------------------------------------------------------------------------

/// Alphanumeric run with interior `.-_/` allowed, bounded by word
/// boundaries. Length band and the at-least-one-digit rule are enforced
/// after matching.
const TOKEN_REGEX: &str = r"\b[A-Za-z0-9](?:[A-Za-z0-9._/-]*[A-Za-z0-9])?\b";

fn is_code_token(token: &str, band: &TokenPattern) -> bool {
    let len = token.chars().count();
    len >= band.min_len && len <= band.max_len && token.chars().any(|c| c.is_ascii_digit())
}

/// Name left over once the code token is cut out of the node text:
/// separator punctuation and whitespace trimmed, interior runs collapsed.
fn derive_name(text: &str, start: usize, end: usize) -> String {
    let remaining = format!("{}{}", &text[..start], &text[end..]);
    let trimmed =
        remaining.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | ';' | ','));
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scan leaf text nodes for code-like tokens. Each token found in a node
/// emits one candidate record; a node may contribute zero or more.
pub fn records_from_text_nodes<I, S>(nodes: I, band: &TokenPattern, record_cap: usize) -> Vec<ItemRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // The pattern is a compile-time constant; only the band varies.
    let re = Regex::new(TOKEN_REGEX).unwrap();

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::new();

    'outer: for node in nodes {
        let text = node.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        for m in re.find_iter(text) {
            if !is_code_token(m.as_str(), band) {
                continue;
            }

            let record = ItemRecord::new(m.as_str(), derive_name(text, m.start(), m.end()));
            if seen.insert((record.code.clone(), record.name.clone())) {
                records.push(record);
                if records.len() == record_cap {
                    break 'outer;
                }
            }
        }
    }

    records
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
