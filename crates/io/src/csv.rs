// CSV / delimited text import and report export

use std::io::Read;
use std::path::Path;

use linematch_engine::extract::RawTable;
use linematch_engine::model::MatchReport;

/// Import a delimited text file as a header + rows table. The delimiter
/// is sniffed from the content; the first record becomes the header row.
pub fn import_table(path: &Path) -> Result<RawTable, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    table_from_string(&content, delimiter)
}

pub fn import_table_with_delimiter(path: &Path, delimiter: u8) -> Result<RawTable, String> {
    let content = read_file_as_utf8(path)?;
    table_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across
/// the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per
/// line. The delimiter that produces the most consistent field count
/// (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        // Higher field count breaks ties — more columns = more likely real delimiter
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn table_from_string(content: &str, delimiter: u8) -> Result<RawTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut table = RawTable::default();

    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        if table.headers.is_empty() {
            table.headers = fields;
        } else {
            table.rows.push(fields);
        }
    }

    if table.headers.is_empty() {
        return Err("file contains no rows".to_string());
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Report export
// ---------------------------------------------------------------------------

/// Write the matched table as CSV.
pub fn export_matched(report: &MatchReport, path: &Path) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;

    writer
        .write_record([
            "invoice_code",
            "invoice_name",
            "order_code",
            "order_name",
            "score",
            "confidence",
        ])
        .map_err(|e| e.to_string())?;

    for row in &report.matched {
        let score = format!("{:.1}", row.score);
        writer
            .write_record([
                row.invoice_code.as_str(),
                row.invoice_name.as_str(),
                row.order_code.as_str(),
                row.order_name.as_str(),
                score.as_str(),
                row.confidence.text(),
            ])
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())
}

/// Write the unmatched table as CSV.
pub fn export_unmatched(report: &MatchReport, path: &Path) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;

    writer
        .write_record(["invoice_code", "invoice_name", "non_match_score", "confidence"])
        .map_err(|e| e.to_string())?;

    for row in &report.unmatched {
        let score = format!("{:.1}", row.non_match_score);
        writer
            .write_record([
                row.invoice_code.as_str(),
                row.invoice_name.as_str(),
                score.as_str(),
                row.confidence.text(),
            ])
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sniff_semicolon_delimiter() {
        let content = "urun_kodu;urun_adi\nA100;Widget Blue\nB200;Widget Red\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniff_comma_delimiter() {
        let content = "code,name\nA100,Widget\nB200,Gasket\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn sniff_tab_delimiter() {
        let content = "code\tname\nA100\tWidget\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn sniff_pipe_delimiter() {
        let content = "code|name\nA100|Widget\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn sniff_semicolon_with_commas_in_values() {
        // Semicolon delimiter but commas appear inside quoted fields
        let content = "code;name\nA100;\"Widget, blue\"\nB200;\"Gasket, small\"\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn import_splits_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("order.csv");
        fs::write(&path, "urun_kodu,urun_adi\nA100,Widget Blue\nB200,Widget Red\n").unwrap();

        let table = import_table(&path).unwrap();
        assert_eq!(table.headers, vec!["urun_kodu", "urun_adi"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["A100", "Widget Blue"]);
    }

    #[test]
    fn import_ragged_rows_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "code,name\nA100\nB200,Gasket,extra\n").unwrap();

        let table = import_table(&path).unwrap();
        assert_eq!(table.rows[0], vec!["A100"]);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn import_empty_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        assert!(import_table(&path).is_err());
    }

    #[test]
    fn windows_1252_content_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Ürün" in Windows-1252: 0xDC 0x72 0xFC 0x6E
        fs::write(&path, [0xDCu8, 0x72, 0xFC, 0x6E, b',', b'x', b'\n']).unwrap();

        let content = read_file_as_utf8(&path).unwrap();
        assert!(content.starts_with("Ürün"));
    }

    #[test]
    fn export_matched_round_trips_through_reader() {
        use linematch_engine::config::MatchConfig;
        use linematch_engine::normalize::TemplateSet;
        use linematch_engine::{run, ItemRecord};

        let orders = vec![ItemRecord::new("A100", "Widget Blue")];
        let invoices = vec![ItemRecord::new("A100", "Widget Blue")];
        let report =
            run(&MatchConfig::default(), &TemplateSet::new(), None, &orders, &invoices).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("matched.csv");
        export_matched(&report, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "invoice_code,invoice_name,order_code,order_name,score,confidence"
        );
        assert_eq!(lines.next().unwrap(), "A100,Widget Blue,A100,Widget Blue,100.0,Excellent");
    }
}
