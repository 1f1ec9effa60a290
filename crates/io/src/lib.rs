// File ingestion and report export

pub mod csv;
pub mod xlsx;
pub mod xml;

use std::path::Path;

use linematch_engine::config::MatchConfig;
use linematch_engine::extract::{records_from_table, records_from_text_nodes};
use linematch_engine::ItemRecord;

/// Load one document (order- or invoice-side) into item records,
/// dispatching on the file extension. XML goes through the unstructured
/// leaf-text scan; spreadsheets and delimited text through the tabular
/// extractor. Unknown extensions are treated as delimited text.
pub fn load_records(path: &Path, config: &MatchConfig) -> Result<Vec<ItemRecord>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xml" => {
            let nodes = xml::leaf_texts(path)?;
            Ok(records_from_text_nodes(
                nodes,
                &config.token_pattern,
                config.record_cap,
            ))
        }
        "xlsx" | "xls" | "xlsb" | "ods" => {
            let table = xlsx::import_table(path)?;
            records_from_table(&table, config.record_cap).map_err(|e| e.to_string())
        }
        _ => {
            let table = csv::import_table(path)?;
            records_from_table(&table, config.record_cap).map_err(|e| e.to_string())
        }
    }
}
