// XML ingestion: collect leaf text for the unstructured extractor

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::csv::read_file_as_utf8;

/// Collect every non-empty text (and CDATA) node from an XML document,
/// in document order. Attribute values are not scanned — the original
/// data carries item lines as element text.
///
/// Malformed XML is an import error; no partial node list is returned.
pub fn leaf_texts(path: &Path) -> Result<Vec<String>, String> {
    let content = read_file_as_utf8(path)?;
    leaf_texts_from_str(&content)
}

pub fn leaf_texts_from_str(content: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut texts = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("XML text decode error: {}", err))?;
                if !text.is_empty() {
                    texts.push(text.into_owned());
                }
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(texts)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
