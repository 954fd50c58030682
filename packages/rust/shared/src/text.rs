//! Document reading.

use std::path::Path;

use crate::error::{MdstitchError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a document as text.
///
/// UTF-8 is expected; a leading byte-order mark is dropped. Bytes that are
/// not valid UTF-8 are decoded as Latin-1 so a stray legacy file never aborts
/// a build.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| MdstitchError::io(path, e))?;
    Ok(decode(bytes))
}

fn decode(mut bytes: Vec<u8>) -> String {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
