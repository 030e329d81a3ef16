//! Document envelope, pretty printing, and output file naming.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Serializer, Value};

use crate::assemble::PropertyMap;
use crate::errors::MappingError;

/// Wrap assembled properties in the index-mapping envelope.
pub fn mapping_document(properties: PropertyMap) -> Value {
    json!({
        "mappings": {
            "properties": properties,
        }
    })
}

/// Serialize with four-space indentation, no trailing newline.
pub fn to_pretty_json(document: &Value) -> Result<String, MappingError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf).expect("serde_json emits UTF-8"))
}

/// Derive the output path: next to the source, stem plus `_<suffix>.json`.
pub fn output_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mapping");
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{stem}_{suffix}.json"))
}

/// Write the document, replacing any previous content at the path.
pub fn write_document(path: &Path, document: &Value) -> Result<(), MappingError> {
    let rendered = to_pretty_json(document)?;
    std::fs::write(path, rendered).map_err(|source| MappingError::Write {
        path: path.to_path_buf(),
        source,
    })
}
