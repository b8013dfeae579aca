use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::Error;

/// Reserved key holding a per-entry artwork path.
pub const IMAGE_KEY: &str = "image";

/// One entry of the metadata array: an open tag map plus the optional `image` path.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    fields: Map<String, Value>,
}

impl MetadataRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Artwork path as written in the JSON (may be relative). Blank strings count as unset.
    pub fn image(&self) -> Option<&str> {
        match self.fields.get(IMAGE_KEY) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Tag pairs in the order they appear in the entry.
    ///
    /// Skips `image`, nulls, nested arrays/objects and values that are empty after trimming.
    /// Numbers and booleans are passed through as their JSON text.
    pub fn tags(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.fields.iter().filter_map(|(key, value)| {
            if key == IMAGE_KEY {
                return None;
            }
            let text = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            if text.is_empty() {
                None
            } else {
                Some((key.as_str(), text))
            }
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Read and validate the metadata array from `path`.
pub fn load_metadata(path: &Path) -> Result<Vec<MetadataRecord>, Error> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    records_from_value(value)
}

/// Validate an already parsed JSON document as a metadata array.
pub fn records_from_value(value: Value) -> Result<Vec<MetadataRecord>, Error> {
    let Value::Array(items) = value else {
        return Err(Error::InvalidMetadataFormat(
            "JSON root must be an array of metadata objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => {
                match fields.get(IMAGE_KEY) {
                    None | Some(Value::Null) | Some(Value::String(_)) => {}
                    Some(_) => {
                        return Err(Error::InvalidMetadataFormat(format!(
                            "entry at index {index}: \"{IMAGE_KEY}\" must be a string or null"
                        )))
                    }
                }
                Ok(MetadataRecord::new(fields))
            }
            _ => Err(Error::InvalidMetadataFormat(format!(
                "entry at index {index} is not an object"
            ))),
        })
        .collect()
}
