//! Transient `--data-file` holding collected answers

use crate::error::Result;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Coerce a collected answer to a typed YAML scalar
///
/// `true`/`false` (any case) become booleans, then integers, then finite
/// floats; everything else stays a string.
pub fn coerce_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    match raw.parse::<f64>() {
        Ok(float) if float.is_finite() => Value::Number(float.into()),
        _ => Value::String(raw.to_string()),
    }
}

/// Render answers as a YAML document with coerced values
pub fn render(variables: &BTreeMap<String, String>) -> Result<String> {
    let mapping: Mapping = variables
        .iter()
        .map(|(k, v)| (Value::String(k.clone()), coerce_value(v)))
        .collect();
    serde_yaml::to_string(&Value::Mapping(mapping)).map_err(|e| {
        crate::error::Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// A uniquely named data file, deleted when dropped
#[derive(Debug)]
pub struct DataFile {
    file: NamedTempFile,
}

impl DataFile {
    pub fn create(variables: &BTreeMap<String, String>) -> Result<Self> {
        let content = render(variables)?;
        let mut file = tempfile::Builder::new()
            .prefix("copier-data-")
            .suffix(".yml")
            .tempfile()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), count = variables.len(), "created data file");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
