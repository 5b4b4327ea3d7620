use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::DomainError;

/// A single settings value: string, bool, number, null, array or nested object.
pub type SettingValue = Value;

/// Sub-path of the image currently shown in the preview.
pub const PREVIEW: &str = "PREVIEW";

/// Whether network fetches go through the mirror endpoint.
pub const CNM: &str = "CNM";

/// The whole settings file held in memory.
///
/// Keys keep their insertion order. The key set is fixed when the file is
/// created; afterwards only values can be replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SettingsDocument(Map<String, SettingValue>);

impl SettingsDocument {
    /// Template written when the settings file is created for the first time.
    pub fn defaults() -> Self {
        let mut map = Map::new();
        map.insert(PREVIEW.to_string(), Value::String(String::new()));
        map.insert(CNM.to_string(), Value::Bool(false));
        Self(map)
    }

    /// Build a template from arbitrary key/value pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SettingValue)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Parse the text of a settings file.
    ///
    /// Empty (or whitespace-only) text, invalid JSON and a root that is not
    /// an object are all parse failures.
    pub fn parse(text: &str, path: &Path) -> Result<Self, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::SettingsEmpty {
                path: path.to_path_buf(),
            });
        }

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(DomainError::SettingsParse {
                path: path.to_path_buf(),
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(DomainError::SettingsParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Serialize as 2-space indented JSON into `writer`.
    pub fn write_pretty<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, &self.0)?;
        writer.flush()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    /// Replace the value of an existing key. Returns the previous value.
    ///
    /// Adding a key that is not already present is refused.
    pub fn replace(
        &mut self,
        key: &str,
        value: SettingValue,
        path: &Path,
    ) -> Result<SettingValue, DomainError> {
        match self.0.get_mut(key) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(DomainError::KeyNotRecognized {
                key: key.to_string(),
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
