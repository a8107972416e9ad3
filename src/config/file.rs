//! The on-disk configuration document

use crate::error::{AppError, Result};
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Configuration document as written by operators.
///
/// Every field is optional; anything left out falls through to the command
/// line or the built-in defaults. Numeric fields accept either TOML integers
/// or numeric strings (`test-length = "5"`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigDocument {
    #[serde(default, deserialize_with = "number_or_string")]
    pub test_length: Option<u64>,

    #[serde(default, deserialize_with = "number_or_string")]
    pub test_interval: Option<u64>,

    #[serde(default, deserialize_with = "number_or_string")]
    pub server_port: Option<u16>,

    #[serde(default)]
    pub grafana_address: Option<String>,

    #[serde(default, deserialize_with = "number_or_string")]
    pub grafana_port: Option<u16>,

    #[serde(default)]
    pub tsdb_download_prefix: Option<String>,

    #[serde(default)]
    pub tsdb_upload_prefix: Option<String>,

    /// `address = "name"` tables
    #[serde(default)]
    pub iperf_servers: Vec<BTreeMap<String, String>>,
}

impl ConfigDocument {
    /// Parse a document from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the document at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist; unreadable or
    /// malformed files are errors.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read configuration file {}: {}", path.display(), e)))?;

        Self::parse(&content)
            .map(Some)
            .map_err(|e| AppError::config(format!("Malformed configuration file {}: {}", path.display(), e)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + FromStr,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => T::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{} is out of range", n))),
        Some(NumberOrString::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<T>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("'{}' is not a valid number", text)))
        }
    }
}
