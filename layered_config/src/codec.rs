//! Decoders turning raw documents into value trees.
//!
//! Every decoder produces a [`figment`] [`Dict`] so hierarchical sources can
//! share one lookup implementation regardless of the wire format.

use std::fmt;
use std::path::Path;

use figment::value::{Dict, Value};
use serde_saphyr::Options;

use crate::error::DecodeError;

/// Decodes a document into a table of values.
pub trait Decoder: fmt::Debug + Send + Sync {
    /// Short format name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Decodes `data`.
    ///
    /// Blank documents decode to an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when `data` is malformed or its root is not a
    /// table.
    fn decode(&self, data: &[u8]) -> Result<Dict, DecodeError>;
}

fn into_dict(value: Value) -> Result<Dict, DecodeError> {
    let found = value.to_actual().to_string();
    value.into_dict().ok_or(DecodeError::NotAMap { found })
}

fn text(data: &[u8]) -> Result<Option<&str>, DecodeError> {
    let text = std::str::from_utf8(data)?;
    Ok((!text.trim().is_empty()).then_some(text))
}

/// YAML via `serde-saphyr` with YAML 1.2 booleans, so `yes` stays a string.
///
/// Flow style (`{key: [a, b]}`) is YAML too, which makes this decoder accept
/// compact inline documents as well as block documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn decode(&self, data: &[u8]) -> Result<Dict, DecodeError> {
        let Some(contents) = text(data)? else {
            return Ok(Dict::new());
        };
        let value: Value = serde_saphyr::from_str_with_options(
            contents,
            Options {
                strict_booleans: true,
                ..Options::default()
            },
        )?;
        into_dict(value)
    }
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, data: &[u8]) -> Result<Dict, DecodeError> {
        if text(data)?.is_none() {
            return Ok(Dict::new());
        }
        into_dict(serde_json::from_slice::<Value>(data)?)
    }
}

/// TOML via `toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDecoder;

impl Decoder for TomlDecoder {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn decode(&self, data: &[u8]) -> Result<Dict, DecodeError> {
        let Some(contents) = text(data)? else {
            return Ok(Dict::new());
        };
        into_dict(toml::from_str::<Value>(contents)?)
    }
}

/// File suffixes searched for, in preference order.
pub const SUFFIXES: [&str; 4] = ["yaml", "yml", "json", "toml"];

/// Picks a decoder from the extension of `path`.
///
/// Unknown or missing extensions fall back to YAML.
#[must_use]
pub fn decoder_for_path(path: &Path) -> Box<dyn Decoder> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Box::new(JsonDecoder),
        Some("toml") => Box::new(TomlDecoder),
        _ => Box::new(YamlDecoder),
    }
}
