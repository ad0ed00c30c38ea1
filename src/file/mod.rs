// src/file/mod.rs
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Format;
use crate::error::SaveError;

pub mod handler;
pub mod json;
pub mod strategy;
pub mod xml;

pub use handler::{LoadOutcome, SaveHandler, SaveOutcome, SeedOutcome};
pub use json::JsonCodec;
pub use strategy::{CustomStrategy, Strategy};
pub use xml::XmlCodec;

// Core trait for byte-level encoding
pub trait Codec<T> {
    fn encode(&self, data: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// Codec selected by a policy's [`Format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCodec {
    format: Format,
}

impl BuiltinCodec {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for BuiltinCodec {
    fn encode(&self, data: &T) -> Result<Vec<u8>> {
        match self.format {
            Format::Xml => XmlCodec.encode(data),
            Format::Json => JsonCodec.encode(data),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        match self.format {
            Format::Xml => XmlCodec.decode(bytes),
            Format::Json => JsonCodec.decode(bytes),
        }
    }
}

/// Create `dir` and its parents if missing. Returns true when the directory
/// had to be created.
pub fn ensure_dir(dir: &Path) -> Result<bool, SaveError> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir).map_err(|e| SaveError::io(dir, e))?;
    log::debug!("Created directory {}", dir.display());
    Ok(true)
}

pub(crate) fn read_all(path: &Path) -> Result<Vec<u8>, SaveError> {
    fs::read(path).map_err(|e| SaveError::io(path, e))
}

pub(crate) fn write_all(path: &Path, bytes: &[u8]) -> Result<(), SaveError> {
    fs::write(path, bytes).map_err(|e| SaveError::io(path, e))
}
