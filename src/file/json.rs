// src/file/json.rs
use super::Codec;
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec {
    fn encode(&self, data: &T) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(data).context("Failed to serialize JSON")
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).context("Failed to parse JSON")
    }
}
