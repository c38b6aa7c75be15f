//! Byte encoding for cached result sets and RPC payloads.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Serialization format for values written to the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// UTF-8 JSON via `serde_json`.
    #[default]
    Json,
    /// `MsgPack` via `rmp-serde`, with field names.
    MsgPack,
}

impl Codec {
    /// Serializes `value` to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented in this format.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Json => serde_json::to_vec(value).context("json encode"),
            Self::MsgPack => rmp_serde::to_vec_named(value).context("msgpack encode"),
        }
    }

    /// Deserializes bytes produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` are corrupt or do not match the shape of `T`.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> anyhow::Result<T> {
        match self {
            Self::Json => serde_json::from_slice(bytes).context("json decode"),
            Self::MsgPack => rmp_serde::from_slice(bytes).context("msgpack decode"),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::MsgPack => "msgpack",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "msgpack" | "messagepack" => Ok(Self::MsgPack),
            other => bail!("unknown codec: {other}"),
        }
    }
}
