use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Config specs document, as distributed through the data adapter or downloaded from the API.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpecs {
    /// Time of the last update, in milliseconds since the epoch.
    #[serde(default)]
    pub time: i64,
    /// `false` marks a document that carries nothing new, so refreshing skips it.
    #[serde(default = "default_has_updates")]
    pub has_updates: bool,
    #[serde(default)]
    pub experiments: HashMap<String, TryParse<Experiment>>,
}

impl ConfigSpecs {
    pub fn from_json(json: &str) -> Result<ConfigSpecs> {
        serde_json::from_str(json).map_err(|err| {
            log::warn!(target: "edge_experiments", "failed to parse config specs: {:?}", err);
            Error::ConfigurationParseError
        })
    }
}

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TryParse<T> {
    Parsed(T),
    ParseFailed(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub name: String,
    pub enabled: bool,
    pub salt: String,
    /// Always positive. A zero in the document fails parsing of the whole experiment.
    #[serde(
        default = "default_total_shards",
        deserialize_with = "deserialize_total_shards"
    )]
    pub total_shards: u64,
    pub groups: Vec<Group>,
    /// Value served to users that land outside every group, or when the experiment is disabled.
    #[serde(default)]
    pub default_value: serde_json::Map<String, serde_json::Value>,
}

fn default_has_updates() -> bool {
    true
}

fn default_total_shards() -> u64 {
    10_000
}

fn deserialize_total_shards<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match u64::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("totalShards must be positive")),
        total_shards => Ok(total_shards),
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    pub ranges: Vec<Range>,
    #[serde(default)]
    pub value: serde_json::Map<String, serde_json::Value>,
}

/// Half-open range of shards, `start..end`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    pub fn contains(&self, shard: u64) -> bool {
        self.start <= shard && shard < self.end
    }
}
