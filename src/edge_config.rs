//! Read-only clients for an Edge Config store.
//!
//! An Edge Config is a hosted key/value store that is replicated close to the edge. This crate only
//! ever reads single items from it, so the whole contract is [`EdgeConfigClient::get`].
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use crate::{Error, Result};

/// A client able to look up a single item in an Edge Config.
#[async_trait]
pub trait EdgeConfigClient: Send + Sync {
    /// Return the item stored under `key`, or `None` if the store does not have it.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
}

/// Default host serving Edge Config reads.
pub const DEFAULT_EDGE_CONFIG_URL: &str = "https://edge-config.vercel.com";

/// Edge Config client talking to the hosted REST endpoint.
pub struct HttpEdgeConfigClient {
    // Client holds a connection pool internally, so it is shared between requests.
    client: reqwest::Client,
    base_url: String,
    edge_config_id: String,
    token: String,
}

impl std::fmt::Debug for HttpEdgeConfigClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEdgeConfigClient")
            .field("base_url", &self.base_url)
            .field("edge_config_id", &self.edge_config_id)
            .finish_non_exhaustive()
    }
}

impl HttpEdgeConfigClient {
    /// Create a client from an Edge Config connection string.
    ///
    /// Both the URL form (`https://edge-config.vercel.com/<id>?token=<token>`) and the short form
    /// (`edge-config:id=<id>&token=<token>`) are accepted.
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let connection = parse_connection_string(connection_string)?;
        Ok(HttpEdgeConfigClient {
            client: reqwest::Client::new(),
            base_url: connection.base_url,
            edge_config_id: connection.id,
            token: connection.token,
        })
    }

    pub fn edge_config_id(&self) -> &str {
        &self.edge_config_id
    }

    fn item_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|_| Error::InvalidConnectionString)?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConnectionString)?
            .pop_if_empty()
            .extend([self.edge_config_id.as_str(), "item", key]);
        Ok(url)
    }
}

#[async_trait]
impl EdgeConfigClient for HttpEdgeConfigClient {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let url = self.item_url(key)?;

        log::debug!(target: "edge_experiments", key; "reading edge config item");
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                log::debug!(target: "edge_experiments", key; "edge config item not found");
                return Ok(None);
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                log::warn!(target: "edge_experiments", "edge config read is not authorized. Check the connection string token");
                return Err(Error::Unauthorized);
            }
            _ => {}
        }

        let response = response.error_for_status().map_err(|err| {
            log::warn!(target: "edge_experiments", "received non-200 response while reading edge config: {:?}", err);
            Error::from(err)
        })?;

        let value = response.json().await?;
        Ok(Some(value))
    }
}

#[derive(Debug, PartialEq)]
struct Connection {
    base_url: String,
    id: String,
    token: String,
}

fn parse_connection_string(connection_string: &str) -> Result<Connection> {
    if let Some(params) = connection_string.strip_prefix("edge-config:") {
        let params: HashMap<_, _> = url::form_urlencoded::parse(params.as_bytes()).collect();
        let (Some(id), Some(token)) = (params.get("id"), params.get("token")) else {
            return Err(Error::InvalidConnectionString);
        };
        return Ok(Connection {
            base_url: DEFAULT_EDGE_CONFIG_URL.to_owned(),
            id: id.to_string(),
            token: token.to_string(),
        });
    }

    let url = Url::parse(connection_string).map_err(|_| Error::InvalidConnectionString)?;
    let id = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .ok_or(Error::InvalidConnectionString)?
        .to_owned();
    let token = url
        .query_pairs()
        .find(|(name, _)| name == "token")
        .map(|(_, value)| value.into_owned())
        .ok_or(Error::InvalidConnectionString)?;

    Ok(Connection {
        base_url: url.origin().ascii_serialization(),
        id,
        token,
    })
}

/// In-memory Edge Config. Useful for local development and tests.
///
/// Counts every read so callers can check whether the store was consulted.
#[derive(Debug, Default)]
pub struct StaticEdgeConfig {
    items: RwLock<HashMap<String, serde_json::Value>>,
    reads: AtomicUsize,
}

impl StaticEdgeConfig {
    pub fn new() -> Self {
        StaticEdgeConfig::default()
    }

    pub fn with_item(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        let mut items = self
            .items
            .write()
            .expect("thread holding edge config lock should not panic");
        items.insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        let mut items = self
            .items
            .write()
            .expect("thread holding edge config lock should not panic");
        items.remove(key)
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EdgeConfigClient for StaticEdgeConfig {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let items = self
            .items
            .read()
            .expect("thread holding edge config lock should not panic");
        Ok(items.get(key).cloned())
    }
}
