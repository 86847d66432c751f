//! Pluggable data sources for the experimentation client.
//!
//! The client never talks to storage directly. It asks a [`DataAdapter`] for a serialized document
//! under a well-known key (see [`RULESETS_KEY`]) and treats whatever comes back as opaque text until
//! it parses it.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;

use crate::{edge_config::EdgeConfigClient, Error, Result};

/// Key under which the client stores and looks up config specs.
pub const RULESETS_KEY: &str = "statsig.cache";

/// Outcome of a [`DataAdapter::get`] call.
///
/// Failures are carried in `error` rather than returned, so the caller decides whether a missing
/// document is fatal.
#[derive(Debug, Default, Clone)]
pub struct AdapterResponse {
    pub result: Option<String>,
    /// Time the document was last updated, in milliseconds since the epoch, when known.
    pub time: Option<i64>,
    pub error: Option<Error>,
}

impl AdapterResponse {
    pub fn from_result(result: String) -> Self {
        AdapterResponse {
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn from_error(error: Error) -> Self {
        AdapterResponse {
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Storage contract expected by the experimentation client.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    async fn get(&self, key: &str) -> AdapterResponse;

    async fn set(&self, key: &str, value: String, time: Option<i64>);

    async fn initialize(&self) -> Result<()>;

    async fn shutdown(&self);

    /// Whether the client may re-read `key` periodically to pick up updates.
    fn supports_polling_updates_for(&self, key: &str) -> bool;
}

/// [`DataAdapter`] serving config specs out of an Edge Config item.
///
/// The Edge Config is the source of truth and is updated by the experimentation service
/// independently, so writes are ignored.
pub struct EdgeConfigDataAdapter {
    client: Arc<dyn EdgeConfigClient>,
    /// Name of the Edge Config item holding the config specs.
    config_specs_key: String,
    supports_config_spec_polling: AtomicBool,
}

impl EdgeConfigDataAdapter {
    pub fn new(client: Arc<dyn EdgeConfigClient>, config_specs_key: impl Into<String>) -> Self {
        EdgeConfigDataAdapter {
            client,
            config_specs_key: config_specs_key.into(),
            supports_config_spec_polling: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DataAdapter for EdgeConfigDataAdapter {
    async fn get(&self, key: &str) -> AdapterResponse {
        if key != RULESETS_KEY {
            return AdapterResponse::from_error(Error::UnsupportedKey(key.to_owned()));
        }

        let value = match self.client.get(&self.config_specs_key).await {
            Ok(Some(value)) => value,
            Ok(None) => return AdapterResponse::from_error(Error::NotFound(key.to_owned())),
            Err(err) => {
                log::warn!(target: "edge_experiments",
                           key,
                           item:display = self.config_specs_key;
                           "error reading config specs from edge config: {:?}", err);
                return AdapterResponse::from_error(err);
            }
        };

        let result = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        AdapterResponse::from_result(result)
    }

    async fn set(&self, _key: &str, _value: String, _time: Option<i64>) {}

    async fn initialize(&self) -> Result<()> {
        let value = self.client.get(&self.config_specs_key).await?;
        if value.is_some() {
            self.supports_config_spec_polling
                .store(true, Ordering::SeqCst);
        }
        log::debug!(target: "edge_experiments",
                    item:display = self.config_specs_key,
                    present = value.is_some();
                    "initialized edge config data adapter");
        Ok(())
    }

    async fn shutdown(&self) {}

    fn supports_polling_updates_for(&self, key: &str) -> bool {
        if key == RULESETS_KEY {
            self.supports_config_spec_polling.load(Ordering::SeqCst)
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::edge_config::StaticEdgeConfig;

    const ITEM: &str = "statsig-config";

    fn adapter_over(store: &Arc<StaticEdgeConfig>) -> EdgeConfigDataAdapter {
        EdgeConfigDataAdapter::new(store.clone(), ITEM)
    }

    #[tokio::test]
    async fn rejects_unsupported_keys_without_reading() {
        let store = Arc::new(StaticEdgeConfig::new().with_item(ITEM, json!("specs")));
        let adapter = adapter_over(&store);

        for key in ["statsig.id_lists", ITEM, "", "statsig.cache.extra"] {
            let response = adapter.get(key).await;
            assert!(response.result.is_none());
            assert!(matches!(response.error, Some(Error::UnsupportedKey(ref k)) if k == key));
        }
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let store = Arc::new(StaticEdgeConfig::new());
        let adapter = adapter_over(&store);

        let response = adapter.get(RULESETS_KEY).await;

        assert!(response.result.is_none());
        assert!(matches!(response.error, Some(Error::NotFound(ref k)) if k == RULESETS_KEY));
        assert_eq!(
            response.error.unwrap().to_string(),
            "key (statsig.cache) not found"
        );
    }

    #[tokio::test]
    async fn string_item_is_returned_verbatim() {
        let raw = r#"{ "experiments": {},   "time": 1 }"#;
        let store = Arc::new(StaticEdgeConfig::new().with_item(ITEM, json!(raw)));
        let adapter = adapter_over(&store);

        let response = adapter.get(RULESETS_KEY).await;

        assert!(response.error.is_none());
        assert_eq!(response.result.as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn object_item_is_serialized_to_json() {
        let item = json!({"experiments": {"exp": {"salt": "s"}}, "time": 42});
        let store = Arc::new(StaticEdgeConfig::new().with_item(ITEM, item.clone()));
        let adapter = adapter_over(&store);

        let response = adapter.get(RULESETS_KEY).await;
        let parsed: serde_json::Value = serde_json::from_str(&response.result.unwrap()).unwrap();

        assert_eq!(parsed, item);
    }

    #[tokio::test]
    async fn polling_support_follows_initialize() {
        let store = Arc::new(StaticEdgeConfig::new().with_item(ITEM, json!({})));
        let adapter = adapter_over(&store);

        assert!(!adapter.supports_polling_updates_for(RULESETS_KEY));
        adapter.initialize().await.unwrap();
        assert!(adapter.supports_polling_updates_for(RULESETS_KEY));
        assert!(adapter.supports_polling_updates_for("statsig.id_lists"));
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn no_polling_when_initialize_finds_nothing() {
        let store = Arc::new(StaticEdgeConfig::new());
        let adapter = adapter_over(&store);

        adapter.initialize().await.unwrap();

        assert!(!adapter.supports_polling_updates_for(RULESETS_KEY));
        assert!(adapter.supports_polling_updates_for("statsig.id_lists"));
        assert!(adapter.supports_polling_updates_for("anything-else"));
    }

    #[tokio::test]
    async fn polling_flag_is_not_refreshed_after_initialize() {
        let store = Arc::new(StaticEdgeConfig::new().with_item(ITEM, json!({})));
        let adapter = adapter_over(&store);

        adapter.initialize().await.unwrap();
        store.remove(ITEM);

        assert!(adapter.supports_polling_updates_for(RULESETS_KEY));
    }

    #[tokio::test]
    async fn set_and_shutdown_do_not_affect_get() {
        let store = Arc::new(StaticEdgeConfig::new().with_item(ITEM, json!("original")));
        let adapter = adapter_over(&store);

        adapter
            .set(RULESETS_KEY, "overwritten".to_owned(), Some(1))
            .await;
        assert_eq!(
            adapter.get(RULESETS_KEY).await.result.as_deref(),
            Some("original")
        );

        adapter.shutdown().await;
        assert_eq!(
            adapter.get(RULESETS_KEY).await.result.as_deref(),
            Some("original")
        );
    }
}
