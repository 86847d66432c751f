use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    configuration_store::ConfigurationStore,
    data_adapter::{DataAdapter, RULESETS_KEY},
    events::{EventLogger, EventQueue, HttpEventLogger, NoopEventLogger},
    fetcher::ConfigSpecsFetcher,
    sharder::Md5Sharder,
    specs::ConfigSpecs,
    ClientConfig, Result, User,
};

/// An experimentation client.
///
/// In order to create a client instance, first create [`ClientConfig`].
pub struct Client {
    configuration_store: ConfigurationStore,
    data_adapter: Option<Arc<dyn DataAdapter>>,
    event_logger: Box<dyn EventLogger>,
    events: EventQueue,
}

impl Client {
    pub(crate) async fn initialize(config: ClientConfig) -> Result<Client> {
        let ClientConfig {
            secret_key,
            api_url,
            data_adapter,
            event_logger,
            local_mode,
        } = config;

        let event_logger: Box<dyn EventLogger> = match event_logger {
            Some(event_logger) => event_logger,
            None if local_mode => Box::new(NoopEventLogger),
            None => Box::new(HttpEventLogger::new(&api_url, secret_key.as_str())?),
        };

        let mut specs = None;
        if let Some(data_adapter) = &data_adapter {
            data_adapter.initialize().await?;
            specs = read_specs_from_adapter(data_adapter.as_ref()).await?;
        }

        if specs.is_none() && !local_mode {
            log::debug!(target: "edge_experiments", "data adapter has no config specs, falling back to network");
            specs = Some(ConfigSpecsFetcher::new(&api_url, secret_key)?.fetch().await?);
        }

        let configuration_store = ConfigurationStore::new();
        match specs {
            Some(specs) => {
                log::debug!(target: "edge_experiments", time = specs.time; "client initialized");
                configuration_store.install(specs);
            }
            None => {
                log::warn!(target: "edge_experiments", "client initialized without config specs, every experiment will serve defaults");
            }
        }

        Ok(Client {
            configuration_store,
            data_adapter,
            event_logger,
            events: EventQueue::new(),
        })
    }

    /// Evaluate the experiment `config_name` for `user`.
    ///
    /// Never fails: if specs are missing, the experiment is unknown, or it cannot be evaluated, an
    /// empty config is returned and every [`DynamicConfig::get_value`] falls back.
    pub fn get_config(&self, user: &User, config_name: &str) -> DynamicConfig {
        let Some(specs) = self.configuration_store.current() else {
            log::warn!(target: "edge_experiments", config_name, user_id:display = user.user_id; "evaluating an experiment before config specs have been loaded");
            return DynamicConfig::empty(config_name);
        };

        let (config, event) = match specs.eval_experiment(config_name, user, &Md5Sharder) {
            Ok(evaluation) => evaluation,
            Err(err) => {
                log::warn!(target: "edge_experiments",
                           config_name,
                           user_id:display = user.user_id;
                           "error occurred while evaluating an experiment: {:?}", err);
                return DynamicConfig::empty(config_name);
            }
        };

        log::trace!(target: "edge_experiments",
                    config_name,
                    user_id:display = user.user_id,
                    config:serde = config;
                    "evaluated an experiment");

        if let Some(event) = event {
            self.events.push(event);
        }

        config
    }

    /// Re-read config specs from the data adapter, if it supports polling for them.
    ///
    /// Returns `true` when newer specs were installed. A document with `hasUpdates: false` is
    /// ignored.
    pub async fn refresh(&self) -> Result<bool> {
        let Some(data_adapter) = &self.data_adapter else {
            return Ok(false);
        };
        if !data_adapter.supports_polling_updates_for(RULESETS_KEY) {
            return Ok(false);
        }

        let Some(specs) = read_specs_from_adapter(data_adapter.as_ref()).await? else {
            return Ok(false);
        };

        let time = specs.time;
        let installed = self.configuration_store.install_if_newer(specs);
        if installed {
            log::debug!(target: "edge_experiments", time; "installed refreshed config specs");
        }
        Ok(installed)
    }

    /// Number of exposure events waiting for [`Client::flush`].
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Send buffered exposure events to the event logger.
    pub async fn flush(&self) -> Result<()> {
        let events = self.events.drain();
        if events.is_empty() {
            return Ok(());
        }

        log::debug!(target: "edge_experiments", count = events.len(); "flushing exposure events");
        self.event_logger.log_events(events).await
    }

    /// Flush pending events and shut the data adapter down.
    pub async fn shutdown(self) -> Result<()> {
        let result = self.flush().await;
        if let Some(data_adapter) = &self.data_adapter {
            data_adapter.shutdown().await;
        }
        result
    }
}

/// Returns `Ok(None)` when the adapter has nothing usable. Only a malformed document is an error.
async fn read_specs_from_adapter(data_adapter: &dyn DataAdapter) -> Result<Option<ConfigSpecs>> {
    let response = data_adapter.get(RULESETS_KEY).await;
    match (response.result, response.error) {
        (Some(result), _) => ConfigSpecs::from_json(&result).map(Some),
        (None, Some(err)) => {
            log::debug!(target: "edge_experiments", "data adapter returned no config specs: {}", err);
            Ok(None)
        }
        (None, None) => Ok(None),
    }
}

/// Result of evaluating an experiment for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicConfig {
    pub name: String,
    pub value: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "ruleID")]
    pub rule_id: String,
    pub group_name: Option<String>,
}

impl DynamicConfig {
    pub fn empty(name: impl Into<String>) -> Self {
        DynamicConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Read `field` as `T`, or return `fallback` if it is absent or has another type.
    pub fn get_value<T: DeserializeOwned>(&self, field: &str, fallback: T) -> T {
        self.value
            .get(field)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or(fallback)
    }
}
