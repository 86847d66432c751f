use std::sync::Arc;

use crate::{data_adapter::DataAdapter, events::EventLogger, Client, Result};

/// Configuration for [`Client`].
///
/// # Examples
/// ```no_run
/// # async fn run() -> edge_experiments::Result<()> {
/// use edge_experiments::{events::ExposureEvent, ClientConfig};
///
/// let client = ClientConfig::from_secret_key("secret-key")
///     .event_logger(|event: ExposureEvent| {
///         println!("{:?}", event);
///     })
///     .initialize()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientConfig {
    pub(crate) secret_key: String,
    pub(crate) api_url: String,
    pub(crate) data_adapter: Option<Arc<dyn DataAdapter>>,
    pub(crate) event_logger: Option<Box<dyn EventLogger>>,
    pub(crate) local_mode: bool,
}

impl ClientConfig {
    /// Create a default configuration using the specified server secret key.
    ///
    /// ```
    /// # use edge_experiments::ClientConfig;
    /// ClientConfig::from_secret_key("secret-key");
    /// ```
    pub fn from_secret_key(secret_key: impl Into<String>) -> Self {
        ClientConfig {
            secret_key: secret_key.into(),
            api_url: ClientConfig::DEFAULT_API_URL.to_owned(),
            data_adapter: None,
            event_logger: None,
            local_mode: false,
        }
    }

    /// Default base URL for API calls.
    pub const DEFAULT_API_URL: &'static str = "https://statsigapi.net/v1";

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Read config specs through `data_adapter` instead of downloading them.
    pub fn data_adapter(mut self, data_adapter: impl DataAdapter + 'static) -> Self {
        self.data_adapter = Some(Arc::new(data_adapter));
        self
    }

    /// Set the logger receiving exposure events on flush. Defaults to sending them to the API.
    pub fn event_logger(mut self, event_logger: impl EventLogger + 'static) -> Self {
        self.event_logger = Some(Box::new(event_logger));
        self
    }

    /// Never talk to the API: no fallback download, and exposure events are dropped unless an
    /// event logger is set explicitly.
    pub fn local_mode(mut self, local_mode: bool) -> Self {
        self.local_mode = local_mode;
        self
    }

    /// Create and initialize a [`Client`] using this configuration.
    pub async fn initialize(self) -> Result<Client> {
        Client::initialize(self).await
    }
}
