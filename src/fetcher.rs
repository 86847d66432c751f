//! An HTTP client that downloads config specs from the experimentation API.
//!
//! Used only when the data adapter cannot provide specs.
use reqwest::{StatusCode, Url};

use crate::{events::API_KEY_HEADER, specs::ConfigSpecs, Error, Result};

const DOWNLOAD_CONFIG_SPECS_ENDPOINT: &str = "/download_config_specs";

pub(crate) struct ConfigSpecsFetcher {
    client: reqwest::Client,
    url: Url,
    secret_key: String,
}

impl ConfigSpecsFetcher {
    pub fn new(api_url: &str, secret_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(&format!(
            "{}{}",
            api_url.trim_end_matches('/'),
            DOWNLOAD_CONFIG_SPECS_ENDPOINT
        ))
        .map_err(Error::InvalidApiUrl)?;

        Ok(ConfigSpecsFetcher {
            client: reqwest::Client::new(),
            url,
            secret_key: secret_key.into(),
        })
    }

    pub async fn fetch(&self) -> Result<ConfigSpecs> {
        log::debug!(target: "edge_experiments", "downloading config specs");
        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.secret_key)
            .json(&serde_json::json!({ "sinceTime": 0 }))
            .send()
            .await?;

        let response = response.error_for_status().map_err(|err| {
            if matches!(
                err.status(),
                Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            ) {
                log::warn!(target: "edge_experiments", "client is not authorized. Check your server secret key");
                Error::Unauthorized
            } else {
                log::warn!(target: "edge_experiments", "received non-200 response while downloading config specs: {:?}", err);
                Error::from(err)
            }
        })?;

        let body = response.text().await?;
        let specs = ConfigSpecs::from_json(&body)?;

        log::debug!(target: "edge_experiments", time = specs.time; "successfully downloaded config specs");
        Ok(specs)
    }
}
