//! HTTP handlers serving the demo page.
mod edge;
mod health;
mod page;

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

pub use edge::{handle_edge, BUCKET_HEADER};
pub use health::handle_health;
pub use page::{handle_page, SERVER_USER_ID};

use crate::{
    data_adapter::EdgeConfigDataAdapter,
    edge_config::EdgeConfigClient,
    page::{BUCKET_FIELD, DEFAULT_BUCKET, EXPERIMENT_NAME},
    settings::Settings,
    Client, ClientConfig, Error, Result, User,
};

/// State shared by every request: settings and the Edge Config client (and its connection pool).
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub edge_config: Arc<dyn EdgeConfigClient>,
}

impl AppState {
    pub fn new(settings: Settings, edge_config: Arc<dyn EdgeConfigClient>) -> Self {
        AppState {
            settings: Arc::new(settings),
            edge_config,
        }
    }

    /// Build a client over a fresh data adapter. Nothing is reused from earlier requests.
    async fn initialize_client(&self) -> Result<Client> {
        let adapter = EdgeConfigDataAdapter::new(
            self.edge_config.clone(),
            self.settings.edge_config_item_key.as_str(),
        );

        ClientConfig::from_secret_key(self.settings.server_secret_key.as_str())
            .api_url(self.settings.api_url.as_str())
            .local_mode(self.settings.local_mode)
            .data_adapter(adapter)
            .initialize()
            .await
    }

    /// Initialize a client, evaluate the demo experiment for `user` and flush exposures.
    async fn evaluate_bucket(&self, user: &User) -> Result<String> {
        let client = self.initialize_client().await?;

        let bucket = client
            .get_config(user, EXPERIMENT_NAME)
            .get_value(BUCKET_FIELD, DEFAULT_BUCKET.to_owned());

        if let Err(err) = client.flush().await {
            log::warn!(target: "edge_experiments", "failed to flush exposure events: {}", err);
        }

        log::info!(target: "edge_experiments",
                   user_id:display = user.user_id,
                   bucket:display = bucket;
                   "evaluated bucket");
        Ok(bucket)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_page))
        .route("/edge", get(handle_edge))
        .route("/health", get(handle_health))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        log::error!(target: "edge_experiments", "request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Value of cookie `name`, if present and non-empty.
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, HeaderValue};

    use super::read_cookie;

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; uid=abc-123"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(read_cookie(&headers, "uid").as_deref(), Some("abc-123"));
        assert_eq!(read_cookie(&headers, "other").as_deref(), Some("1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("uid=; theme=dark"));

        assert_eq!(read_cookie(&headers, "uid"), None);
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("xuid=1; uidx=2"));

        assert_eq!(read_cookie(&headers, "uid"), None);
    }
}
