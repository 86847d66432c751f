use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The data adapter was asked for a key it does not serve.
    #[error("edge config adapter only supports config specs, got key `{0}`")]
    UnsupportedKey(String),
    /// The key has no value in the remote config store.
    #[error("key ({0}) not found")]
    NotFound(String),
    #[error("experiment not found")]
    ExperimentNotFound,
    #[error("error parsing config specs")]
    ConfigurationParseError,
    #[error("invalid edge config connection string")]
    InvalidConnectionString,
    #[error("invalid api_url configuration")]
    InvalidApiUrl(#[source] url::ParseError),
    #[error("invalid bind address")]
    InvalidBindAddress(#[source] std::net::AddrParseError),
    #[error("unauthorized, check the key or token")]
    Unauthorized,
    #[error("missing required environment variable {0}")]
    MissingEnvVar(&'static str),
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    #[error(transparent)]
    Io(Arc<std::io::Error>),
    #[error(transparent)]
    Network(Arc<reqwest::Error>),
    #[error(transparent)]
    Json(Arc<serde_json::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        // Request URLs may carry keys in the query string.
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(Arc::new(value))
    }
}
