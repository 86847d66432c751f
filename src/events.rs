//! Exposure events and the loggers that ship them.
use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, User};

pub const EXPOSURE_EVENT_NAME: &str = "experiment_exposure";

/// Recorded every time a user is evaluated into an experiment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureEvent {
    pub event_name: String,
    pub user: User,
    /// Milliseconds since the epoch.
    pub time: i64,
    pub metadata: ExposureMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureMetadata {
    pub config: String,
    #[serde(rename = "ruleID")]
    pub rule_id: String,
    pub group: String,
}

/// Destination for exposure events, called on [`Client::flush`](crate::Client::flush).
#[async_trait]
pub trait EventLogger: Send + Sync {
    async fn log_events(&self, events: Vec<ExposureEvent>) -> Result<()>;
}

pub(crate) struct NoopEventLogger;

#[async_trait]
impl EventLogger for NoopEventLogger {
    async fn log_events(&self, _events: Vec<ExposureEvent>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T> EventLogger for T
where
    T: Fn(ExposureEvent) + Send + Sync,
{
    async fn log_events(&self, events: Vec<ExposureEvent>) -> Result<()> {
        for event in events {
            self(event);
        }
        Ok(())
    }
}

const LOG_EVENT_ENDPOINT: &str = "/log_event";

pub(crate) const API_KEY_HEADER: &str = "statsig-api-key";

/// Ships exposure events to the experimentation API.
pub struct HttpEventLogger {
    client: reqwest::Client,
    url: Url,
    secret_key: String,
}

#[derive(Serialize)]
struct LogEventRequest<'a> {
    events: &'a [ExposureEvent],
}

impl HttpEventLogger {
    pub fn new(api_url: &str, secret_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(&format!("{}{}", api_url.trim_end_matches('/'), LOG_EVENT_ENDPOINT))
            .map_err(Error::InvalidApiUrl)?;
        Ok(HttpEventLogger {
            client: reqwest::Client::new(),
            url,
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl EventLogger for HttpEventLogger {
    async fn log_events(&self, events: Vec<ExposureEvent>) -> Result<()> {
        log::debug!(target: "edge_experiments", count = events.len(); "sending exposure events");
        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.secret_key)
            .json(&LogEventRequest { events: &events })
            .send()
            .await?;

        response.error_for_status().map_err(|err| {
            if matches!(
                err.status(),
                Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            ) {
                log::warn!(target: "edge_experiments", "event logging is not authorized. Check your server secret key");
                Error::Unauthorized
            } else {
                log::warn!(target: "edge_experiments", "received non-200 response while logging events: {:?}", err);
                Error::from(err)
            }
        })?;

        Ok(())
    }
}

/// Buffer of exposure events waiting for the next flush.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<ExposureEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue::default()
    }

    pub fn push(&self, event: ExposureEvent) {
        let mut events = self
            .events
            .lock()
            .expect("thread holding event queue lock should not panic");
        events.push_back(event);
    }

    /// Take every queued event, leaving the queue empty.
    pub fn drain(&self) -> Vec<ExposureEvent> {
        let mut events = self
            .events
            .lock()
            .expect("thread holding event queue lock should not panic");
        events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .expect("thread holding event queue lock should not panic")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
