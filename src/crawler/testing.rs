//! Scripted transport and recording clock for unit tests

use crate::crawler::clock::Clock;
use crate::crawler::transport::{ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Scripted = Result<ApiResponse, TransportError>;

/// Replays queued answers per URL and records every request made
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    answers: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, answer: Scripted) -> &Self {
        self.answers
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(answer);
        self
    }

    pub fn push_json(&self, url: &str, body: serde_json::Value) -> &Self {
        self.push(url, Ok(ApiResponse::new(200, body.to_string())))
    }

    pub fn push_status(&self, url: &str, status: u16) -> &Self {
        self.push(url, Ok(ApiResponse::new(status, "{}")))
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.answers
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(TransportError::Request(format!("unscripted url {}", url))))
    }
}

/// Frozen clock that records sleeps instead of performing them
#[derive(Clone)]
pub struct RecordingClock {
    now: DateTime<Utc>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn at_unix(secs: i64) -> Self {
        Self {
            now: Utc.timestamp_opt(secs, 0).unwrap(),
            sleeps: Arc::default(),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
