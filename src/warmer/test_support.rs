//! Scripted collaborators shared by the warmer unit tests

use crate::purge::CachePurger;
use crate::warmer::fetcher::{FetchedPage, PageFetcher};
use crate::FetchResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Builds a fetched page with the given headers
pub fn page(status: u16, headers: &[(&str, &str)], body: &str) -> FetchedPage {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    FetchedPage {
        status,
        headers: map,
        body: body.to_string(),
    }
}

/// Fetcher answering from per-URL queues
///
/// When a URL's queue is empty the fetcher answers `200` with
/// `x-vercel-cache: HIT`. Every call is logged with the (virtual) time it
/// started.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<FetchResult<FetchedPage>>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, result: FetchResult<FetchedPage>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    pub fn call_log(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult<FetchedPage> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        next.unwrap_or_else(|| Ok(page(200, &[("x-vercel-cache", "HIT")], "")))
    }
}

/// Purger that only remembers what it was asked to purge
#[derive(Default)]
pub struct RecordingPurger {
    purged: Mutex<Vec<String>>,
}

impl RecordingPurger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purged(&self) -> Vec<String> {
        self.purged.lock().unwrap().clone()
    }
}

#[async_trait]
impl CachePurger for RecordingPurger {
    async fn purge(&self, url: &str) {
        self.purged.lock().unwrap().push(url.to_string());
    }
}
