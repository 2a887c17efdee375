#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use kala_common::{FetchDescriptor, FilterField};
use kala_core::fetcher::{FetchError, Page, PageFetcher};
use kala_core::models::Artwork;
use tokio::sync::Semaphore;

pub fn tracing_init() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true)
        .try_init();
}

/// An artwork created `minutes_ago` minutes before a fixed instant.
pub fn artwork(id: &str, style: &str, region: &str, minutes_ago: i64) -> Artwork {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Artwork {
        id: id.to_string(),
        title: format!("{style} study {id}"),
        description: Some(format!("A {style} painting from {region}")),
        image_ref: format!("u1/{id}.jpg"),
        user_id: Some("u1".to_string()),
        artist: None,
        created_at: base - ChronoDuration::minutes(minutes_ago),
        style: Some(style.to_string()),
        region: Some(region.to_string()),
        like_count: 0,
    }
}

/// `n` artworks of one style, newest first.
pub fn artworks(prefix: &str, style: &str, region: &str, n: usize) -> Vec<Artwork> {
    (0..n)
        .map(|i| artwork(&format!("{prefix}{i}"), style, region, i as i64))
        .collect()
}

/// In-memory page source that applies descriptors the way the backend would.
///
/// Optionally gated: each call waits for a permit on `gate` before answering.
pub struct FakeFetcher {
    records: Vec<Artwork>,
    gate: Option<Arc<Semaphore>>,
    style_gates: Vec<(String, Arc<Semaphore>)>,
    failures: Mutex<VecDeque<FetchError>>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    descriptors: Mutex<Vec<FetchDescriptor>>,
}

impl FakeFetcher {
    pub fn new(records: Vec<Artwork>) -> Self {
        Self {
            records,
            gate: None,
            style_gates: Vec::new(),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            descriptors: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(records: Vec<Artwork>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(records)
        }
    }

    /// Gate only the fetches filtered to a given style, each on its own semaphore.
    pub fn gated_per_style(records: Vec<Artwork>, gates: &[(&str, Arc<Semaphore>)]) -> Self {
        Self {
            style_gates: gates
                .iter()
                .map(|(style, gate)| (style.to_string(), gate.clone()))
                .collect(),
            ..Self::new(records)
        }
    }

    fn gate_for(&self, descriptor: &FetchDescriptor) -> Option<&Arc<Semaphore>> {
        let style_gate = descriptor
            .filters
            .iter()
            .find(|f| f.field == FilterField::Style)
            .and_then(|f| self.style_gates.iter().find(|(style, _)| *style == f.value))
            .map(|(_, gate)| gate);
        style_gate.or(self.gate.as_ref())
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: FetchError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn descriptors(&self) -> Vec<FetchDescriptor> {
        self.descriptors.lock().unwrap().clone()
    }

    fn matches(artwork: &Artwork, descriptor: &FetchDescriptor) -> bool {
        let text_ok = descriptor.text_match.as_ref().map_or(true, |m| {
            let needle = m.needle.to_lowercase();
            [
                Some(&artwork.title),
                artwork.description.as_ref(),
                artwork.style.as_ref(),
            ]
            .into_iter()
            .flatten()
            .any(|v| v.to_lowercase().contains(&needle))
        });
        let filters_ok = descriptor.filters.iter().all(|f| {
            let value = match f.field {
                FilterField::Style => &artwork.style,
                FilterField::Region => &artwork.region,
            };
            value.as_deref() == Some(f.value.as_str())
        });
        text_ok && filters_ok
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_page(&self, descriptor: &FetchDescriptor) -> Result<Page<Artwork>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.descriptors.lock().unwrap().push(descriptor.clone());

        if let Some(gate) = self.gate_for(descriptor) {
            gate.acquire().await.unwrap().forget();
        }

        let failure = self.failures.lock().unwrap().pop_front();
        let result = match failure {
            Some(error) => Err(error),
            None => {
                let records: Vec<Artwork> = self
                    .records
                    .iter()
                    .filter(|a| Self::matches(a, descriptor))
                    .skip(descriptor.start)
                    .take(descriptor.limit())
                    .cloned()
                    .collect();
                Ok(Page::new(records))
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Never answers; used to exercise the fetch timeout.
pub struct HangingFetcher;

#[async_trait]
impl PageFetcher for HangingFetcher {
    async fn fetch_page(&self, _descriptor: &FetchDescriptor) -> Result<Page<Artwork>, FetchError> {
        std::future::pending::<Result<Page<Artwork>, FetchError>>().await
    }
}
