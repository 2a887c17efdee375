use std::sync::Arc;
use std::time::Duration;

use kala_common::{ApplyOutcome, GalleryFeed, LoadSignal, PageRequest, QueryState};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::handle::GalleryHandle;
use crate::fetcher::{FetchError, Page, PageFetcher};
use crate::models::Artwork;

/// Read-only presentation state published after every transition.
#[derive(Clone, Debug, PartialEq)]
pub struct GallerySnapshot {
    pub items: Vec<Artwork>,
    pub is_loading: bool,
    pub has_more: bool,
    pub last_error: Option<FetchError>,
    pub page_index: usize,
    pub generation: u64,
    pub query: QueryState,
}

impl GallerySnapshot {
    fn of(feed: &GalleryFeed<Artwork, FetchError>) -> Self {
        Self {
            items: feed.items().to_vec(),
            is_loading: feed.is_loading(),
            has_more: feed.has_more(),
            last_error: feed.last_error().cloned(),
            page_index: feed.page_index(),
            generation: feed.generation(),
            query: feed.query().clone(),
        }
    }
}

pub(crate) enum GalleryCommand {
    SetQuery {
        query: QueryState,
        done: oneshot::Sender<()>,
    },
    Signal {
        signal: LoadSignal,
        done: oneshot::Sender<bool>,
    },
    Refresh {
        done: oneshot::Sender<()>,
    },
}

struct Completion {
    request: PageRequest,
    result: Result<Page<Artwork>, FetchError>,
}

/// Owns the gallery feed. Every transition runs on this task, one at a time.
pub struct GalleryService {
    feed: GalleryFeed<Artwork, FetchError>,
    fetcher: Arc<dyn PageFetcher>,
    fetch_timeout: Duration,
    state_tx: watch::Sender<GallerySnapshot>,
    completions_tx: mpsc::UnboundedSender<Completion>,
}

impl GalleryService {
    /// Spawn the service on the current runtime and return a handle to it.
    ///
    /// No fetch is issued until the first `set_query` or load-more request.
    pub fn start(
        fetcher: Arc<dyn PageFetcher>,
        page_size: usize,
        fetch_timeout: Duration,
    ) -> GalleryHandle {
        let feed = GalleryFeed::new(page_size);
        let (state_tx, state_rx) = watch::channel(GallerySnapshot::of(&feed));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let service = GalleryService {
            feed,
            fetcher,
            fetch_timeout,
            state_tx,
            completions_tx,
        };
        tokio::spawn(service.run(commands_rx, completions_rx));

        GalleryHandle::new(commands_tx, state_rx)
    }

    async fn run(
        mut self,
        mut commands_rx: mpsc::UnboundedReceiver<GalleryCommand>,
        mut completions_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!("Gallery service started (page size {})", self.feed.page_size());
        loop {
            tokio::select! {
                command = commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = completions_rx.recv() => self.handle_completion(completion),
            }
        }
        info!("Gallery service stopped");
    }

    fn handle_command(&mut self, command: GalleryCommand) {
        match command {
            GalleryCommand::SetQuery { query, done } => {
                debug!("Gallery query changed: {:?}", query);
                let request = self.feed.set_query(query);
                self.start_fetch(request);
                let _ = done.send(());
            }
            GalleryCommand::Refresh { done } => {
                debug!("Gallery refresh");
                let request = self.feed.refresh();
                self.start_fetch(request);
                let _ = done.send(());
            }
            GalleryCommand::Signal { signal, done } => {
                let issued = match self.feed.handle_signal(&signal) {
                    Some(request) => {
                        self.start_fetch(request);
                        true
                    }
                    None => false,
                };
                let _ = done.send(issued);
            }
        }
    }

    fn start_fetch(&self, request: PageRequest) {
        debug!(
            "Fetching gallery page {} (generation {})",
            request.page_index, request.generation
        );
        self.publish();

        let fetcher = self.fetcher.clone();
        let completions_tx = self.completions_tx.clone();
        let timeout = self.fetch_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, fetcher.fetch_page(&request.descriptor))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(timeout)),
            };
            // The service may have shut down; nothing left to report to.
            let _ = completions_tx.send(Completion { request, result });
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        let Completion { request, result } = completion;

        let outcome = match result {
            Ok(page) => self.feed.apply_page(&request, page.records, page.count),
            Err(error) => {
                let outcome = self.feed.apply_failure(&request, error.clone());
                if outcome == ApplyOutcome::Failed {
                    warn!("Gallery page {} failed: {}", request.page_index, error);
                }
                outcome
            }
        };

        match outcome {
            ApplyOutcome::Stale => {
                debug!(
                    "Discarding stale page {} (generation {}, current {})",
                    request.page_index,
                    request.generation,
                    self.feed.generation()
                );
                return;
            }
            ApplyOutcome::Appended { added, exhausted } => {
                debug!(
                    "Gallery page {} added {} artworks{}",
                    request.page_index,
                    added,
                    if exhausted { " (end of results)" } else { "" }
                );
            }
            ApplyOutcome::Failed => {}
        }
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(GallerySnapshot::of(&self.feed));
    }
}
