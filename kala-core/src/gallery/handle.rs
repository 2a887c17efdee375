use kala_common::{LoadSignal, QueryState};
use tokio::sync::{mpsc, oneshot, watch};

use super::service::{GalleryCommand, GallerySnapshot};

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("gallery service is not running")]
    Closed,
}

/// Cheap, cloneable handle for driving the gallery service.
#[derive(Clone)]
pub struct GalleryHandle {
    commands_tx: mpsc::UnboundedSender<GalleryCommand>,
    state_rx: watch::Receiver<GallerySnapshot>,
}

impl GalleryHandle {
    pub(crate) fn new(
        commands_tx: mpsc::UnboundedSender<GalleryCommand>,
        state_rx: watch::Receiver<GallerySnapshot>,
    ) -> Self {
        Self {
            commands_tx,
            state_rx,
        }
    }

    /// Replace the query and start loading its first page.
    pub async fn set_query(&self, query: QueryState) -> Result<(), GalleryError> {
        self.call(|done| GalleryCommand::SetQuery { query, done })
            .await
    }

    /// "Load More" button. Returns whether a fetch was issued.
    pub async fn request_more(&self) -> Result<bool, GalleryError> {
        self.signal(LoadSignal::Button).await
    }

    /// A rendered item became visible. Only the last item can load more.
    pub async fn item_visible(&self, item_id: impl Into<String>) -> Result<bool, GalleryError> {
        self.signal(LoadSignal::Visible {
            item_id: item_id.into(),
        })
        .await
    }

    /// Reload the current query from the first page.
    pub async fn refresh(&self) -> Result<(), GalleryError> {
        self.call(|done| GalleryCommand::Refresh { done }).await
    }

    pub fn snapshot(&self) -> GallerySnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GallerySnapshot> {
        self.state_rx.clone()
    }

    /// Wait until no fetch is in flight and return that state.
    pub async fn wait_until_idle(&self) -> Result<GallerySnapshot, GalleryError> {
        let mut state_rx = self.subscribe();
        let snapshot = state_rx
            .wait_for(|s| !s.is_loading)
            .await
            .map_err(|_| GalleryError::Closed)?;
        Ok(snapshot.clone())
    }

    async fn signal(&self, signal: LoadSignal) -> Result<bool, GalleryError> {
        self.call(|done| GalleryCommand::Signal { signal, done })
            .await
    }

    async fn call<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> GalleryCommand,
    ) -> Result<R, GalleryError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands_tx
            .send(command(done_tx))
            .map_err(|_| GalleryError::Closed)?;
        done_rx.await.map_err(|_| GalleryError::Closed)
    }
}
