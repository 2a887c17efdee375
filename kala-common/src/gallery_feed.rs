use std::collections::HashSet;

use crate::load_trigger::{LoadSignal, LoadTrigger};
use crate::query::{build, FetchDescriptor, QueryState};

/// Records the feed can accumulate. The id must be stable across pages.
pub trait FeedItem {
    fn feed_id(&self) -> &str;
}

/// A page fetch the caller should issue.
///
/// Carries the generation and page index it was issued under so the result
/// can be matched against the feed state when it comes back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub page_index: usize,
    pub descriptor: FetchDescriptor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Loaded { exhausted: bool },
}

/// Result of applying a fetch completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Records appended (after dedup); `exhausted` when this was the last page
    Appended { added: usize, exhausted: bool },
    /// Failure recorded; accumulated items untouched
    Failed,
    /// Completion belonged to an older query or page and was dropped
    Stale,
}

/// Pure pagination state for the gallery.
///
/// Owns the accumulated records, page cursor and loading flags. Performs no
/// I/O: transitions that need a fetch return a [`PageRequest`] and the caller
/// reports back through [`GalleryFeed::apply_success`] or
/// [`GalleryFeed::apply_failure`].
#[derive(Debug)]
pub struct GalleryFeed<T, E> {
    query: QueryState,
    page_size: usize,
    page_index: usize,
    items: Vec<T>,
    seen_ids: HashSet<String>,
    is_loading: bool,
    has_more: bool,
    generation: u64,
    last_error: Option<E>,
    trigger: LoadTrigger,
}

impl<T: FeedItem, E> GalleryFeed<T, E> {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: QueryState::default(),
            page_size: page_size.max(1),
            page_index: 0,
            items: Vec::new(),
            seen_ids: HashSet::new(),
            is_loading: false,
            has_more: true,
            generation: 0,
            last_error: None,
            trigger: LoadTrigger::new(),
        }
    }

    /// Replace the query. Discards all pages, bumps the generation and starts
    /// loading page 0 under the new query.
    pub fn set_query(&mut self, query: QueryState) -> PageRequest {
        self.query = query;
        self.reset();
        self.begin_fetch()
    }

    /// Re-run the current query from the first page.
    pub fn refresh(&mut self) -> PageRequest {
        self.reset();
        self.begin_fetch()
    }

    /// Ask for the next page. None when a fetch is already in flight or the
    /// record set is exhausted.
    pub fn request_more(&mut self) -> Option<PageRequest> {
        if self.is_loading || !self.has_more {
            return None;
        }
        Some(self.begin_fetch())
    }

    /// Route a button press or visibility event through the trigger guard.
    pub fn handle_signal(&mut self, signal: &LoadSignal) -> Option<PageRequest> {
        if !self.trigger.accepts(signal) {
            return None;
        }
        self.request_more()
    }

    /// Apply a page whose record count is `records.len()`.
    pub fn apply_success(&mut self, request: &PageRequest, records: Vec<T>) -> ApplyOutcome {
        let count = records.len();
        self.apply_page(request, records, count)
    }

    /// Apply a page, deciding end-of-data from `count`, the number of records
    /// the source reported returning.
    pub fn apply_page(
        &mut self,
        request: &PageRequest,
        records: Vec<T>,
        count: usize,
    ) -> ApplyOutcome {
        if self.is_stale(request) {
            return ApplyOutcome::Stale;
        }

        let before = self.items.len();
        for record in records {
            if self.seen_ids.insert(record.feed_id().to_string()) {
                self.items.push(record);
            }
        }

        // A short page means the backend ran out of records.
        self.has_more = count >= self.page_size;
        self.page_index += 1;
        self.is_loading = false;
        self.reattach_trigger();

        ApplyOutcome::Appended {
            added: self.items.len() - before,
            exhausted: !self.has_more,
        }
    }

    pub fn apply_failure(&mut self, request: &PageRequest, error: E) -> ApplyOutcome {
        if self.is_stale(request) {
            return ApplyOutcome::Stale;
        }
        self.is_loading = false;
        self.last_error = Some(error);
        ApplyOutcome::Failed
    }

    pub fn phase(&self) -> FeedPhase {
        if self.is_loading {
            FeedPhase::Loading
        } else if self.page_index == 0 && self.items.is_empty() && self.has_more {
            FeedPhase::Idle
        } else {
            FeedPhase::Loaded {
                exhausted: !self.has_more,
            }
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&E> {
        self.last_error.as_ref()
    }

    /// Id of the item the visibility trigger is attached to.
    pub fn observed_item(&self) -> Option<&str> {
        self.trigger.observed()
    }

    fn reset(&mut self) {
        self.items.clear();
        self.seen_ids.clear();
        self.page_index = 0;
        self.has_more = true;
        self.is_loading = false;
        self.last_error = None;
        self.generation += 1;
        self.trigger.observe_last(None);
    }

    fn begin_fetch(&mut self) -> PageRequest {
        self.is_loading = true;
        self.last_error = None;
        PageRequest {
            generation: self.generation,
            page_index: self.page_index,
            descriptor: build(&self.query, self.page_index, self.page_size),
        }
    }

    fn is_stale(&self, request: &PageRequest) -> bool {
        request.generation != self.generation
            || request.page_index != self.page_index
            || !self.is_loading
    }

    fn reattach_trigger(&mut self) {
        let last = self.items.last().map(|item| item.feed_id());
        self.trigger.observe_last(last);
    }
}
