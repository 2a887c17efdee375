/// Where a "load more" request came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadSignal {
    /// Explicit "Load More" action
    Button,
    /// A rendered item scrolled into view
    Visible { item_id: String },
}

/// Tracks which rendered item the visibility trigger is attached to.
///
/// Only the last item of the current list may request more. Whenever the list
/// changes the owner re-attaches the trigger with [`LoadTrigger::observe_last`],
/// so visibility events from items of a replaced list are ignored.
#[derive(Debug, Default)]
pub struct LoadTrigger {
    observed: Option<String>,
}

impl LoadTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to the new last item (None for an empty list).
    pub fn observe_last(&mut self, last_item_id: Option<&str>) {
        self.observed = last_item_id.map(str::to_string);
    }

    pub fn observed(&self) -> Option<&str> {
        self.observed.as_deref()
    }

    /// Whether this signal should turn into a `request_more()`.
    pub fn accepts(&self, signal: &LoadSignal) -> bool {
        match signal {
            LoadSignal::Button => true,
            LoadSignal::Visible { item_id } => self.observed.as_deref() == Some(item_id.as_str()),
        }
    }
}
