//! Pure gallery logic shared by the client crates.
//!
//! Nothing in here performs I/O: the query builder, the gallery feed state
//! machine and the load-more trigger are plain data structures that the async
//! layer in `kala-core` drives.

pub mod gallery_feed;
pub mod load_trigger;
pub mod query;

pub use gallery_feed::{ApplyOutcome, FeedItem, FeedPhase, GalleryFeed, PageRequest};
pub use load_trigger::{LoadSignal, LoadTrigger};
pub use query::{
    build, search_ready, EqualityFilter, FetchDescriptor, FilterField, QueryState, SortOrder,
    TextMatch,
};
