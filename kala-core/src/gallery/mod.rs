//! Incremental gallery loading.
//!
//! [`GalleryService`] runs the pure [`kala_common::GalleryFeed`] on a single
//! task, spawns page fetches and feeds their completions back in. Views read
//! [`GallerySnapshot`]s through a [`GalleryHandle`].

mod handle;
mod service;

pub use handle::{GalleryError, GalleryHandle};
pub use service::{GalleryService, GallerySnapshot};
