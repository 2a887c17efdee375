pub mod backend;
pub mod config;
pub mod content_type;
pub mod fetcher;
pub mod gallery;
pub mod models;
pub mod session;

pub use backend::{BackendClient, BackendError};
pub use config::{Config, ConfigError};
pub use fetcher::{FetchError, Page, PageFetcher};
pub use gallery::{GalleryError, GalleryHandle, GalleryService, GallerySnapshot};
pub use session::Session;
