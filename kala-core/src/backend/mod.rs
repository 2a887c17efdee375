mod artworks;
mod client;
mod export;
pub mod query;
mod profiles;
mod social;
mod stats;

pub use client::{BackendClient, BackendError, Params};
