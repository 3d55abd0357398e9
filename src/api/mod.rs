pub mod client;
pub mod models;

pub use client::SongsClient;
pub use models::{Song, SongsResponse};
