//! Breadth-first documentation crawler with incremental event streaming.
//!
//! This crate provides:
//! - [`Crawler`] — sequential, host-contained BFS traversal bounded by depth
//! - [`CrawlEvent`] — the lazy progress/result event stream
//! - [`extract`] — page chrome stripping and HTML-to-text conversion

pub mod engine;
pub mod extract;

pub use engine::{CrawlEvent, Crawler, normalize_url};
