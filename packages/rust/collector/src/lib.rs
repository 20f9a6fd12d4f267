//! Website collection for the positioning pipeline.
//!
//! This crate provides:
//! - [`extract`]: positioning content extraction from HTML (title, headings, CTAs, body copy)
//! - [`engine`]: the [`PageFetcher`] capability, its HTTP implementation, and the
//!   sequential per-company [`Collector`]

pub mod engine;
pub mod extract;

pub use engine::{Collector, HttpFetcher, PageFetcher};
pub use extract::extract_page;
