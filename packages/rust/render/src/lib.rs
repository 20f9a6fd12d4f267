//! Positioning brief rendering.
//!
//! This crate provides:
//! - [`html`]: the self-contained markup document for a [`PositioningBrief`](positioning_shared::PositioningBrief)
//! - [`compositor`]: the optional [`Compositor`] capability that turns markup into a PDF

pub mod compositor;
pub mod html;

pub use compositor::{CommandCompositor, Compositor, compositor_from_config};
pub use html::{GENERATOR, escape_html, render_html, title_case};
