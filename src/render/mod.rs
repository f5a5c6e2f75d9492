//! Report rendering
//!
//! Rendering is a single forward pass over the catalog. The wiki renderer
//! builds a fresh [`RowspanAccountant`] per call and consumes it while
//! writing rows, so rendering the same catalog twice gives the same output.
//!
//! # Modules
//!
//! - [`rowspan`]: per-column repeat counts
//! - [`corrections`]: historical file rowspan corrections
//! - [`text`]: plain-text paragraphs
//! - [`wiki`]: wiki table with merged cells

pub mod corrections;
pub mod rowspan;
pub mod text;
pub mod wiki;

pub use rowspan::RowspanAccountant;
pub use text::TextRenderer;
pub use wiki::{WikiOptions, WikiRenderer};

use crate::catalog::Catalog;

/// Turns a catalog into report text
pub trait ReportRenderer {
    fn render(&self, catalog: &Catalog) -> String;
}
