//! stitch-pdf: a PDF object model and document merger.
//!
//! The crate parses PDF files into an [`ObjectTable`] of typed values,
//! exposes their navigation structures (outlines and named destinations),
//! and recombines page ranges from several documents into a new file with
//! those structures carried over and re-targeted.
//!
//! # Example
//!
//! ```no_run
//! use stitch_pdf::{MergeOptions, PdfMerger};
//!
//! # fn main() -> stitch_pdf::Result<()> {
//! let mut merger = PdfMerger::new(false);
//! merger.append(std::path::Path::new("a.pdf"), MergeOptions::default())?;
//! merger.append(
//!     std::path::Path::new("b.pdf"),
//!     MergeOptions {
//!         pages: Some(0..3),
//!         bookmark: Some("Appendix".to_string()),
//!         ..Default::default()
//!     },
//! )?;
//! merger.save("merged.pdf")?;
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod destination;
pub mod diagnostics;
pub mod document;
pub mod encoding;
pub mod encryption;
pub mod error;
pub mod filters;
pub mod merger;
pub mod objects;
pub mod reader;
pub mod source;
pub mod tree;
pub mod writer;

#[cfg(test)]
mod testutil;

pub use content::{ContentEntry, ContentStream};
pub use destination::{Destination, FitType};
pub use diagnostics::{BufferSink, DiagnosticSink, SilentSink, TracingSink};
pub use document::ObjectTable;
pub use error::{PdfError, Result};
pub use merger::{MergeInput, MergeOptions, PdfMerger};
pub use objects::{
    Dictionary, DocumentId, Name, ObjRef, Object, PdfString, Real, StreamObject, TextSource,
};
pub use source::{OutlineNode, SourceDocument};
pub use writer::PdfWriter;
