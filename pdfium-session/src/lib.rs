//! # pdfium-session
//!
//! Document sessions over the PDFium engine: handle lifetimes, stream
//! bridging, page geometry and search highlighting.
//!
//! PDFium does the parsing and rasterisation. This crate owns everything
//! around it that is easy to get wrong:
//!
//! - **Handle ordering**: form environment before document, text page before
//!   page, search before text page. Pages are loaded per call and always
//!   released, including on early returns.
//! - **Stream bridging**: documents are read on demand from any
//!   `Read + Seek` source through a process-wide registry keyed by the
//!   integer context PDFium passes to its read callback.
//! - **Search**: hits are collected per page and turned into highlight
//!   rectangles by merging adjacent glyph boxes.
//!
//! The engine is reached through the [`PdfiumApi`] function table. With the
//! `native` feature, [`Pdfium::native`] forwards it to the linked
//! `libpdfium`.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "native")]
//! # fn main() -> Result<(), pdfium_session::PdfError> {
//! use pdfium_session::{Pdfium, PdfSearchOptions};
//!
//! let pdfium = Pdfium::native();
//! let mut doc = pdfium.open_file("document.pdf", None)?;
//!
//! println!("{:?} ({} pages)", doc.title()?, doc.page_count()?);
//!
//! let matches = doc.search_all(Some("total"), PdfSearchOptions::new().whole_word())?;
//! for hit in &matches {
//!     let rects = doc.text_bounds(&hit.span)?;
//!     println!("page {}: {} rectangles", hit.page, rects.len());
//! }
//!
//! doc.close();
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "native"))]
//! # fn main() {}
//! ```
//!
//! ## Threads
//!
//! Documents opened on different streams are independent and can be used
//! from different threads at the same time. A single [`PdfDocument`] is
//! `Send` but not `Sync`; put it behind a `Mutex` to share it.

mod bookmark;
mod config;
mod document;
mod engine;
mod error;
mod geometry;
mod handle;
mod library;
mod metadata;
#[cfg(feature = "native")]
mod native;
mod page_scope;
mod render;
mod search;
mod stream;

pub use bookmark::{flatten_bookmarks, FlatBookmark, PdfBookmark};
pub use config::{
    PdfiumConfig, DEFAULT_HIGHLIGHT_ALPHA, DEFAULT_HIGHLIGHT_COLOR, DISABLE_FORMS_ENV,
    FORM_HIGHLIGHT_ALPHA_ENV, FORM_HIGHLIGHT_COLOR_ENV,
};
pub use document::PdfDocument;
pub use engine::{CharBox, PdfiumApi};
pub use error::{OpenFailure, PdfError, Result};
pub use geometry::{
    DevicePoint, DeviceRect, DeviceViewport, PdfPageSize, PdfPoint, PdfRect, PdfRotation,
};
pub use handle::{
    BitmapHandle, BookmarkHandle, DestHandle, DocumentHandle, FormHandle, PageHandle,
    SearchHandle, TextPageHandle,
};
pub use library::Pdfium;
pub use metadata::{parse_pdf_date, tags};
#[cfg(feature = "native")]
pub use native::NativeEngine;
pub use render::{PdfRenderConfig, RenderFlags};
pub use search::{
    merge_char_boxes, PdfMatch, PdfMatches, PdfRectangle, PdfSearchOptions, PdfTextSpan,
    MERGE_TOLERANCE,
};
pub use stream::{read_at, PdfStream, SharedStream, StreamId, StreamRegistry};

/// Raw C ABI types, for implementing [`PdfiumApi`] outside this crate.
pub use pdfium_sys as sys;
