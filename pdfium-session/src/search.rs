//! Text search and highlight geometry.
//!
//! A document search runs PDFium's substring finder page by page and collects
//! every hit as a [`PdfMatch`]. Hits are plain character spans; turning a span
//! into something drawable is [`PdfDocument::text_bounds`], which merges the
//! per-glyph boxes into one rectangle per visually contiguous run.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "native")]
//! # fn main() -> Result<(), pdfium_session::PdfError> {
//! use pdfium_session::{Pdfium, PdfSearchOptions};
//!
//! let pdfium = Pdfium::native();
//! let mut doc = pdfium.open_file("document.pdf", None)?;
//!
//! let mut matches = doc.search(Some("keyword"), PdfSearchOptions::new(), 0, 9)?;
//! if let Some(hit) = matches.find_next(true).cloned() {
//!     for rect in doc.text_bounds(&hit.span)? {
//!         println!("highlight page {} at {:?}", rect.page, rect.bounds);
//!     }
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "native"))]
//! # fn main() {}
//! ```
//!
//! [`PdfDocument::text_bounds`]: crate::PdfDocument::text_bounds

use crate::geometry::PdfRect;
use crate::handle::SearchHandle;
use crate::page_scope::PageScope;
use pdfium_sys::{FPDF_CONSECUTIVE, FPDF_MATCHCASE, FPDF_MATCHWHOLEWORD};

/// Maximum distance, in PDF points, between two glyph edges that still
/// counts as touching when merging highlight rectangles.
///
/// Applied to the horizontal gap and to both vertical edges. This is a fixed
/// constant: with very small fonts, neighbouring lines closer than this are
/// merged into one rectangle.
pub const MERGE_TOLERANCE: f32 = 4.0;

/// Search option flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdfSearchOptions {
    /// Case-sensitive matching.
    pub match_case: bool,
    /// Match whole words only.
    pub match_whole_word: bool,
    /// Find consecutive matches (no gap between matches).
    pub consecutive: bool,
}

impl PdfSearchOptions {
    /// Create new search options with all flags disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable case-sensitive matching.
    pub fn case_sensitive(mut self) -> Self {
        self.match_case = true;
        self
    }

    /// Enable whole word matching.
    pub fn whole_word(mut self) -> Self {
        self.match_whole_word = true;
        self
    }

    /// Enable consecutive matching.
    pub fn consecutive(mut self) -> Self {
        self.consecutive = true;
        self
    }

    /// Convert to PDFium flags.
    pub(crate) fn to_flags(self) -> u32 {
        let mut flags = 0u32;
        if self.match_case {
            flags |= FPDF_MATCHCASE;
        }
        if self.match_whole_word {
            flags |= FPDF_MATCHWHOLEWORD;
        }
        if self.consecutive {
            flags |= FPDF_CONSECUTIVE;
        }
        flags
    }
}

/// A run of extracted characters on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdfTextSpan {
    pub page: usize,
    pub offset: usize,
    pub length: usize,
}

impl PdfTextSpan {
    pub fn new(page: usize, offset: usize, length: usize) -> Self {
        Self {
            page,
            offset,
            length,
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfMatch {
    /// The matched characters as they appear on the page.
    pub text: String,
    pub span: PdfTextSpan,
    pub page: usize,
}

/// A highlight rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRectangle {
    pub page: usize,
    pub bounds: PdfRect,
}

/// Ordered results of a document search, with a cursor for stepping through
/// them.
///
/// Matches are ordered by page, then by position on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfMatches {
    start_page: usize,
    end_page: usize,
    items: Vec<PdfMatch>,
    current: Option<usize>,
}

impl PdfMatches {
    pub(crate) fn new(start_page: usize, end_page: usize, items: Vec<PdfMatch>) -> Self {
        Self {
            start_page,
            end_page,
            items,
            current: None,
        }
    }

    /// First page that was searched.
    pub fn start_page(&self) -> usize {
        self.start_page
    }

    /// Last page that was searched (inclusive).
    pub fn end_page(&self) -> usize {
        self.end_page
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfMatch> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfMatch> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[PdfMatch] {
        &self.items
    }

    /// The match the cursor is on, if it has moved yet.
    pub fn current(&self) -> Option<&PdfMatch> {
        self.current.and_then(|index| self.items.get(index))
    }

    /// Index of the current match.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Step the cursor to the next (or previous) match, wrapping around at
    /// either end. Returns `None` only when there are no matches.
    ///
    /// A fresh result set starts before the first match: stepping forward
    /// lands on the first, stepping backward on the last.
    pub fn find_next(&mut self, forward: bool) -> Option<&PdfMatch> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }
        let next = match (self.current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(index), true) => (index + 1) % len,
            (Some(index), false) => (index + len - 1) % len,
        };
        self.current = Some(next);
        self.items.get(next)
    }

    /// Move the cursor back before the first match.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn into_vec(self) -> Vec<PdfMatch> {
        self.items
    }
}

impl IntoIterator for PdfMatches {
    type Item = PdfMatch;
    type IntoIter = std::vec::IntoIter<PdfMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a PdfMatches {
    type Item = &'a PdfMatch;
    type IntoIter = std::slice::Iter<'a, PdfMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An open native find handle on a page's text layer.
///
/// Borrows its [`PageScope`], so it can never outlive the text page it
/// searches. The handle is closed on drop.
pub(crate) struct SearchCursor<'s, 'a> {
    scope: &'s PageScope<'a>,
    handle: SearchHandle,
}

impl<'s, 'a> SearchCursor<'s, 'a> {
    /// Start a search from the first character. `pattern` must be
    /// NUL-terminated UTF-16. Returns `None` if the engine refused.
    pub(crate) fn start(scope: &'s PageScope<'a>, pattern: &[u16], flags: u32) -> Option<Self> {
        let handle = scope
            .engine()
            .text_find_start(scope.text_page(), pattern, flags, 0);
        if handle.is_null() {
            None
        } else {
            Some(Self { scope, handle })
        }
    }
}

impl Iterator for SearchCursor<'_, '_> {
    /// Start index and length of the next hit, in characters.
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let engine = self.scope.engine();
        if !engine.text_find_next(self.handle) {
            return None;
        }
        let start = engine.text_get_sch_result_index(self.handle).max(0) as usize;
        let count = engine.text_get_sch_count(self.handle).max(0) as usize;
        Some((start, count))
    }
}

impl Drop for SearchCursor<'_, '_> {
    fn drop(&mut self) {
        self.scope.engine().text_find_close(self.handle);
    }
}

/// Collect every hit of `pattern` on one loaded page.
pub(crate) fn search_page(scope: &PageScope<'_>, pattern: &[u16], flags: u32) -> Vec<PdfMatch> {
    let Some(cursor) = SearchCursor::start(scope, pattern, flags) else {
        return Vec::new();
    };
    let page = scope.index();
    cursor
        .map(|(offset, length)| PdfMatch {
            text: scope.text(offset, length),
            span: PdfTextSpan::new(page, offset, length),
            page,
        })
        .collect()
}

fn are_close(a: f32, b: f32) -> bool {
    (a - b).abs() < MERGE_TOLERANCE
}

/// Merge glyph boxes into highlight rectangles.
///
/// Boxes with zero width or height are skipped without breaking the current
/// run. A box is merged into the previous rectangle when its left edge is
/// within [`MERGE_TOLERANCE`] of that rectangle's right edge and both its top
/// and bottom are within the same tolerance; the merged rectangle takes the
/// union of the vertical extents.
pub fn merge_char_boxes<I>(page: usize, boxes: I) -> Vec<PdfRectangle>
where
    I: IntoIterator<Item = PdfRect>,
{
    let mut result: Vec<PdfRectangle> = Vec::new();

    for bounds in boxes {
        if bounds.is_empty() {
            continue;
        }

        match result.last_mut() {
            Some(last)
                if are_close(last.bounds.right, bounds.left)
                    && are_close(last.bounds.top, bounds.top)
                    && are_close(last.bounds.bottom, bounds.bottom) =>
            {
                last.bounds = PdfRect::new(
                    last.bounds.left,
                    last.bounds.top.max(bounds.top),
                    bounds.right,
                    last.bounds.bottom.min(bounds.bottom),
                );
            }
            _ => result.push(PdfRectangle { page, bounds }),
        }
    }

    result
}
