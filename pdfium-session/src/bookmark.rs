//! PDF bookmark (outline) support
//!
//! The outline is read in one pass into an owned tree, so callers never hold
//! native bookmark handles.

use crate::engine::PdfiumApi;
use crate::handle::{BookmarkHandle, DocumentHandle};
use crate::metadata::decode_utf16le;
use std::collections::HashSet;

/// A bookmark (outline item) in a PDF document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBookmark {
    /// Display text.
    pub title: String,
    /// Destination page (0-based), if the entry has one.
    pub page_index: Option<usize>,
    pub children: Vec<PdfBookmark>,
}

impl PdfBookmark {
    /// Check if this bookmark has children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Total number of entries in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(PdfBookmark::count).sum::<usize>()
    }
}

/// A flattened bookmark entry with depth information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBookmark {
    /// The bookmark title.
    pub title: String,
    /// The destination page index (0-based), if any.
    pub page_index: Option<usize>,
    /// The depth in the tree (0 = root level).
    pub depth: usize,
}

/// Flatten a bookmark forest depth-first, parents before children.
pub fn flatten_bookmarks(bookmarks: &[PdfBookmark]) -> Vec<FlatBookmark> {
    let mut result = Vec::new();
    flatten_recursive(bookmarks, 0, &mut result);
    result
}

fn flatten_recursive(bookmarks: &[PdfBookmark], depth: usize, result: &mut Vec<FlatBookmark>) {
    for bookmark in bookmarks {
        result.push(FlatBookmark {
            title: bookmark.title.clone(),
            page_index: bookmark.page_index,
            depth,
        });
        flatten_recursive(&bookmark.children, depth + 1, result);
    }
}

/// Read the whole outline of `document`.
///
/// Malformed files can link outline entries into a cycle; an entry already
/// visited ends the walk of its sibling chain.
pub(crate) fn read_outline(engine: &dyn PdfiumApi, document: DocumentHandle) -> Vec<PdfBookmark> {
    let mut visited = HashSet::new();
    read_children(engine, document, BookmarkHandle::NULL, &mut visited)
}

fn read_children(
    engine: &dyn PdfiumApi,
    document: DocumentHandle,
    parent: BookmarkHandle,
    visited: &mut HashSet<BookmarkHandle>,
) -> Vec<PdfBookmark> {
    let mut result = Vec::new();
    let mut current = engine.bookmark_get_first_child(document, parent);

    while !current.is_null() && visited.insert(current) {
        result.push(PdfBookmark {
            title: title(engine, current),
            page_index: page_index(engine, document, current),
            children: read_children(engine, document, current, visited),
        });
        current = engine.bookmark_get_next_sibling(document, current);
    }

    result
}

fn title(engine: &dyn PdfiumApi, bookmark: BookmarkHandle) -> String {
    let len = engine.bookmark_get_title(bookmark, &mut []);
    if len <= 2 {
        return String::new();
    }
    let mut buffer = vec![0u8; len];
    engine.bookmark_get_title(bookmark, &mut buffer);
    decode_utf16le(&buffer)
}

fn page_index(
    engine: &dyn PdfiumApi,
    document: DocumentHandle,
    bookmark: BookmarkHandle,
) -> Option<usize> {
    let dest = engine.bookmark_get_dest(document, bookmark);
    if dest.is_null() {
        return None;
    }
    usize::try_from(engine.dest_get_page_index(document, dest)).ok()
}
