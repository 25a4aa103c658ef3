//! Per-call page resources
//!
//! A [`PageScope`] loads a page and its text layer for the duration of one
//! document operation and releases both when it goes out of scope, whether
//! the operation returned normally or bailed out with `?`. Nothing else in
//! the crate creates or closes page handles.

use crate::engine::PdfiumApi;
use crate::error::{PdfError, Result};
use crate::geometry::{PdfPageSize, PdfRect};
use crate::handle::{DocumentHandle, FormHandle, PageHandle, TextPageHandle};
use pdfium_sys::{FPDFPAGE_AACTION_CLOSE, FPDFPAGE_AACTION_OPEN};
use tracing::trace;

pub(crate) struct PageScope<'a> {
    engine: &'a dyn PdfiumApi,
    form: FormHandle,
    index: usize,
    page: PageHandle,
    text_page: TextPageHandle,
    size: PdfPageSize,
}

impl<'a> PageScope<'a> {
    /// Load page `index` and its text layer, then notify the form
    /// environment (when there is one) that the page opened.
    ///
    /// If the text layer cannot be loaded the page is closed again before
    /// the error is returned.
    pub(crate) fn acquire(
        engine: &'a dyn PdfiumApi,
        document: DocumentHandle,
        form: FormHandle,
        index: usize,
    ) -> Result<Self> {
        let raw_index = i32::try_from(index).map_err(|_| PdfError::PageLoadFailed { index })?;

        let page = engine.load_page(document, raw_index);
        if page.is_null() {
            return Err(PdfError::PageLoadFailed { index });
        }

        let text_page = engine.text_load_page(page);
        if text_page.is_null() {
            engine.close_page(page);
            return Err(PdfError::PageLoadFailed { index });
        }

        if !form.is_null() {
            engine.form_on_after_load_page(page, form);
            engine.form_do_page_aaction(page, form, FPDFPAGE_AACTION_OPEN);
        }

        let size = PdfPageSize::new(
            engine.get_page_width(page) as f32,
            engine.get_page_height(page) as f32,
        );

        trace!(index, width = size.width, height = size.height, "page scope acquired");

        Ok(Self {
            engine,
            form,
            index,
            page,
            text_page,
            size,
        })
    }

    pub(crate) fn engine(&self) -> &'a dyn PdfiumApi {
        self.engine
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn page(&self) -> PageHandle {
        self.page
    }

    pub(crate) fn text_page(&self) -> TextPageHandle {
        self.text_page
    }

    /// Page size in points, as loaded.
    pub(crate) fn size(&self) -> PdfPageSize {
        self.size
    }

    /// Number of characters in the text layer.
    pub(crate) fn char_count(&self) -> usize {
        self.engine.text_count_chars(self.text_page).max(0) as usize
    }

    /// Decode `count` characters starting at `start`.
    ///
    /// `count` is clamped to the end of the text layer. The engine writes a
    /// terminator after the requested characters and counts it in its return
    /// value; only the characters themselves are decoded.
    pub(crate) fn text(&self, start: usize, count: usize) -> String {
        let count = self.clamp_len(start, count);
        if count == 0 {
            return String::new();
        }
        let (Ok(raw_start), Ok(raw_count)) = (i32::try_from(start), i32::try_from(count)) else {
            return String::new();
        };

        let mut buffer = vec![0u16; count + 1];
        let written = self
            .engine
            .text_get_text(self.text_page, raw_start, raw_count, &mut buffer);
        let decoded = (written.max(1) as usize - 1).min(count);
        String::from_utf16_lossy(&buffer[..decoded])
    }

    /// Length of the run starting at `start` that lies inside the text layer.
    pub(crate) fn clamp_len(&self, start: usize, len: usize) -> usize {
        len.min(self.char_count().saturating_sub(start))
    }

    /// Bounding box of one glyph in PDF user space.
    pub(crate) fn char_box(&self, index: usize) -> Option<PdfRect> {
        let index = i32::try_from(index).ok()?;
        let bounds = self.engine.text_get_char_box(self.text_page, index)?;
        Some(PdfRect::new(
            bounds.left as f32,
            bounds.top as f32,
            bounds.right as f32,
            bounds.bottom as f32,
        ))
    }
}

impl Drop for PageScope<'_> {
    fn drop(&mut self) {
        if !self.form.is_null() {
            self.engine
                .form_do_page_aaction(self.page, self.form, FPDFPAGE_AACTION_CLOSE);
            self.engine.form_on_before_close_page(self.page, self.form);
        }
        self.engine.text_close_page(self.text_page);
        self.engine.close_page(self.page);
        trace!(index = self.index, "page scope released");
    }
}
