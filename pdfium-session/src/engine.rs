//! The native function table
//!
//! Every PDFium entry point the session layer uses is one method of
//! [`PdfiumApi`]. Methods report failure exactly the way the C API does
//! (null handles, `false`, zero lengths); translating those sentinels into
//! [`PdfError`](crate::PdfError) happens at the call sites in the document
//! layer.
//!
//! Two-phase string calls take a byte slice: an empty slice asks for the
//! required length, a large enough slice receives the data.

use crate::geometry::DeviceViewport;
use crate::handle::{
    BitmapHandle, BookmarkHandle, DestHandle, DocumentHandle, FormHandle, PageHandle, SearchHandle,
    TextPageHandle,
};
use pdfium_sys::{FPDF_FILEACCESS, FPDF_FILEWRITE, FPDF_FORMFILLINFO};
use std::ffi::CStr;

/// Glyph bounding box as reported by `FPDFText_GetCharBox`, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CharBox {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

/// Function table of the native PDF engine.
///
/// Implementations must be callable from any thread. The engine itself is
/// not required to be reentrant per document; the session layer serialises
/// access to each document.
pub trait PdfiumApi: Send + Sync {
    // Library

    fn init_library(&self);
    fn destroy_library(&self);
    /// Error code of the last failed document load (`FPDF_ERR_*`).
    fn get_last_error(&self) -> u32;

    // Document

    /// Open a document that is read on demand through `access`.
    ///
    /// # Safety
    ///
    /// `access` must stay valid and unmoved until [`close_document`] returns
    /// for the returned handle, and its callback must be safe to invoke from
    /// inside any later call on that document.
    ///
    /// [`close_document`]: PdfiumApi::close_document
    unsafe fn load_custom_document(
        &self,
        access: *mut FPDF_FILEACCESS,
        password: Option<&CStr>,
    ) -> DocumentHandle;
    fn close_document(&self, document: DocumentHandle);
    fn get_doc_permissions(&self, document: DocumentHandle) -> u32;
    fn get_page_count(&self, document: DocumentHandle) -> i32;
    /// Width and height in points without loading the page.
    fn get_page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<(f64, f64)>;
    /// `FPDF_GetMetaText`. Returns the byte length of the UTF-16LE value
    /// including its terminator.
    fn get_meta_text(&self, document: DocumentHandle, tag: &CStr, buffer: &mut [u8]) -> usize;
    /// Serialise the document through `writer`.
    ///
    /// # Safety
    ///
    /// `writer` must point to a valid `FPDF_FILEWRITE` (possibly the prefix of
    /// a larger struct its callback knows how to recover) for the duration of
    /// the call.
    unsafe fn save_as_copy(
        &self,
        document: DocumentHandle,
        writer: *mut FPDF_FILEWRITE,
        flags: u32,
    ) -> bool;

    // Page

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle;
    fn close_page(&self, page: PageHandle);
    fn get_page_width(&self, page: PageHandle) -> f64;
    fn get_page_height(&self, page: PageHandle) -> f64;
    fn page_get_rotation(&self, page: PageHandle) -> i32;
    fn page_set_rotation(&self, page: PageHandle, rotation: i32);
    fn page_delete(&self, document: DocumentHandle, index: i32);
    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: &DeviceViewport,
        flags: u32,
    );
    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: &DeviceViewport,
        page_x: f64,
        page_y: f64,
    ) -> Option<(i32, i32)>;
    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: &DeviceViewport,
        device_x: i32,
        device_y: i32,
    ) -> Option<(f64, f64)>;

    // Text

    fn text_load_page(&self, page: PageHandle) -> TextPageHandle;
    fn text_close_page(&self, text_page: TextPageHandle);
    fn text_count_chars(&self, text_page: TextPageHandle) -> i32;
    /// `FPDFText_GetText`. `buffer` must hold `count + 1` units; the return
    /// value counts the terminator.
    fn text_get_text(
        &self,
        text_page: TextPageHandle,
        start: i32,
        count: i32,
        buffer: &mut [u16],
    ) -> i32;
    fn text_get_char_box(&self, text_page: TextPageHandle, index: i32) -> Option<CharBox>;
    /// Start a search. `pattern` is NUL-terminated UTF-16.
    fn text_find_start(
        &self,
        text_page: TextPageHandle,
        pattern: &[u16],
        flags: u32,
        start_index: i32,
    ) -> SearchHandle;
    fn text_find_next(&self, search: SearchHandle) -> bool;
    fn text_get_sch_result_index(&self, search: SearchHandle) -> i32;
    fn text_get_sch_count(&self, search: SearchHandle) -> i32;
    fn text_find_close(&self, search: SearchHandle);

    // Forms

    /// Create a form-fill environment.
    ///
    /// # Safety
    ///
    /// `info` must stay valid and unmoved until
    /// [`exit_form_fill_environment`](PdfiumApi::exit_form_fill_environment)
    /// returns for the returned handle.
    unsafe fn init_form_fill_environment(
        &self,
        document: DocumentHandle,
        info: *mut FPDF_FORMFILLINFO,
    ) -> FormHandle;
    fn exit_form_fill_environment(&self, form: FormHandle);
    fn set_form_field_highlight_color(&self, form: FormHandle, field_type: i32, color: u32);
    fn set_form_field_highlight_alpha(&self, form: FormHandle, alpha: u8);
    fn form_do_document_js_action(&self, form: FormHandle);
    fn form_do_document_open_action(&self, form: FormHandle);
    fn form_do_document_aaction(&self, form: FormHandle, action: u32);
    fn form_on_after_load_page(&self, page: PageHandle, form: FormHandle);
    fn form_on_before_close_page(&self, page: PageHandle, form: FormHandle);
    fn form_do_page_aaction(&self, page: PageHandle, form: FormHandle, action: u32);
    fn ffl_draw(
        &self,
        form: FormHandle,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: &DeviceViewport,
        flags: u32,
    );

    // Outline

    /// First child of `parent`, or of the outline root when `parent` is null.
    fn bookmark_get_first_child(
        &self,
        document: DocumentHandle,
        parent: BookmarkHandle,
    ) -> BookmarkHandle;
    fn bookmark_get_next_sibling(
        &self,
        document: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> BookmarkHandle;
    /// Same length convention as [`get_meta_text`](PdfiumApi::get_meta_text).
    fn bookmark_get_title(&self, bookmark: BookmarkHandle, buffer: &mut [u8]) -> usize;
    fn bookmark_get_dest(&self, document: DocumentHandle, bookmark: BookmarkHandle) -> DestHandle;
    /// Zero-based page index of a destination, or -1.
    fn dest_get_page_index(&self, document: DocumentHandle, dest: DestHandle) -> i32;
}
