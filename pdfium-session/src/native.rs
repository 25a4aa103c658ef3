//! [`PdfiumApi`] backed by the linked `libpdfium`.

use crate::engine::{CharBox, PdfiumApi};
use crate::geometry::DeviceViewport;
use crate::handle::{
    BitmapHandle, BookmarkHandle, DestHandle, DocumentHandle, FormHandle, PageHandle, SearchHandle,
    TextPageHandle,
};
use pdfium_sys::*;
use std::ffi::CStr;
use std::os::raw::{c_int, c_ulong, c_void};
use std::ptr;

macro_rules! raw {
    ($handle:expr, $ty:ty) => {
        $handle.as_raw() as $ty
    };
}

/// Forwards every call to the PDFium C API.
///
/// There is one instance per process, reached through
/// [`Pdfium::native`](crate::Pdfium::native).
#[derive(Debug)]
pub struct NativeEngine {
    _private: (),
}

impl NativeEngine {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

fn out_buffer<T>(buffer: &mut [T]) -> *mut c_void {
    if buffer.is_empty() {
        ptr::null_mut()
    } else {
        buffer.as_mut_ptr() as *mut c_void
    }
}

impl PdfiumApi for NativeEngine {
    fn init_library(&self) {
        unsafe { FPDF_InitLibrary() }
    }

    fn destroy_library(&self) {
        unsafe { FPDF_DestroyLibrary() }
    }

    fn get_last_error(&self) -> u32 {
        unsafe { FPDF_GetLastError() as u32 }
    }

    unsafe fn load_custom_document(
        &self,
        access: *mut FPDF_FILEACCESS,
        password: Option<&CStr>,
    ) -> DocumentHandle {
        let password = password.map_or(ptr::null(), CStr::as_ptr);
        DocumentHandle::from_raw(FPDF_LoadCustomDocument(access, password) as usize)
    }

    fn close_document(&self, document: DocumentHandle) {
        unsafe { FPDF_CloseDocument(raw!(document, FPDF_DOCUMENT)) }
    }

    fn get_doc_permissions(&self, document: DocumentHandle) -> u32 {
        unsafe { FPDF_GetDocPermissions(raw!(document, FPDF_DOCUMENT)) as u32 }
    }

    fn get_page_count(&self, document: DocumentHandle) -> i32 {
        unsafe { FPDF_GetPageCount(raw!(document, FPDF_DOCUMENT)) }
    }

    fn get_page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<(f64, f64)> {
        let mut width = 0.0;
        let mut height = 0.0;
        let ok = unsafe {
            FPDF_GetPageSizeByIndex(raw!(document, FPDF_DOCUMENT), index, &mut width, &mut height)
        };
        (ok != 0).then_some((width, height))
    }

    fn get_meta_text(&self, document: DocumentHandle, tag: &CStr, buffer: &mut [u8]) -> usize {
        let len = buffer.len() as c_ulong;
        unsafe {
            FPDF_GetMetaText(
                raw!(document, FPDF_DOCUMENT),
                tag.as_ptr(),
                out_buffer(buffer),
                len,
            ) as usize
        }
    }

    unsafe fn save_as_copy(
        &self,
        document: DocumentHandle,
        writer: *mut FPDF_FILEWRITE,
        flags: u32,
    ) -> bool {
        FPDF_SaveAsCopy(raw!(document, FPDF_DOCUMENT), writer, flags as FPDF_DWORD) != 0
    }

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        PageHandle::from_raw(unsafe { FPDF_LoadPage(raw!(document, FPDF_DOCUMENT), index) } as usize)
    }

    fn close_page(&self, page: PageHandle) {
        unsafe { FPDF_ClosePage(raw!(page, FPDF_PAGE)) }
    }

    fn get_page_width(&self, page: PageHandle) -> f64 {
        unsafe { FPDF_GetPageWidth(raw!(page, FPDF_PAGE)) }
    }

    fn get_page_height(&self, page: PageHandle) -> f64 {
        unsafe { FPDF_GetPageHeight(raw!(page, FPDF_PAGE)) }
    }

    fn page_get_rotation(&self, page: PageHandle) -> i32 {
        unsafe { FPDFPage_GetRotation(raw!(page, FPDF_PAGE)) }
    }

    fn page_set_rotation(&self, page: PageHandle, rotation: i32) {
        unsafe { FPDFPage_SetRotation(raw!(page, FPDF_PAGE), rotation) }
    }

    fn page_delete(&self, document: DocumentHandle, index: i32) {
        unsafe { FPDFPage_Delete(raw!(document, FPDF_DOCUMENT), index) }
    }

    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: &DeviceViewport,
        flags: u32,
    ) {
        unsafe {
            FPDF_RenderPageBitmap(
                raw!(bitmap, FPDF_BITMAP),
                raw!(page, FPDF_PAGE),
                viewport.start_x,
                viewport.start_y,
                viewport.size_x,
                viewport.size_y,
                viewport.rotation.as_raw(),
                flags as c_int,
            )
        }
    }

    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: &DeviceViewport,
        page_x: f64,
        page_y: f64,
    ) -> Option<(i32, i32)> {
        let mut device_x = 0;
        let mut device_y = 0;
        let ok = unsafe {
            FPDF_PageToDevice(
                raw!(page, FPDF_PAGE),
                viewport.start_x,
                viewport.start_y,
                viewport.size_x,
                viewport.size_y,
                viewport.rotation.as_raw(),
                page_x,
                page_y,
                &mut device_x,
                &mut device_y,
            )
        };
        (ok != 0).then_some((device_x, device_y))
    }

    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: &DeviceViewport,
        device_x: i32,
        device_y: i32,
    ) -> Option<(f64, f64)> {
        let mut page_x = 0.0;
        let mut page_y = 0.0;
        let ok = unsafe {
            FPDF_DeviceToPage(
                raw!(page, FPDF_PAGE),
                viewport.start_x,
                viewport.start_y,
                viewport.size_x,
                viewport.size_y,
                viewport.rotation.as_raw(),
                device_x,
                device_y,
                &mut page_x,
                &mut page_y,
            )
        };
        (ok != 0).then_some((page_x, page_y))
    }

    fn text_load_page(&self, page: PageHandle) -> TextPageHandle {
        TextPageHandle::from_raw(unsafe { FPDFText_LoadPage(raw!(page, FPDF_PAGE)) } as usize)
    }

    fn text_close_page(&self, text_page: TextPageHandle) {
        unsafe { FPDFText_ClosePage(raw!(text_page, FPDF_TEXTPAGE)) }
    }

    fn text_count_chars(&self, text_page: TextPageHandle) -> i32 {
        unsafe { FPDFText_CountChars(raw!(text_page, FPDF_TEXTPAGE)) }
    }

    fn text_get_text(
        &self,
        text_page: TextPageHandle,
        start: i32,
        count: i32,
        buffer: &mut [u16],
    ) -> i32 {
        // PDFium writes count + 1 units; never hand it a shorter buffer.
        let capacity = i32::try_from(buffer.len()).unwrap_or(i32::MAX);
        let count = count.min(capacity - 1);
        if count < 0 {
            return 0;
        }
        unsafe {
            FPDFText_GetText(
                raw!(text_page, FPDF_TEXTPAGE),
                start,
                count,
                buffer.as_mut_ptr(),
            )
        }
    }

    fn text_get_char_box(&self, text_page: TextPageHandle, index: i32) -> Option<CharBox> {
        let mut bounds = CharBox::default();
        let ok = unsafe {
            FPDFText_GetCharBox(
                raw!(text_page, FPDF_TEXTPAGE),
                index,
                &mut bounds.left,
                &mut bounds.right,
                &mut bounds.bottom,
                &mut bounds.top,
            )
        };
        (ok != 0).then_some(bounds)
    }

    fn text_find_start(
        &self,
        text_page: TextPageHandle,
        pattern: &[u16],
        flags: u32,
        start_index: i32,
    ) -> SearchHandle {
        if pattern.last() != Some(&0) {
            return SearchHandle::NULL;
        }
        let handle = unsafe {
            FPDFText_FindStart(
                raw!(text_page, FPDF_TEXTPAGE),
                pattern.as_ptr(),
                flags as c_ulong,
                start_index,
            )
        };
        SearchHandle::from_raw(handle as usize)
    }

    fn text_find_next(&self, search: SearchHandle) -> bool {
        unsafe { FPDFText_FindNext(raw!(search, FPDF_SCHHANDLE)) != 0 }
    }

    fn text_get_sch_result_index(&self, search: SearchHandle) -> i32 {
        unsafe { FPDFText_GetSchResultIndex(raw!(search, FPDF_SCHHANDLE)) }
    }

    fn text_get_sch_count(&self, search: SearchHandle) -> i32 {
        unsafe { FPDFText_GetSchCount(raw!(search, FPDF_SCHHANDLE)) }
    }

    fn text_find_close(&self, search: SearchHandle) {
        unsafe { FPDFText_FindClose(raw!(search, FPDF_SCHHANDLE)) }
    }

    unsafe fn init_form_fill_environment(
        &self,
        document: DocumentHandle,
        info: *mut FPDF_FORMFILLINFO,
    ) -> FormHandle {
        let form = FPDFDOC_InitFormFillEnvironment(raw!(document, FPDF_DOCUMENT), info);
        FormHandle::from_raw(form as usize)
    }

    fn exit_form_fill_environment(&self, form: FormHandle) {
        unsafe { FPDFDOC_ExitFormFillEnvironment(raw!(form, FPDF_FORMHANDLE)) }
    }

    fn set_form_field_highlight_color(&self, form: FormHandle, field_type: i32, color: u32) {
        unsafe {
            FPDF_SetFormFieldHighlightColor(raw!(form, FPDF_FORMHANDLE), field_type, color as c_ulong)
        }
    }

    fn set_form_field_highlight_alpha(&self, form: FormHandle, alpha: u8) {
        unsafe { FPDF_SetFormFieldHighlightAlpha(raw!(form, FPDF_FORMHANDLE), alpha) }
    }

    fn form_do_document_js_action(&self, form: FormHandle) {
        unsafe { FORM_DoDocumentJSAction(raw!(form, FPDF_FORMHANDLE)) }
    }

    fn form_do_document_open_action(&self, form: FormHandle) {
        unsafe { FORM_DoDocumentOpenAction(raw!(form, FPDF_FORMHANDLE)) }
    }

    fn form_do_document_aaction(&self, form: FormHandle, action: u32) {
        unsafe { FORM_DoDocumentAAction(raw!(form, FPDF_FORMHANDLE), action as c_int) }
    }

    fn form_on_after_load_page(&self, page: PageHandle, form: FormHandle) {
        unsafe { FORM_OnAfterLoadPage(raw!(page, FPDF_PAGE), raw!(form, FPDF_FORMHANDLE)) }
    }

    fn form_on_before_close_page(&self, page: PageHandle, form: FormHandle) {
        unsafe { FORM_OnBeforeClosePage(raw!(page, FPDF_PAGE), raw!(form, FPDF_FORMHANDLE)) }
    }

    fn form_do_page_aaction(&self, page: PageHandle, form: FormHandle, action: u32) {
        unsafe {
            FORM_DoPageAAction(
                raw!(page, FPDF_PAGE),
                raw!(form, FPDF_FORMHANDLE),
                action as c_int,
            )
        }
    }

    fn ffl_draw(
        &self,
        form: FormHandle,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: &DeviceViewport,
        flags: u32,
    ) {
        unsafe {
            FPDF_FFLDraw(
                raw!(form, FPDF_FORMHANDLE),
                raw!(bitmap, FPDF_BITMAP),
                raw!(page, FPDF_PAGE),
                viewport.start_x,
                viewport.start_y,
                viewport.size_x,
                viewport.size_y,
                viewport.rotation.as_raw(),
                flags as c_int,
            )
        }
    }

    fn bookmark_get_first_child(
        &self,
        document: DocumentHandle,
        parent: BookmarkHandle,
    ) -> BookmarkHandle {
        let child = unsafe {
            FPDFBookmark_GetFirstChild(raw!(document, FPDF_DOCUMENT), raw!(parent, FPDF_BOOKMARK))
        };
        BookmarkHandle::from_raw(child as usize)
    }

    fn bookmark_get_next_sibling(
        &self,
        document: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> BookmarkHandle {
        let sibling = unsafe {
            FPDFBookmark_GetNextSibling(raw!(document, FPDF_DOCUMENT), raw!(bookmark, FPDF_BOOKMARK))
        };
        BookmarkHandle::from_raw(sibling as usize)
    }

    fn bookmark_get_title(&self, bookmark: BookmarkHandle, buffer: &mut [u8]) -> usize {
        let len = buffer.len() as c_ulong;
        unsafe {
            FPDFBookmark_GetTitle(raw!(bookmark, FPDF_BOOKMARK), out_buffer(buffer), len) as usize
        }
    }

    fn bookmark_get_dest(&self, document: DocumentHandle, bookmark: BookmarkHandle) -> DestHandle {
        let dest = unsafe {
            FPDFBookmark_GetDest(raw!(document, FPDF_DOCUMENT), raw!(bookmark, FPDF_BOOKMARK))
        };
        DestHandle::from_raw(dest as usize)
    }

    fn dest_get_page_index(&self, document: DocumentHandle, dest: DestHandle) -> i32 {
        unsafe { FPDFDest_GetPageIndex(raw!(document, FPDF_DOCUMENT), raw!(dest, FPDF_DEST)) }
    }
}
