//! Raw C ABI of PDFium
//!
//! This crate provides the low-level types of the PDFium C interface: opaque
//! handle typedefs, the `#[repr(C)]` callback structures PDFium reads from,
//! and the constants used by the public headers.
//!
//! The `extern "C"` entry points are only declared with the `link` feature,
//! which also makes the build script link `libpdfium` (see `PDFIUM_LIB_DIR`).
//! Without it the crate builds on machines that have no PDFium installed.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use libc::{c_char, c_int, c_uchar, c_ulong, c_ushort, c_void};
#[cfg(feature = "link")]
use libc::c_double;

// ========================================
// Opaque handles
// ========================================

macro_rules! opaque_handle {
    ($tag:ident, $alias:ident) => {
        #[repr(C)]
        pub struct $tag {
            _private: [u8; 0],
        }

        pub type $alias = *mut $tag;
    };
}

opaque_handle!(fpdf_document_t__, FPDF_DOCUMENT);
opaque_handle!(fpdf_page_t__, FPDF_PAGE);
opaque_handle!(fpdf_textpage_t__, FPDF_TEXTPAGE);
opaque_handle!(fpdf_form_handle_t__, FPDF_FORMHANDLE);
opaque_handle!(fpdf_schhandle_t__, FPDF_SCHHANDLE);
opaque_handle!(fpdf_bitmap_t__, FPDF_BITMAP);
opaque_handle!(fpdf_bookmark_t__, FPDF_BOOKMARK);
opaque_handle!(fpdf_dest_t__, FPDF_DEST);

pub type FPDF_BOOL = c_int;
pub type FPDF_DWORD = c_ulong;
pub type FPDF_WIDESTRING = *const c_ushort;
pub type FPDF_BYTESTRING = *const c_char;

// ========================================
// Callback structures
// ========================================

/// Block reader signature used by [`FPDF_FILEACCESS`].
///
/// Returns non-zero on success, zero on failure.
pub type FPDF_GetBlock = unsafe extern "C" fn(
    param: *mut c_void,
    position: c_ulong,
    pBuf: *mut c_uchar,
    size: c_ulong,
) -> c_int;

/// Custom file access: PDFium pulls blocks on demand for the whole lifetime
/// of the document, so the structure must stay at a stable address until
/// `FPDF_CloseDocument` returns.
#[repr(C)]
pub struct FPDF_FILEACCESS {
    pub m_FileLen: c_ulong,
    pub m_GetBlock: Option<FPDF_GetBlock>,
    pub m_Param: *mut c_void,
}

/// Block writer signature used by [`FPDF_FILEWRITE`].
pub type FPDF_WriteBlock =
    unsafe extern "C" fn(pThis: *mut FPDF_FILEWRITE, pData: *const c_void, size: c_ulong) -> c_int;

/// Sink used by `FPDF_SaveAsCopy`. Callers may embed it as the first field
/// of a larger `#[repr(C)]` struct to carry their own state.
#[repr(C)]
pub struct FPDF_FILEWRITE {
    pub version: c_int,
    pub WriteBlock: Option<FPDF_WriteBlock>,
}

/// Slot type for form-fill callbacks this crate never installs.
///
/// Every callback in `FPDF_FORMFILLINFO` is a nullable function pointer; the
/// exact signature does not affect the layout, so unused slots share one type.
pub type FPDF_FormCallback = Option<unsafe extern "C" fn()>;

/// Form-fill environment description (versions 1 and 2).
///
/// PDFium keeps a pointer to this struct for the lifetime of the form
/// handle, so it must be boxed and outlive `FPDFDOC_ExitFormFillEnvironment`.
#[repr(C)]
pub struct FPDF_FORMFILLINFO {
    pub version: c_int,
    pub Release: FPDF_FormCallback,
    pub FFI_Invalidate: FPDF_FormCallback,
    pub FFI_OutputSelectedRect: FPDF_FormCallback,
    pub FFI_SetCursor: FPDF_FormCallback,
    pub FFI_SetTimer: FPDF_FormCallback,
    pub FFI_KillTimer: FPDF_FormCallback,
    pub FFI_GetLocalTime: FPDF_FormCallback,
    pub FFI_OnChange: FPDF_FormCallback,
    pub FFI_GetPage: FPDF_FormCallback,
    pub FFI_GetCurrentPage: FPDF_FormCallback,
    pub FFI_GetRotation: FPDF_FormCallback,
    pub FFI_ExecuteNamedAction: FPDF_FormCallback,
    pub FFI_SetTextFieldFocus: FPDF_FormCallback,
    pub FFI_DoURIAction: FPDF_FormCallback,
    pub FFI_DoGoToAction: FPDF_FormCallback,
    pub m_pJsPlatform: *mut c_void,
    // Version 2 (XFA) fields
    pub xfa_disabled: FPDF_BOOL,
    pub FFI_DisplayCaret: FPDF_FormCallback,
    pub FFI_GetCurrentPageIndex: FPDF_FormCallback,
    pub FFI_SetCurrentPage: FPDF_FormCallback,
    pub FFI_GotoURL: FPDF_FormCallback,
    pub FFI_GetPageViewRect: FPDF_FormCallback,
    pub FFI_PageEvent: FPDF_FormCallback,
    pub FFI_PopupMenu: FPDF_FormCallback,
    pub FFI_OpenFile: FPDF_FormCallback,
    pub FFI_EmailTo: FPDF_FormCallback,
    pub FFI_UploadTo: FPDF_FormCallback,
    pub FFI_GetPlatform: FPDF_FormCallback,
    pub FFI_GetLanguage: FPDF_FormCallback,
    pub FFI_DownloadFromURL: FPDF_FormCallback,
    pub FFI_PostRequestURL: FPDF_FormCallback,
    pub FFI_PutRequestURL: FPDF_FormCallback,
    pub FFI_OnFocusChange: FPDF_FormCallback,
    pub FFI_DoURIActionWithKeyboardModifier: FPDF_FormCallback,
}

impl FPDF_FORMFILLINFO {
    /// A structure with every callback unset and the given interface version.
    pub fn with_version(version: c_int) -> Self {
        // SAFETY: every field is an integer, a raw pointer or a nullable
        // function pointer, all of which are valid when zeroed.
        let mut info: Self = unsafe { std::mem::zeroed() };
        info.version = version;
        info
    }
}

// ========================================
// Constants
// ========================================

// FPDF_GetLastError codes
pub const FPDF_ERR_SUCCESS: u32 = 0;
pub const FPDF_ERR_UNKNOWN: u32 = 1;
pub const FPDF_ERR_FILE: u32 = 2;
pub const FPDF_ERR_FORMAT: u32 = 3;
pub const FPDF_ERR_PASSWORD: u32 = 4;
pub const FPDF_ERR_SECURITY: u32 = 5;
pub const FPDF_ERR_PAGE: u32 = 6;

// Render flags
pub const FPDF_ANNOT: u32 = 0x01;
pub const FPDF_LCD_TEXT: u32 = 0x02;
pub const FPDF_NO_NATIVETEXT: u32 = 0x04;
pub const FPDF_GRAYSCALE: u32 = 0x08;
pub const FPDF_REVERSE_BYTE_ORDER: u32 = 0x10;
pub const FPDF_CONVERT_FILL_TO_STROKE: u32 = 0x20;
pub const FPDF_DEBUG_INFO: u32 = 0x80;
pub const FPDF_NO_CATCH: u32 = 0x100;
pub const FPDF_RENDER_LIMITEDIMAGECACHE: u32 = 0x200;
pub const FPDF_RENDER_FORCEHALFTONE: u32 = 0x400;
pub const FPDF_PRINTING: u32 = 0x800;
pub const FPDF_RENDER_NO_SMOOTHTEXT: u32 = 0x1000;
pub const FPDF_RENDER_NO_SMOOTHIMAGE: u32 = 0x2000;
pub const FPDF_RENDER_NO_SMOOTHPATH: u32 = 0x4000;

// Search flags
pub const FPDF_MATCHCASE: u32 = 0x0001;
pub const FPDF_MATCHWHOLEWORD: u32 = 0x0002;
pub const FPDF_CONSECUTIVE: u32 = 0x0004;

// Page additional actions
pub const FPDFPAGE_AACTION_OPEN: u32 = 0;
pub const FPDFPAGE_AACTION_CLOSE: u32 = 1;

// Document additional actions
pub const FPDFDOC_AACTION_WC: u32 = 0x10;
pub const FPDFDOC_AACTION_WS: u32 = 0x11;
pub const FPDFDOC_AACTION_DS: u32 = 0x12;
pub const FPDFDOC_AACTION_WP: u32 = 0x13;
pub const FPDFDOC_AACTION_DP: u32 = 0x14;

// Save flags
pub const FPDF_INCREMENTAL: u32 = 1;
pub const FPDF_NO_INCREMENTAL: u32 = 2;
pub const FPDF_REMOVE_SECURITY: u32 = 3;

// Form field types for highlight configuration
pub const FPDF_FORMFIELD_UNKNOWN: u32 = 0;

// ========================================
// Entry points
// ========================================

#[cfg(feature = "link")]
extern "C" {
    pub fn FPDF_InitLibrary();
    pub fn FPDF_DestroyLibrary();
    pub fn FPDF_GetLastError() -> c_ulong;

    pub fn FPDF_LoadCustomDocument(
        pFileAccess: *mut FPDF_FILEACCESS,
        password: FPDF_BYTESTRING,
    ) -> FPDF_DOCUMENT;
    pub fn FPDF_CloseDocument(document: FPDF_DOCUMENT);
    pub fn FPDF_GetDocPermissions(document: FPDF_DOCUMENT) -> c_ulong;
    pub fn FPDF_GetPageCount(document: FPDF_DOCUMENT) -> c_int;
    pub fn FPDF_GetPageSizeByIndex(
        document: FPDF_DOCUMENT,
        page_index: c_int,
        width: *mut c_double,
        height: *mut c_double,
    ) -> c_int;
    pub fn FPDF_GetMetaText(
        document: FPDF_DOCUMENT,
        tag: FPDF_BYTESTRING,
        buffer: *mut c_void,
        buflen: c_ulong,
    ) -> c_ulong;
    pub fn FPDF_SaveAsCopy(
        document: FPDF_DOCUMENT,
        pFileWrite: *mut FPDF_FILEWRITE,
        flags: FPDF_DWORD,
    ) -> FPDF_BOOL;

    pub fn FPDF_LoadPage(document: FPDF_DOCUMENT, page_index: c_int) -> FPDF_PAGE;
    pub fn FPDF_ClosePage(page: FPDF_PAGE);
    pub fn FPDF_GetPageWidth(page: FPDF_PAGE) -> c_double;
    pub fn FPDF_GetPageHeight(page: FPDF_PAGE) -> c_double;
    pub fn FPDFPage_GetRotation(page: FPDF_PAGE) -> c_int;
    pub fn FPDFPage_SetRotation(page: FPDF_PAGE, rotate: c_int);
    pub fn FPDFPage_Delete(document: FPDF_DOCUMENT, page_index: c_int);

    pub fn FPDF_RenderPageBitmap(
        bitmap: FPDF_BITMAP,
        page: FPDF_PAGE,
        start_x: c_int,
        start_y: c_int,
        size_x: c_int,
        size_y: c_int,
        rotate: c_int,
        flags: c_int,
    );
    pub fn FPDF_PageToDevice(
        page: FPDF_PAGE,
        start_x: c_int,
        start_y: c_int,
        size_x: c_int,
        size_y: c_int,
        rotate: c_int,
        page_x: c_double,
        page_y: c_double,
        device_x: *mut c_int,
        device_y: *mut c_int,
    ) -> FPDF_BOOL;
    pub fn FPDF_DeviceToPage(
        page: FPDF_PAGE,
        start_x: c_int,
        start_y: c_int,
        size_x: c_int,
        size_y: c_int,
        rotate: c_int,
        device_x: c_int,
        device_y: c_int,
        page_x: *mut c_double,
        page_y: *mut c_double,
    ) -> FPDF_BOOL;

    pub fn FPDFText_LoadPage(page: FPDF_PAGE) -> FPDF_TEXTPAGE;
    pub fn FPDFText_ClosePage(text_page: FPDF_TEXTPAGE);
    pub fn FPDFText_CountChars(text_page: FPDF_TEXTPAGE) -> c_int;
    pub fn FPDFText_GetText(
        text_page: FPDF_TEXTPAGE,
        start_index: c_int,
        count: c_int,
        result: *mut c_ushort,
    ) -> c_int;
    pub fn FPDFText_GetCharBox(
        text_page: FPDF_TEXTPAGE,
        index: c_int,
        left: *mut c_double,
        right: *mut c_double,
        bottom: *mut c_double,
        top: *mut c_double,
    ) -> FPDF_BOOL;
    pub fn FPDFText_FindStart(
        text_page: FPDF_TEXTPAGE,
        findwhat: FPDF_WIDESTRING,
        flags: c_ulong,
        start_index: c_int,
    ) -> FPDF_SCHHANDLE;
    pub fn FPDFText_FindNext(handle: FPDF_SCHHANDLE) -> FPDF_BOOL;
    pub fn FPDFText_GetSchResultIndex(handle: FPDF_SCHHANDLE) -> c_int;
    pub fn FPDFText_GetSchCount(handle: FPDF_SCHHANDLE) -> c_int;
    pub fn FPDFText_FindClose(handle: FPDF_SCHHANDLE);

    pub fn FPDFDOC_InitFormFillEnvironment(
        document: FPDF_DOCUMENT,
        formInfo: *mut FPDF_FORMFILLINFO,
    ) -> FPDF_FORMHANDLE;
    pub fn FPDFDOC_ExitFormFillEnvironment(hHandle: FPDF_FORMHANDLE);
    pub fn FPDF_SetFormFieldHighlightColor(hHandle: FPDF_FORMHANDLE, fieldType: c_int, color: c_ulong);
    pub fn FPDF_SetFormFieldHighlightAlpha(hHandle: FPDF_FORMHANDLE, alpha: c_uchar);
    pub fn FORM_DoDocumentJSAction(hHandle: FPDF_FORMHANDLE);
    pub fn FORM_DoDocumentOpenAction(hHandle: FPDF_FORMHANDLE);
    pub fn FORM_DoDocumentAAction(hHandle: FPDF_FORMHANDLE, aaType: c_int);
    pub fn FORM_OnAfterLoadPage(page: FPDF_PAGE, hHandle: FPDF_FORMHANDLE);
    pub fn FORM_OnBeforeClosePage(page: FPDF_PAGE, hHandle: FPDF_FORMHANDLE);
    pub fn FORM_DoPageAAction(page: FPDF_PAGE, hHandle: FPDF_FORMHANDLE, aaType: c_int);
    pub fn FPDF_FFLDraw(
        hHandle: FPDF_FORMHANDLE,
        bitmap: FPDF_BITMAP,
        page: FPDF_PAGE,
        start_x: c_int,
        start_y: c_int,
        size_x: c_int,
        size_y: c_int,
        rotate: c_int,
        flags: c_int,
    );

    pub fn FPDFBookmark_GetFirstChild(
        document: FPDF_DOCUMENT,
        bookmark: FPDF_BOOKMARK,
    ) -> FPDF_BOOKMARK;
    pub fn FPDFBookmark_GetNextSibling(
        document: FPDF_DOCUMENT,
        bookmark: FPDF_BOOKMARK,
    ) -> FPDF_BOOKMARK;
    pub fn FPDFBookmark_GetTitle(
        bookmark: FPDF_BOOKMARK,
        buffer: *mut c_void,
        buflen: c_ulong,
    ) -> c_ulong;
    pub fn FPDFBookmark_GetDest(document: FPDF_DOCUMENT, bookmark: FPDF_BOOKMARK) -> FPDF_DEST;
    pub fn FPDFDest_GetPageIndex(document: FPDF_DOCUMENT, dest: FPDF_DEST) -> c_int;
}
