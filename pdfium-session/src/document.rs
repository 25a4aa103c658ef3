//! PDF document session
//!
//! A [`PdfDocument`] owns one native document, its form-fill environment and
//! the stream PDFium reads the file from. Every page-level operation loads
//! the page for the duration of the call only (see `page_scope`).
//!
//! Teardown happens in exactly one place, [`PdfDocument::close`], in a fixed
//! order: form environment, document, pinned callback structures, stream,
//! registry entry. After that every operation returns
//! [`PdfError::Disposed`].

use crate::bookmark::{read_outline, PdfBookmark};
use crate::config::PdfiumConfig;
use crate::error::{PdfError, Result};
use crate::geometry::{
    DevicePoint, DeviceRect, DeviceViewport, PdfPageSize, PdfPoint, PdfRect, PdfRotation,
};
use crate::handle::{BitmapHandle, DocumentHandle, FormHandle};
use crate::library::Library;
use crate::metadata::{decode_utf16le, parse_pdf_date, tags};
use crate::page_scope::PageScope;
use crate::render::PdfRenderConfig;
use crate::search::{
    merge_char_boxes, search_page, PdfMatches, PdfRectangle, PdfSearchOptions, PdfTextSpan,
};
use crate::stream::{file_access, stream_len, SharedStream, StreamId, StreamRegistry};
use chrono::{DateTime, FixedOffset};
use pdfium_sys::{
    FPDFDOC_AACTION_WC, FPDF_FILEACCESS, FPDF_FILEWRITE, FPDF_FORMFIELD_UNKNOWN,
    FPDF_FORMFILLINFO, FPDF_NO_INCREMENTAL,
};
use std::ffi::CString;
use std::io::{self, Write};
use std::os::raw::{c_int, c_ulong, c_void};
use std::sync::{Arc, PoisonError};
use tracing::{debug, warn};

/// Native resources of an open document. Dropped only by `close`.
struct DocumentState {
    handle: DocumentHandle,
    form: FormHandle,
    // PDFium keeps pointers to both structures until the handles above are
    // released.
    form_info: Option<Box<FPDF_FORMFILLINFO>>,
    file_access: Box<FPDF_FILEACCESS>,
    stream: SharedStream,
    stream_id: StreamId,
    permissions: u32,
}

/// An open PDF document.
///
/// `PdfDocument` can be moved to another thread but not shared between
/// threads: the engine does not support concurrent calls on one document.
/// Wrap it in a `Mutex` to share it.
pub struct PdfDocument {
    library: Arc<Library>,
    state: Option<DocumentState>,
}

// SAFETY: the raw pointers inside DocumentState (callback context and
// pinned form-fill info) are only touched by the engine during calls made
// through this document, and `&self` access is confined to one thread
// because the type is not `Sync`.
unsafe impl Send for PdfDocument {}

impl PdfDocument {
    pub(crate) fn open(
        library: Arc<Library>,
        config: PdfiumConfig,
        stream: SharedStream,
        password: Option<&str>,
    ) -> Result<Self> {
        let engine = library.engine();

        let password = password
            .map(CString::new)
            .transpose()
            .map_err(|_| PdfError::InvalidParameter("password contains a NUL byte".to_string()))?;

        let len = {
            let mut reader = stream.lock().unwrap_or_else(PoisonError::into_inner);
            stream_len(&mut *reader)?
        };

        let stream_id = StreamRegistry::register(Arc::clone(&stream));
        let mut access = match file_access(stream_id, len) {
            Ok(access) => access,
            Err(e) => {
                StreamRegistry::unregister(stream_id);
                return Err(e);
            }
        };

        // SAFETY: the access block is boxed and moved into DocumentState
        // below, which outlives the native document.
        let handle = unsafe { engine.load_custom_document(access.as_mut(), password.as_deref()) };
        if handle.is_null() {
            let code = engine.get_last_error();
            StreamRegistry::unregister(stream_id);
            debug!(%stream_id, code, "failed to open document");
            return Err(PdfError::open_failed(code));
        }

        let permissions = engine.get_doc_permissions(handle);

        let (form, form_info) = if config.forms() {
            init_form_environment(&library, handle, &config)
        } else {
            (FormHandle::NULL, None)
        };

        debug!(%stream_id, bytes = len, permissions, forms = !form.is_null(), "document opened");

        Ok(Self {
            library,
            state: Some(DocumentState {
                handle,
                form,
                form_info,
                file_access: access,
                stream,
                stream_id,
                permissions,
            }),
        })
    }

    fn state(&self) -> Result<&DocumentState> {
        self.state.as_ref().ok_or(PdfError::Disposed)
    }

    fn scope(&self, index: usize) -> Result<PageScope<'_>> {
        let state = self.state()?;
        PageScope::acquire(self.library.engine(), state.handle, state.form, index)
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }

    /// Registry id of the backing stream while the document is open.
    pub fn stream_id(&self) -> Option<StreamId> {
        self.state.as_ref().map(|state| state.stream_id)
    }

    /// Whether a form-fill environment could be created for this document.
    ///
    /// When it could not, form widgets are not drawn and form actions are
    /// skipped; everything else works normally.
    pub fn forms_available(&self) -> bool {
        self.state.as_ref().is_some_and(|state| !state.form.is_null())
    }

    /// Document permission flags (`FPDF_GetDocPermissions`).
    pub fn permissions(&self) -> Result<u32> {
        Ok(self.state()?.permissions)
    }

    // ========================================
    // Pages
    // ========================================

    /// Number of pages.
    pub fn page_count(&self) -> Result<usize> {
        let state = self.state()?;
        Ok(self.library.engine().get_page_count(state.handle).max(0) as usize)
    }

    /// Size of one page in points, without loading its content.
    pub fn page_size(&self, index: usize) -> Result<PdfPageSize> {
        let state = self.state()?;
        let raw_index = i32::try_from(index).map_err(|_| PdfError::PageLoadFailed { index })?;
        let (width, height) = self
            .library
            .engine()
            .get_page_size_by_index(state.handle, raw_index)
            .ok_or(PdfError::PageLoadFailed { index })?;
        Ok(PdfPageSize::new(width as f32, height as f32))
    }

    /// Sizes of all pages, in page order.
    pub fn page_sizes(&self) -> Result<Vec<PdfPageSize>> {
        (0..self.page_count()?)
            .map(|index| self.page_size(index))
            .collect()
    }

    /// Current rotation of a page.
    pub fn page_rotation(&self, index: usize) -> Result<PdfRotation> {
        let scope = self.scope(index)?;
        Ok(PdfRotation::from_raw(
            scope.engine().page_get_rotation(scope.page()),
        ))
    }

    /// Set the rotation of a page.
    pub fn rotate_page(&mut self, index: usize, rotation: PdfRotation) -> Result<()> {
        let scope = self.scope(index)?;
        scope
            .engine()
            .page_set_rotation(scope.page(), rotation.as_raw());
        Ok(())
    }

    /// Remove a page from the document.
    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        let count = self.page_count()?;
        let state = self.state()?;
        let raw_index = i32::try_from(index).ok().filter(|_| index < count).ok_or_else(|| {
            PdfError::InvalidParameter(format!(
                "page index {index} out of range (document has {count} pages)"
            ))
        })?;
        self.library.engine().page_delete(state.handle, raw_index);
        debug!(index, "page deleted");
        Ok(())
    }

    // ========================================
    // Rendering
    // ========================================

    /// Render a page into a bitmap the caller allocated.
    ///
    /// When form data is requested and the document has a form environment,
    /// widgets are drawn as a second layer and left out of the page render
    /// itself.
    pub fn render_to_bitmap(
        &self,
        index: usize,
        bitmap: BitmapHandle,
        config: &PdfRenderConfig,
    ) -> Result<()> {
        let state = self.state()?;
        if bitmap.is_null() {
            return Err(PdfError::RenderFailed {
                reason: "null bitmap handle".to_string(),
            });
        }

        let scope = self.scope(index)?;
        let viewport = config.viewport(scope.size())?;
        let draw_forms = config.renders_form_data() && !state.form.is_null();
        let flags = config.page_flags(draw_forms).bits();

        let engine = scope.engine();
        engine.render_page_bitmap(bitmap, scope.page(), &viewport, flags);
        if draw_forms {
            engine.ffl_draw(state.form, bitmap, scope.page(), &viewport, flags);
        }
        Ok(())
    }

    // ========================================
    // Coordinate transforms
    // ========================================

    fn viewport(scope: &PageScope<'_>, rotation: PdfRotation) -> DeviceViewport {
        DeviceViewport::for_page(scope.size(), rotation)
    }

    fn to_device(
        scope: &PageScope<'_>,
        viewport: &DeviceViewport,
        x: f32,
        y: f32,
    ) -> Result<DevicePoint> {
        let (dx, dy) = scope
            .engine()
            .page_to_device(scope.page(), viewport, x as f64, y as f64)
            .ok_or_else(|| transform_failed(scope.index()))?;
        Ok(DevicePoint::new(dx, dy))
    }

    fn to_pdf(
        scope: &PageScope<'_>,
        viewport: &DeviceViewport,
        x: i32,
        y: i32,
    ) -> Result<PdfPoint> {
        let (px, py) = scope
            .engine()
            .device_to_page(scope.page(), viewport, x, y)
            .ok_or_else(|| transform_failed(scope.index()))?;
        Ok(PdfPoint::new(px as f32, py as f32))
    }

    /// Map a point in PDF user space to the page's device grid (one pixel per
    /// point, origin top-left).
    pub fn device_from_pdf(&self, page: usize, point: PdfPoint) -> Result<DevicePoint> {
        self.device_from_pdf_rotated(page, point, PdfRotation::None)
    }

    /// [`device_from_pdf`](Self::device_from_pdf) with the page displayed at
    /// `rotation`.
    pub fn device_from_pdf_rotated(
        &self,
        page: usize,
        point: PdfPoint,
        rotation: PdfRotation,
    ) -> Result<DevicePoint> {
        let scope = self.scope(page)?;
        let viewport = Self::viewport(&scope, rotation);
        Self::to_device(&scope, &viewport, point.x, point.y)
    }

    /// Map a device point back to PDF user space.
    pub fn pdf_from_device(&self, page: usize, point: DevicePoint) -> Result<PdfPoint> {
        self.pdf_from_device_rotated(page, point, PdfRotation::None)
    }

    /// [`pdf_from_device`](Self::pdf_from_device) with the page displayed at
    /// `rotation`.
    pub fn pdf_from_device_rotated(
        &self,
        page: usize,
        point: DevicePoint,
        rotation: PdfRotation,
    ) -> Result<PdfPoint> {
        let scope = self.scope(page)?;
        let viewport = Self::viewport(&scope, rotation);
        Self::to_pdf(&scope, &viewport, point.x, point.y)
    }

    /// Map a PDF rectangle to device space by transforming its top-left and
    /// bottom-right corners independently.
    ///
    /// The result is not normalised: under rotation the corners can swap.
    pub fn device_rect_from_pdf(&self, page: usize, rect: PdfRect) -> Result<DeviceRect> {
        self.device_rect_from_pdf_rotated(page, rect, PdfRotation::None)
    }

    pub fn device_rect_from_pdf_rotated(
        &self,
        page: usize,
        rect: PdfRect,
        rotation: PdfRotation,
    ) -> Result<DeviceRect> {
        let scope = self.scope(page)?;
        let viewport = Self::viewport(&scope, rotation);
        let top_left = Self::to_device(&scope, &viewport, rect.left, rect.top)?;
        let bottom_right = Self::to_device(&scope, &viewport, rect.right, rect.bottom)?;
        Ok(DeviceRect::new(
            top_left.x,
            top_left.y,
            bottom_right.x,
            bottom_right.y,
        ))
    }

    /// Map a device rectangle to PDF user space corner by corner. The result
    /// is not normalised.
    pub fn pdf_rect_from_device(&self, page: usize, rect: DeviceRect) -> Result<PdfRect> {
        self.pdf_rect_from_device_rotated(page, rect, PdfRotation::None)
    }

    pub fn pdf_rect_from_device_rotated(
        &self,
        page: usize,
        rect: DeviceRect,
        rotation: PdfRotation,
    ) -> Result<PdfRect> {
        let scope = self.scope(page)?;
        let viewport = Self::viewport(&scope, rotation);
        let top_left = Self::to_pdf(&scope, &viewport, rect.left, rect.top)?;
        let bottom_right = Self::to_pdf(&scope, &viewport, rect.right, rect.bottom)?;
        Ok(PdfRect::new(
            top_left.x,
            top_left.y,
            bottom_right.x,
            bottom_right.y,
        ))
    }

    // ========================================
    // Text
    // ========================================

    /// All text on a page.
    pub fn page_text(&self, index: usize) -> Result<String> {
        let scope = self.scope(index)?;
        Ok(scope.text(0, scope.char_count()))
    }

    /// The characters covered by `span`. A span running past the end of the
    /// page stops at its last character.
    pub fn span_text(&self, span: &PdfTextSpan) -> Result<String> {
        let scope = self.scope(span.page)?;
        Ok(scope.text(span.offset, span.length))
    }

    /// Search pages `start_page..=end_page` for `query`.
    ///
    /// An empty or missing query yields no matches. The page range is
    /// clamped to the document; a range that starts after it ends is empty.
    pub fn search(
        &self,
        query: Option<&str>,
        options: PdfSearchOptions,
        start_page: usize,
        end_page: usize,
    ) -> Result<PdfMatches> {
        self.state()?;

        let count = self.page_count()?;
        let last = end_page.min(count.saturating_sub(1));
        let query = match query {
            Some(query) if !query.is_empty() => query,
            _ => return Ok(PdfMatches::new(start_page, last, Vec::new())),
        };
        if count == 0 || start_page > last {
            return Ok(PdfMatches::new(start_page, last, Vec::new()));
        }

        let pattern: Vec<u16> = query.encode_utf16().chain(std::iter::once(0)).collect();
        let flags = options.to_flags();

        let mut items = Vec::new();
        for page in start_page..=last {
            let scope = self.scope(page)?;
            items.extend(search_page(&scope, &pattern, flags));
        }

        debug!(start_page, end_page = last, matches = items.len(), "search finished");
        Ok(PdfMatches::new(start_page, last, items))
    }

    /// Search every page.
    pub fn search_all(&self, query: Option<&str>, options: PdfSearchOptions) -> Result<PdfMatches> {
        self.search(query, options, 0, usize::MAX)
    }

    /// Highlight rectangles for a span, one per visually contiguous run of
    /// glyphs. The span is clamped to the page's text layer.
    pub fn text_bounds(&self, span: &PdfTextSpan) -> Result<Vec<PdfRectangle>> {
        let scope = self.scope(span.page)?;
        let end = span.offset + scope.clamp_len(span.offset, span.length);
        let boxes = (span.offset..end).filter_map(|index| scope.char_box(index));
        Ok(merge_char_boxes(span.page, boxes))
    }

    // ========================================
    // Metadata
    // ========================================

    /// Value of an info dictionary entry. `None` if absent or empty.
    pub fn meta_text(&self, tag: &str) -> Result<Option<String>> {
        let state = self.state()?;
        let Ok(c_tag) = CString::new(tag) else {
            return Ok(None);
        };
        let engine = self.library.engine();

        // Length includes the UTF-16 terminator.
        let len = engine.get_meta_text(state.handle, &c_tag, &mut []);
        if len <= 2 {
            return Ok(None);
        }

        let mut buffer = vec![0u8; len];
        engine.get_meta_text(state.handle, &c_tag, &mut buffer);
        let value = decode_utf16le(&buffer);
        Ok((!value.is_empty()).then_some(value))
    }

    /// An info dictionary date. `None` if absent or unparseable.
    pub fn meta_date(&self, tag: &str) -> Result<Option<DateTime<FixedOffset>>> {
        Ok(self
            .meta_text(tag)?
            .and_then(|value| parse_pdf_date(&value)))
    }

    pub fn title(&self) -> Result<Option<String>> {
        self.meta_text(tags::TITLE)
    }

    pub fn author(&self) -> Result<Option<String>> {
        self.meta_text(tags::AUTHOR)
    }

    pub fn subject(&self) -> Result<Option<String>> {
        self.meta_text(tags::SUBJECT)
    }

    pub fn keywords(&self) -> Result<Option<String>> {
        self.meta_text(tags::KEYWORDS)
    }

    pub fn creator(&self) -> Result<Option<String>> {
        self.meta_text(tags::CREATOR)
    }

    pub fn producer(&self) -> Result<Option<String>> {
        self.meta_text(tags::PRODUCER)
    }

    pub fn creation_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.meta_date(tags::CREATION_DATE)
    }

    pub fn modification_date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.meta_date(tags::MOD_DATE)
    }

    /// The document outline.
    pub fn bookmarks(&self) -> Result<Vec<PdfBookmark>> {
        let state = self.state()?;
        Ok(read_outline(self.library.engine(), state.handle))
    }

    // ========================================
    // Saving
    // ========================================

    /// Write a complete copy of the document (non-incremental).
    pub fn save_to_writer(&self, writer: &mut dyn Write) -> Result<()> {
        let state = self.state()?;

        #[repr(C)]
        struct WriterBridge<'w> {
            // Must stay first: PDFium sees only this prefix.
            base: FPDF_FILEWRITE,
            sink: &'w mut dyn Write,
            error: Option<io::Error>,
        }

        unsafe extern "C" fn write_block(
            this: *mut FPDF_FILEWRITE,
            data: *const c_void,
            size: c_ulong,
        ) -> c_int {
            let bridge = &mut *(this as *mut WriterBridge<'_>);
            if size == 0 {
                return 1;
            }
            if data.is_null() {
                return 0;
            }
            let bytes = std::slice::from_raw_parts(data as *const u8, size as usize);
            match bridge.sink.write_all(bytes) {
                Ok(()) => 1,
                Err(e) => {
                    bridge.error = Some(e);
                    0
                }
            }
        }

        let mut bridge = WriterBridge {
            base: FPDF_FILEWRITE {
                version: 1,
                WriteBlock: Some(write_block),
            },
            sink: writer,
            error: None,
        };

        // SAFETY: bridge lives on this frame for the whole call and starts
        // with the FPDF_FILEWRITE the callback casts back from.
        let ok = unsafe {
            self.library.engine().save_as_copy(
                state.handle,
                &mut bridge as *mut WriterBridge<'_> as *mut FPDF_FILEWRITE,
                FPDF_NO_INCREMENTAL,
            )
        };

        if let Some(e) = bridge.error.take() {
            return Err(PdfError::SaveFailed {
                reason: format!("write failed: {e}"),
            });
        }
        if !ok {
            return Err(PdfError::SaveFailed {
                reason: "FPDF_SaveAsCopy returned false".to_string(),
            });
        }
        bridge.sink.flush()?;
        Ok(())
    }

    /// Save the document to a byte vector.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save_to_writer(&mut buffer)?;
        Ok(buffer)
    }

    // ========================================
    // Lifetime
    // ========================================

    /// Release every native resource. Safe to call more than once; also run
    /// on drop.
    pub fn close(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let engine = self.library.engine();

        if !state.form.is_null() {
            engine.form_do_document_aaction(state.form, FPDFDOC_AACTION_WC);
            engine.exit_form_fill_environment(state.form);
        }
        engine.close_document(state.handle);

        let DocumentState {
            form_info,
            file_access,
            stream,
            stream_id,
            ..
        } = state;
        drop(form_info);
        drop(file_access);
        drop(stream);
        StreamRegistry::unregister(stream_id);

        debug!(%stream_id, "document closed");
    }
}

impl Drop for PdfDocument {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("stream_id", &self.stream_id())
            .field("forms_available", &self.forms_available())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Create the form-fill environment, trying interface version 1 and then 2
/// (which one works depends on whether the engine was built with XFA).
fn init_form_environment(
    library: &Library,
    document: DocumentHandle,
    config: &PdfiumConfig,
) -> (FormHandle, Option<Box<FPDF_FORMFILLINFO>>) {
    let engine = library.engine();
    let mut info = Box::new(FPDF_FORMFILLINFO::with_version(1));

    for version in 1..=2 {
        info.version = version;
        // SAFETY: info is boxed and kept in DocumentState until after
        // exit_form_fill_environment.
        let form = unsafe { engine.init_form_fill_environment(document, info.as_mut()) };
        if !form.is_null() {
            engine.set_form_field_highlight_color(
                form,
                FPDF_FORMFIELD_UNKNOWN as i32,
                config.highlight_color(),
            );
            engine.set_form_field_highlight_alpha(form, config.highlight_alpha());
            engine.form_do_document_js_action(form);
            engine.form_do_document_open_action(form);
            debug!(version, "form environment initialized");
            return (form, Some(info));
        }
    }

    warn!("form environment unavailable, form filling disabled");
    (FormHandle::NULL, None)
}

fn transform_failed(page: usize) -> PdfError {
    PdfError::InvalidParameter(format!("coordinate transform failed on page {page}"))
}
