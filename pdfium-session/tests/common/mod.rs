//! In-memory PDF engine for integration tests.
//!
//! `FakeEngine` implements the whole function table over a JSON "document"
//! format. Documents are pulled through the real `FPDF_FILEACCESS` callback
//! in small blocks, at open and again whenever a text layer is loaded, so
//! every test exercises the stream bridge. Calls that matter for ordering are
//! recorded in a log.

#![allow(dead_code)]

use pdfium_session::sys::{
    FPDF_FILEACCESS, FPDF_FILEWRITE, FPDF_FORMFILLINFO, FPDF_ERR_FILE, FPDF_ERR_FORMAT,
    FPDF_ERR_PASSWORD, FPDF_ERR_SECURITY, FPDF_ERR_SUCCESS, FPDF_MATCHCASE,
    FPDF_MATCHWHOLEWORD,
};
use pdfium_session::{
    BitmapHandle, BookmarkHandle, CharBox, DestHandle, DeviceViewport, DocumentHandle,
    FormHandle, PageHandle, PdfDocument, Pdfium, PdfiumApi, PdfiumConfig, PdfRotation,
    SearchHandle, TextPageHandle,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::ffi::CStr;
use std::os::raw::{c_ulong, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};

/// File signature every fake document starts with.
pub const MAGIC: &[u8] = b"%FAKEPDF-1\n";

/// Block size used when pulling bytes through the stream bridge.
const READ_CHUNK: usize = 13;
const WRITE_CHUNK: usize = 64;

/// Glyph advance and width used by [`FakePage::with_text`].
pub const GLYPH_ADVANCE: f64 = 6.0;
pub const GLYPH_WIDTH: f64 = 5.0;
pub const LINE_HEIGHT: f64 = 14.0;
pub const TEXT_LEFT: f64 = 72.0;
pub const TEXT_BASELINE: f64 = 700.0;

static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(0x1000);

thread_local! {
    static LAST_ERROR: Cell<u32> = const { Cell::new(FPDF_ERR_SUCCESS) };
}

fn next_handle() -> usize {
    NEXT_HANDLE.fetch_add(0x10, Ordering::Relaxed)
}

fn set_last_error(code: u32) {
    LAST_ERROR.with(|error| error.set(code));
}

// ========================================
// Fixture format
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeGlyph {
    pub ch: char,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakePage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: i32,
    #[serde(default)]
    pub glyphs: Vec<FakeGlyph>,
    /// Text layer fails to load.
    #[serde(default)]
    pub broken_text_layer: bool,
}

impl FakePage {
    /// An empty US Letter page.
    pub fn blank() -> Self {
        Self::sized(612.0, 792.0)
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rotation: 0,
            glyphs: Vec::new(),
            broken_text_layer: false,
        }
    }

    /// A Letter page with `text` laid out left to right from the top margin.
    ///
    /// Spaces and line breaks get zero-area boxes; every other glyph is
    /// `GLYPH_WIDTH` wide on a `GLYPH_ADVANCE` pitch.
    pub fn with_text(text: &str) -> Self {
        let mut page = Self::blank();
        let mut x = TEXT_LEFT;
        let mut baseline = TEXT_BASELINE;
        for ch in text.chars() {
            let glyph = match ch {
                '\n' | ' ' => FakeGlyph::empty(ch, x, baseline),
                _ => FakeGlyph {
                    ch,
                    left: x,
                    right: x + GLYPH_WIDTH,
                    bottom: baseline - 2.0,
                    top: baseline + 8.0,
                },
            };
            page.glyphs.push(glyph);
            if ch == '\n' {
                x = TEXT_LEFT;
                baseline -= LINE_HEIGHT;
            } else {
                x += GLYPH_ADVANCE;
            }
        }
        page
    }

    pub fn rotated(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn broken_text_layer(mut self) -> Self {
        self.broken_text_layer = true;
        self
    }

    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }

    /// Width and height as displayed, after the page's own rotation.
    fn effective_size(&self) -> (f64, f64) {
        if self.rotation.rem_euclid(2) == 1 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

impl FakeGlyph {
    fn empty(ch: char, x: f64, baseline: f64) -> Self {
        Self {
            ch,
            left: x,
            right: x,
            bottom: baseline,
            top: baseline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeBookmark {
    pub title: String,
    pub page: Option<i32>,
    #[serde(default)]
    pub children: Vec<FakeBookmark>,
}

impl FakeBookmark {
    pub fn new(title: &str, page: Option<i32>) -> Self {
        Self {
            title: title.to_string(),
            page,
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: FakeBookmark) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakePdf {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub unsupported_security: bool,
    /// The FORMFILLINFO version the engine accepts, if any.
    #[serde(default)]
    pub form_version: Option<i32>,
    #[serde(default)]
    pub permissions: u32,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub pages: Vec<FakePage>,
    #[serde(default)]
    pub bookmarks: Vec<FakeBookmark>,
}

impl Default for FakePdf {
    fn default() -> Self {
        Self {
            password: None,
            unsupported_security: false,
            form_version: Some(1),
            permissions: 0xFFFF_FFFC,
            meta: BTreeMap::new(),
            pages: Vec::new(),
            bookmarks: Vec::new(),
        }
    }
}

impl FakePdf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: FakePage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn text_page(self, text: &str) -> Self {
        self.page(FakePage::with_text(text))
    }

    pub fn meta(mut self, tag: &str, value: &str) -> Self {
        self.meta.insert(tag.to_string(), value.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn unsupported_security(mut self) -> Self {
        self.unsupported_security = true;
        self
    }

    pub fn form_version(mut self, version: Option<i32>) -> Self {
        self.form_version = version;
        self
    }

    pub fn bookmark(mut self, bookmark: FakeBookmark) -> Self {
        self.bookmarks.push(bookmark);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend(serde_json::to_vec(self).expect("fixture serialises"));
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let body = bytes.strip_prefix(MAGIC)?;
        serde_json::from_slice(body).ok()
    }
}

// ========================================
// Engine
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderLayer {
    Page,
    Forms,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCall {
    pub layer: RenderLayer,
    pub bitmap: BitmapHandle,
    pub page_index: usize,
    pub viewport: DeviceViewport,
    pub flags: u32,
}

struct FakeDoc {
    pdf: FakePdf,
    // FPDF_FILEACCESS the document was opened with; read again lazily.
    access: usize,
}

struct FakeSearch {
    text_page: usize,
    hits: Vec<(usize, usize)>,
    next: usize,
    current: Option<(usize, usize)>,
}

#[derive(Default)]
struct FakeState {
    init_calls: usize,
    destroy_calls: usize,
    char_box_calls: usize,
    docs: HashMap<usize, FakeDoc>,
    pages: HashMap<usize, (usize, usize)>,
    text_pages: HashMap<usize, usize>,
    forms: HashMap<usize, usize>,
    searches: HashMap<usize, FakeSearch>,
    bookmarks: HashMap<usize, (usize, Vec<usize>)>,
    dests: HashMap<usize, i32>,
    form_versions_tried: Vec<i32>,
    highlight: Option<(i32, u32)>,
    highlight_alpha: Option<u8>,
    renders: Vec<RenderCall>,
    log: Vec<String>,
}

impl FakeState {
    fn page(&self, page: PageHandle) -> Option<&FakePage> {
        let (doc, index) = self.pages.get(&page.as_raw())?;
        self.docs.get(doc)?.pdf.pages.get(*index)
    }

    fn page_mut(&mut self, page: PageHandle) -> Option<&mut FakePage> {
        let (doc, index) = *self.pages.get(&page.as_raw())?;
        self.docs.get_mut(&doc)?.pdf.pages.get_mut(index)
    }

    fn glyphs(&self, text_page: TextPageHandle) -> &[FakeGlyph] {
        self.text_pages
            .get(&text_page.as_raw())
            .and_then(|page| self.page(PageHandle::from_raw(*page)))
            .map(|page| page.glyphs.as_slice())
            .unwrap_or(&[])
    }

    fn bookmark_node(&self, document: DocumentHandle, path: &[usize]) -> Option<&FakeBookmark> {
        let doc = self.docs.get(&document.as_raw())?;
        let (first, rest) = path.split_first()?;
        let mut node = doc.pdf.bookmarks.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    fn allocate_bookmark(&mut self, document: DocumentHandle, path: Vec<usize>) -> BookmarkHandle {
        if self.bookmark_node(document, &path).is_none() {
            return BookmarkHandle::NULL;
        }
        let handle = next_handle();
        self.bookmarks.insert(handle, (document.as_raw(), path));
        BookmarkHandle::from_raw(handle)
    }
}

/// In-memory stand-in for the native engine.
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
}

impl FakeEngine {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, entry: impl Into<String>) {
        self.state().log.push(entry.into());
    }

    pub fn init_calls(&self) -> usize {
        self.state().init_calls
    }

    pub fn destroy_calls(&self) -> usize {
        self.state().destroy_calls
    }

    /// Number of `text_get_char_box` calls so far.
    pub fn char_box_calls(&self) -> usize {
        self.state().char_box_calls
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().log.clone()
    }

    pub fn clear_calls(&self) {
        self.state().log.clear();
    }

    pub fn open_documents(&self) -> usize {
        self.state().docs.len()
    }

    pub fn open_pages(&self) -> usize {
        self.state().pages.len()
    }

    pub fn open_text_pages(&self) -> usize {
        self.state().text_pages.len()
    }

    pub fn open_searches(&self) -> usize {
        self.state().searches.len()
    }

    pub fn open_forms(&self) -> usize {
        self.state().forms.len()
    }

    pub fn form_versions_tried(&self) -> Vec<i32> {
        self.state().form_versions_tried.clone()
    }

    pub fn highlight(&self) -> Option<(i32, u32, u8)> {
        let state = self.state();
        let (field_type, color) = state.highlight?;
        Some((field_type, color, state.highlight_alpha?))
    }

    pub fn renders(&self) -> Vec<RenderCall> {
        self.state().renders.clone()
    }

    /// Pull `len` bytes through a document's file access in small blocks.
    ///
    /// # Safety
    ///
    /// `access` must point to a live `FPDF_FILEACCESS`.
    unsafe fn read_through(access: *const FPDF_FILEACCESS, len: usize) -> Option<Vec<u8>> {
        let access = &*access;
        let get_block = access.m_GetBlock?;
        let mut bytes = vec![0u8; len];
        let mut position = 0;
        while position < len {
            let size = READ_CHUNK.min(len - position);
            let ok = get_block(
                access.m_Param,
                position as c_ulong,
                bytes[position..].as_mut_ptr(),
                size as c_ulong,
            );
            if ok == 0 {
                return None;
            }
            position += size;
        }
        Some(bytes)
    }
}

fn find_hits(chars: &[char], pattern: &[char], flags: u32) -> Vec<(usize, usize)> {
    let match_case = flags & FPDF_MATCHCASE != 0;
    let whole_word = flags & FPDF_MATCHWHOLEWORD != 0;
    let fold = |c: char| {
        if match_case {
            c
        } else {
            c.to_lowercase().next().unwrap_or(c)
        }
    };

    let mut hits = Vec::new();
    let mut index = 0;
    while !pattern.is_empty() && index + pattern.len() <= chars.len() {
        let end = index + pattern.len();
        let matched = chars[index..end]
            .iter()
            .zip(pattern)
            .all(|(a, b)| fold(*a) == fold(*b));
        let bounded = !whole_word
            || ((index == 0 || !chars[index - 1].is_alphanumeric())
                && chars.get(end).map_or(true, |c| !c.is_alphanumeric()));
        if matched && bounded {
            hits.push((index, pattern.len()));
            index = end;
        } else {
            index += 1;
        }
    }
    hits
}

fn utf16le_with_nul(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn copy_out(bytes: &[u8], buffer: &mut [u8]) -> usize {
    if buffer.len() >= bytes.len() {
        buffer[..bytes.len()].copy_from_slice(bytes);
    }
    bytes.len()
}

impl PdfiumApi for FakeEngine {
    fn init_library(&self) {
        self.state().init_calls += 1;
        self.log("init_library");
    }

    fn destroy_library(&self) {
        self.state().destroy_calls += 1;
        self.log("destroy_library");
    }

    fn get_last_error(&self) -> u32 {
        LAST_ERROR.with(Cell::get)
    }

    unsafe fn load_custom_document(
        &self,
        access: *mut FPDF_FILEACCESS,
        password: Option<&CStr>,
    ) -> DocumentHandle {
        let len = (*access).m_FileLen as usize;
        let Some(bytes) = Self::read_through(access, len) else {
            set_last_error(FPDF_ERR_FILE);
            return DocumentHandle::NULL;
        };
        let Some(pdf) = FakePdf::from_bytes(&bytes) else {
            set_last_error(FPDF_ERR_FORMAT);
            return DocumentHandle::NULL;
        };
        if pdf.unsupported_security {
            set_last_error(FPDF_ERR_SECURITY);
            return DocumentHandle::NULL;
        }
        if let Some(expected) = &pdf.password {
            let supplied = password.and_then(|p| p.to_str().ok());
            if supplied != Some(expected.as_str()) {
                set_last_error(FPDF_ERR_PASSWORD);
                return DocumentHandle::NULL;
            }
        }

        set_last_error(FPDF_ERR_SUCCESS);
        let handle = next_handle();
        let mut state = self.state();
        state.docs.insert(
            handle,
            FakeDoc {
                pdf,
                access: access as usize,
            },
        );
        state.log.push("load_document".to_string());
        DocumentHandle::from_raw(handle)
    }

    fn close_document(&self, document: DocumentHandle) {
        let mut state = self.state();
        state.docs.remove(&document.as_raw());
        state.log.push("close_document".to_string());
    }

    fn get_doc_permissions(&self, document: DocumentHandle) -> u32 {
        let state = self.state();
        state
            .docs
            .get(&document.as_raw())
            .map_or(0, |doc| doc.pdf.permissions)
    }

    fn get_page_count(&self, document: DocumentHandle) -> i32 {
        let state = self.state();
        state
            .docs
            .get(&document.as_raw())
            .map_or(0, |doc| doc.pdf.pages.len() as i32)
    }

    fn get_page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<(f64, f64)> {
        let state = self.state();
        let doc = state.docs.get(&document.as_raw())?;
        let page = doc.pdf.pages.get(usize::try_from(index).ok()?)?;
        Some(page.effective_size())
    }

    fn get_meta_text(&self, document: DocumentHandle, tag: &CStr, buffer: &mut [u8]) -> usize {
        let state = self.state();
        let value = tag
            .to_str()
            .ok()
            .and_then(|tag| state.docs.get(&document.as_raw())?.pdf.meta.get(tag))
            .map(String::as_str)
            .unwrap_or("");
        copy_out(&utf16le_with_nul(value), buffer)
    }

    unsafe fn save_as_copy(
        &self,
        document: DocumentHandle,
        writer: *mut FPDF_FILEWRITE,
        flags: u32,
    ) -> bool {
        let bytes = {
            let mut state = self.state();
            state.log.push(format!("save_as_copy flags={flags}"));
            match state.docs.get(&document.as_raw()) {
                Some(doc) => doc.pdf.to_bytes(),
                None => return false,
            }
        };

        let Some(write_block) = (*writer).WriteBlock else {
            return false;
        };
        for chunk in bytes.chunks(WRITE_CHUNK) {
            let ok = write_block(
                writer,
                chunk.as_ptr() as *const c_void,
                chunk.len() as c_ulong,
            );
            if ok == 0 {
                return false;
            }
        }
        true
    }

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        let mut state = self.state();
        let Ok(index) = usize::try_from(index) else {
            return PageHandle::NULL;
        };
        let exists = state
            .docs
            .get(&document.as_raw())
            .is_some_and(|doc| index < doc.pdf.pages.len());
        if !exists {
            state.log.push(format!("load_page {index} failed"));
            return PageHandle::NULL;
        }
        let handle = next_handle();
        state.pages.insert(handle, (document.as_raw(), index));
        state.log.push(format!("load_page {index}"));
        PageHandle::from_raw(handle)
    }

    fn close_page(&self, page: PageHandle) {
        let mut state = self.state();
        if let Some((_, index)) = state.pages.remove(&page.as_raw()) {
            state.log.push(format!("close_page {index}"));
        }
    }

    fn get_page_width(&self, page: PageHandle) -> f64 {
        self.state().page(page).map_or(0.0, |p| p.effective_size().0)
    }

    fn get_page_height(&self, page: PageHandle) -> f64 {
        self.state().page(page).map_or(0.0, |p| p.effective_size().1)
    }

    fn page_get_rotation(&self, page: PageHandle) -> i32 {
        self.state().page(page).map_or(0, |p| p.rotation)
    }

    fn page_set_rotation(&self, page: PageHandle, rotation: i32) {
        let mut state = self.state();
        if let Some(page) = state.page_mut(page) {
            page.rotation = rotation.rem_euclid(4);
        }
        state.log.push(format!("set_rotation {rotation}"));
    }

    fn page_delete(&self, document: DocumentHandle, index: i32) {
        let mut state = self.state();
        if let (Some(doc), Ok(index)) = (
            state.docs.get_mut(&document.as_raw()),
            usize::try_from(index),
        ) {
            if index < doc.pdf.pages.len() {
                doc.pdf.pages.remove(index);
            }
        }
        state.log.push(format!("delete_page {index}"));
    }

    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: &DeviceViewport,
        flags: u32,
    ) {
        let mut state = self.state();
        let page_index = state.pages.get(&page.as_raw()).map_or(usize::MAX, |p| p.1);
        state.renders.push(RenderCall {
            layer: RenderLayer::Page,
            bitmap,
            page_index,
            viewport: *viewport,
            flags,
        });
        state.log.push(format!("render_page {page_index}"));
    }

    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: &DeviceViewport,
        page_x: f64,
        page_y: f64,
    ) -> Option<(i32, i32)> {
        let state = self.state();
        let (width, height) = state.page(page)?.effective_size();
        let (u, v) = (page_x / width, page_y / height);
        let (dx, dy) = match viewport.rotation {
            PdfRotation::None => (u, 1.0 - v),
            PdfRotation::Clockwise90 => (v, u),
            PdfRotation::Rotated180 => (1.0 - u, v),
            PdfRotation::Clockwise270 => (1.0 - v, 1.0 - u),
        };
        Some((
            viewport.start_x + (dx * viewport.size_x as f64).round() as i32,
            viewport.start_y + (dy * viewport.size_y as f64).round() as i32,
        ))
    }

    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: &DeviceViewport,
        device_x: i32,
        device_y: i32,
    ) -> Option<(f64, f64)> {
        let state = self.state();
        let (width, height) = state.page(page)?.effective_size();
        if viewport.size_x <= 0 || viewport.size_y <= 0 {
            return None;
        }
        let dx = (device_x - viewport.start_x) as f64 / viewport.size_x as f64;
        let dy = (device_y - viewport.start_y) as f64 / viewport.size_y as f64;
        let (u, v) = match viewport.rotation {
            PdfRotation::None => (dx, 1.0 - dy),
            PdfRotation::Clockwise90 => (dy, dx),
            PdfRotation::Rotated180 => (1.0 - dx, dy),
            PdfRotation::Clockwise270 => (1.0 - dy, 1.0 - dx),
        };
        Some((u * width, v * height))
    }

    fn text_load_page(&self, page: PageHandle) -> TextPageHandle {
        let (access, broken) = {
            let state = self.state();
            let Some((doc, _)) = state.pages.get(&page.as_raw()) else {
                return TextPageHandle::NULL;
            };
            let access = state.docs.get(doc).map_or(0, |d| d.access);
            let broken = state.page(page).map_or(true, |p| p.broken_text_layer);
            (access, broken)
        };

        // Text layers are parsed lazily; pull the header through the stream
        // bridge again, outside the state lock.
        // SAFETY: the access block outlives the document it was opened with.
        let header = unsafe { Self::read_through(access as *const FPDF_FILEACCESS, MAGIC.len()) };
        if broken || header.as_deref() != Some(MAGIC) {
            self.log("text_load_page failed");
            return TextPageHandle::NULL;
        }

        let handle = next_handle();
        let mut state = self.state();
        state.text_pages.insert(handle, page.as_raw());
        state.log.push("text_load_page".to_string());
        TextPageHandle::from_raw(handle)
    }

    fn text_close_page(&self, text_page: TextPageHandle) {
        let mut state = self.state();
        if state.text_pages.remove(&text_page.as_raw()).is_some() {
            state.log.push("text_close_page".to_string());
        }
    }

    fn text_count_chars(&self, text_page: TextPageHandle) -> i32 {
        self.state().glyphs(text_page).len() as i32
    }

    fn text_get_text(
        &self,
        text_page: TextPageHandle,
        start: i32,
        count: i32,
        buffer: &mut [u16],
    ) -> i32 {
        let state = self.state();
        let glyphs = state.glyphs(text_page);
        let (Ok(start), Ok(count)) = (usize::try_from(start), usize::try_from(count)) else {
            return 0;
        };
        if buffer.is_empty() || start > glyphs.len() {
            return 0;
        }
        let end = start.saturating_add(count).min(glyphs.len());
        let units: Vec<u16> = glyphs[start..end]
            .iter()
            .flat_map(|g| {
                let mut pair = [0u16; 2];
                g.ch.encode_utf16(&mut pair).to_vec()
            })
            .take(buffer.len() - 1)
            .collect();
        buffer[..units.len()].copy_from_slice(&units);
        buffer[units.len()] = 0;
        units.len() as i32 + 1
    }

    fn text_get_char_box(&self, text_page: TextPageHandle, index: i32) -> Option<CharBox> {
        let mut state = self.state();
        state.char_box_calls += 1;
        let glyph = state.glyphs(text_page).get(usize::try_from(index).ok()?)?;
        Some(CharBox {
            left: glyph.left,
            right: glyph.right,
            bottom: glyph.bottom,
            top: glyph.top,
        })
    }

    fn text_find_start(
        &self,
        text_page: TextPageHandle,
        pattern: &[u16],
        flags: u32,
        start_index: i32,
    ) -> SearchHandle {
        let mut state = self.state();
        let Some((&0, units)) = pattern.split_last() else {
            return SearchHandle::NULL;
        };
        let pattern: Vec<char> = String::from_utf16_lossy(units).chars().collect();
        let chars: Vec<char> = state.glyphs(text_page).iter().map(|g| g.ch).collect();
        let skip = usize::try_from(start_index).unwrap_or(0);
        let hits = find_hits(&chars, &pattern, flags)
            .into_iter()
            .filter(|(offset, _)| *offset >= skip)
            .collect();

        let handle = next_handle();
        state.searches.insert(
            handle,
            FakeSearch {
                text_page: text_page.as_raw(),
                hits,
                next: 0,
                current: None,
            },
        );
        state.log.push(format!("find_start flags={flags}"));
        SearchHandle::from_raw(handle)
    }

    fn text_find_next(&self, search: SearchHandle) -> bool {
        let mut state = self.state();
        let Some(search) = state.searches.get_mut(&search.as_raw()) else {
            return false;
        };
        match search.hits.get(search.next).copied() {
            Some(hit) => {
                search.current = Some(hit);
                search.next += 1;
                true
            }
            None => false,
        }
    }

    fn text_get_sch_result_index(&self, search: SearchHandle) -> i32 {
        self.state()
            .searches
            .get(&search.as_raw())
            .and_then(|s| s.current)
            .map_or(-1, |(offset, _)| offset as i32)
    }

    fn text_get_sch_count(&self, search: SearchHandle) -> i32 {
        self.state()
            .searches
            .get(&search.as_raw())
            .and_then(|s| s.current)
            .map_or(0, |(_, len)| len as i32)
    }

    fn text_find_close(&self, search: SearchHandle) {
        let mut state = self.state();
        if state.searches.remove(&search.as_raw()).is_some() {
            state.log.push("find_close".to_string());
        }
    }

    unsafe fn init_form_fill_environment(
        &self,
        document: DocumentHandle,
        info: *mut FPDF_FORMFILLINFO,
    ) -> FormHandle {
        let version = (*info).version;
        let mut state = self.state();
        state.form_versions_tried.push(version);
        let accepted = state
            .docs
            .get(&document.as_raw())
            .and_then(|doc| doc.pdf.form_version);
        if accepted != Some(version) {
            state.log.push(format!("init_form v{version} failed"));
            return FormHandle::NULL;
        }
        let handle = next_handle();
        state.forms.insert(handle, document.as_raw());
        state.log.push(format!("init_form v{version}"));
        FormHandle::from_raw(handle)
    }

    fn exit_form_fill_environment(&self, form: FormHandle) {
        let mut state = self.state();
        state.forms.remove(&form.as_raw());
        state.log.push("exit_form".to_string());
    }

    fn set_form_field_highlight_color(&self, _form: FormHandle, field_type: i32, color: u32) {
        self.state().highlight = Some((field_type, color));
    }

    fn set_form_field_highlight_alpha(&self, _form: FormHandle, alpha: u8) {
        self.state().highlight_alpha = Some(alpha);
    }

    fn form_do_document_js_action(&self, _form: FormHandle) {
        self.log("doc_js_action");
    }

    fn form_do_document_open_action(&self, _form: FormHandle) {
        self.log("doc_open_action");
    }

    fn form_do_document_aaction(&self, _form: FormHandle, action: u32) {
        self.log(format!("doc_aaction {action:#x}"));
    }

    fn form_on_after_load_page(&self, _page: PageHandle, _form: FormHandle) {
        self.log("form_after_load");
    }

    fn form_on_before_close_page(&self, _page: PageHandle, _form: FormHandle) {
        self.log("form_before_close");
    }

    fn form_do_page_aaction(&self, _page: PageHandle, _form: FormHandle, action: u32) {
        self.log(format!("page_aaction {action}"));
    }

    fn ffl_draw(
        &self,
        _form: FormHandle,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: &DeviceViewport,
        flags: u32,
    ) {
        let mut state = self.state();
        let page_index = state.pages.get(&page.as_raw()).map_or(usize::MAX, |p| p.1);
        state.renders.push(RenderCall {
            layer: RenderLayer::Forms,
            bitmap,
            page_index,
            viewport: *viewport,
            flags,
        });
        state.log.push(format!("ffl_draw {page_index}"));
    }

    fn bookmark_get_first_child(
        &self,
        document: DocumentHandle,
        parent: BookmarkHandle,
    ) -> BookmarkHandle {
        let mut state = self.state();
        let mut path = if parent.is_null() {
            Vec::new()
        } else {
            match state.bookmarks.get(&parent.as_raw()) {
                Some((_, path)) => path.clone(),
                None => return BookmarkHandle::NULL,
            }
        };
        path.push(0);
        state.allocate_bookmark(document, path)
    }

    fn bookmark_get_next_sibling(
        &self,
        document: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> BookmarkHandle {
        let mut state = self.state();
        let Some((_, mut path)) = state.bookmarks.get(&bookmark.as_raw()).cloned() else {
            return BookmarkHandle::NULL;
        };
        if let Some(last) = path.last_mut() {
            *last += 1;
        }
        state.allocate_bookmark(document, path)
    }

    fn bookmark_get_title(&self, bookmark: BookmarkHandle, buffer: &mut [u8]) -> usize {
        let state = self.state();
        let title = state
            .bookmarks
            .get(&bookmark.as_raw())
            .and_then(|(doc, path)| {
                state.bookmark_node(DocumentHandle::from_raw(*doc), path)
            })
            .map(|node| node.title.clone())
            .unwrap_or_default();
        copy_out(&utf16le_with_nul(&title), buffer)
    }

    fn bookmark_get_dest(&self, document: DocumentHandle, bookmark: BookmarkHandle) -> DestHandle {
        let mut state = self.state();
        let page = state
            .bookmarks
            .get(&bookmark.as_raw())
            .and_then(|(_, path)| state.bookmark_node(document, path))
            .and_then(|node| node.page);
        match page {
            Some(page) => {
                let handle = next_handle();
                state.dests.insert(handle, page);
                DestHandle::from_raw(handle)
            }
            None => DestHandle::NULL,
        }
    }

    fn dest_get_page_index(&self, _document: DocumentHandle, dest: DestHandle) -> i32 {
        self.state().dests.get(&dest.as_raw()).copied().unwrap_or(-1)
    }
}

// ========================================
// Helpers
// ========================================

/// Route `tracing` output through the test harness. `RUST_LOG` applies.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A fresh engine and a library handle over it.
pub fn fake_pdfium() -> (Arc<FakeEngine>, Pdfium) {
    init_tracing();
    let engine = Arc::new(FakeEngine::default());
    let pdfium = Pdfium::new(engine.clone());
    (engine, pdfium)
}

/// Same as [`fake_pdfium`] with an explicit configuration.
pub fn fake_pdfium_with(config: PdfiumConfig) -> (Arc<FakeEngine>, Pdfium) {
    let (engine, pdfium) = fake_pdfium();
    (engine, pdfium.with_config(config))
}

/// Open a fixture from memory.
pub fn open(pdfium: &Pdfium, pdf: &FakePdf) -> PdfDocument {
    pdfium
        .open_bytes(pdf.to_bytes(), None)
        .expect("fixture opens")
}

/// A two-page document: "Hello World" on page 0, a second line of text on
/// page 1.
pub fn hello_world_pdf() -> FakePdf {
    FakePdf::new()
        .text_page("Hello World")
        .text_page("Say hello to the world\nhello again")
}

/// Position of `entry` in the call log.
pub fn position(calls: &[String], entry: &str) -> usize {
    calls
        .iter()
        .position(|call| call == entry)
        .unwrap_or_else(|| panic!("{entry:?} not in call log {calls:?}"))
}
