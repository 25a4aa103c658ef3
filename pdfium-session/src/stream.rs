//! Process-wide stream registry and the native read-callback bridge.
//!
//! PDFium pulls document bytes lazily through `FPDF_FILEACCESS::m_GetBlock`,
//! which receives nothing but an opaque `m_Param`. We store a small integer
//! id there and resolve it back to the owning stream through the table below.
//!
//! The table lock only guards id bookkeeping. A read clones the stream's
//! `Arc`, drops the table lock, and only then locks the stream itself, so a
//! slow read on one document never stalls registration for another.

use crate::error::{PdfError, Result};
use once_cell::sync::Lazy;
use pdfium_sys::FPDF_FILEACCESS;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::os::raw::{c_int, c_uchar, c_ulong, c_void};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

/// A readable, seekable byte source a document can be opened from.
pub trait PdfStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> PdfStream for T {}

/// A stream shared between its document and the registry.
pub type SharedStream = Arc<Mutex<dyn PdfStream>>;

/// Registry id handed to the native engine as callback context.
///
/// Ids start at 1 and are never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(usize);

impl StreamId {
    /// The raw id value.
    pub fn as_raw(self) -> usize {
        self.0
    }

    pub(crate) fn from_param(param: *mut c_void) -> Self {
        StreamId(param as usize)
    }

    pub(crate) fn as_param(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct StreamTable {
    next_id: usize,
    streams: HashMap<StreamId, SharedStream>,
}

static STREAMS: Lazy<Mutex<StreamTable>> = Lazy::new(|| {
    Mutex::new(StreamTable {
        next_id: 1,
        streams: HashMap::new(),
    })
});

fn table() -> MutexGuard<'static, StreamTable> {
    // Critical sections are plain map operations and cannot leave the table
    // half-updated, so a poisoned lock is still consistent.
    STREAMS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide table mapping registry ids to open streams.
pub struct StreamRegistry;

impl StreamRegistry {
    /// Store a stream under a fresh id.
    pub fn register(stream: SharedStream) -> StreamId {
        let mut table = table();
        let id = StreamId(table.next_id);
        table.next_id += 1;
        table.streams.insert(id, stream);
        trace!(%id, "registered stream");
        id
    }

    /// Remove a mapping. Unknown ids are ignored.
    ///
    /// Returns whether an entry was removed. The stream itself is only
    /// dropped once its last owner lets go of it.
    pub fn unregister(id: StreamId) -> bool {
        let removed = table().streams.remove(&id).is_some();
        if removed {
            trace!(%id, "unregistered stream");
        }
        removed
    }

    /// Look up a registered stream.
    pub fn get(id: StreamId) -> Option<SharedStream> {
        table().streams.get(&id).cloned()
    }

    /// Whether `id` is currently registered.
    pub fn is_registered(id: StreamId) -> bool {
        table().streams.contains_key(&id)
    }

    /// Number of live registrations.
    pub fn len() -> usize {
        table().streams.len()
    }

    /// Whether no stream is registered.
    pub fn is_empty() -> bool {
        Self::len() == 0
    }
}

/// Fill `buf` with the bytes at `position` of a registered stream.
pub fn read_at(id: StreamId, position: u64, buf: &mut [u8]) -> Result<()> {
    let stream = StreamRegistry::get(id).ok_or(PdfError::StreamUnregistered { id })?;
    let mut stream = stream.lock().unwrap_or_else(PoisonError::into_inner);
    stream.seek(SeekFrom::Start(position))?;
    stream.read_exact(buf)?;
    Ok(())
}

/// Total length of a stream. The read position is restored afterwards.
pub(crate) fn stream_len(stream: &mut dyn PdfStream) -> Result<u64> {
    let current = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if current != len {
        stream.seek(SeekFrom::Start(current))?;
    }
    Ok(len)
}

/// Native `m_GetBlock` callback.
///
/// # Safety
///
/// Called by PDFium with `buf` pointing to at least `size` writable bytes.
pub(crate) unsafe extern "C" fn read_block(
    param: *mut c_void,
    position: c_ulong,
    buf: *mut c_uchar,
    size: c_ulong,
) -> c_int {
    let id = StreamId::from_param(param);
    if size == 0 {
        return 1;
    }
    if buf.is_null() {
        return 0;
    }
    let out = std::slice::from_raw_parts_mut(buf, size as usize);
    match read_at(id, position as u64, out) {
        Ok(()) => 1,
        Err(err @ PdfError::StreamUnregistered { .. }) => {
            warn!(%id, "read callback failed: {err}");
            0
        }
        Err(err) => {
            warn!(%id, position, size, "stream read failed: {err}");
            0
        }
    }
}

/// Build the file-access block PDFium reads through for a registered stream.
///
/// The block is boxed: PDFium keeps its address until the document closes.
pub(crate) fn file_access(id: StreamId, len: u64) -> Result<Box<FPDF_FILEACCESS>> {
    let file_len = c_ulong::try_from(len).map_err(|_| {
        PdfError::InvalidParameter(format!("stream of {len} bytes is too large to open"))
    })?;
    Ok(Box::new(FPDF_FILEACCESS {
        m_FileLen: file_len,
        m_GetBlock: Some(read_block),
        m_Param: id.as_param(),
    }))
}
