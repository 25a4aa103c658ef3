//! Library entry point and engine lifetime

use crate::config::PdfiumConfig;
use crate::document::PdfDocument;
use crate::engine::PdfiumApi;
use crate::error::Result;
use crate::stream::{PdfStream, SharedStream};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

/// Process-wide bookkeeping for one engine instance.
#[derive(Default)]
struct EngineEntry {
    /// The library handed out to new [`Pdfium`] handles.
    library: Weak<Library>,
    /// Initialised libraries over this engine that have not been dropped.
    loaded: usize,
}

/// Engines in use, keyed by address.
///
/// A `Library` owns its engine, so an address cannot be taken by another
/// engine while any entry for it is live.
static ENGINES: Lazy<Mutex<HashMap<usize, EngineEntry>>> = Lazy::new(|| Mutex::new(HashMap::new()));

#[cfg(feature = "native")]
static NATIVE_ENGINE: Lazy<Arc<dyn PdfiumApi>> =
    Lazy::new(|| Arc::new(crate::native::NativeEngine::new()));

fn engine_key(engine: &Arc<dyn PdfiumApi>) -> usize {
    Arc::as_ptr(engine) as *const () as usize
}

/// One initialised engine, shared by every handle and document over it.
///
/// The engine is initialised lazily on the first [`ensure_loaded`] call and
/// torn down when the last reference (held by [`Pdfium`] handles and open
/// documents) is dropped.
///
/// [`ensure_loaded`]: Library::ensure_loaded
pub(crate) struct Library {
    engine: Arc<dyn PdfiumApi>,
    key: usize,
    initialized: Mutex<bool>,
}

impl Library {
    /// The live library for `engine`, or a fresh one registered for it.
    fn shared(engine: Arc<dyn PdfiumApi>) -> Arc<Library> {
        let key = engine_key(&engine);
        let mut engines = ENGINES.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = engines.entry(key).or_default();
        if let Some(library) = entry.library.upgrade() {
            return library;
        }
        let library = Arc::new(Library {
            engine,
            key,
            initialized: Mutex::new(false),
        });
        entry.library = Arc::downgrade(&library);
        library
    }

    pub(crate) fn engine(&self) -> &dyn PdfiumApi {
        self.engine.as_ref()
    }

    /// Initialise the engine once. Later calls return immediately.
    ///
    /// The native call is skipped while another library over the same engine
    /// is still initialised.
    pub(crate) fn ensure_loaded(&self) {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        if *initialized {
            return;
        }
        let mut engines = ENGINES.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = engines.entry(self.key).or_default();
        if entry.loaded == 0 {
            self.engine.init_library();
            debug!("PDFium library initialized");
        }
        entry.loaded += 1;
        *initialized = true;
    }

    fn is_loaded(&self) -> bool {
        *self.initialized.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        let initialized = *self
            .initialized
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let mut engines = ENGINES.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = engines.get_mut(&self.key) else {
            return;
        };
        if initialized {
            entry.loaded = entry.loaded.saturating_sub(1);
            if entry.loaded == 0 {
                self.engine.destroy_library();
                debug!("PDFium library destroyed");
            }
        }
        if entry.loaded == 0 && entry.library.strong_count() == 0 {
            engines.remove(&self.key);
        }
    }
}

/// Main entry point for PDFium operations.
///
/// Create a `Pdfium` and use it to open documents. Clones share the same
/// engine, and every document keeps that engine alive until it is closed.
///
/// # Example
///
/// ```no_run
/// # #[cfg(feature = "native")]
/// # fn main() -> Result<(), pdfium_session::PdfError> {
/// use pdfium_session::{Pdfium, PdfSearchOptions};
///
/// let pdfium = Pdfium::native();
/// let mut doc = pdfium.open_file("document.pdf", None)?;
/// let matches = doc.search_all(Some("invoice"), PdfSearchOptions::new())?;
/// for m in &matches {
///     println!("page {}: {}", m.page, m.text);
/// }
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "native"))]
/// # fn main() {}
/// ```
#[derive(Clone)]
pub struct Pdfium {
    library: Arc<Library>,
    config: PdfiumConfig,
}

impl Pdfium {
    /// Wrap an engine implementation.
    ///
    /// Handles created over the same engine instance share one library: it
    /// is initialised once for all of them and torn down after the last
    /// handle and the last document opened through any of them are gone.
    pub fn new(engine: Arc<dyn PdfiumApi>) -> Self {
        Self {
            library: Library::shared(engine),
            config: PdfiumConfig::default(),
        }
    }

    /// The process-wide native library.
    #[cfg(feature = "native")]
    pub fn native() -> Self {
        Self::new(Arc::clone(&NATIVE_ENGINE))
    }

    /// Use `config` for documents opened from now on.
    pub fn with_config(mut self, config: PdfiumConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PdfiumConfig {
        &self.config
    }

    /// Whether the engine has been initialised yet.
    pub fn is_loaded(&self) -> bool {
        self.library.is_loaded()
    }

    /// Open a document from any seekable reader.
    ///
    /// The reader is owned by the document from here on and dropped when the
    /// document is closed (or when opening fails).
    pub fn open<R>(&self, reader: R, password: Option<&str>) -> Result<PdfDocument>
    where
        R: PdfStream + 'static,
    {
        let stream: SharedStream = Arc::new(Mutex::new(reader));
        self.library.ensure_loaded();
        PdfDocument::open(Arc::clone(&self.library), self.config, stream, password)
    }

    /// Open a document from a file path.
    pub fn open_file<P: AsRef<Path>>(&self, path: P, password: Option<&str>) -> Result<PdfDocument> {
        let file = File::open(path.as_ref())?;
        self.open(BufReader::new(file), password)
    }

    /// Open a document from an owned byte buffer.
    pub fn open_bytes(&self, bytes: Vec<u8>, password: Option<&str>) -> Result<PdfDocument> {
        self.open(Cursor::new(bytes), password)
    }
}

impl std::fmt::Debug for Pdfium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pdfium")
            .field("loaded", &self.is_loaded())
            .field("config", &self.config)
            .finish()
    }
}
