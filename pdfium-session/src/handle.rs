//! Opaque native handles
//!
//! PDFium hands out pointers to objects it owns. This layer never looks
//! behind them: a handle can be compared, checked against null and passed
//! back to the engine, nothing else. Keeping them as `usize` newtypes (rather
//! than raw pointers) makes them `Send` and keeps pointer arithmetic out of
//! reach.

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// The null sentinel returned by the engine on failure.
            pub const NULL: Self = Self(0);

            /// Wrap a raw handle value produced by an engine.
            pub const fn from_raw(raw: usize) -> Self {
                Self(raw)
            }

            /// The raw handle value, for passing back to the engine.
            pub const fn as_raw(self) -> usize {
                self.0
            }

            /// Whether this is the null sentinel.
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NULL
            }
        }
    };
}

native_handle!(
    /// An open document (`FPDF_DOCUMENT`).
    DocumentHandle
);
native_handle!(
    /// A loaded page (`FPDF_PAGE`). Never held across two calls.
    PageHandle
);
native_handle!(
    /// The text layer of a loaded page (`FPDF_TEXTPAGE`).
    TextPageHandle
);
native_handle!(
    /// A form-fill environment (`FPDF_FORMHANDLE`).
    FormHandle
);
native_handle!(
    /// An active text search (`FPDF_SCHHANDLE`).
    SearchHandle
);
native_handle!(
    /// A caller-owned render target (`FPDF_BITMAP`).
    BitmapHandle
);
native_handle!(
    /// An outline entry (`FPDF_BOOKMARK`).
    BookmarkHandle
);
native_handle!(
    /// A link destination (`FPDF_DEST`).
    DestHandle
);
