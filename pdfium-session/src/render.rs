//! Page rendering configuration.
//!
//! Rendering always targets a bitmap the caller allocated and owns (see
//! [`BitmapHandle`](crate::BitmapHandle)); this module only decides where on
//! that bitmap the page lands and how it is drawn.

use crate::error::{PdfError, Result};
use crate::geometry::{DeviceViewport, PdfPageSize, PdfRotation};
use pdfium_sys::*;
use std::ops::{BitOr, BitOrAssign};

/// PDFium render flags (`FPDF_ANNOT`, `FPDF_LCD_TEXT`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderFlags(u32);

impl RenderFlags {
    pub const NONE: Self = Self(0);
    /// Render annotations.
    pub const ANNOT: Self = Self(FPDF_ANNOT);
    /// Optimise text for LCD displays.
    pub const LCD_TEXT: Self = Self(FPDF_LCD_TEXT);
    pub const NO_NATIVE_TEXT: Self = Self(FPDF_NO_NATIVETEXT);
    pub const GRAYSCALE: Self = Self(FPDF_GRAYSCALE);
    /// Write BGRA bitmaps as RGBA.
    pub const REVERSE_BYTE_ORDER: Self = Self(FPDF_REVERSE_BYTE_ORDER);
    pub const CONVERT_FILL_TO_STROKE: Self = Self(FPDF_CONVERT_FILL_TO_STROKE);
    pub const DEBUG_INFO: Self = Self(FPDF_DEBUG_INFO);
    pub const NO_CATCH: Self = Self(FPDF_NO_CATCH);
    pub const LIMITED_IMAGE_CACHE: Self = Self(FPDF_RENDER_LIMITEDIMAGECACHE);
    pub const FORCE_HALFTONE: Self = Self(FPDF_RENDER_FORCEHALFTONE);
    /// Render for printing.
    pub const PRINTING: Self = Self(FPDF_PRINTING);
    pub const NO_SMOOTH_TEXT: Self = Self(FPDF_RENDER_NO_SMOOTHTEXT);
    pub const NO_SMOOTH_IMAGE: Self = Self(FPDF_RENDER_NO_SMOOTHIMAGE);
    pub const NO_SMOOTH_PATH: Self = Self(FPDF_RENDER_NO_SMOOTHPATH);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// These flags with every bit of `other` cleared.
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for RenderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RenderFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Configuration for rendering one page into a caller-supplied bitmap.
///
/// Without explicit bounds the page is drawn at the origin, sized from its
/// dimensions in points and the horizontal/vertical DPI. For quarter-turn
/// rotations the derived width and height are swapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRenderConfig {
    dpi_x: f32,
    dpi_y: f32,
    bounds: Option<DeviceViewport>,
    rotation: PdfRotation,
    flags: RenderFlags,
    render_form_data: bool,
}

impl Default for PdfRenderConfig {
    fn default() -> Self {
        Self {
            dpi_x: 72.0,
            dpi_y: 72.0,
            bounds: None,
            rotation: PdfRotation::None,
            flags: RenderFlags::ANNOT,
            render_form_data: true,
        }
    }
}

impl PdfRenderConfig {
    /// Create a new render configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both horizontal and vertical DPI.
    ///
    /// Default: 72 DPI (one pixel per point)
    pub fn set_target_dpi(mut self, dpi: f32) -> Self {
        self.dpi_x = dpi;
        self.dpi_y = dpi;
        self
    }

    /// Set horizontal and vertical DPI independently.
    pub fn set_dpi(mut self, dpi_x: f32, dpi_y: f32) -> Self {
        self.dpi_x = dpi_x;
        self.dpi_y = dpi_y;
        self
    }

    /// Draw into an explicit device rectangle instead of deriving the size
    /// from the DPI.
    pub fn set_bounds(mut self, origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        self.bounds = Some(DeviceViewport::new(
            origin_x,
            origin_y,
            width,
            height,
            PdfRotation::None,
        ));
        self
    }

    pub fn rotate(mut self, rotation: PdfRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn set_flags(mut self, flags: RenderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Draw interactive form widgets on top of the page.
    ///
    /// Default: true. Has no effect on documents without a form environment.
    pub fn render_form_data(mut self, render: bool) -> Self {
        self.render_form_data = render;
        self
    }

    pub fn dpi(&self) -> (f32, f32) {
        (self.dpi_x, self.dpi_y)
    }

    pub fn rotation(&self) -> PdfRotation {
        self.rotation
    }

    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    pub fn renders_form_data(&self) -> bool {
        self.render_form_data
    }

    /// Flags for the page render itself. When forms are drawn as a separate
    /// layer, annotations are left out so widgets are not drawn twice.
    pub(crate) fn page_flags(&self, forms_drawn: bool) -> RenderFlags {
        if forms_drawn {
            self.flags.without(RenderFlags::ANNOT)
        } else {
            self.flags
        }
    }

    /// Calculate output dimensions for a page.
    pub fn calculate_size(&self, page: PdfPageSize) -> (i32, i32) {
        let width = (page.width * self.dpi_x / 72.0).round() as i32;
        let height = (page.height * self.dpi_y / 72.0).round() as i32;
        match self.rotation {
            PdfRotation::Clockwise90 | PdfRotation::Clockwise270 => (height, width),
            PdfRotation::None | PdfRotation::Rotated180 => (width, height),
        }
    }

    /// Device area the page is drawn into.
    pub(crate) fn viewport(&self, page: PdfPageSize) -> Result<DeviceViewport> {
        let valid_dpi = |dpi: f32| dpi.is_finite() && dpi > 0.0;
        if !valid_dpi(self.dpi_x) || !valid_dpi(self.dpi_y) {
            return Err(PdfError::InvalidParameter(format!(
                "DPI must be positive, got {}x{}",
                self.dpi_x, self.dpi_y
            )));
        }

        let viewport = match self.bounds {
            Some(bounds) => DeviceViewport {
                rotation: self.rotation,
                ..bounds
            },
            None => {
                let (width, height) = self.calculate_size(page);
                DeviceViewport::new(0, 0, width, height, self.rotation)
            }
        };

        if viewport.size_x <= 0 || viewport.size_y <= 0 {
            return Err(PdfError::RenderFailed {
                reason: format!(
                    "empty render area {}x{}",
                    viewport.size_x, viewport.size_y
                ),
            });
        }
        Ok(viewport)
    }
}
