//! Page geometry: PDF user space, device space and the mapping between them.
//!
//! PDF user space has its origin at the bottom-left corner of the page with y
//! growing upwards, measured in points (1/72 inch). Device space is the pixel
//! grid of a render target: origin top-left, y growing downwards, integer
//! coordinates. The two are only related through a [`DeviceViewport`] and the
//! page's own transformation state, which is why conversions live on the
//! document and need a loaded page.

/// Page rotation in 90-degree increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PdfRotation {
    /// No rotation (0 degrees)
    #[default]
    None = 0,
    /// 90 degrees clockwise
    Clockwise90 = 1,
    /// 180 degrees
    Rotated180 = 2,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Clockwise270 = 3,
}

impl PdfRotation {
    /// Every supported rotation, in clockwise order.
    pub const ALL: [PdfRotation; 4] = [
        PdfRotation::None,
        PdfRotation::Clockwise90,
        PdfRotation::Rotated180,
        PdfRotation::Clockwise270,
    ];

    /// Create rotation from raw PDFium value (0-3). Values wrap modulo 4.
    pub fn from_raw(value: i32) -> Self {
        match value.rem_euclid(4) {
            1 => Self::Clockwise90,
            2 => Self::Rotated180,
            3 => Self::Clockwise270,
            _ => Self::None,
        }
    }

    /// Get the raw PDFium rotation value.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Get the rotation in degrees (0, 90, 180, or 270).
    pub fn as_degrees(self) -> u16 {
        self as u16 * 90
    }

    /// Rotation for a multiple of 90 degrees, `None` for anything else.
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Self::None),
            90 => Some(Self::Clockwise90),
            180 => Some(Self::Rotated180),
            270 => Some(Self::Clockwise270),
            _ => None,
        }
    }

    /// The next rotation clockwise.
    pub fn clockwise(self) -> Self {
        Self::from_raw(self.as_raw() + 1)
    }

    /// The next rotation counter-clockwise.
    pub fn counter_clockwise(self) -> Self {
        Self::from_raw(self.as_raw() + 3)
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPageSize {
    pub width: f32,
    pub height: f32,
}

impl PdfPageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A point in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdfPoint {
    pub x: f32,
    pub y: f32,
}

impl PdfPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in PDF user space.
///
/// For a well-formed rectangle `top >= bottom`, since y grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdfRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PdfRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Whether the rectangle covers no area (either extent is zero).
    pub fn is_empty(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Reorder the edges so that `left <= right` and `bottom <= top`.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            right: self.left.max(self.right),
            top: self.top.max(self.bottom),
            bottom: self.top.min(self.bottom),
        }
    }
}

/// A point on the device pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

impl DevicePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle on the device pixel grid.
///
/// Rectangles produced by transforming two corners keep the corners where
/// they landed; call [`DeviceRect::normalized`] before relying on
/// `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl DeviceRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Reorder the edges so that `left <= right` and `top <= bottom`.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            right: self.left.max(self.right),
            top: self.top.min(self.bottom),
            bottom: self.top.max(self.bottom),
        }
    }
}

/// The device area a page is mapped onto, in pixels, plus the display
/// rotation applied during the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceViewport {
    pub start_x: i32,
    pub start_y: i32,
    pub size_x: i32,
    pub size_y: i32,
    pub rotation: PdfRotation,
}

impl DeviceViewport {
    pub fn new(start_x: i32, start_y: i32, size_x: i32, size_y: i32, rotation: PdfRotation) -> Self {
        Self {
            start_x,
            start_y,
            size_x,
            size_y,
            rotation,
        }
    }

    /// A one-pixel-per-point viewport anchored at the origin. Quarter turns
    /// swap the device width and height.
    pub fn for_page(size: PdfPageSize, rotation: PdfRotation) -> Self {
        let (width, height) = (size.width as i32, size.height as i32);
        match rotation {
            PdfRotation::Clockwise90 | PdfRotation::Clockwise270 => {
                Self::new(0, 0, height, width, rotation)
            }
            PdfRotation::None | PdfRotation::Rotated180 => Self::new(0, 0, width, height, rotation),
        }
    }
}
