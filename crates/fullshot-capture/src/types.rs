use serde::{Deserialize, Serialize};

/// Opaque native window identifier.
///
/// On Windows this wraps an `HWND`; the simulated backend hands out small
/// integers. Zero is never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Outer frame size of a native window, chrome included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub width: i32,
    pub height: i32,
}

impl WindowGeometry {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Snapshot of the canvas element's layout metrics.
///
/// Only valid for the layout it was read from: re-read after every resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentMetrics {
    pub client_width: i32,
    pub client_height: i32,
    pub scroll_width: i32,
    pub scroll_height: i32,
}

/// Which element defines the document's content extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasElement {
    /// The root element, used in standards mode.
    DocumentElement,
    /// The body element, used in quirks mode.
    Body,
}

impl CanvasElement {
    pub fn for_mode(standards_mode: bool) -> Self {
        if standards_mode {
            CanvasElement::DocumentElement
        } else {
            CanvasElement::Body
        }
    }
}

/// Sizes resolved once per capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDimensions {
    pub target_window_width: i32,
    pub target_window_height: i32,
    pub target_view_width: i32,
    pub target_view_height: i32,
    pub target_client_width: i32,
    pub target_client_height: i32,
}

impl TargetDimensions {
    pub fn window(&self) -> WindowGeometry {
        WindowGeometry::new(self.target_window_width, self.target_window_height)
    }
}

/// Layout of the four bytes of each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Blue, green, red, alpha.
    Bgra,
    /// Blue, green, red and an undefined fourth byte (GDI window prints).
    Bgrx,
}

/// 32 bits per pixel bitmap, rows top-down.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * 4`.
    pub stride: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Allocate a zeroed buffer, or `None` if the size is unusable or the
    /// allocator refuses.
    pub fn allocate(width: i32, height: i32, format: PixelFormat) -> Option<Self> {
        if width < 1 || height < 1 {
            return None;
        }
        let stride = (width as usize).checked_mul(Self::BYTES_PER_PIXEL)?;
        let len = stride.checked_mul(height as usize)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).ok()?;
        data.resize(len, 0);

        Some(Self {
            width: width as u32,
            height: height as u32,
            stride,
            format,
            data,
        })
    }

    /// Raw little-endian 32-bit value of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let offset = y as usize * self.stride + x as usize * Self::BYTES_PER_PIXEL;
        let bytes = &self.data[offset..offset + Self::BYTES_PER_PIXEL];
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) {
        let offset = y as usize * self.stride + x as usize * Self::BYTES_PER_PIXEL;
        self.data[offset..offset + Self::BYTES_PER_PIXEL].copy_from_slice(&value.to_le_bytes());
    }

    pub fn fill(&mut self, value: u32) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, value);
            }
        }
    }

    /// Rows without stride padding.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_len = self.width as usize * Self::BYTES_PER_PIXEL;
        self.data
            .chunks(self.stride)
            .take(self.height as usize)
            .map(move |row| &row[..row_len])
    }
}
