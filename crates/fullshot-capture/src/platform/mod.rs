//! Capabilities the capture pipeline needs from its host.
//!
//! Three seams keep the core platform-neutral:
//! - [`WindowPlatform`] queries and mutates native windows and rasterizes them
//! - [`BrowsingContext`] hands out the window handles of the current document
//! - [`DocumentMetrics`] reports the canvas layout and flushes pending layout
//!
//! `windows` is the Win32 backend; `fake` simulates layout and paint timing
//! in memory.

pub mod fake;

#[cfg(target_os = "windows")]
pub mod windows;

use crate::error::PlatformError;
use crate::types::{CanvasElement, ContentMetrics, PixelBuffer, PixelFormat, WindowGeometry, WindowHandle};

/// Native window operations. Every call blocks the calling thread.
pub trait WindowPlatform {
    /// Outer frame size of `handle`.
    fn window_size(&self, handle: WindowHandle) -> Result<WindowGeometry, PlatformError>;

    /// Resize the frame without moving it, touching z-order or activation,
    /// and without notifying the window that its size is about to change.
    fn set_window_size(&self, handle: WindowHandle, size: WindowGeometry) -> Result<(), PlatformError>;

    fn is_maximized(&self, handle: WindowHandle) -> bool;

    /// Leave the maximized state without activating the window.
    fn show_restored_no_activate(&self, handle: WindowHandle);

    fn maximize(&self, handle: WindowHandle);

    /// Format of the buffers `print_window` fills.
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Bgrx
    }

    /// Rasterize the visible contents of `handle` into `buffer`.
    fn print_window(&self, handle: WindowHandle, buffer: &mut PixelBuffer) -> Result<(), PlatformError>;

    /// Ask the window to repaint before the next rasterization.
    fn redraw(&self, handle: WindowHandle);
}

/// The document currently displayed by the automated browser.
pub trait BrowsingContext {
    /// Frame window whose size the pipeline changes.
    fn top_level_window(&self) -> Option<WindowHandle>;

    /// Window hosting the rendered document surface.
    fn content_window(&self) -> Option<WindowHandle>;

    /// `None` when no document is loaded.
    fn document(&self) -> Option<&dyn DocumentMetrics>;
}

/// Layout metrics of the displayed document.
pub trait DocumentMetrics {
    fn is_standards_mode(&self) -> bool;

    /// Whether the document exposes `canvas` at all.
    fn has_element(&self, canvas: CanvasElement) -> bool;

    fn metrics(&self, canvas: CanvasElement) -> Result<ContentMetrics, PlatformError>;

    /// Flush pending layout work.
    fn force_recalculate(&self, force: bool) -> Result<(), PlatformError>;
}

// Platform-specific constructor
#[cfg(target_os = "windows")]
pub fn create_platform() -> Result<Box<dyn WindowPlatform>, PlatformError> {
    Ok(Box::new(windows::Win32Platform::new()))
}

#[cfg(not(target_os = "windows"))]
pub fn create_platform() -> Result<Box<dyn WindowPlatform>, PlatformError> {
    tracing::warn!("Native window capture is only implemented for Windows");
    Err(PlatformError::Unsupported("native window capture"))
}
