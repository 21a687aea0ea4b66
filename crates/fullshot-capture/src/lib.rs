//! Full-page capture of a document surface hosted in a native window.
//!
//! The visible viewport is usually smaller than the document. To capture all
//! of it the pipeline:
//!
//! 1. resolves how large the frame must be for the canvas to fit without
//!    scrolling ([`resolver`])
//! 2. grows the window silently and verifies it ([`resize`])
//! 3. rasterizes the content window, retrying blank paints ([`engine`])
//! 4. restores the original geometry, on every path
//! 5. encodes the pixels as PNG base64 ([`encoder`])
//!
//! [`screenshot::take_screenshot`] runs the whole cycle against any host that
//! implements the [`platform`] traits.

pub mod encoder;
pub mod engine;
pub mod error;
pub mod platform;
pub mod resize;
pub mod resolver;
pub mod screenshot;
pub mod types;

pub use error::{CaptureError, EncodeError, PlatformError};
pub use platform::{create_platform, BrowsingContext, DocumentMetrics, WindowPlatform};
pub use screenshot::{take_screenshot, CommandResponse, ErrorCode};
pub use types::*;

/// Largest capture dimension; image encoders start failing beyond it.
pub const MAX_CAPTURE_DIMENSION: i32 = 65534;

/// Width of the band along the right and bottom edges left out of the blank
/// check, roughly one scrollbar.
pub const DEFAULT_SAMPLE_INSET: i32 = 17;

/// Pixels taken off a grown height so the vertical scrollbar stays rendered.
///
/// Tuned against one layout engine; other engines may not need it.
pub const DEFAULT_SCROLLBAR_RETENTION_PX: i32 = 2;

/// Tunables of the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub max_dimension: i32,
    pub sample_inset: i32,
    pub scrollbar_retention_px: i32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_dimension: MAX_CAPTURE_DIMENSION,
            sample_inset: DEFAULT_SAMPLE_INSET,
            scrollbar_retention_px: DEFAULT_SCROLLBAR_RETENTION_PX,
        }
    }
}
