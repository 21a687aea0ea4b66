use crate::screenshot::ErrorCode;
use crate::types::WindowHandle;
use thiserror::Error;

/// Failure reported by a platform or document call.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{call} failed: {message}")]
    Call { call: &'static str, message: String },

    #[error("window {0:?} does not exist")]
    NoSuchWindow(WindowHandle),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl PlatformError {
    pub fn call(call: &'static str, message: impl Into<String>) -> Self {
        PlatformError::Call {
            call,
            message: message.into(),
        }
    }
}

/// Failure of a single capture attempt.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No frame or content window: fatal to the request.
    #[error("window unavailable: {0}")]
    WindowUnavailable(String),

    /// No document or canvas: fatal to the request.
    #[error("document unavailable: {0}")]
    DocumentUnavailable(String),

    /// Window metrics or pixels could not be obtained: the caller degrades
    /// to an empty image.
    #[error("capture degraded: {0}")]
    CaptureDegraded(String),
}

impl CaptureError {
    /// Whether the request must fail instead of degrading to an empty image.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CaptureError::WindowUnavailable(_) | CaptureError::DocumentUnavailable(_)
        )
    }

    pub fn status(&self) -> ErrorCode {
        match self {
            CaptureError::WindowUnavailable(_) => ErrorCode::NoSuchWindow,
            CaptureError::DocumentUnavailable(_) | CaptureError::CaptureDegraded(_) => {
                ErrorCode::UnknownError
            }
        }
    }
}

impl From<PlatformError> for CaptureError {
    fn from(err: PlatformError) -> Self {
        CaptureError::CaptureDegraded(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no image was produced")]
    NullInput,

    #[error("PNG compression failed: {0}")]
    Compression(#[from] image::ImageError),

    #[error("pixel buffer is malformed: {0}")]
    MalformedBuffer(String),
}
