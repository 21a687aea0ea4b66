//! Screenshot command: the full resolve, resize, capture, restore, encode
//! cycle behind a single call.
//!
//! Only a missing window or document is reported as an error. Every other
//! failure degrades to a successful response carrying an empty string, so a
//! flaky capture never fails the caller's operation.

use crate::encoder;
use crate::engine;
use crate::error::CaptureError;
use crate::platform::{BrowsingContext, DocumentMetrics, WindowPlatform};
use crate::resize::ResizeSession;
use crate::resolver::ViewportResolver;
use crate::types::{CanvasElement, PixelBuffer, WindowHandle};
use crate::CaptureOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// End-to-end attempts before giving up with an empty image.
pub const CAPTURE_ATTEMPTS: u32 = 2;

/// Status codes of the automation wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    NoSuchWindow,
    UnknownError,
}

impl ErrorCode {
    /// Legacy numeric status.
    pub fn status(&self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::UnknownError => 13,
            ErrorCode::NoSuchWindow => 23,
        }
    }

    /// W3C error string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::NoSuchWindow => "no such window",
            ErrorCode::UnknownError => "unknown error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    Success { value: String },
    Error { status: ErrorCode, message: String },
}

impl CommandResponse {
    pub fn success(value: impl Into<String>) -> Self {
        CommandResponse::Success { value: value.into() }
    }

    pub fn error(status: ErrorCode, message: impl Into<String>) -> Self {
        CommandResponse::Error {
            status,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandResponse::Success { .. })
    }

    /// The encoded image, if this is a success.
    pub fn value(&self) -> Option<&str> {
        match self {
            CommandResponse::Success { value } => Some(value),
            CommandResponse::Error { .. } => None,
        }
    }

    pub fn status(&self) -> ErrorCode {
        match self {
            CommandResponse::Success { .. } => ErrorCode::Success,
            CommandResponse::Error { status, .. } => *status,
        }
    }

    /// Wire form: `{"status": 0, "value": "<base64>"}` or
    /// `{"status": 23, "value": {"error": "no such window", "message": "..."}}`.
    pub fn to_json(&self) -> Value {
        match self {
            CommandResponse::Success { value } => json!({
                "status": ErrorCode::Success.status(),
                "value": value,
            }),
            CommandResponse::Error { status, message } => json!({
                "status": status.status(),
                "value": {
                    "error": status.as_str(),
                    "message": message,
                },
            }),
        }
    }
}

/// Handles and document of the surface being captured.
struct CaptureTarget<'a> {
    top_level: WindowHandle,
    content: WindowHandle,
    document: &'a dyn DocumentMetrics,
    canvas: CanvasElement,
}

fn acquire(context: &dyn BrowsingContext) -> Result<CaptureTarget<'_>, CaptureError> {
    let top_level = context.top_level_window().filter(|handle| !handle.is_null());
    let content = context.content_window().filter(|handle| !handle.is_null());
    let (Some(top_level), Some(content)) = (top_level, content) else {
        return Err(CaptureError::WindowUnavailable(
            "No browser window is displaying content".to_string(),
        ));
    };

    let Some(document) = context.document() else {
        warn!("Unable to get document from browser. Are you viewing a non-HTML document?");
        return Err(CaptureError::DocumentUnavailable(
            "Unable to get document from browser".to_string(),
        ));
    };

    let canvas = CanvasElement::for_mode(document.is_standards_mode());
    if !document.has_element(canvas) {
        warn!("Unable to get {:?} canvas from document.", canvas);
        return Err(CaptureError::DocumentUnavailable(format!(
            "Unable to get {:?} canvas from document",
            canvas
        )));
    }

    Ok(CaptureTarget {
        top_level,
        content,
        document,
        canvas,
    })
}

/// One resolve, resize, capture and restore cycle.
fn capture_document(
    target: &CaptureTarget<'_>,
    platform: &dyn WindowPlatform,
    options: &CaptureOptions,
) -> Result<PixelBuffer, CaptureError> {
    let mut session = ResizeSession::begin(platform, target.top_level)?;
    let view = platform.window_size(target.content)?;

    let resolver = ViewportResolver::new(target.document, target.canvas, options);
    let resolved = resolver.resolve(&mut session, view)?;
    let dimensions = resolved.dimensions;

    let image = engine::capture_view(
        platform,
        target.content,
        dimensions.target_client_width,
        dimensions.target_client_height,
        resolved.initial_client.width - options.sample_inset,
        resolved.initial_client.height - options.sample_inset,
    );

    session.restore();

    image.ok_or_else(|| CaptureError::CaptureDegraded("no image could be captured".to_string()))
}

/// Capture the full document shown by `context` and return it as PNG base64.
pub fn take_screenshot(
    context: &dyn BrowsingContext,
    platform: &dyn WindowPlatform,
    options: &CaptureOptions,
) -> CommandResponse {
    let span = info_span!("screenshot", request_id = %Uuid::new_v4());
    let _enter = span.enter();

    let target = match acquire(context) {
        Ok(target) => target,
        Err(e) => return CommandResponse::error(e.status(), e.to_string()),
    };

    let mut attempt = 1;
    let image = loop {
        match capture_document(&target, platform, options) {
            Ok(image) => break image,
            Err(e) if e.is_fatal() => return CommandResponse::error(e.status(), e.to_string()),
            Err(e) => {
                warn!("Failed to capture browser image at {} try: {}", attempt, e);
                if attempt >= CAPTURE_ATTEMPTS {
                    return CommandResponse::success("");
                }
                attempt += 1;
            }
        }
    };

    match encoder::encode_base64_png(Some(&image)) {
        Ok(text) => {
            info!("Captured {}x{} screenshot", image.width, image.height);
            CommandResponse::success(text)
        }
        Err(e) => {
            warn!("Unable to transform browser image to Base64 format: {}", e);
            CommandResponse::success("")
        }
    }
}
