//! Viewport sizing resolver
//!
//! Works out how large the frame must be for the document canvas to fit the
//! viewport without scrolling, growing the window through a
//! [`ResizeSession`] as each axis is resolved.
//!
//! Scrollbar thickness is inferred as viewport size minus client size; there
//! is no direct query for it.

use crate::error::CaptureError;
use crate::platform::DocumentMetrics;
use crate::resize::ResizeSession;
use crate::types::{CanvasElement, ContentMetrics, TargetDimensions, WindowGeometry};
use crate::CaptureOptions;
use tracing::{debug, warn};

/// Client size reads after a resize, with a layout recalculation between
/// them. Some layout engines do not update synchronously with the resize.
pub const LAYOUT_SETTLE_ATTEMPTS: u32 = 2;

/// Sizes of one axis before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisInput {
    pub window: i32,
    pub view: i32,
    pub client: i32,
    pub scroll: i32,
}

/// Resolution of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPlan {
    pub scrollbar: i32,
    pub target_view: i32,
    pub target_window: i32,
    pub needs_resize: bool,
    pub truncated: bool,
}

/// Resolve one axis.
///
/// `retention` is taken off the target view when the axis grows. Height uses
/// it to keep a vertical scrollbar rendered, so that the width freed by a
/// vanishing scrollbar does not reflow the content.
pub fn plan_axis(input: AxisInput, max_dimension: i32, retention: i32) -> AxisPlan {
    let scrollbar = (input.view - input.client).max(0);
    let mut target_view = input.view.max(input.scroll.saturating_add(scrollbar));
    let mut truncated = false;

    if target_view > input.view {
        if target_view > max_dimension {
            target_view = max_dimension;
            truncated = true;
        }
        // Never shrink below the current viewport.
        target_view = (target_view - retention).max(input.view);
    }

    let needs_resize = target_view > input.view;
    let target_window = if needs_resize {
        input.window + (target_view - input.view)
    } else {
        input.window
    };

    AxisPlan {
        scrollbar,
        target_view,
        target_window,
        needs_resize,
        truncated,
    }
}

/// Everything the capture engine needs from resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedViewport {
    pub dimensions: TargetDimensions,
    /// Client size before any resize; the degeneracy sample is cut from it.
    pub initial_client: WindowGeometry,
    pub resized: bool,
}

pub struct ViewportResolver<'a> {
    document: &'a dyn DocumentMetrics,
    canvas: CanvasElement,
    options: &'a CaptureOptions,
}

impl<'a> ViewportResolver<'a> {
    pub fn new(document: &'a dyn DocumentMetrics, canvas: CanvasElement, options: &'a CaptureOptions) -> Self {
        Self {
            document,
            canvas,
            options,
        }
    }

    /// Resolve both axes for a viewport currently `view` in size, growing the
    /// frame held by `session` as needed.
    pub fn resolve(&self, session: &mut ResizeSession<'_>, view: WindowGeometry) -> Result<ResolvedViewport, CaptureError> {
        let window = session.original();
        debug!("Initial view size (w, h): {}, {}", view.width, view.height);
        let mut target_window = window;

        let initial = self.read_metrics()?;
        let width = plan_axis(
            AxisInput {
                window: window.width,
                view: view.width,
                client: initial.client_width,
                scroll: initial.scroll_width,
            },
            self.options.max_dimension,
            0,
        );
        debug!(
            "Initial clientWidth={} scrollWidth={} scrollbarWidth={}",
            initial.client_width, initial.scroll_width, width.scrollbar
        );
        if width.truncated {
            warn!("Required width is greater than limit. Truncating screenshot width.");
        }
        if width.needs_resize {
            target_window.width = width.target_window;
            debug!("Increasing window width to {}px", target_window.width);
            session.resize_to(target_window);
        }

        // Height metrics are read against the layout produced by the width change.
        let after_width = self.read_metrics()?;
        let retention = if width.scrollbar > 0 {
            self.options.scrollbar_retention_px
        } else {
            0
        };
        let height = plan_axis(
            AxisInput {
                window: window.height,
                view: view.height,
                client: after_width.client_height,
                scroll: after_width.scroll_height,
            },
            self.options.max_dimension,
            retention,
        );
        debug!(
            "Initial clientHeight={} scrollHeight={} scrollbarHeight={}",
            after_width.client_height, after_width.scroll_height, height.scrollbar
        );
        if height.truncated {
            warn!("Required height is greater than limit. Truncating screenshot height.");
        }
        if height.needs_resize {
            if retention > 0 {
                debug!("Removed {}px from the targeted height to force the vertical scrollbar.", retention);
            }
            target_window.height = height.target_window;
            debug!("Increasing window height to {}px", target_window.height);
            session.resize_to(target_window);
        }

        let initial_client = WindowGeometry::new(initial.client_width, after_width.client_height);
        let mut client = self.settle_client_size(initial_client, width.needs_resize, height.needs_resize)?;

        if client.width < 1 || client.height < 1 {
            warn!("Target client size is null. Take the view size instead.");
            client = WindowGeometry::new(width.target_view, height.target_view);
        }

        let dimensions = TargetDimensions {
            target_window_width: target_window.width,
            target_window_height: target_window.height,
            target_view_width: width.target_view,
            target_view_height: height.target_view,
            target_client_width: client.width,
            target_client_height: client.height,
        };
        debug!("Final client size: {} x {}", client.width, client.height);
        debug!("Final view size: {} x {}", width.target_view, height.target_view);
        debug!("Final window size: {} x {}", target_window.width, target_window.height);

        Ok(ResolvedViewport {
            dimensions,
            initial_client,
            resized: width.needs_resize || height.needs_resize,
        })
    }

    /// Read the client size until every resized axis reports a new value.
    fn settle_client_size(
        &self,
        initial: WindowGeometry,
        resized_width: bool,
        resized_height: bool,
    ) -> Result<WindowGeometry, CaptureError> {
        if !resized_width && !resized_height {
            return Ok(initial);
        }

        let mut client = initial;
        for attempt in 0..LAYOUT_SETTLE_ATTEMPTS {
            let metrics = self.read_metrics()?;
            client = WindowGeometry::new(metrics.client_width, metrics.client_height);

            let width_settled = !resized_width || client.width != initial.width;
            let height_settled = !resized_height || client.height != initial.height;
            if width_settled && height_settled {
                break;
            }

            debug!("Failed to update the client size at try {}", attempt);
            if let Err(e) = self.document.force_recalculate(attempt > 0) {
                warn!("Layout recalculation failed: {}", e);
            }
        }
        Ok(client)
    }

    fn read_metrics(&self) -> Result<ContentMetrics, CaptureError> {
        Ok(self.document.metrics(self.canvas)?)
    }
}
