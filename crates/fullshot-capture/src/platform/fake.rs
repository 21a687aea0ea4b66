//! In-memory browser for tests and dry runs
//!
//! [`SimulatedBrowser`] plays all three host roles at once: it owns a frame
//! window, a content window and a document, and keeps them consistent the way
//! a real layout engine would. Layout can lag behind resizes, paints can be
//! scripted to fail or come back blank, and the window can refuse sizes.
//!
//! # Example
//!
//! ```rust
//! use fullshot_capture::platform::fake::{Scenario, SimulatedBrowser};
//! use fullshot_capture::types::WindowGeometry;
//!
//! let browser = SimulatedBrowser::new(Scenario {
//!     content: WindowGeometry::new(800, 1200),
//!     ..Scenario::default()
//! });
//! assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
//! ```

use super::{BrowsingContext, DocumentMetrics, WindowPlatform};
use crate::error::PlatformError;
use crate::types::{CanvasElement, ContentMetrics, PixelBuffer, PixelFormat, WindowGeometry, WindowHandle};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::debug;

pub const FRAME_WINDOW: WindowHandle = WindowHandle(0x10);
pub const CONTENT_WINDOW: WindowHandle = WindowHandle(0x20);

/// Value painted where nothing was drawn.
pub const BLANK_PIXEL: u32 = 0xFFFF_FFFF;

/// Result of one scripted rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintOutcome {
    /// The rasterization primitive reports failure.
    Fail,
    /// Succeeds but every pixel is [`BLANK_PIXEL`].
    Blank,
    /// Succeeds with rendered content.
    Painted,
}

/// Initial state of a simulated browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Frame size, chrome included.
    pub window: WindowGeometry,
    /// Frame size minus viewport size.
    pub chrome: WindowGeometry,
    /// Viewport size minus client size (scrollbars, borders).
    pub client_insets: WindowGeometry,
    /// Extent of the rendered document.
    pub content: WindowGeometry,
    pub standards_mode: bool,
    pub maximized: bool,
    /// Frame size after leaving the maximized state.
    pub restored_window: Option<WindowGeometry>,
    /// Largest frame the window manager accepts; larger requests are clamped.
    pub max_window: Option<WindowGeometry>,
    /// Layout recalculations needed before client metrics follow a resize.
    pub layout_lag: u32,
    /// Consumed one per rasterization; `Painted` once exhausted.
    pub paint: Vec<PaintOutcome>,
    pub has_window: bool,
    pub has_document: bool,
    pub has_canvas: bool,
    /// Every frame size query fails.
    pub window_size_fails: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            window: WindowGeometry::new(1024, 768),
            chrome: WindowGeometry::new(24, 68),
            client_insets: WindowGeometry::new(17, 17),
            content: WindowGeometry::new(600, 400),
            standards_mode: true,
            maximized: false,
            restored_window: None,
            max_window: None,
            layout_lag: 0,
            paint: Vec::new(),
            has_window: true,
            has_document: true,
            has_canvas: true,
            window_size_fails: false,
        }
    }
}

/// Calls observed by the simulated browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub resizes: Vec<WindowGeometry>,
    pub demaximize_calls: u32,
    pub maximize_calls: u32,
    pub prints: u32,
    pub redraws: u32,
    pub recalculations: Vec<bool>,
}

#[derive(Debug)]
struct State {
    frame: WindowGeometry,
    maximized: bool,
    maximized_frame: WindowGeometry,
    restored_frame: WindowGeometry,
    /// Viewport the document was last laid out against.
    laid_out_viewport: WindowGeometry,
    pending_recalculations: u32,
    paint: VecDeque<PaintOutcome>,
    log: CallLog,
}

pub struct SimulatedBrowser {
    scenario: Scenario,
    state: RefCell<State>,
}

impl SimulatedBrowser {
    pub fn new(scenario: Scenario) -> Self {
        let frame = scenario.window;
        let state = State {
            frame,
            maximized: scenario.maximized,
            maximized_frame: frame,
            restored_frame: scenario.restored_window.unwrap_or(frame),
            laid_out_viewport: viewport_for(frame, scenario.chrome),
            pending_recalculations: 0,
            paint: scenario.paint.iter().copied().collect(),
            log: CallLog::default(),
        };
        Self {
            scenario,
            state: RefCell::new(state),
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn frame_size(&self) -> WindowGeometry {
        self.state.borrow().frame
    }

    pub fn is_window_maximized(&self) -> bool {
        self.state.borrow().maximized
    }

    pub fn calls(&self) -> CallLog {
        self.state.borrow().log.clone()
    }

    /// Queue more rasterization outcomes.
    pub fn script_paint(&self, outcomes: &[PaintOutcome]) {
        self.state.borrow_mut().paint.extend(outcomes.iter().copied());
    }

    fn viewport(&self) -> WindowGeometry {
        viewport_for(self.state.borrow().frame, self.scenario.chrome)
    }

    fn apply_frame(&self, frame: WindowGeometry) {
        let mut state = self.state.borrow_mut();
        if state.frame == frame {
            return;
        }
        state.frame = frame;
        let viewport = viewport_for(frame, self.scenario.chrome);
        if self.scenario.layout_lag == 0 {
            state.laid_out_viewport = viewport;
        } else {
            state.pending_recalculations = self.scenario.layout_lag;
        }
    }

    fn check_handle(&self, handle: WindowHandle) -> Result<(), PlatformError> {
        if handle == FRAME_WINDOW || handle == CONTENT_WINDOW {
            Ok(())
        } else {
            Err(PlatformError::NoSuchWindow(handle))
        }
    }
}

fn viewport_for(frame: WindowGeometry, chrome: WindowGeometry) -> WindowGeometry {
    WindowGeometry::new(
        (frame.width - chrome.width).max(0),
        (frame.height - chrome.height).max(0),
    )
}

fn painted_pixel(x: u32, y: u32) -> u32 {
    0xFF00_0000 | ((x & 0xFF) << 16) | ((y & 0xFF) << 8) | ((x ^ y) & 0xFF)
}

impl WindowPlatform for SimulatedBrowser {
    fn window_size(&self, handle: WindowHandle) -> Result<WindowGeometry, PlatformError> {
        self.check_handle(handle)?;
        if self.scenario.window_size_fails {
            return Err(PlatformError::call("GetWindowRect", "simulated failure"));
        }
        if handle == CONTENT_WINDOW {
            Ok(self.viewport())
        } else {
            Ok(self.frame_size())
        }
    }

    fn set_window_size(&self, handle: WindowHandle, size: WindowGeometry) -> Result<(), PlatformError> {
        self.check_handle(handle)?;
        self.state.borrow_mut().log.resizes.push(size);

        // Maximized windows ignore explicit sizes.
        if self.is_window_maximized() {
            debug!("Simulated window is maximized, ignoring resize to {}", size);
            return Ok(());
        }

        let applied = match self.scenario.max_window {
            Some(max) => WindowGeometry::new(size.width.min(max.width), size.height.min(max.height)),
            None => size,
        };
        self.apply_frame(applied);
        Ok(())
    }

    fn is_maximized(&self, _handle: WindowHandle) -> bool {
        self.is_window_maximized()
    }

    fn show_restored_no_activate(&self, _handle: WindowHandle) {
        let restored = {
            let mut state = self.state.borrow_mut();
            state.log.demaximize_calls += 1;
            state.maximized = false;
            state.restored_frame
        };
        self.apply_frame(restored);
    }

    fn maximize(&self, _handle: WindowHandle) {
        let maximized = {
            let mut state = self.state.borrow_mut();
            state.log.maximize_calls += 1;
            if !state.maximized {
                state.restored_frame = state.frame;
            }
            state.maximized = true;
            state.maximized_frame
        };
        self.apply_frame(maximized);
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Bgra
    }

    fn print_window(&self, handle: WindowHandle, buffer: &mut PixelBuffer) -> Result<(), PlatformError> {
        if handle != CONTENT_WINDOW {
            return Err(PlatformError::NoSuchWindow(handle));
        }
        let outcome = {
            let mut state = self.state.borrow_mut();
            state.log.prints += 1;
            state.paint.pop_front().unwrap_or(PaintOutcome::Painted)
        };
        match outcome {
            PaintOutcome::Fail => Err(PlatformError::call("PrintWindow", "simulated failure")),
            PaintOutcome::Blank => {
                buffer.fill(BLANK_PIXEL);
                Ok(())
            }
            PaintOutcome::Painted => {
                for y in 0..buffer.height {
                    for x in 0..buffer.width {
                        buffer.set_pixel(x, y, painted_pixel(x, y));
                    }
                }
                Ok(())
            }
        }
    }

    fn redraw(&self, _handle: WindowHandle) {
        self.state.borrow_mut().log.redraws += 1;
    }
}

impl BrowsingContext for SimulatedBrowser {
    fn top_level_window(&self) -> Option<WindowHandle> {
        self.scenario.has_window.then_some(FRAME_WINDOW)
    }

    fn content_window(&self) -> Option<WindowHandle> {
        self.scenario.has_window.then_some(CONTENT_WINDOW)
    }

    fn document(&self) -> Option<&dyn DocumentMetrics> {
        if self.scenario.has_document {
            Some(self)
        } else {
            None
        }
    }
}

impl DocumentMetrics for SimulatedBrowser {
    fn is_standards_mode(&self) -> bool {
        self.scenario.standards_mode
    }

    fn has_element(&self, _canvas: CanvasElement) -> bool {
        self.scenario.has_canvas
    }

    fn metrics(&self, _canvas: CanvasElement) -> Result<ContentMetrics, PlatformError> {
        if !self.scenario.has_canvas {
            return Err(PlatformError::call("clientWidth", "canvas element is gone"));
        }
        let viewport = self.state.borrow().laid_out_viewport;
        let insets = self.scenario.client_insets;
        let client_width = (viewport.width - insets.width).max(0);
        let client_height = (viewport.height - insets.height).max(0);
        Ok(ContentMetrics {
            client_width,
            client_height,
            scroll_width: self.scenario.content.width.max(client_width),
            scroll_height: self.scenario.content.height.max(client_height),
        })
    }

    fn force_recalculate(&self, force: bool) -> Result<(), PlatformError> {
        let viewport = self.viewport();
        let mut state = self.state.borrow_mut();
        state.log.recalculations.push(force);
        if state.pending_recalculations > 0 {
            state.pending_recalculations -= 1;
            if state.pending_recalculations == 0 {
                state.laid_out_viewport = viewport;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_follow_resize_immediately_without_lag() {
        let browser = SimulatedBrowser::new(Scenario::default());
        let before = browser.metrics(CanvasElement::DocumentElement).unwrap();
        assert_eq!(before.client_width, 1024 - 24 - 17);

        browser
            .set_window_size(FRAME_WINDOW, WindowGeometry::new(1124, 768))
            .unwrap();
        let after = browser.metrics(CanvasElement::DocumentElement).unwrap();
        assert_eq!(after.client_width, before.client_width + 100);
    }

    #[test]
    fn test_layout_lag_requires_recalculation() {
        let browser = SimulatedBrowser::new(Scenario {
            layout_lag: 2,
            ..Scenario::default()
        });
        let before = browser.metrics(CanvasElement::DocumentElement).unwrap();
        browser
            .set_window_size(FRAME_WINDOW, WindowGeometry::new(1024, 868))
            .unwrap();

        assert_eq!(browser.metrics(CanvasElement::DocumentElement).unwrap(), before);
        browser.force_recalculate(false).unwrap();
        assert_eq!(browser.metrics(CanvasElement::DocumentElement).unwrap(), before);
        browser.force_recalculate(true).unwrap();
        let settled = browser.metrics(CanvasElement::DocumentElement).unwrap();
        assert_eq!(settled.client_height, before.client_height + 100);
    }

    #[test]
    fn test_maximized_window_ignores_explicit_size() {
        let browser = SimulatedBrowser::new(Scenario {
            maximized: true,
            restored_window: Some(WindowGeometry::new(800, 600)),
            ..Scenario::default()
        });
        browser
            .set_window_size(FRAME_WINDOW, WindowGeometry::new(1200, 900))
            .unwrap();
        assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));

        browser.show_restored_no_activate(FRAME_WINDOW);
        assert_eq!(browser.frame_size(), WindowGeometry::new(800, 600));

        browser.maximize(FRAME_WINDOW);
        assert!(browser.is_window_maximized());
        assert_eq!(browser.frame_size(), WindowGeometry::new(1024, 768));
    }

    #[test]
    fn test_scripted_paint_outcomes() {
        let browser = SimulatedBrowser::new(Scenario {
            paint: vec![PaintOutcome::Fail, PaintOutcome::Blank],
            ..Scenario::default()
        });
        let mut buffer = PixelBuffer::allocate(4, 4, PixelFormat::Bgra).unwrap();

        assert!(browser.print_window(CONTENT_WINDOW, &mut buffer).is_err());
        browser.print_window(CONTENT_WINDOW, &mut buffer).unwrap();
        assert_eq!(buffer.pixel(3, 3), BLANK_PIXEL);
        browser.print_window(CONTENT_WINDOW, &mut buffer).unwrap();
        assert_ne!(buffer.pixel(0, 0), buffer.pixel(1, 0));
        assert_eq!(browser.calls().prints, 3);
    }

    #[test]
    fn test_scenario_from_toml() {
        let scenario: Scenario = toml::from_str(
            r#"
window = { width = 1280, height = 1024 }
content = { width = 900, height = 3000 }
layout_lag = 1
paint = ["blank", "painted"]
"#,
        )
        .unwrap();
        assert_eq!(scenario.window, WindowGeometry::new(1280, 1024));
        assert_eq!(scenario.paint, vec![PaintOutcome::Blank, PaintOutcome::Painted]);
        assert!(scenario.has_document);
        assert_eq!(scenario.chrome, WindowGeometry::new(24, 68));
    }
}
