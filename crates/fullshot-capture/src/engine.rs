//! Capture engine: rasterize a window and reject blank results.

use crate::platform::WindowPlatform;
use crate::types::{PixelBuffer, WindowHandle};
use tracing::{debug, warn};

/// Rasterizations tried before settling for whatever was last drawn.
pub const RASTERIZE_ATTEMPTS: u32 = 3;

/// Whether every pixel of the top-left `check_width` x `check_height` region
/// (clamped to the buffer) equals the top-left pixel.
///
/// An empty region counts as uniform.
pub fn is_uniform(buffer: &PixelBuffer, check_width: i32, check_height: i32) -> bool {
    let width = check_width.clamp(0, buffer.width as i32) as u32;
    let height = check_height.clamp(0, buffer.height as i32) as u32;
    let first_pixel = buffer.pixel(0, 0);

    for y in 0..height {
        for x in 0..width {
            if buffer.pixel(x, y) != first_pixel {
                return false;
            }
        }
    }
    true
}

/// Rasterize `handle` into a new `width` x `height` buffer.
///
/// Each attempt that fails or yields a uniform sample region forces a redraw
/// before the next. A uniform image is still returned once attempts run out;
/// `None` means nothing could be drawn at all.
pub fn capture_view(
    platform: &dyn WindowPlatform,
    handle: WindowHandle,
    width: i32,
    height: i32,
    check_width: i32,
    check_height: i32,
) -> Option<PixelBuffer> {
    let Some(mut buffer) = PixelBuffer::allocate(width, height, platform.pixel_format()) else {
        warn!("Unable to initialize image object ({}x{})", width, height);
        return None;
    };

    let mut drawn = false;
    for attempt in 1..=RASTERIZE_ATTEMPTS {
        if let Err(e) = platform.print_window(handle, &mut buffer) {
            warn!("PrintWindow API failed at try {}: {}", attempt, e);
            platform.redraw(handle);
            continue;
        }
        drawn = true;

        if is_uniform(&buffer, check_width, check_height) {
            debug!("Failed to capture non single colour browser image at try {}", attempt);
            platform.redraw(handle);
            continue;
        }

        debug!("Captured {}x{} image at try {}", width, height, attempt);
        return Some(buffer);
    }

    if drawn {
        Some(buffer)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{PaintOutcome, Scenario, SimulatedBrowser, BLANK_PIXEL, CONTENT_WINDOW};
    use crate::types::PixelFormat;

    fn white(width: i32, height: i32) -> PixelBuffer {
        let mut buffer = PixelBuffer::allocate(width, height, PixelFormat::Bgra).unwrap();
        buffer.fill(0xFFFF_FFFF);
        buffer
    }

    #[test]
    fn test_all_white_is_uniform() {
        assert!(is_uniform(&white(20, 10), 20, 10));
    }

    #[test]
    fn test_single_bit_difference_is_not_uniform() {
        let mut buffer = white(20, 10);
        buffer.set_pixel(19, 9, 0xFFFF_FFFE);
        assert!(!is_uniform(&buffer, 20, 10));
    }

    #[test]
    fn test_difference_outside_sample_is_ignored() {
        let mut buffer = white(20, 10);
        buffer.set_pixel(19, 9, 0x0000_0000);
        assert!(is_uniform(&buffer, 19, 9));
    }

    #[test]
    fn test_sample_is_clamped_to_buffer() {
        let mut buffer = white(4, 4);
        buffer.set_pixel(3, 3, 0);
        assert!(!is_uniform(&buffer, 1000, 1000));
        assert!(is_uniform(&buffer, -5, 2));
    }

    #[test]
    fn test_painted_on_first_try() {
        let browser = SimulatedBrowser::new(Scenario::default());
        let buffer = capture_view(&browser, CONTENT_WINDOW, 64, 48, 40, 30).unwrap();
        assert_eq!((buffer.width, buffer.height), (64, 48));
        assert_eq!(browser.calls().prints, 1);
        assert_eq!(browser.calls().redraws, 0);
    }

    #[test]
    fn test_retries_after_failure_and_blank() {
        let browser = SimulatedBrowser::new(Scenario {
            paint: vec![PaintOutcome::Fail, PaintOutcome::Blank],
            ..Scenario::default()
        });
        let buffer = capture_view(&browser, CONTENT_WINDOW, 64, 48, 40, 30).unwrap();
        assert!(!is_uniform(&buffer, 40, 30));
        assert_eq!(browser.calls().prints, 3);
        assert_eq!(browser.calls().redraws, 2);
    }

    #[test]
    fn test_blank_image_is_returned_when_attempts_run_out() {
        let browser = SimulatedBrowser::new(Scenario {
            paint: vec![PaintOutcome::Blank; 3],
            ..Scenario::default()
        });
        let buffer = capture_view(&browser, CONTENT_WINDOW, 16, 16, 10, 10).unwrap();
        assert_eq!(buffer.pixel(5, 5), BLANK_PIXEL);
        assert_eq!(browser.calls().prints, RASTERIZE_ATTEMPTS);
    }

    #[test]
    fn test_nothing_drawn_yields_none() {
        let browser = SimulatedBrowser::new(Scenario {
            paint: vec![PaintOutcome::Fail; 3],
            ..Scenario::default()
        });
        assert!(capture_view(&browser, CONTENT_WINDOW, 16, 16, 10, 10).is_none());
        assert_eq!(browser.calls().redraws, 3);
    }

    #[test]
    fn test_unallocatable_size_yields_none() {
        let browser = SimulatedBrowser::new(Scenario::default());
        assert!(capture_view(&browser, CONTENT_WINDOW, 0, 100, 0, 0).is_none());
        assert_eq!(browser.calls().prints, 0);
    }
}
