//! Window resize controller
//!
//! Resizes are applied silently and verified by reading the frame size back.
//! [`ResizeSession`] remembers the geometry a capture started from and puts
//! it back exactly once, whichever way the capture ends.

use crate::error::PlatformError;
use crate::platform::WindowPlatform;
use crate::types::{WindowGeometry, WindowHandle};
use tracing::{debug, warn};

/// Apply `size` to the frame of `handle` and confirm it took effect.
///
/// Returns `false` when the call fails or the observed size differs from the
/// request; the caller carries on with whatever geometry resulted.
pub fn resize(platform: &dyn WindowPlatform, handle: WindowHandle, size: WindowGeometry) -> bool {
    let succeeded = match platform.set_window_size(handle, size) {
        Ok(()) => match platform.window_size(handle) {
            Ok(observed) => {
                if observed != size {
                    debug!("Window size after resize is {} instead of {}", observed, size);
                }
                observed == size
            }
            Err(e) => {
                debug!("Unable to read back window size: {}", e);
                false
            }
        },
        Err(e) => {
            debug!("Resize call failed: {}", e);
            false
        }
    };

    if !succeeded {
        warn!(
            "Failed to resize the window to w={} h={}",
            size.width, size.height
        );
    }
    succeeded
}

/// Put a window back the way it was before a capture touched it.
pub fn restore(
    platform: &dyn WindowPlatform,
    handle: WindowHandle,
    original: WindowGeometry,
    was_maximized: bool,
) {
    if was_maximized {
        debug!("Restoring maximized state");
        platform.maximize(handle);
    } else {
        debug!("Restoring window size to {}", original);
        resize(platform, handle, original);
    }
}

/// Exclusive hold on a window's geometry for the span of one capture attempt.
///
/// Dropping the session restores the window if it was mutated.
pub struct ResizeSession<'a> {
    platform: &'a dyn WindowPlatform,
    handle: WindowHandle,
    original: WindowGeometry,
    was_maximized: bool,
    demaximized: bool,
    resized: bool,
    restored: bool,
}

impl<'a> ResizeSession<'a> {
    /// Record the current geometry of `handle`. Nothing is mutated yet.
    pub fn begin(platform: &'a dyn WindowPlatform, handle: WindowHandle) -> Result<Self, PlatformError> {
        let original = platform.window_size(handle)?;
        let was_maximized = platform.is_maximized(handle);
        debug!(
            "Initial window size (w, h): {}, {} (maximized: {})",
            original.width, original.height, was_maximized
        );
        Ok(Self {
            platform,
            handle,
            original,
            was_maximized,
            demaximized: false,
            resized: false,
            restored: false,
        })
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn original(&self) -> WindowGeometry {
        self.original
    }

    pub fn was_maximized(&self) -> bool {
        self.was_maximized
    }

    /// Whether restoration will have anything to undo.
    pub fn is_mutated(&self) -> bool {
        self.demaximized || self.resized
    }

    /// Resize the frame, leaving the maximized state first if needed.
    pub fn resize_to(&mut self, size: WindowGeometry) -> bool {
        // Maximized windows ignore explicit sizes.
        if self.was_maximized && !self.demaximized {
            debug!("Window is maximized currently. Demaximizing.");
            self.platform.show_restored_no_activate(self.handle);
            self.demaximized = true;
        }
        self.resized = true;
        resize(self.platform, self.handle, size)
    }

    /// Restore now instead of at drop.
    pub fn restore(mut self) {
        self.restore_once();
    }

    fn restore_once(&mut self) {
        if self.restored || !self.is_mutated() {
            return;
        }
        self.restored = true;
        restore(self.platform, self.handle, self.original, self.was_maximized);
    }
}

impl Drop for ResizeSession<'_> {
    fn drop(&mut self) {
        self.restore_once();
    }
}
