//! Win32 backend.
//!
//! Frames are resized with `SetWindowPos` and rasterized with `PrintWindow`
//! into a top-down 32bpp DIB section. [`NativeWindowContext`] finds a
//! browser window by title and reads document metrics from the content
//! window's client rectangle and scroll ranges.

use super::{BrowsingContext, DocumentMetrics, WindowPlatform};
use crate::error::PlatformError;
use crate::types::{CanvasElement, ContentMetrics, PixelBuffer, WindowGeometry, WindowHandle};
use std::ffi::c_void;
use tracing::{debug, warn};
use ::windows::core::PCWSTR;
use ::windows::Win32::Foundation::{BOOL, HANDLE, HWND, LPARAM, RECT};
use ::windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, RedrawWindow, SelectObject,
    UpdateWindow, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ, HRGN,
    RDW_ALLCHILDREN, RDW_INVALIDATE, RDW_UPDATENOW,
};
use ::windows::Win32::Storage::Xps::{PrintWindow, PRINT_WINDOW_FLAGS};
use ::windows::Win32::UI::WindowsAndMessaging::{
    EnumChildWindows, FindWindowW, GetClassNameW, GetClientRect, GetScrollInfo, GetWindowRect,
    IsWindow, IsZoomed, SetWindowPos, ShowWindow, SB_HORZ, SB_VERT, SCROLLBAR_CONSTANTS,
    SCROLLINFO, SIF_PAGE, SIF_RANGE, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOOWNERZORDER,
    SWP_NOSENDCHANGING, SWP_NOZORDER, SW_MAXIMIZE, SW_SHOWNOACTIVATE,
};

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0)
}

fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(call: &'static str, err: ::windows::core::Error) -> PlatformError {
    PlatformError::call(call, err.message().to_string())
}

/// Stateless Win32 window operations.
#[derive(Debug, Default)]
pub struct Win32Platform;

impl Win32Platform {
    pub fn new() -> Self {
        Self
    }
}

impl WindowPlatform for Win32Platform {
    fn window_size(&self, handle: WindowHandle) -> Result<WindowGeometry, PlatformError> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(handle), &mut rect) }.map_err(|e| last_error("GetWindowRect", e))?;
        Ok(WindowGeometry::new(rect.right - rect.left, rect.bottom - rect.top))
    }

    fn set_window_size(&self, handle: WindowHandle, size: WindowGeometry) -> Result<(), PlatformError> {
        // No WM_WINDOWPOSCHANGING: the browser must not react to the resize.
        let flags = SWP_NOSENDCHANGING | SWP_NOMOVE | SWP_NOOWNERZORDER | SWP_NOZORDER | SWP_NOACTIVATE;
        unsafe { SetWindowPos(hwnd(handle), HWND(0), 0, 0, size.width, size.height, flags) }
            .map_err(|e| last_error("SetWindowPos", e))
    }

    fn is_maximized(&self, handle: WindowHandle) -> bool {
        unsafe { IsZoomed(hwnd(handle)) }.as_bool()
    }

    fn show_restored_no_activate(&self, handle: WindowHandle) {
        unsafe {
            ShowWindow(hwnd(handle), SW_SHOWNOACTIVATE);
        }
    }

    fn maximize(&self, handle: WindowHandle) {
        unsafe {
            ShowWindow(hwnd(handle), SW_MAXIMIZE);
        }
    }

    fn print_window(&self, handle: WindowHandle, buffer: &mut PixelBuffer) -> Result<(), PlatformError> {
        let surface = DibSurface::create(buffer.width as i32, buffer.height as i32)?;
        let printed = unsafe { PrintWindow(hwnd(handle), surface.dc, PRINT_WINDOW_FLAGS(0)) };
        if !printed.as_bool() {
            return Err(PlatformError::call("PrintWindow", "returned FALSE"));
        }
        surface.copy_into(buffer);
        Ok(())
    }

    fn redraw(&self, handle: WindowHandle) {
        unsafe {
            UpdateWindow(hwnd(handle));
        }
    }
}

/// Memory DC with a top-down 32bpp DIB selected into it.
struct DibSurface {
    dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
    bits: *mut c_void,
    width: i32,
    height: i32,
}

impl DibSurface {
    fn create(width: i32, height: i32) -> Result<Self, PlatformError> {
        let info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height: rows run top-down.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        unsafe {
            let dc = CreateCompatibleDC(HDC(0));
            if dc.is_invalid() {
                return Err(PlatformError::call("CreateCompatibleDC", "returned NULL"));
            }
            let mut bits: *mut c_void = std::ptr::null_mut();
            let bitmap = match CreateDIBSection(dc, &info, DIB_RGB_COLORS, &mut bits, HANDLE(0), 0) {
                Ok(bitmap) if !bits.is_null() => bitmap,
                Ok(bitmap) => {
                    DeleteObject(bitmap);
                    DeleteDC(dc);
                    return Err(PlatformError::call("CreateDIBSection", "no pixel memory"));
                }
                Err(e) => {
                    DeleteDC(dc);
                    return Err(last_error("CreateDIBSection", e));
                }
            };
            let previous = SelectObject(dc, bitmap);
            Ok(Self {
                dc,
                bitmap,
                previous,
                bits,
                width,
                height,
            })
        }
    }

    fn copy_into(&self, buffer: &mut PixelBuffer) {
        let stride = self.width as usize * PixelBuffer::BYTES_PER_PIXEL;
        let len = stride * self.height as usize;
        // SAFETY: the DIB section owns `len` bytes at `bits` until `drop`.
        let source = unsafe { std::slice::from_raw_parts(self.bits as *const u8, len) };
        for (y, row) in source.chunks_exact(stride).enumerate() {
            let offset = y * buffer.stride;
            buffer.data[offset..offset + stride].copy_from_slice(row);
        }
    }
}

impl Drop for DibSurface {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.dc, self.previous);
            DeleteObject(self.bitmap);
            DeleteDC(self.dc);
        }
    }
}

/// A native browser window located by title.
pub struct NativeWindowContext {
    top_level: HWND,
    content: HWND,
}

impl NativeWindowContext {
    /// Find the top-level window titled `title` and, beneath it, the first
    /// descendant of class `content_class`.
    pub fn find(title: &str, content_class: &str) -> Result<Self, PlatformError> {
        let title_wide = wide(title);
        let top_level = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(title_wide.as_ptr())) };
        if top_level.0 == 0 {
            return Err(PlatformError::call(
                "FindWindowW",
                format!("no window titled '{}'", title),
            ));
        }

        let content = find_descendant_by_class(top_level, content_class).unwrap_or_else(|| {
            warn!(
                "No '{}' child window under '{}', capturing the frame itself",
                content_class, title
            );
            top_level
        });
        debug!("Found window {:?} with content window {:?}", top_level, content);

        Ok(Self { top_level, content })
    }

    fn scroll_extent(&self, bar: SCROLLBAR_CONSTANTS, client: i32) -> i32 {
        let mut info = SCROLLINFO {
            cbSize: std::mem::size_of::<SCROLLINFO>() as u32,
            fMask: SIF_RANGE | SIF_PAGE,
            ..Default::default()
        };
        match unsafe { GetScrollInfo(self.content, bar, &mut info) } {
            Ok(()) if info.nPage > 0 => (info.nMax - info.nMin + 1).max(client),
            _ => client,
        }
    }
}

struct ClassSearch {
    class: String,
    found: Option<HWND>,
}

unsafe extern "system" fn match_class(child: HWND, lparam: LPARAM) -> BOOL {
    let search = &mut *(lparam.0 as *mut ClassSearch);
    let mut name = [0u16; 256];
    let len = GetClassNameW(child, &mut name);
    if len > 0 && String::from_utf16_lossy(&name[..len as usize]) == search.class {
        search.found = Some(child);
        return BOOL(0);
    }
    BOOL(1)
}

fn find_descendant_by_class(parent: HWND, class: &str) -> Option<HWND> {
    let mut search = ClassSearch {
        class: class.to_string(),
        found: None,
    };
    unsafe {
        EnumChildWindows(
            parent,
            Some(match_class),
            LPARAM(&mut search as *mut ClassSearch as isize),
        );
    }
    search.found
}

impl BrowsingContext for NativeWindowContext {
    fn top_level_window(&self) -> Option<WindowHandle> {
        Some(WindowHandle(self.top_level.0))
    }

    fn content_window(&self) -> Option<WindowHandle> {
        Some(WindowHandle(self.content.0))
    }

    fn document(&self) -> Option<&dyn DocumentMetrics> {
        if unsafe { IsWindow(self.content) }.as_bool() {
            Some(self)
        } else {
            None
        }
    }
}

impl DocumentMetrics for NativeWindowContext {
    fn is_standards_mode(&self) -> bool {
        true
    }

    fn has_element(&self, _canvas: CanvasElement) -> bool {
        unsafe { IsWindow(self.content) }.as_bool()
    }

    fn metrics(&self, _canvas: CanvasElement) -> Result<ContentMetrics, PlatformError> {
        let mut rect = RECT::default();
        unsafe { GetClientRect(self.content, &mut rect) }.map_err(|e| last_error("GetClientRect", e))?;
        let client_width = rect.right - rect.left;
        let client_height = rect.bottom - rect.top;
        Ok(ContentMetrics {
            client_width,
            client_height,
            scroll_width: self.scroll_extent(SB_HORZ, client_width),
            scroll_height: self.scroll_extent(SB_VERT, client_height),
        })
    }

    fn force_recalculate(&self, force: bool) -> Result<(), PlatformError> {
        unsafe {
            if force {
                RedrawWindow(
                    self.content,
                    None,
                    HRGN(0),
                    RDW_INVALIDATE | RDW_UPDATENOW | RDW_ALLCHILDREN,
                );
            } else {
                UpdateWindow(self.content);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_is_nul_terminated() {
        assert_eq!(wide("ab"), vec![b'a' as u16, b'b' as u16, 0]);
    }

    #[test]
    fn test_missing_window_is_reported() {
        let result = NativeWindowContext::find("fullshot test window that does not exist", "Nope");
        assert!(result.is_err());
    }
}
