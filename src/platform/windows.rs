//! General Windows platform utilities
//!
//! This module contains Win32 helper functions that don't fit into
//! other specialized platform modules.

use tracing::warn;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::UI::HiDpi::{
    GetDpiForSystem, GetDpiForWindow, SetProcessDpiAwarenessContext,
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::{GetWindowTextLengthW, GetWindowTextW, SetWindowTextW};

use crate::domain::core::Rect;

/// Logical DPI that corresponds to a scale factor of 1.0
const BASE_DPI: f32 = 96.0;

/// Opts the process into per-monitor DPI awareness
///
/// Failure is not fatal: Windows then bitmap-scales the window.
pub fn enable_per_monitor_dpi_awareness() {
    unsafe {
        if let Err(err) = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) {
            warn!(%err, "per-monitor DPI awareness unavailable");
        }
    }
}

/// DPI scale factor of the primary monitor
pub fn system_dpi_scale() -> f32 {
    dpi_to_scale(unsafe { GetDpiForSystem() })
}

/// DPI scale factor of the monitor a window is on
pub fn window_dpi_scale(hwnd: HWND) -> f32 {
    dpi_to_scale(unsafe { GetDpiForWindow(hwnd) })
}

fn dpi_to_scale(dpi: u32) -> f32 {
    if dpi == 0 { 1.0 } else { dpi as f32 / BASE_DPI }
}

/// Converts a domain rectangle to Windows RECT structure
pub fn rect_to_win32_rect(rect: &Rect) -> RECT {
    RECT {
        left: rect.x,
        top: rect.y,
        right: rect.x + rect.w,
        bottom: rect.y + rect.h,
    }
}

/// Converts a Windows RECT to domain rectangle
pub fn win32_rect_to_rect(rect: &RECT) -> Rect {
    Rect {
        x: rect.left,
        y: rect.top,
        w: rect.right - rect.left,
        h: rect.bottom - rect.top,
    }
}

/// Null-terminated UTF-16 copy of a string
pub fn to_wstring(input: &str) -> Vec<u16> {
    input.encode_utf16().chain(std::iter::once(0)).collect()
}

pub fn set_window_text(hwnd: HWND, text: &str) {
    let wide = to_wstring(text);
    unsafe {
        let _ = SetWindowTextW(hwnd, PCWSTR(wide.as_ptr()));
    }
}

pub fn window_text(hwnd: HWND) -> String {
    unsafe {
        let length = GetWindowTextLengthW(hwnd).max(0) as usize;
        let mut buffer = vec![0u16; length + 1];
        let copied = GetWindowTextW(hwnd, &mut buffer).max(0) as usize;
        String::from_utf16_lossy(&buffer[..copied.min(length)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_conversion_preserves_geometry() {
        let rect = Rect::new(10, 20, 300, 200);
        let win32 = rect_to_win32_rect(&rect);
        assert_eq!((win32.right, win32.bottom), (310, 220));
        assert_eq!(win32_rect_to_rect(&win32), rect);
    }

    #[test]
    fn wide_strings_are_null_terminated() {
        assert_eq!(to_wstring("ab"), vec![97, 98, 0]);
    }

    #[test]
    fn zero_dpi_falls_back_to_unit_scale() {
        assert_eq!(dpi_to_scale(0), 1.0);
        assert_eq!(dpi_to_scale(144), 1.5);
    }
}
