// Monitor enumeration and lookup.

use std::fmt;

use anyhow::{bail, Context, Result};
use windows::core::BOOL;
use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromWindow, HDC, HMONITOR, MONITORINFO,
    MONITORINFOEXW, MONITOR_DEFAULTTONEAREST,
};

use crate::geometry::Rect;

/// `MONITORINFO::dwFlags` bit marking the primary monitor.
const MONITORINFOF_PRIMARY: u32 = 1;

/// One active display device.
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    /// Monitor handle stored as `isize` so the struct stays plain data.
    handle_ptr: isize,
    /// Device name (e.g. `\\.\DISPLAY1`).
    pub name: String,
    /// Whether this is the primary monitor.
    pub is_primary: bool,
    /// Bounds in screen coordinates.
    pub bounds: Rect,
}

impl MonitorInfo {
    pub fn handle(&self) -> HMONITOR {
        HMONITOR(self.handle_ptr as *mut _)
    }
}

impl fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} at ({}, {}){}",
            self.name,
            self.bounds.width,
            self.bounds.height,
            self.bounds.left,
            self.bounds.top,
            if self.is_primary { " [primary]" } else { "" }
        )
    }
}

/// Enumerate all active monitors in system enumeration order.
pub fn enumerate_monitors() -> Result<Vec<MonitorInfo>> {
    unsafe {
        let mut handles: Vec<HMONITOR> = Vec::new();
        let ok = EnumDisplayMonitors(
            Some(HDC::default()),
            None,
            Some(enum_monitor_proc),
            LPARAM(&mut handles as *mut _ as isize),
        );

        if !ok.as_bool() {
            bail!("EnumDisplayMonitors failed");
        }

        handles.into_iter().map(query_monitor).collect()
    }
}

/// Find monitor by index.
///
/// Indices follow system enumeration order; `0` is not guaranteed to be the
/// primary monitor.
pub fn find_monitor(index: usize) -> Result<MonitorInfo> {
    let monitors = enumerate_monitors()?;

    if monitors.is_empty() {
        bail!("No monitors detected");
    }

    let count = monitors.len();
    monitors
        .into_iter()
        .nth(index)
        .with_context(|| format!("Monitor index {} out of range (found {})", index, count))
}

/// The monitor containing the point, falling back to the primary monitor.
pub fn monitor_at(x: i32, y: i32) -> Result<MonitorInfo> {
    let monitors = enumerate_monitors()?;

    if monitors.is_empty() {
        bail!("No monitors detected");
    }

    let primary = monitors.iter().position(|m| m.is_primary).unwrap_or(0);
    let containing = monitors.iter().position(|m| m.bounds.contains(x, y));

    Ok(monitors
        .into_iter()
        .nth(containing.unwrap_or(primary))
        .unwrap())
}

/// The monitor nearest to the window.
pub fn monitor_for_window(hwnd: HWND) -> Result<MonitorInfo> {
    // SAFETY: MONITOR_DEFAULTTONEAREST always yields a valid HMONITOR,
    // even when the window is off-screen.
    let hmonitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };
    query_monitor(hmonitor)
}

/// Query name, primary flag, and bounds for a monitor handle.
fn query_monitor(hmonitor: HMONITOR) -> Result<MonitorInfo> {
    let mut info = MONITORINFOEXW {
        monitorInfo: MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFOEXW>() as u32,
            ..Default::default()
        },
        ..Default::default()
    };

    // SAFETY: cbSize is set to the EXW size, so the OS fills szDevice too.
    let ok = unsafe { GetMonitorInfoW(hmonitor, &mut info.monitorInfo as *mut _ as *mut _) };
    if !ok.as_bool() {
        bail!("GetMonitorInfoW failed");
    }

    let name = String::from_utf16_lossy(&info.szDevice)
        .trim_end_matches('\0')
        .to_string();

    Ok(MonitorInfo {
        handle_ptr: hmonitor.0 as isize,
        name,
        is_primary: (info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY) != 0,
        bounds: rect_from_win32(info.monitorInfo.rcMonitor),
    })
}

fn rect_from_win32(rc: RECT) -> Rect {
    Rect {
        left: rc.left,
        top: rc.top,
        width: (rc.right - rc.left).max(0) as u32,
        height: (rc.bottom - rc.top).max(0) as u32,
    }
}

unsafe extern "system" fn enum_monitor_proc(
    hmonitor: HMONITOR,
    _: HDC,
    _: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    // SAFETY: lparam points to a Vec<HMONITOR> on the caller's stack in
    // enumerate_monitors(). The Vec outlives the EnumDisplayMonitors call and
    // the callback runs synchronously on the same thread.
    let handles = &mut *(lparam.0 as *mut Vec<HMONITOR>);
    handles.push(hmonitor);
    BOOL(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_finds_one_primary() {
        let monitors = enumerate_monitors().unwrap();
        assert!(!monitors.is_empty(), "should detect at least one monitor");

        let primary_count = monitors.iter().filter(|m| m.is_primary).count();
        assert_eq!(primary_count, 1, "exactly one primary monitor expected");

        for m in &monitors {
            assert!(m.bounds.width > 0);
            assert!(m.bounds.height > 0);
        }
    }

    #[test]
    fn find_monitor_index_0() {
        let info = find_monitor(0).unwrap();
        assert!(!info.handle().0.is_null());
    }

    #[test]
    fn find_monitor_out_of_range() {
        let result = find_monitor(999);
        assert!(result.is_err());
        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("out of range"), "unexpected error: {msg}");
    }

    #[test]
    fn monitor_at_origin_is_contained() {
        // (0, 0) is the primary monitor's top-left corner by definition.
        let info = monitor_at(0, 0).unwrap();
        assert!(info.bounds.contains(0, 0));
    }
}
