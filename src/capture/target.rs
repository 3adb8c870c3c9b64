// Capture target resolution: window title → HWND, plus window geometry queries.

use anyhow::{bail, Context, Result};
use windows::core::BOOL;
use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClientRect, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    IsWindowVisible,
};

use crate::geometry::{BorderMetrics, Rect};

// ---------------------------------------------------------------------------
// DPI
// ---------------------------------------------------------------------------

/// Enable Per-Monitor DPI awareness.
///
/// Ensures capturing physical resolution rather than scaled logical resolution.
/// Repeated calls are safe (silently ignored if already set).
pub fn enable_dpi_awareness() {
    unsafe {
        // SAFETY: best-effort call, failure indicates it was already set
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}

// ---------------------------------------------------------------------------
// Window lookup
// ---------------------------------------------------------------------------

/// Find a visible top-level window by its exact title.
///
/// # Examples
/// ```no_run
/// # use framegrab::capture::find_window;
/// let hwnd = find_window("Untitled - Notepad").unwrap();
/// ```
pub fn find_window(title: &str) -> Result<HWND> {
    let mut ctx = EnumCtx {
        title,
        result: None,
    };

    unsafe {
        // EnumWindows returns an error when the callback stops enumeration
        // early, which is the found case, not a failure.
        let _ = EnumWindows(Some(enum_window_proc), LPARAM(&mut ctx as *mut _ as isize));
    }

    ctx.result
        .with_context(|| format!("Window \"{}\" not found", title))
}

struct EnumCtx<'a> {
    title: &'a str,
    result: Option<HWND>,
}

unsafe extern "system" fn enum_window_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam points to an EnumCtx on the caller's stack in
    // find_window(). Same lifetime and single-thread guarantees as the
    // monitor enumeration callback.
    let ctx = &mut *(lparam.0 as *mut EnumCtx);

    if !IsWindowVisible(hwnd).as_bool() {
        return BOOL(1);
    }

    let len = GetWindowTextLengthW(hwnd);
    if len <= 0 {
        return BOOL(1);
    }

    let mut buf = vec![0u16; (len + 1) as usize];
    let copied = GetWindowTextW(hwnd, &mut buf);
    if copied <= 0 {
        return BOOL(1);
    }

    let title = String::from_utf16_lossy(&buf[..copied as usize]);
    if title == ctx.title {
        ctx.result = Some(hwnd);
        return BOOL(0); // stop enumeration
    }

    BOOL(1)
}

// ---------------------------------------------------------------------------
// Window geometry
// ---------------------------------------------------------------------------

/// The window's outer rectangle in screen coordinates, and the metrics of the
/// frame around its client area.
pub fn window_geometry(hwnd: HWND) -> Result<(Rect, BorderMetrics)> {
    let mut window_rect = RECT::default();
    // SAFETY: hwnd came from EnumWindows or the caller; out-param is local.
    unsafe { GetWindowRect(hwnd, &mut window_rect).context("GetWindowRect failed")? };

    let mut client_rect = RECT::default();
    // SAFETY: same as above. Client rect has origin (0, 0) by contract.
    unsafe { GetClientRect(hwnd, &mut client_rect).context("GetClientRect failed")? };

    let window = Rect {
        left: window_rect.left,
        top: window_rect.top,
        width: (window_rect.right - window_rect.left).max(0) as u32,
        height: (window_rect.bottom - window_rect.top).max(0) as u32,
    };

    if window.width == 0 || window.height == 0 {
        bail!("Window has zero size (minimized?)");
    }

    let borders = BorderMetrics::new(
        &window,
        client_rect.right.max(0) as u32,
        client_rect.bottom.max(0) as u32,
    );

    Ok((window, borders))
}
