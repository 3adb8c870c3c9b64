#![cfg(windows)]
// Integration test: capture a window by its exact title.
//
// Modify TARGET_WINDOW to point at an open window. If no window with that
// title exists, the capture tests gracefully skip.

use framegrab::capture::find_window;
use framegrab::session::{CaptureConfig, CaptureSession};

/// Exact title of the window to capture.
const TARGET_WINDOW: &str = "Untitled - Notepad";

#[test]
fn test_window_not_found_at_construction() {
    let result = CaptureSession::new(CaptureConfig {
        window: Some("framegrab missing window 1b7f".to_string()),
        ..Default::default()
    });
    assert!(result.is_err());
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("not found"), "unexpected error: {msg}");
}

#[test]
fn test_capture_target_window() {
    if find_window(TARGET_WINDOW).is_err() {
        println!("SKIPPED: no window titled \"{}\"", TARGET_WINDOW);
        return;
    }

    let mut session = CaptureSession::new(CaptureConfig {
        window: Some(TARGET_WINDOW.to_string()),
        border: false,
        ..Default::default()
    })
    .unwrap();

    let frame = session.read(true).unwrap();
    let (height, width, channels) = frame.shape();
    assert!(width > 0 && height > 0);
    assert_eq!(channels, 3);
    assert_eq!(frame.data.len(), (width * height * channels) as usize);

    println!("Window: {}x{}", width, height);
}

#[test]
fn test_capture_window_screen_space() {
    if find_window(TARGET_WINDOW).is_err() {
        println!("SKIPPED: no window titled \"{}\"", TARGET_WINDOW);
        return;
    }

    let mut session = CaptureSession::new(CaptureConfig {
        window: Some(TARGET_WINDOW.to_string()),
        screen_space: true,
        ..Default::default()
    })
    .unwrap();

    let frame = session.read(true).unwrap();
    assert!(frame.width > 0 && frame.height > 0);
}
