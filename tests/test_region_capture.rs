#![cfg(windows)]
// Integration test: explicit-rectangle capture.

use framegrab::session::{CaptureConfig, CaptureSession};

#[test]
fn test_region_shape_matches_request() {
    let mut session = CaptureSession::new(CaptureConfig {
        left: 0,
        top: 0,
        width: 320,
        height: 200,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(session.width(), 320);
    assert_eq!(session.height(), 200);

    let frame = session.read(true).unwrap();
    assert_eq!(frame.shape(), (200, 320, 3));

    let gray = session.read(false).unwrap();
    assert_eq!(gray.shape(), (200, 320, 1));
}

#[test]
fn test_default_region_is_640x480() {
    let mut session = CaptureSession::new(CaptureConfig::default()).unwrap();
    let frame = session.read(true).unwrap();
    assert_eq!(frame.shape(), (480, 640, 3));
}

#[test]
fn test_zero_size_region_fails() {
    let result = CaptureSession::new(CaptureConfig {
        width: 0,
        height: 0,
        ..Default::default()
    });
    assert!(result.is_err());
}
