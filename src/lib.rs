//! # framegrab
//!
//! Windows screen capture with a fixed capture rectangle.
//!
//! A session resolves its target — a window title, a monitor index, or an
//! explicit screen rectangle — into a fixed rectangle once, then copies the
//! current on-screen pixels into a reusable buffer on every `read`, returning
//! 3-channel BGR or 1-channel grayscale frames.
//!
//! ## Usage
//!
//! ```no_run
//! # #[cfg(windows)]
//! # fn demo() {
//! use framegrab::session::{CaptureConfig, CaptureSession};
//!
//! // One-shot screenshot
//! let frame = framegrab::session::screenshot(0).unwrap();
//! frame.save("screenshot.png").unwrap();
//!
//! // Reusable session
//! let mut cap = CaptureSession::new(CaptureConfig {
//!     window: Some("Untitled - Notepad".to_string()),
//!     border: false,
//!     ..Default::default()
//! })
//! .unwrap();
//! let frame = cap.read(true).unwrap();
//! println!("{:?}", frame.shape());
//! # }
//! ```

pub mod frame;
pub mod geometry;

#[cfg(windows)]
pub mod capture;
#[cfg(windows)]
pub mod d3d11;
#[cfg(windows)]
pub mod session;
#[cfg(windows)]
pub mod viewer;
