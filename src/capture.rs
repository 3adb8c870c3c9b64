// Capture engine: target resolution, monitor enumeration, WGC session.

pub mod monitor;
pub mod target;
pub mod wgc;

pub use monitor::{enumerate_monitors, find_monitor, monitor_at, monitor_for_window, MonitorInfo};
pub use target::{enable_dpi_awareness, find_window, window_geometry};
pub use wgc::{init_capture, CaptureTarget, WgcCapture};
