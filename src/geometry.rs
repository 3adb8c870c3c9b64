// Capture rectangle arithmetic: border offsets, coordinate translation, clipping.
//
// Everything here is pure integer math on screen-space rectangles; the session
// turns the resulting CropBox into a D3D11 copy box.

use anyhow::{bail, Result};

/// Screen-coordinate rectangle. `left`/`top` may be negative on multi-monitor
/// setups where the primary monitor is not the leftmost one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Translate into `outer`'s local coordinate space (origin at `outer`'s
    /// top-left corner). Sizes are unchanged.
    fn local_to(&self, outer: &Rect) -> Rect {
        Rect {
            left: self.left - outer.left,
            top: self.top - outer.top,
            width: self.width,
            height: self.height,
        }
    }

    /// Intersect with the `width` x `height` area at the local origin.
    /// Returns `None` when the intersection is empty.
    fn clipped_to(&self, width: u32, height: u32) -> Option<CropBox> {
        let x0 = self.left.max(0);
        let y0 = self.top.max(0);
        let x1 = self.right().min(width as i32);
        let y1 = self.bottom().min(height as i32);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        Some(CropBox {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Pixel difference between a window's outer frame and its client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderMetrics {
    pub width: u32,
    pub height: u32,
}

impl BorderMetrics {
    /// Derive from the outer window rectangle and the client-area size.
    pub fn new(window: &Rect, client_width: u32, client_height: u32) -> Self {
        Self {
            width: window.width.saturating_sub(client_width),
            height: window.height.saturating_sub(client_height),
        }
    }

    /// Horizontal offset from the frame's left edge to the client area.
    /// The side borders split the horizontal border evenly.
    pub fn inset_x(&self) -> i32 {
        (self.width / 2) as i32
    }

    /// Vertical offset from the frame's top edge to the client area.
    /// The title bar takes whatever the bottom border does not.
    pub fn inset_y(&self) -> i32 {
        self.height as i32 - (self.width / 2) as i32
    }
}

/// Sub-rectangle of a captured texture, in texture-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Whether this box spans the entire `width` x `height` source.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }

    /// Re-clip against a source of the given size (used once at construction
    /// when the actual frame-pool size is known).
    pub fn clamped_to(&self, width: u32, height: u32) -> Result<CropBox> {
        let rect = Rect {
            left: self.x as i32,
            top: self.y as i32,
            width: self.width,
            height: self.height,
        };
        match rect.clipped_to(width, height) {
            Some(clipped) => Ok(clipped),
            None => bail!(
                "Capture rectangle {}x{} at ({}, {}) lies outside the {}x{} source",
                self.width,
                self.height,
                self.x,
                self.y,
                width,
                height
            ),
        }
    }
}

/// View into a window's own captured texture: the full frame when the border
/// is included, the client area inset by the border offsets otherwise.
pub fn window_view(window: &Rect, borders: &BorderMetrics, include_border: bool) -> Result<CropBox> {
    let view = if include_border {
        Rect {
            left: 0,
            top: 0,
            width: window.width,
            height: window.height,
        }
    } else {
        Rect {
            left: borders.inset_x(),
            top: borders.inset_y(),
            width: window.width.saturating_sub(borders.width),
            height: window.height.saturating_sub(borders.height),
        }
    };

    match view.clipped_to(window.width, window.height) {
        Some(boxed) => Ok(boxed),
        None => bail!(
            "Window client area is empty ({}x{} frame, {}x{} border)",
            window.width,
            window.height,
            borders.width,
            borders.height
        ),
    }
}

/// The window's rectangle expressed inside its monitor's captured texture
/// (screen-space coordinate convention).
pub fn screen_view(
    window: &Rect,
    monitor: &Rect,
    borders: &BorderMetrics,
    include_border: bool,
) -> Result<CropBox> {
    let rect = if include_border {
        *window
    } else {
        Rect {
            left: window.left + borders.inset_x(),
            top: window.top + borders.inset_y(),
            width: window.width.saturating_sub(borders.width),
            height: window.height.saturating_sub(borders.height),
        }
    };

    rect.local_to(monitor)
        .clipped_to(monitor.width, monitor.height)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Window rectangle ({}, {}) {}x{} lies outside monitor bounds ({}, {}) {}x{}",
                rect.left,
                rect.top,
                rect.width,
                rect.height,
                monitor.left,
                monitor.top,
                monitor.width,
                monitor.height
            )
        })
}

/// An explicit screen-coordinate rectangle inside its monitor's texture.
pub fn region_view(region: &Rect, monitor: &Rect) -> Result<CropBox> {
    region
        .local_to(monitor)
        .clipped_to(monitor.width, monitor.height)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Region ({}, {}) {}x{} lies outside monitor bounds ({}, {}) {}x{}",
                region.left,
                region.top,
                region.width,
                region.height,
                monitor.left,
                monitor.top,
                monitor.width,
                monitor.height
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Rect = Rect {
        left: 100,
        top: 100,
        width: 816,
        height: 639,
    };

    // 816x639 frame around an 800x600 client: 16px horizontal, 39px vertical.
    fn borders() -> BorderMetrics {
        BorderMetrics::new(&WINDOW, 800, 600)
    }

    #[test]
    fn border_metrics_from_rects() {
        let b = borders();
        assert_eq!(b.width, 16);
        assert_eq!(b.height, 39);
        assert_eq!(b.inset_x(), 8);
        assert_eq!(b.inset_y(), 31);
    }

    #[test]
    fn window_view_with_border_is_full_frame() {
        let v = window_view(&WINDOW, &borders(), true).unwrap();
        assert_eq!(
            v,
            CropBox {
                x: 0,
                y: 0,
                width: 816,
                height: 639
            }
        );
    }

    #[test]
    fn window_view_without_border_is_inset_client_area() {
        let v = window_view(&WINDOW, &borders(), false).unwrap();
        assert_eq!(
            v,
            CropBox {
                x: 8,
                y: 31,
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn border_toggle_changes_only_offsets_and_border_delta() {
        let b = borders();
        let with = window_view(&WINDOW, &b, true).unwrap();
        let without = window_view(&WINDOW, &b, false).unwrap();

        assert_eq!(with.width - without.width, b.width);
        assert_eq!(with.height - without.height, b.height);
        assert_eq!(without.x as i32, b.inset_x());
        assert_eq!(without.y as i32, b.inset_y());
    }

    #[test]
    fn screen_view_translates_into_monitor_space() {
        let monitor = Rect {
            left: 0,
            top: 0,
            width: 1920,
            height: 1080,
        };
        let v = screen_view(&WINDOW, &monitor, &borders(), true).unwrap();
        assert_eq!(
            v,
            CropBox {
                x: 100,
                y: 100,
                width: 816,
                height: 639
            }
        );

        let v = screen_view(&WINDOW, &monitor, &borders(), false).unwrap();
        assert_eq!(
            v,
            CropBox {
                x: 108,
                y: 131,
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn screen_view_handles_negative_monitor_origin() {
        let monitor = Rect {
            left: -1920,
            top: 0,
            width: 1920,
            height: 1080,
        };
        let window = Rect {
            left: -1800,
            top: 50,
            width: 640,
            height: 480,
        };
        let v = screen_view(&window, &monitor, &BorderMetrics { width: 0, height: 0 }, true)
            .unwrap();
        assert_eq!(
            v,
            CropBox {
                x: 120,
                y: 50,
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn views_clip_to_monitor_bounds() {
        let monitor = Rect {
            left: 0,
            top: 0,
            width: 1920,
            height: 1080,
        };
        // Window hanging off the right edge.
        let window = Rect {
            left: 1800,
            top: 900,
            width: 640,
            height: 480,
        };
        let v = screen_view(&window, &monitor, &BorderMetrics { width: 0, height: 0 }, true)
            .unwrap();
        assert_eq!(
            v,
            CropBox {
                x: 1800,
                y: 900,
                width: 120,
                height: 180
            }
        );
    }

    #[test]
    fn region_outside_monitor_fails() {
        let monitor = Rect {
            left: 0,
            top: 0,
            width: 1920,
            height: 1080,
        };
        let region = Rect {
            left: 3000,
            top: 0,
            width: 640,
            height: 480,
        };
        assert!(region_view(&region, &monitor).is_err());
    }

    #[test]
    fn region_view_passes_through_contained_rect() {
        let monitor = Rect {
            left: 0,
            top: 0,
            width: 1920,
            height: 1080,
        };
        let region = Rect {
            left: 0,
            top: 0,
            width: 100,
            height: 100,
        };
        let v = region_view(&region, &monitor).unwrap();
        assert!(v.covers(100, 100));
        assert!(!v.covers(1920, 1080));
        assert_eq!(
            v,
            CropBox {
                x: 0,
                y: 0,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn crop_box_clamps_to_smaller_source() {
        let b = CropBox {
            x: 10,
            y: 10,
            width: 200,
            height: 200,
        };
        let clamped = b.clamped_to(100, 100).unwrap();
        assert_eq!(
            clamped,
            CropBox {
                x: 10,
                y: 10,
                width: 90,
                height: 90
            }
        );
        assert!(b.clamped_to(5, 5).is_err());
    }

    #[test]
    fn rect_contains() {
        let monitor = Rect {
            left: -1920,
            top: 0,
            width: 1920,
            height: 1080,
        };
        assert!(monitor.contains(-1920, 0));
        assert!(monitor.contains(-1, 1079));
        assert!(!monitor.contains(0, 0));
        assert!(!monitor.contains(-1921, 10));
    }
}
