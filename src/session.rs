// Capture session: resolve the capture rectangle once, then blit-and-convert
// on every read.
//
// The rectangle is fixed at construction. Window targets are cropped per the
// border flag; in screen-space mode the monitor under the window is captured
// and the window's screen rectangle is cropped out of it. Reads drain the
// frame-pool backlog and keep the newest frame; on a static screen nothing
// arrives and the reusable buffer still holds the previous pixels, so two
// consecutive reads with no on-screen change are pixel-identical.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use windows::Graphics::Capture::Direct3D11CaptureFrame;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Texture2D, D3D11_BIND_SHADER_RESOURCE, D3D11_BOX, D3D11_TEXTURE2D_DESC,
    D3D11_USAGE_DEFAULT,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC};

use crate::capture::{
    enable_dpi_awareness, find_monitor, find_window, init_capture, monitor_at, monitor_for_window,
    window_geometry, CaptureTarget, WgcCapture,
};
use crate::d3d11::texture::TextureReader;
use crate::d3d11::{create_d3d11_device, D3D11Context};
use crate::frame::{Frame, PixelFormat};
use crate::geometry::{self, CropBox, Rect};

/// First frame wait timeout.
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Short timeout for waiting for a new frame (~3 VSyncs at 60Hz).
/// A timeout here means the screen is static and the previous pixels stand.
const FRESH_FRAME_TIMEOUT: Duration = Duration::from_millis(50);

/// Capture target specification.
///
/// Resolution precedence: `window` if set, then `monitor`, else the explicit
/// `left`/`top`/`width`/`height` rectangle in screen coordinates.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Display title, used by the viewer window.
    pub name: String,
    /// Explicit rectangle, screen coordinates.
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Exact title of the window to capture.
    pub window: Option<String>,
    /// Monitor index in system enumeration order.
    pub monitor: Option<usize>,
    /// Include the window frame; when false, crop to the client area.
    pub border: bool,
    /// Capture the window through its monitor in screen coordinates instead
    /// of its own composited content.
    pub screen_space: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            name: "Window".to_string(),
            left: 0,
            top: 0,
            width: 640,
            height: 480,
            window: None,
            monitor: None,
            border: true,
            screen_space: false,
        }
    }
}

/// Capture session with a fixed rectangle and a reusable frame buffer.
///
/// # Examples
/// ```no_run
/// # use framegrab::session::{CaptureConfig, CaptureSession};
/// let mut session = CaptureSession::new(CaptureConfig {
///     monitor: Some(0),
///     ..Default::default()
/// })
/// .unwrap();
/// let frame = session.read(true).unwrap();
/// println!("{:?}", frame.shape());
/// ```
pub struct CaptureSession {
    d3d_ctx: D3D11Context,
    capture: WgcCapture,
    reader: TextureReader,
    /// Sub-rectangle of the pool texture plus its GPU-side copy target;
    /// `None` when the session covers the whole pool.
    crop: Option<(CropBox, ID3D11Texture2D)>,
    width: u32,
    height: u32,
    name: String,
    /// Reusable BGRA buffer, exactly `width * height * 4` bytes, overwritten
    /// in place by each read that sees a new frame.
    raw: Vec<u8>,
    first_read: bool,
}

impl CaptureSession {
    /// Resolve the capture rectangle and acquire the OS resources for the
    /// session's lifetime.
    ///
    /// Fails when the named window cannot be found or the monitor index is
    /// out of range. All handles acquired before a failure are released by
    /// drop on the error path.
    pub fn new(config: CaptureConfig) -> Result<Self> {
        enable_dpi_awareness();

        let (target, view) = resolve_target(&config)?;
        let d3d_ctx = create_d3d11_device()?;
        let capture = init_capture(&d3d_ctx, target)?;
        capture.start()?;

        let (pool_w, pool_h) = capture.pool_size();

        // WGC's item size and GetWindowRect can disagree by a pixel or two
        // under DWM scaling; the clamped view is what the session commits to.
        let view = match view {
            Some(v) => {
                let v = v.clamped_to(pool_w, pool_h)?;
                if v.covers(pool_w, pool_h) {
                    None
                } else {
                    Some(v)
                }
            }
            None => None,
        };

        let (width, height) = match &view {
            Some(v) => (v.width, v.height),
            None => (pool_w, pool_h),
        };

        let crop = match view {
            Some(v) => {
                let texture = create_crop_texture(&d3d_ctx, v.width, v.height)?;
                Some((v, texture))
            }
            None => None,
        };

        // Pre-create the staging texture so the first read pays no setup cost.
        let mut reader = TextureReader::new(d3d_ctx.device.clone(), d3d_ctx.context.clone());
        reader.ensure_staging_texture(width, height)?;

        let raw = vec![0u8; width as usize * height as usize * 4];

        log::debug!(
            "Capture session \"{}\": {}x{}, crop {:?}",
            config.name,
            width,
            height,
            crop.as_ref().map(|(v, _)| v)
        );

        Ok(Self {
            d3d_ctx,
            capture,
            reader,
            crop,
            width,
            height,
            name: config.name,
            raw,
            first_read: true,
        })
    }

    /// Copy the current on-screen pixels of the capture rectangle into the
    /// reusable buffer and convert them to a new frame.
    ///
    /// `color = true` yields 3-channel BGR, `false` yields 1-channel
    /// grayscale. The returned shape is always `(height, width, channels)`.
    pub fn read(&mut self, color: bool) -> Result<Frame> {
        if let Some(frame) = self.next_frame()? {
            let texture = WgcCapture::frame_to_texture(&frame)?;
            let source = self.cropped(&texture)?;
            self.reader.read_into(&source, &mut self.raw)?;
            // `frame` is dropped here, after the copy out of its surface.
        }

        let format = if color {
            PixelFormat::Bgr8
        } else {
            PixelFormat::Gray8
        };
        Ok(Frame::from_bgra(&self.raw, self.width, self.height, format))
    }

    /// Width of the resolved capture rectangle.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the resolved capture rectangle.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Display title from the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest pending frame, if any.
    ///
    /// The first read blocks until the session's first frame arrives; later
    /// reads drain the backlog, keep the newest, and only wait briefly when
    /// the pool is empty. `None` means the screen did not change.
    fn next_frame(&mut self) -> Result<Option<Direct3D11CaptureFrame>> {
        if self.first_read {
            self.first_read = false;
            return self.wait_frame(FIRST_FRAME_TIMEOUT).map(Some);
        }

        let mut latest = None;
        while let Ok(f) = self.capture.try_get_next_frame() {
            latest = Some(f);
        }
        if latest.is_some() {
            return Ok(latest);
        }

        self.soft_wait_frame(FRESH_FRAME_TIMEOUT)
    }

    /// Wait for the next frame, `None` on timeout.
    fn soft_wait_frame(&self, timeout: Duration) -> Result<Option<Direct3D11CaptureFrame>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(f) = self.capture.try_get_next_frame() {
                return Ok(Some(f));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let timeout_ms = remaining.as_millis().min(u32::MAX as u128) as u32;
            if self.capture.wait_for_frame(timeout_ms).is_err() {
                return Ok(None);
            }
        }
    }

    /// Wait for the next frame, error on timeout.
    fn wait_frame(&self, timeout: Duration) -> Result<Direct3D11CaptureFrame> {
        self.soft_wait_frame(timeout)?.ok_or_else(|| {
            anyhow::anyhow!(
                "Timeout waiting for capture frame ({}ms)",
                timeout.as_millis()
            )
        })
    }

    /// Crop the capture rectangle out of the pool texture on the GPU, or pass
    /// the texture through when the session covers the whole pool.
    fn cropped(&self, source: &ID3D11Texture2D) -> Result<ID3D11Texture2D> {
        let Some((view, crop_texture)) = &self.crop else {
            return Ok(source.clone());
        };

        let src_box = D3D11_BOX {
            left: view.x,
            top: view.y,
            front: 0,
            right: view.x + view.width,
            bottom: view.y + view.height,
            back: 1,
        };

        // SAFETY: both textures are valid BGRA8 resources; src_box was clamped
        // to the pool size at construction, so the region read is in bounds.
        unsafe {
            self.d3d_ctx.context.CopySubresourceRegion(
                crop_texture,
                0,
                0,
                0,
                0,
                source,
                0,
                Some(&src_box),
            );
        }

        Ok(crop_texture.clone())
    }
}

/// Capture a single color frame of the given monitor.
pub fn screenshot(monitor: usize) -> Result<Frame> {
    let mut session = CaptureSession::new(CaptureConfig {
        monitor: Some(monitor),
        ..Default::default()
    })?;
    session.read(true)
}

/// Turn the configuration into a capture target and the view into its pool
/// texture (`None` = the whole texture).
fn resolve_target(config: &CaptureConfig) -> Result<(CaptureTarget, Option<CropBox>)> {
    if let Some(title) = &config.window {
        let hwnd = find_window(title)?;
        let (window, borders) = window_geometry(hwnd)?;

        if config.screen_space {
            let monitor = monitor_for_window(hwnd)?;
            let view = geometry::screen_view(&window, &monitor.bounds, &borders, config.border)?;
            return Ok((CaptureTarget::Monitor(monitor.handle()), Some(view)));
        }

        let view = geometry::window_view(&window, &borders, config.border)?;
        return Ok((CaptureTarget::Window(hwnd), Some(view)));
    }

    if let Some(index) = config.monitor {
        let monitor = find_monitor(index)?;
        return Ok((CaptureTarget::Monitor(monitor.handle()), None));
    }

    if config.width == 0 || config.height == 0 {
        bail!("Capture region must have non-zero size");
    }

    let region = Rect {
        left: config.left,
        top: config.top,
        width: config.width,
        height: config.height,
    };
    let monitor = monitor_at(region.left, region.top)
        .context("Failed to resolve a monitor for the capture region")?;
    let view = geometry::region_view(&region, &monitor.bounds)?;
    Ok((CaptureTarget::Monitor(monitor.handle()), Some(view)))
}

/// GPU-side copy target for cropped reads.
fn create_crop_texture(d3d_ctx: &D3D11Context, width: u32, height: u32) -> Result<ID3D11Texture2D> {
    let desc = D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: 1,
        ArraySize: 1,
        Format: DXGI_FORMAT_B8G8R8A8_UNORM,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
        CPUAccessFlags: 0,
        MiscFlags: 0,
    };

    // SAFETY: desc is fully initialized; CreateTexture2D allocates the resource
    let texture = unsafe {
        let mut tex = None;
        d3d_ctx
            .device
            .CreateTexture2D(&desc, None, Some(&mut tex))
            .context("Failed to create crop texture")?;
        tex.unwrap()
    };

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = CaptureConfig::default();
        assert_eq!(cfg.name, "Window");
        assert_eq!((cfg.left, cfg.top, cfg.width, cfg.height), (0, 0, 640, 480));
        assert!(cfg.window.is_none());
        assert!(cfg.monitor.is_none());
        assert!(cfg.border);
        assert!(!cfg.screen_space);
    }
}
