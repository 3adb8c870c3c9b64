// Windows Graphics Capture core implementation.
//
// The frame pool is always BGRA8 and its size is fixed at init; the session
// never resizes a capture mid-flight. Uses FrameArrived event +
// WaitForSingleObject for zero-latency frame waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use windows::core::Interface;
use windows::Foundation::TypedEventHandler;
use windows::Graphics::Capture::{
    Direct3D11CaptureFrame, Direct3D11CaptureFramePool, GraphicsCaptureItem, GraphicsCaptureSession,
};
use windows::Graphics::DirectX::Direct3D11::IDirect3DSurface;
use windows::Graphics::DirectX::DirectXPixelFormat;
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND};
use windows::Win32::Graphics::Direct3D11::ID3D11Texture2D;
use windows::Win32::Graphics::Gdi::HMONITOR;
use windows::Win32::System::Threading::{CreateEventW, SetEvent, WaitForSingleObject};
use windows::Win32::System::WinRT::Direct3D11::IDirect3DDxgiInterfaceAccess;
use windows::Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop;

use crate::d3d11::D3D11Context;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Capture target type.
#[derive(Debug, Clone, Copy)]
pub enum CaptureTarget {
    /// Monitor capture
    Monitor(HMONITOR),
    /// Window capture
    Window(HWND),
}

// ---------------------------------------------------------------------------
// WGC capture session
// ---------------------------------------------------------------------------

/// WGC capture session.
pub struct WgcCapture {
    /// Holds ownership, stops capture on drop
    _item: GraphicsCaptureItem,
    frame_pool: Direct3D11CaptureFramePool,
    session: GraphicsCaptureSession,
    /// FrameArrived callback token (for unregistering on drop)
    frame_arrived_token: i64,
    /// FrameArrived signal event (kernel object, for WaitForSingleObject)
    frame_event: HANDLE,
    /// Indicates teardown has started (callback should stop signaling)
    shutting_down: Arc<AtomicBool>,
    /// Frame pool size, fixed at init
    pool_width: u32,
    pool_height: u32,
}

impl WgcCapture {
    /// Start capture.
    pub fn start(&self) -> Result<()> {
        self.session.StartCapture()?;
        Ok(())
    }

    /// Frame pool size. Every delivered frame texture has these dimensions.
    pub fn pool_size(&self) -> (u32, u32) {
        (self.pool_width, self.pool_height)
    }

    /// Try to get a frame from the pool (non-blocking).
    ///
    /// Returns the raw `Direct3D11CaptureFrame`; the caller controls its
    /// lifetime and must finish accessing the underlying surface (e.g. the
    /// copy into a staging texture) before dropping it.
    pub fn try_get_next_frame(&self) -> Result<Direct3D11CaptureFrame> {
        Ok(self.frame_pool.TryGetNextFrame()?)
    }

    /// Wait for the next frame arrival (blocking, with timeout).
    ///
    /// Kernel event wait, no CPU consumption. Call `try_get_next_frame()`
    /// after this returns.
    pub fn wait_for_frame(&self, timeout_ms: u32) -> Result<()> {
        // SAFETY: frame_event is created in init_capture and lives as long as self
        let result = unsafe { WaitForSingleObject(self.frame_event, timeout_ms) };
        if result.0 != 0 {
            // WAIT_TIMEOUT = 0x102, WAIT_FAILED = 0xFFFFFFFF
            bail!(
                "WaitForSingleObject returned 0x{:X} (timeout: {}ms)",
                result.0,
                timeout_ms
            );
        }
        Ok(())
    }

    /// Extract the `ID3D11Texture2D` from a `Direct3D11CaptureFrame`.
    ///
    /// The frame must not be dropped until the returned texture is no longer
    /// needed.
    pub fn frame_to_texture(frame: &Direct3D11CaptureFrame) -> Result<ID3D11Texture2D> {
        let surface: IDirect3DSurface = frame.Surface()?;
        let access: IDirect3DDxgiInterfaceAccess = surface.cast()?;

        // SAFETY: COM interop call; access was obtained from a successful cast
        let texture: ID3D11Texture2D = unsafe {
            access
                .GetInterface()
                .context("Failed to get ID3D11Texture2D interface")?
        };

        Ok(texture)
    }
}

impl Drop for WgcCapture {
    fn drop(&mut self) {
        self.shutting_down.store(true, Ordering::Relaxed);

        let _ = self.frame_pool.RemoveFrameArrived(self.frame_arrived_token);
        let _ = self.session.Close();
        let _ = self.frame_pool.Close();

        if !self.frame_event.is_invalid() {
            // SAFETY: frame_event is a valid handle we created, only closed here
            unsafe {
                let _ = CloseHandle(self.frame_event);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Capture initialization
// ---------------------------------------------------------------------------

/// Create GraphicsCaptureItem from a monitor handle.
fn create_capture_item_for_monitor(hmonitor: HMONITOR) -> Result<GraphicsCaptureItem> {
    // SAFETY: factory call; failure means the system lacks WGC support
    unsafe {
        let interop: IGraphicsCaptureItemInterop =
            windows::core::factory::<GraphicsCaptureItem, IGraphicsCaptureItemInterop>()
                .context("Failed to get IGraphicsCaptureItemInterop factory")?;

        let item = interop
            .CreateForMonitor(hmonitor)
            .context("Failed to create CaptureItem for monitor")?;

        Ok(item)
    }
}

/// Create GraphicsCaptureItem from a window handle.
fn create_capture_item_for_window(hwnd: HWND) -> Result<GraphicsCaptureItem> {
    // SAFETY: factory call, same as above
    unsafe {
        let interop: IGraphicsCaptureItemInterop =
            windows::core::factory::<GraphicsCaptureItem, IGraphicsCaptureItemInterop>()
                .context("Failed to get IGraphicsCaptureItemInterop factory")?;

        let item = interop
            .CreateForWindow(hwnd)
            .context("Failed to create CaptureItem for window")?;
        Ok(item)
    }
}

/// Initialize a WGC capture session for the target.
///
/// Registers a FrameArrived callback that signals a kernel event, so the
/// caller can block on frame arrival without polling.
pub fn init_capture(d3d_ctx: &D3D11Context, target: CaptureTarget) -> Result<WgcCapture> {
    let item = match target {
        CaptureTarget::Monitor(monitor) => create_capture_item_for_monitor(monitor)?,
        CaptureTarget::Window(hwnd) => create_capture_item_for_window(hwnd)?,
    };

    let size = item.Size()?;

    let frame_pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
        &d3d_ctx.direct3d_device,
        DirectXPixelFormat::B8G8R8A8UIntNormalized,
        2, // Buffer count
        size,
    )?;

    // Kernel event (auto-reset, initially non-signaled)
    // SAFETY: CreateEventW creates an anonymous event object
    let frame_event =
        unsafe { CreateEventW(None, false, false, None).context("Failed to create frame event")? };

    // FrameArrived callback: only SetEvent, no D3D work.
    // The HANDLE travels as usize to satisfy the closure's Send bound.
    // SAFETY: kernel event handles are thread-safe; SetEvent may be called
    // from any thread.
    let shutting_down = Arc::new(AtomicBool::new(false));
    let shutting_down_cb = Arc::clone(&shutting_down);
    let event_ptr = frame_event.0 as usize;
    let frame_arrived_token = frame_pool.FrameArrived(&TypedEventHandler::<
        Direct3D11CaptureFramePool,
        windows::core::IInspectable,
    >::new(move |_, _| {
        if !shutting_down_cb.load(Ordering::Relaxed) {
            unsafe {
                if SetEvent(HANDLE(event_ptr as *mut _)).is_err() {
                    eprintln!("framegrab: SetEvent failed in FrameArrived callback");
                }
            }
        }
        Ok(())
    }))?;

    let session = frame_pool.CreateCaptureSession(&item)?;
    session.SetIsBorderRequired(false)?;

    Ok(WgcCapture {
        _item: item,
        frame_pool,
        session,
        frame_arrived_token,
        frame_event,
        shutting_down,
        pool_width: size.Width.max(0) as u32,
        pool_height: size.Height.max(0) as u32,
    })
}
