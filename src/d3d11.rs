// D3D11 device creation and management.

pub mod texture;

use anyhow::Context;
use windows::core::Interface;
use windows::Graphics::DirectX::Direct3D11::IDirect3DDevice;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::WinRT::Direct3D11::CreateDirect3D11DeviceFromDXGIDevice;

/// D3D11 device bundle shared by the capture session.
pub struct D3D11Context {
    pub device: ID3D11Device,
    pub context: ID3D11DeviceContext,
    pub dxgi_device: IDXGIDevice,
    pub direct3d_device: IDirect3DDevice,
}

/// Create a hardware D3D11 device with BGRA support.
pub fn create_d3d11_device() -> anyhow::Result<D3D11Context> {
    let (device, context) = unsafe {
        let mut device = None;
        let mut context = None;

        D3D11CreateDevice(
            None,
            D3D_DRIVER_TYPE_HARDWARE,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            Some(&[D3D_FEATURE_LEVEL_11_0]),
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            Some(&mut context),
        )
        .context("D3D11CreateDevice failed")?;

        (device.unwrap(), context.unwrap())
    };

    let dxgi_device: IDXGIDevice = device.cast().context("device is not a DXGI device")?;

    let direct3d_device: IDirect3DDevice = unsafe {
        CreateDirect3D11DeviceFromDXGIDevice(&dxgi_device)
            .context("CreateDirect3D11DeviceFromDXGIDevice failed")?
            .cast()
            .context("WinRT device cast failed")?
    };

    log_adapter_info(&dxgi_device);

    Ok(D3D11Context {
        device,
        context,
        dxgi_device,
        direct3d_device,
    })
}

fn log_adapter_info(dxgi_device: &IDXGIDevice) {
    unsafe {
        if let Ok(adapter) = dxgi_device.GetAdapter() {
            if let Ok(desc) = adapter.GetDesc() {
                let name = String::from_utf16_lossy(&desc.Description);
                log::debug!(
                    "D3D11 device created on {} ({} MB)",
                    name.trim_end_matches('\0'),
                    desc.DedicatedVideoMemory / 1024 / 1024
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_creation() {
        let _ctx = create_d3d11_device().expect("device creation failed");
    }

    #[test]
    fn test_dxgi_adapter() {
        let ctx = create_d3d11_device().unwrap();

        unsafe {
            let adapter = ctx.dxgi_device.GetAdapter();
            assert!(adapter.is_ok());
            assert!(adapter.unwrap().GetDesc().is_ok());
        }
    }
}
