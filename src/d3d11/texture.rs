// Staging-texture readback: GPU texture → caller's CPU buffer.

use anyhow::{bail, Context, Result};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;

/// Reads BGRA8 textures back to the CPU through a reusable staging texture.
pub struct TextureReader {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    staging_texture: Option<ID3D11Texture2D>,
    width: u32,
    height: u32,
}

impl TextureReader {
    pub fn new(device: ID3D11Device, context: ID3D11DeviceContext) -> Self {
        Self {
            device,
            context,
            staging_texture: None,
            width: 0,
            height: 0,
        }
    }

    /// Ensure the staging texture exists with the given dimensions.
    /// Pre-creating at session construction avoids the cost on the first read.
    pub fn ensure_staging_texture(&mut self, width: u32, height: u32) -> Result<()> {
        if self.staging_texture.is_some() && self.width == width && self.height == height {
            return Ok(());
        }

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
            Usage: D3D11_USAGE_STAGING,
            BindFlags: 0,
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            MiscFlags: 0,
        };

        // SAFETY: desc is fully initialized; CreateTexture2D allocates the resource
        unsafe {
            let mut texture = None;
            self.device
                .CreateTexture2D(&desc, None, Some(&mut texture))
                .context("Failed to create staging texture")?;

            self.staging_texture = Some(texture.unwrap());
            self.width = width;
            self.height = height;
        }

        Ok(())
    }

    /// Copy `source` into `dst`, stripping the row pitch.
    ///
    /// `source` must be a BGRA8 texture whose dimensions match `dst`'s length
    /// (`width * height * 4` bytes exactly).
    pub fn read_into(&mut self, source: &ID3D11Texture2D, dst: &mut [u8]) -> Result<()> {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe {
            source.GetDesc(&mut desc);
        }

        if desc.Format != DXGI_FORMAT_B8G8R8A8_UNORM {
            bail!("Unsupported texture format for readback: {:?}", desc.Format);
        }

        let row_bytes = desc.Width as usize * 4;
        let expected = row_bytes * desc.Height as usize;
        if dst.len() != expected {
            bail!(
                "Capture source is {}x{} ({} bytes), buffer holds {} bytes",
                desc.Width,
                desc.Height,
                expected,
                dst.len()
            );
        }

        self.ensure_staging_texture(desc.Width, desc.Height)?;
        let staging = self.staging_texture.as_ref().unwrap();

        unsafe {
            // CopyResource requires identical size and format on both sides.
            self.context.CopyResource(staging, source);

            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            self.context
                .Map(staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped))
                .context("Failed to map staging texture")?;

            // Rows in the mapped surface are padded to RowPitch; the output
            // buffer is tightly packed.
            let pitch = mapped.RowPitch as usize;
            let src = mapped.pData as *const u8;
            for y in 0..desc.Height as usize {
                std::ptr::copy_nonoverlapping(
                    src.add(y * pitch),
                    dst.as_mut_ptr().add(y * row_bytes),
                    row_bytes,
                );
            }

            self.context.Unmap(staging, 0);
        }

        Ok(())
    }
}
