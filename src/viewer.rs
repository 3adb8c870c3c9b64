// Live display loop: read frames and show them in a native window until the
// quit key is pressed or the window is closed.

use anyhow::Result;
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions, Vec2};

use crate::frame::{Frame, PixelFormat};
use crate::session::CaptureSession;

/// Show the session's frames live. Blocks until `Q` is pressed or the window
/// is closed. `color` selects the conversion mode passed to each read.
pub fn run(session: CaptureSession, color: bool) -> Result<()> {
    let title = session.name().to_string();
    let size = Vec2::new(session.width() as f32, session.height() as f32);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(size)
            .with_title(title.clone())
            // Drag-and-drop initializes OLE, which conflicts with the
            // multithreaded COM apartment the capture session runs in.
            .with_drag_and_drop(false),
        ..Default::default()
    };

    let app = ViewerApp {
        session,
        color,
        texture: None,
    };

    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Viewer failed: {e}"))
}

struct ViewerApp {
    session: CaptureSession,
    color: bool,
    texture: Option<TextureHandle>,
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Q)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        match self.session.read(self.color) {
            Ok(frame) => {
                let image = to_color_image(&frame);
                match &mut self.texture {
                    Some(handle) => handle.set(image, TextureOptions::NEAREST),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("frame", image, TextureOptions::NEAREST));
                    }
                }
            }
            Err(err) => {
                log::error!("Frame read failed: {err:#}");
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    ui.image((texture.id(), ui.available_size()));
                }
            });

        // Pull the next frame as soon as this one is on screen.
        ctx.request_repaint();
    }
}

/// Expand a BGR or grayscale frame to the RGBA layout egui textures use.
fn to_color_image(frame: &Frame) -> ColorImage {
    let pixel_count = frame.width as usize * frame.height as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    match frame.format {
        PixelFormat::Bgr8 => {
            for px in frame.data.chunks_exact(3) {
                rgba.extend_from_slice(&[px[2], px[1], px[0], 255]);
            }
        }
        PixelFormat::Gray8 => {
            for &v in &frame.data {
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
        }
    }

    ColorImage::from_rgba_unmultiplied([frame.width as usize, frame.height as usize], &rgba)
}
