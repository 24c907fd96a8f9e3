use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::window::Window;

use super::surface::{self, SurfaceErrorAction};
use super::{GpuInit, GraphicsContext};

/// One acquired surface frame.
///
/// Holding it blocks acquisition of the next one; the render loop presents it
/// before the tick ends.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// wgpu-backed graphics context bound to a winit window.
///
/// Created on the owner thread, then used only by the render thread.
pub struct WgpuGraphics {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    clear: wgpu::Color,
    frame: Option<GpuFrame>,
}

impl WgpuGraphics {
    /// Blocks on adapter and device acquisition.
    pub fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new_async(window, init))
    }

    async fn new_async(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let inner = window.inner_size();
        anyhow::ensure!(inner.width > 0 && inner.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: inner.width,
            height: inner.height,
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            inner.width,
            inner.height
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size: (inner.width, inner.height),
            clear: wgpu::Color::BLACK,
            frame: None,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// The frame acquired for the current tick, if any.
    pub fn frame_mut(&mut self) -> Option<&mut GpuFrame> {
        self.frame.as_mut()
    }

    fn clear_pass(&self, frame: &mut GpuFrame) {
        let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

impl GraphicsContext for WgpuGraphics {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            (width, height),
        );
    }

    fn begin_frame(&mut self) -> Result<bool> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Ok(false);
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                let action = surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    &err,
                );
                log::debug!("surface acquisition failed ({err}): {action:?}");
                return match action {
                    SurfaceErrorAction::Fatal => Err(anyhow!("surface lost: {err}")),
                    _ => Ok(false),
                };
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        let mut frame = GpuFrame {
            surface_texture,
            view,
            encoder,
        };
        self.clear_pass(&mut frame);
        self.frame = Some(frame);
        Ok(true)
    }

    fn present(&mut self) -> Result<()> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        self.window.pre_present_notify();
        frame.surface_texture.present();
        Ok(())
    }

    fn set_clear_color(&mut self, rgba: [f64; 4]) {
        self.clear = wgpu::Color {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        };
    }

    fn release(&mut self) {
        self.frame = None;
        log::debug!("wgpu context released");
    }
}
