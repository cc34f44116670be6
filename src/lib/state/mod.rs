mod package;

use std::sync;

use winit::{dpi, window};

use crate::{framebuffer, pipelines};

// GPU side of the viewer: a surface, and a pipeline that
// blits the CPU-traced image onto it
pub struct State {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    quad: pipelines::Quad,
    blit: pipelines::Blit,
    image: package::ImagePackage,
}

impl State {
    pub async fn new(
        config: &crate::Config,
        window: sync::Arc<window::Window>,
    ) -> anyhow::Result<Self> {
        let size = match window.inner_size() {
            // Texture dimensions can never be 0. The real size
            // arrives with the first resize event
            dpi::PhysicalSize { width: 0, .. } | //
            dpi::PhysicalSize { height: 0, .. } => dpi::PhysicalSize::new(1, 1),
            size => size
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(), ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Window({
            Box::new(window.clone())
        }))?;

        let adapter = instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }).await.ok_or_else(|| anyhow::anyhow!("no compatible graphics adapter"))?;

        log::debug!("using adapter {:?}", adapter.get_info());

        let device_desc = wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        };

        let (device, queue) = adapter
            .request_device(&device_desc, None)
            .await?;

        let wgpu::SurfaceCapabilities {
            formats,
            present_modes,
            alpha_modes, ..
        } = surface.get_capabilities(&adapter);

        // The blit relies on the surface encoding sRGB
        let format = formats.iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;

        let present_mode = if config.window.vsync {
            wgpu::PresentMode::Fifo
        } else if present_modes.contains(&wgpu::PresentMode::AutoNoVsync) {
            wgpu::PresentMode::AutoNoVsync
        } else {
            present_modes[0]
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: alpha_modes[0],
            view_formats: Vec::new(),
            desired_maximum_frame_latency: 1,
        };

        surface.configure(&device, &surface_config);

        let quad = pipelines::Quad::new(&device);
        let blit = pipelines::Blit::new(&device, format);
        let image = package::ImagePackage::new(&device, &blit, size);

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,

            quad,
            blit,
            image,
        })
    }

    pub fn size(&self) -> dpi::PhysicalSize<u32> {
        self.image.size
    }

    pub fn resize(&mut self, size: dpi::PhysicalSize<u32>) {
        // Minimized windows report 0
        if size.width > 0 && size.height > 0 {
            self.surface_config.width = size.width;
            self.surface_config.height = size.height;

            self.surface.configure(&self.device, &self.surface_config);

            self.image = package::ImagePackage::new(&self.device, &self.blit, size);
        }
    }

    // Reapplies the current configuration after the surface was lost
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn upload(&self, framebuffer: &framebuffer::Framebuffer) {
        if framebuffer.size() != self.image.size {
            log::warn!(
                "skipping upload, image is {:?} but texture is {:?}",
                framebuffer.size(), self.image.size
            );

            return;
        }

        self.image.write(&self.queue, framebuffer.pixels());
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;

        let view = output.texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder({
            &wgpu::CommandEncoderDescriptor::default()
        });

        {
            let color_attachment = wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            };

            let mut render_pass = encoder.begin_render_pass(
                &wgpu::RenderPassDescriptor {
                    label: None,
                    color_attachments: &[Some(color_attachment)],
                    depth_stencil_attachment: None,
                    ..Default::default()
                }
            );

            render_pass.set_pipeline(&self.blit.inner);
            render_pass.set_bind_group(0, &self.image.group, &[]);

            self.quad.draw(&mut render_pass);
        }

        self.queue.submit(Some(encoder.finish()));

        output.present();

        Ok(())
    }
}
