use winit::dpi;

use crate::pipelines;

// The texture the traced image is uploaded into, with its blit bindings.
// Rebuilt whenever the window size changes
pub struct ImagePackage {
    pub texture: wgpu::Texture,
    pub group: wgpu::BindGroup,
    pub size: dpi::PhysicalSize<u32>,
}

impl ImagePackage {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(
        device: &wgpu::Device,
        blit: &pipelines::Blit,
        size: dpi::PhysicalSize<u32>,
    ) -> Self {
        let dpi::PhysicalSize { width, height } = size;

        let texture = device.create_texture(
            &wgpu::TextureDescriptor {
                label: Some("image"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::FORMAT,
                usage: wgpu::TextureUsages::COPY_DST
                     | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[Self::FORMAT.add_srgb_suffix()],
            }
        );

        // Sampling through the sRGB view undoes the encoding the sRGB
        // surface applies, so pixel bytes reach the screen unchanged
        let view = texture.create_view(
            &wgpu::TextureViewDescriptor {
                label: None,
                format: Some(Self::FORMAT.add_srgb_suffix()),
                dimension: Some(wgpu::TextureViewDimension::D2),
                aspect: wgpu::TextureAspect::All,
                base_mip_level: 0,
                mip_level_count: Some(1),
                base_array_layer: 0,
                array_layer_count: Some(1),
            }
        );

        let group = device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                label: Some("image"),
                layout: &blit.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&blit.sampler),
                    },
                ],
            }
        );

        Self { texture, group, size }
    }

    // Expects tightly packed RGBA8 rows matching `size`
    pub fn write(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        let dpi::PhysicalSize { width, height } = self.size;

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}
