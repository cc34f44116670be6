use winit::dpi;

use crate::{geom, scene, tutorial};

// Every pixel casts a ray parallel to the z axis from z = -1
const RAY_DIR: geom::V3<f32> = [0., 0., 1.];

// Pixel centers span [-0.1, 1.1] on both axes, a margin
// of 0.1 around the unit triangle
const RAY_SPAN: (f32, f32) = (-0.1, 1.2);

/// Brightness of hit pixels on a given frame, pulsing through [128, 255].
pub fn intensity(frame: u64) -> u8 {
    (frame % 128) as u8 + 128
}

// Maps pixel `i` of `n` onto the ray plane
fn coordinate(i: u32, n: u32) -> f32 {
    let (lo, span) = RAY_SPAN;

    match n {
        0 | 1 => lo,
        n => lo + span * i as f32 / (n - 1) as f32,
    }
}

/// Origin of the ray cast for pixel `(x, y)`, with `y` counted from the
/// bottom row.
pub fn ray_origin(x: u32, y: u32, size: dpi::PhysicalSize<u32>) -> geom::V3<f32> {
    [coordinate(x, size.width), coordinate(y, size.height), -1.]
}

/// RGBA8 image with one ray per pixel. Rows are stored top-down.
#[derive(Debug)]
pub struct Framebuffer {
    size: dpi::PhysicalSize<u32>,
    pixels: Vec<u8>,
    frame: u64,
}

impl Framebuffer {
    pub fn new(size: dpi::PhysicalSize<u32>) -> Self {
        let mut framebuffer = Self {
            size,
            pixels: Vec::new(),
            frame: 0,
        };

        framebuffer.resize(size);
        framebuffer
    }

    pub fn resize(&mut self, size: dpi::PhysicalSize<u32>) {
        let dpi::PhysicalSize { width, height } = size;

        self.size = dpi::PhysicalSize::new(width.max(1), height.max(1));
        self.pixels = vec![0; self.size.width as usize * self.size.height as usize * 4];
    }

    pub fn size(&self) -> dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the frame counter and casts one ray per pixel.
    pub fn trace(&mut self, scene: &scene::Scene) {
        self.frame += 1;

        let c = intensity(self.frame);

        let Self { size, pixels, .. } = self;
        let dpi::PhysicalSize { width, height } = *size;

        for (row, line) in pixels.chunks_exact_mut(width as usize * 4).enumerate() {
            let y = height - 1 - row as u32;

            for (x, pixel) in line.chunks_exact_mut(4).enumerate() {
                let org = ray_origin(x as u32, y, *size);

                let value = if tutorial::cast_ray(scene, org, RAY_DIR) { c } else { 0 };

                pixel.copy_from_slice(&[value, value, value, 255]);
            }
        }
    }
}
