pub mod v3;

pub use v3::{V3, V3Ops};

// Layout of a single entry in a triangle mesh's vertex buffer.
// The fourth component is padding and never read.
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[derive(Clone, Copy, Default, PartialEq)]
#[derive(serde::Deserialize)]
#[derive(Debug)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(skip)]
    pub a: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, a: 0. }
    }

    pub const fn pos(&self) -> V3<f32> {
        [self.x, self.y, self.z]
    }
}

impl From<V3<f32>> for Vertex {
    fn from([x, y, z]: V3<f32>) -> Self {
        Self::new(x, y, z)
    }
}

// Layout of a single entry in a triangle mesh's index buffer
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[derive(Debug)]
pub struct Triangle {
    pub v0: u32,
    pub v1: u32,
    pub v2: u32,
}

impl Triangle {
    pub const fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Self { v0, v1, v2 }
    }

    pub const fn indices(&self) -> [u32; 3] {
        [self.v0, self.v1, self.v2]
    }
}
