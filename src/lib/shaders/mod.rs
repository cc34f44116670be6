use std::borrow;

// Full-screen quad that samples the traced image
pub fn blit() -> wgpu::ShaderSource<'static> {
    wgpu::ShaderSource::Wgsl(borrow::Cow::Borrowed(include_str!("blit.wgsl")))
}
