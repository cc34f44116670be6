pub mod bvh;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod geom;
pub mod pipelines;
pub mod ray;
pub mod scene;
pub mod shaders;
pub mod state;
pub mod timing;
pub mod tutorial;

pub use device::{Device, DeviceConfig};
pub use error::{Error, ErrorCode};
pub use ray::{Hit, Ray, INVALID_GEOMETRY_ID};
pub use scene::{GeometryFlags, Scene, SceneFlags};

use std::{fs, io, path, sync};

use winit::{dpi, event, event_loop, keyboard, window};

#[derive(Clone)]
#[derive(serde::Deserialize)]
#[serde(default)]
#[derive(Debug)]
pub struct WindowConfig {
    pub size: dpi::LogicalSize<u32>,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: dpi::LogicalSize::new(512, 384),
            title: String::from("Minimal Test"),
            vsync: true,
        }
    }
}

// Config declaration
#[derive(Clone, Default)]
#[derive(serde::Deserialize)]
#[serde(default)]
#[derive(Debug)]
pub struct Config {
    pub window: WindowConfig,
    // Passed verbatim to `Device::new`
    pub device: Option<String>,
}

impl Config {
    pub fn from_path<P: AsRef<path::Path>>(path: P) -> anyhow::Result<Self> {
        let reader = io::BufReader::new({
            fs::File::open(path)?
        });

        Ok(serde_json::from_reader(reader)?)
    }
}

// Opens the window and traces `scene` into it every frame until closed
pub async fn run_native(config: Config, scene: scene::Scene) -> anyhow::Result<()> {
    let event_loop = event_loop::EventLoop::new()?;
        event_loop.set_control_flow(event_loop::ControlFlow::Poll);

    let window = window::WindowBuilder::new()
        .with_title(config.window.title.as_str())
        .with_inner_size(config.window.size)
        .build(&event_loop)?;

    // This needs to be shared with State
    let window = sync::Arc::new(window);

    let mut state = state::State::new(&config, window.clone()).await?;

    let dpi::PhysicalSize { width, height } = window.inner_size();
    log::info!("framebuffer size: {width}, {height}");

    let mut framebuffer = framebuffer::Framebuffer::new(state.size());
    let mut timer = timing::FrameTimer::default();

    event_loop.run(move |event, target| {
        match event {
            event::Event::WindowEvent { event, window_id, .. }
                if window_id == window.id() => match event {
                    event::WindowEvent::CloseRequested | //
                    event::WindowEvent::KeyboardInput {
                        event: event::KeyEvent {
                            state: event::ElementState::Pressed,
                            logical_key: keyboard::Key::Named(keyboard::NamedKey::Escape), ..
                        }, ..
                    } => target.exit(),
                    event::WindowEvent::Resized(physical_size) => {
                        log::debug!("resized to {:?}", physical_size);

                        state.resize(physical_size);
                        framebuffer.resize(state.size());
                    },
                    event::WindowEvent::RedrawRequested => {
                        framebuffer.trace(&scene);
                        state.upload(&framebuffer);

                        match state.render() {
                            Ok(_) => if let Some(fps) = timer.tick() {
                                log::debug!("{fps:.1} fps");
                            },
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.reconfigure();
                            },
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("out of GPU memory");

                                target.exit();
                            },
                            Err(e) => log::warn!("{e:?}"),
                        }
                    },
                    _ => { /*  */ },
                }
            ,
            event::Event::AboutToWait => window.request_redraw(),
            _ => { /*  */ },
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.window.size, dpi::LogicalSize::new(512, 384));
        assert_eq!(config.window.title, "Minimal Test");
        assert!(config.window.vsync);
        assert!(config.device.is_none());
    }

    #[test]
    fn config_partial_override() {
        let config: Config = serde_json::from_str(r#"{
            "window": { "title": "Triangle", "vsync": false },
            "device": "verbose=1"
        }"#).unwrap();

        assert_eq!(config.window.size, dpi::LogicalSize::new(512, 384));
        assert_eq!(config.window.title, "Triangle");
        assert!(!config.window.vsync);
        assert_eq!(config.device.as_deref(), Some("verbose=1"));
    }
}
