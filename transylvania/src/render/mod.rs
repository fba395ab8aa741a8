mod config;
mod light;
mod params;
mod quad;
mod wgpu_backend;

pub use config::RendererConfig;
pub use light::Light;
pub use params::DrawParams;
pub use wgpu_backend::{Frame, Renderer};
