//! Error types.
//!
//! Everything that can go wrong happens at startup: a window that won't open,
//! a GPU that can't be found, a model or shader that won't load. Once the first
//! frame is on screen the demo runs until it is closed, so there is no
//! per-frame error type. See [`StartupError`].

use thiserror::Error;

use crate::light::ShadowMapError;
use crate::model::ModelError;
use crate::texture::TextureError;

/// Fatal errors raised while bringing the demo up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("shader '{label}' failed to build: {message}")]
    Shader { label: String, message: String },

    #[error(transparent)]
    ShadowMap(#[from] ShadowMapError),
}

/// Top-level error returned by [`run`](crate::run).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("GPU ran out of memory while presenting")]
    OutOfMemory,
}
