//! Two-pass forward rendering.
//!
//! Every frame renders the scene twice: once from the light into the shadow
//! map, then once from the camera into the window while sampling that map.
//! [`render_frame`] fixes the order of operations against any
//! [`RenderBackend`]; [`GpuRenderer`] and [`WgpuFrame`] carry them out on wgpu.

mod backend;
mod frame;
mod uniforms;
mod wgpu_backend;

pub use backend::{PassOrder, PassState, RenderBackend};
pub use frame::{CameraView, render_frame};
pub use uniforms::{FrameUniforms, ModelUniforms, ShadowUniforms, uniform_stride};
pub use wgpu_backend::{GpuRenderer, WgpuFrame};
