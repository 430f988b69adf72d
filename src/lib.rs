// virtegl/src/lib.rs
//
//! An EGL display backend for OpenGL ES front ends.
//!
//! This crate adapts a native EGL driver to the display/context/surface model that a client-facing
//! OpenGL ES implementation expects. It negotiates context versions and robustness across drivers
//! that disagree about what they support, enumerates and classifies framebuffer configurations,
//! and multiplexes many logical client contexts onto a single native context ("virtualization")
//! while keeping track of which surface and context each thread has bound, so that redundant
//! `eglMakeCurrent` calls are never issued.
//!
//! Everything here is synchronous bookkeeping over a native API that this crate does not control.
//! No rendering commands are issued and no GPU memory is managed.

pub mod platform;
pub use platform::egl::{ContextEGL, DisplayEGL, SurfaceEGL, WorkerContextEGL};

pub mod error;
pub use crate::error::{Error, WindowingApiError};

mod attributes;
pub use crate::attributes::{AttributeMap, AttributeVector};

mod context;
pub use crate::context::ContextID;

mod display;
pub use crate::display::DisplayBackend;

pub mod framebuffer;

mod info;
pub use crate::info::{GLApi, GLVersion};

pub use glow::Context as Gl;

#[allow(non_camel_case_types, clippy::all)]
pub mod egl {
    use std::os::raw::{c_long, c_void};
    pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
    pub type khronos_uint64_t = u64;
    pub type khronos_ssize_t = c_long;
    pub type EGLint = i32;
    pub type EGLNativeDisplayType = *const c_void;
    pub type EGLNativePixmapType = *const c_void;
    pub type EGLNativeWindowType = *const c_void;
    pub type NativeDisplayType = EGLNativeDisplayType;
    pub type NativePixmapType = EGLNativePixmapType;
    pub type NativeWindowType = EGLNativeWindowType;
    include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));
}

#[cfg(test)]
mod tests;
