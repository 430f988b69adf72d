// virtegl/src/platform/egl/ffi.rs
//
//! EGL extension enumerants that the generated core bindings don't define.

#![allow(dead_code)]

use crate::egl::types::{EGLConfig, EGLenum, EGLint};

use std::os::raw::c_void;

pub enum EGLClientBufferOpaque {}
pub type EGLClientBuffer = *mut EGLClientBufferOpaque;

// EGL 1.5 / EGL_KHR_create_context
pub const EGL_CONTEXT_MAJOR_VERSION: EGLenum = 0x3098;
pub const EGL_CONTEXT_MINOR_VERSION: EGLenum = 0x30fb;
pub const EGL_OPENGL_ES3_BIT: EGLint = 0x40;

// EGL_EXT_create_context_robustness
pub const EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY: EGLenum = 0x31bd;
pub const EGL_LOSE_CONTEXT_ON_RESET: EGLenum = 0x31bf;

// EGL_NV_robustness_video_memory_purge
pub const EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV: EGLenum = 0x334c;

// EGL_KHR_no_config_context
pub const EGL_NO_CONFIG_KHR: EGLConfig = 0 as *const c_void;

// EGL_EXT_pixel_format_float
pub const EGL_COLOR_COMPONENT_TYPE_EXT: EGLenum = 0x3339;
pub const EGL_COLOR_COMPONENT_TYPE_FIXED_EXT: EGLenum = 0x333a;
pub const EGL_COLOR_COMPONENT_TYPE_FLOAT_EXT: EGLenum = 0x333b;

// ANGLE platform display attributes
pub const EGL_PLATFORM_ANGLE_TYPE_ANGLE: EGLenum = 0x3203;
pub const EGL_PLATFORM_ANGLE_MAX_VERSION_MAJOR_ANGLE: EGLenum = 0x3204;
pub const EGL_PLATFORM_ANGLE_MAX_VERSION_MINOR_ANGLE: EGLenum = 0x3205;
pub const EGL_PLATFORM_ANGLE_TYPE_DEFAULT_ANGLE: EGLenum = 0x3206;
pub const EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE: EGLenum = 0x320d;
pub const EGL_PLATFORM_ANGLE_TYPE_OPENGLES_ANGLE: EGLenum = 0x320e;
pub const EGL_PLATFORM_ANGLE_CONTEXT_VIRTUALIZATION_ANGLE: EGLenum = 0x3481;

// EGL_ANGLE_external_context_and_surface
pub const EGL_EXTERNAL_CONTEXT_ANGLE: EGLenum = 0x348e;
pub const EGL_EXTERNAL_SURFACE_ANGLE: EGLenum = 0x348f;
