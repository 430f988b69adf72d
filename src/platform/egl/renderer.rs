// virtegl/src/platform/egl/renderer.rs
//
//! Renderers: one native context and its GL function table.

use super::functions::{GLFunctions, NativeEGL};
use crate::egl;
use crate::egl::types::{EGLContext, EGLint};
use crate::{AttributeVector, GLVersion, Gl};

use log::error;
use std::thread;

pub(crate) trait NativeContext {
    fn egl_context(&self) -> EGLContext;
    fn is_destroyed(&self) -> bool;
    fn destroy(&mut self, native: &dyn NativeEGL);
}

/// A native context this backend created and must destroy.
pub(crate) struct OwnedEGLContext {
    pub(crate) egl_context: EGLContext,
}

impl NativeContext for OwnedEGLContext {
    #[inline]
    fn egl_context(&self) -> EGLContext {
        self.egl_context
    }

    #[inline]
    fn is_destroyed(&self) -> bool {
        self.egl_context == egl::NO_CONTEXT
    }

    fn destroy(&mut self, native: &dyn NativeEGL) {
        assert!(!self.is_destroyed());
        if !native.destroy_context(self.egl_context) {
            error!(
                "eglDestroyContext failed with 0x{:04x}",
                native.get_error()
            );
        }
        self.egl_context = egl::NO_CONTEXT;
    }
}

/// A native context owned by the embedder, which outlives the renderer.
pub(crate) struct UnsafeEGLContextRef {
    pub(crate) egl_context: EGLContext,
}

impl NativeContext for UnsafeEGLContextRef {
    #[inline]
    fn egl_context(&self) -> EGLContext {
        self.egl_context
    }

    #[inline]
    fn is_destroyed(&self) -> bool {
        self.egl_context == egl::NO_CONTEXT
    }

    fn destroy(&mut self, _: &dyn NativeEGL) {
        assert!(!self.is_destroyed());
        self.egl_context = egl::NO_CONTEXT;
    }
}

/// One native context together with the GL function table resolved for it.
///
/// With virtualization enabled every client context of a display shares the display's renderer.
/// Otherwise each client context has its own. Renderers must be released through the display
/// that created them; dropping a live renderer panics.
pub struct SharedRenderer {
    native_context: Box<dyn NativeContext>,
    attributes: AttributeVector,
    functions: GLFunctions,
    is_external: bool,
}

unsafe impl Send for SharedRenderer {}
unsafe impl Sync for SharedRenderer {}

impl Drop for SharedRenderer {
    #[inline]
    fn drop(&mut self) {
        if !self.native_context.is_destroyed() && !thread::panicking() {
            panic!("Renderers must be destroyed explicitly with `terminate` or `destroy_context`!")
        }
    }
}

impl SharedRenderer {
    pub(crate) fn new(
        native_context: Box<dyn NativeContext>,
        attributes: AttributeVector,
        functions: GLFunctions,
        is_external: bool,
    ) -> SharedRenderer {
        SharedRenderer {
            native_context,
            attributes,
            functions,
            is_external,
        }
    }

    /// The native context. `EGL_NO_CONTEXT` once destroyed.
    #[inline]
    pub fn egl_context(&self) -> EGLContext {
        self.native_context.egl_context()
    }

    /// The `EGL_NONE`-terminated attribute list the native context was created with.
    #[inline]
    pub fn attributes(&self) -> &[EGLint] {
        &self.attributes
    }

    #[inline]
    pub fn gl(&self) -> Option<&Gl> {
        self.functions.gl.as_ref()
    }

    #[inline]
    pub fn max_supported_es_version(&self) -> GLVersion {
        self.functions.max_es_version
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.functions.description
    }

    /// Whether the native context was adopted from the embedder rather than created.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    #[inline]
    pub(crate) fn is_destroyed(&self) -> bool {
        self.native_context.is_destroyed()
    }

    pub(crate) fn destroy(&mut self, native: &dyn NativeEGL) {
        self.native_context.destroy(native)
    }
}
