// virtegl/src/platform/egl/context.rs
//
//! Client contexts.

use super::renderer::SharedRenderer;
use crate::egl;
use crate::egl::types::EGLContext;
use crate::ContextID;

use std::sync::Arc;
use std::thread;

/// A client-visible OpenGL ES context.
///
/// When the display virtualizes contexts, every `ContextEGL` (other than external ones) refers
/// to the display's single renderer, so `egl_context()` is the same for all of them.
pub struct ContextEGL {
    id: ContextID,
    pub(crate) renderer: Option<Arc<SharedRenderer>>,
    is_external: bool,
    reset_on_video_memory_purge: bool,
}

impl Drop for ContextEGL {
    #[inline]
    fn drop(&mut self) {
        if self.renderer.is_some() && !thread::panicking() {
            panic!("Contexts must be destroyed explicitly with `destroy_context`!")
        }
    }
}

impl ContextEGL {
    pub(crate) fn new(
        renderer: Arc<SharedRenderer>,
        is_external: bool,
        reset_on_video_memory_purge: bool,
    ) -> ContextEGL {
        ContextEGL {
            id: ContextID::next(),
            renderer: Some(renderer),
            is_external,
            reset_on_video_memory_purge,
        }
    }

    #[inline]
    pub fn id(&self) -> ContextID {
        self.id
    }

    /// The native context this client context renders with. `EGL_NO_CONTEXT` once destroyed.
    #[inline]
    pub fn egl_context(&self) -> EGLContext {
        match self.renderer {
            Some(ref renderer) => renderer.egl_context(),
            None => egl::NO_CONTEXT,
        }
    }

    /// The renderer backing this context, until it is destroyed.
    #[inline]
    pub fn renderer(&self) -> Option<&SharedRenderer> {
        self.renderer.as_deref()
    }

    /// Whether the context wraps an embedder-owned native context.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Whether the client asked for `EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV`.
    #[inline]
    pub fn generates_reset_on_video_memory_purge(&self) -> bool {
        self.reset_on_video_memory_purge
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.renderer.is_none()
    }
}
