// virtegl/src/platform/egl/worker.rs
//
//! Headless contexts for background work such as shader compilation.

use super::error::ToWindowingApiError;
use super::functions::NativeEGL;
use crate::egl;
use crate::egl::types::{EGLContext, EGLSurface};
use crate::Error;

use log::error;
use std::sync::Arc;

/// An independent native context that is never virtualized and never tracked by the display.
///
/// It binds to no drawable, may be made current on any thread, and destroys its native context
/// when dropped.
pub struct WorkerContextEGL {
    native: Arc<dyn NativeEGL>,
    egl_context: EGLContext,
    egl_surface: EGLSurface,
}

unsafe impl Send for WorkerContextEGL {}

impl Drop for WorkerContextEGL {
    fn drop(&mut self) {
        if !self.native.destroy_context(self.egl_context) {
            error!(
                "eglDestroyContext failed for worker context with 0x{:04x}",
                self.native.get_error()
            );
        }
    }
}

impl WorkerContextEGL {
    pub(crate) fn new(native: Arc<dyn NativeEGL>, egl_context: EGLContext) -> WorkerContextEGL {
        WorkerContextEGL {
            native,
            egl_context,
            egl_surface: egl::NO_SURFACE,
        }
    }

    #[inline]
    pub fn egl_context(&self) -> EGLContext {
        self.egl_context
    }

    pub fn make_current(&self) -> Result<(), Error> {
        if !self.native.make_current(self.egl_surface, self.egl_context) {
            let err = self.native.get_error().to_windowing_api_error();
            return Err(Error::MakeCurrentFailed(err));
        }
        Ok(())
    }

    pub fn unmake_current(&self) -> Result<(), Error> {
        if !self.native.make_current(egl::NO_SURFACE, egl::NO_CONTEXT) {
            let err = self.native.get_error().to_windowing_api_error();
            return Err(Error::MakeCurrentFailed(err));
        }
        Ok(())
    }
}
