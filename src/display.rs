// virtegl/src/display.rs
//
//! The interface a display backend exposes to the OpenGL ES front end.

use crate::egl::types::{EGLNativePixmapType, EGLenum, EGLint};
use crate::platform::egl::ffi::EGLClientBuffer;
use crate::platform::egl::{Caps, ConfigSet, DisplayExtensions};
use crate::{AttributeMap, Error, GLVersion};

/// A display: one native display connection plus the contexts and surfaces created on it.
///
/// Operations other than `initialize` fail with `Error::NotInitialized` before `initialize`
/// succeeds or after `terminate`.
pub trait DisplayBackend {
    /// A client context.
    type Context;
    /// A window, pbuffer or external surface.
    type Surface;
    /// A headless context for background work.
    type WorkerContext;
    /// The native window type window surfaces are created for.
    type NativeWindow;

    /// Opens the native display and creates the display's renderer.
    fn initialize(&mut self, attributes: &AttributeMap) -> Result<(), Error>;

    /// Releases the renderer and closes the native display.
    ///
    /// Every context and surface must have been destroyed first.
    fn terminate(&mut self);

    fn create_context(
        &self,
        share_context: Option<&Self::Context>,
        attributes: &AttributeMap,
    ) -> Result<Self::Context, Error>;
    fn destroy_context(&self, context: &mut Self::Context) -> Result<(), Error>;

    /// Binds `draw` and `context` on the calling thread. `None` unbinds.
    ///
    /// Reads always come from the draw surface.
    fn make_current(
        &self,
        draw: Option<&Self::Surface>,
        read: Option<&Self::Surface>,
        context: Option<&Self::Context>,
    ) -> Result<(), Error>;

    /// Binds `context` without changing the surface binding.
    fn make_current_surfaceless(&self, context: &Self::Context) -> Result<(), Error>;

    fn create_window_surface(
        &self,
        config_id: EGLint,
        window: Self::NativeWindow,
        attributes: &AttributeMap,
    ) -> Result<Self::Surface, Error>;
    fn create_pbuffer_surface(
        &self,
        config_id: EGLint,
        attributes: &AttributeMap,
    ) -> Result<Self::Surface, Error>;
    fn create_pbuffer_from_client_buffer(
        &self,
        config_id: EGLint,
        buffer_type: EGLenum,
        client_buffer: EGLClientBuffer,
        attributes: &AttributeMap,
    ) -> Result<Self::Surface, Error>;
    fn create_pixmap_surface(
        &self,
        config_id: EGLint,
        pixmap: EGLNativePixmapType,
        attributes: &AttributeMap,
    ) -> Result<Self::Surface, Error>;
    fn destroy_surface(&self, surface: &mut Self::Surface) -> Result<(), Error>;

    /// Checks a client buffer before `create_pbuffer_from_client_buffer`.
    fn validate_client_buffer(
        &self,
        config_id: EGLint,
        buffer_type: EGLenum,
        client_buffer: EGLClientBuffer,
        attributes: &AttributeMap,
    ) -> Result<(), Error>;
    fn is_valid_native_window(&self, window: &Self::NativeWindow) -> bool;

    /// Enumerates the configs clients may choose from, renumbering them from 1.
    fn generate_configs(&mut self) -> Result<ConfigSet, Error>;
    fn generate_extensions(&self) -> DisplayExtensions;
    fn generate_caps(&self) -> Caps;

    fn create_worker_context(
        &self,
        shared_context: Option<&Self::Context>,
        attributes: &AttributeMap,
    ) -> Result<Self::WorkerContext, Error>;

    fn wait_client(&self, context: &Self::Context) -> Result<(), Error>;
    fn wait_native(&self, context: &Self::Context, engine: EGLint) -> Result<(), Error>;
    fn test_device_lost(&self) -> bool;
    fn restore_lost_device(&mut self) -> Result<(), Error>;

    fn max_supported_es_version(&self) -> Result<GLVersion, Error>;
}
