// virtegl/src/platform/egl/display.rs
//
//! The EGL display backend.

use super::config::{self, ConfigCatalog, ConfigSet};
use super::context::ContextEGL;
use super::current::{self, CurrentContextTracker, CurrentNativeContext};
use super::error::ToWindowingApiError;
use super::extensions::{Caps, DisplayExtensions, ExtensionSet};
use super::ffi::{EGLClientBuffer, EGL_CONTEXT_MAJOR_VERSION, EGL_CONTEXT_MINOR_VERSION};
use super::ffi::{EGL_EXTERNAL_CONTEXT_ANGLE, EGL_EXTERNAL_SURFACE_ANGLE, EGL_NO_CONFIG_KHR};
use super::ffi::EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV;
use super::functions::{FunctionsEGL, NativeEGL};
use super::negotiate;
use super::options::DisplayOptions;
use super::renderer::{NativeContext, OwnedEGLContext, SharedRenderer, UnsafeEGLContextRef};
use super::surface::{NativeWindow, SurfaceEGL};
use super::worker::WorkerContextEGL;
use crate::egl;
use crate::egl::types::{EGLAttrib, EGLConfig, EGLContext, EGLNativeDisplayType};
use crate::egl::types::{EGLNativePixmapType, EGLSurface, EGLenum, EGLint};
use crate::{AttributeMap, AttributeVector, DisplayBackend, Error, GLVersion};

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread::{self, ThreadId};

const MINIMUM_EGL_VERSION: GLVersion = GLVersion { major: 1, minor: 4 };
const MINIMUM_ES_VERSION: GLVersion = GLVersion { major: 2, minor: 0 };

/// An EGL display.
///
/// Owns the native display connection, the display's renderer, the fallback surface used when
/// the driver can't bind a context without one, and the record of what each thread has bound.
pub struct DisplayEGL {
    native: Arc<dyn NativeEGL>,
    state: Option<DisplayState>,
    tracker: CurrentContextTracker,
}

// Everything that exists only between `initialize` and `terminate`.
struct DisplayState {
    options: DisplayOptions,
    extensions: ExtensionSet,
    egl_config: EGLConfig,
    catalog: ConfigCatalog,
    mock_pbuffer: EGLSurface,
    renderer: Option<Arc<SharedRenderer>>,
}

impl DisplayState {
    #[inline]
    fn renderer(&self) -> Result<&Arc<SharedRenderer>, Error> {
        self.renderer.as_ref().ok_or(Error::NotInitialized)
    }
}

unsafe impl Send for DisplayEGL {}
unsafe impl Sync for DisplayEGL {}

impl Drop for DisplayEGL {
    fn drop(&mut self) {
        if self.state.is_some() && !thread::panicking() {
            self.terminate();
        }
    }
}

impl DisplayEGL {
    /// Opens the platform's default display with the system EGL library.
    pub fn new() -> Result<DisplayEGL, Error> {
        let native = FunctionsEGL::new(egl::DEFAULT_DISPLAY as EGLNativeDisplayType)?;
        Ok(DisplayEGL::from_native_egl(Arc::new(native)))
    }

    /// Wraps an already-opened native display. Nothing is called on it until `initialize`.
    pub fn from_native_egl(native: Arc<dyn NativeEGL>) -> DisplayEGL {
        DisplayEGL {
            native,
            state: None,
            tracker: CurrentContextTracker::default(),
        }
    }

    #[inline]
    pub fn native_egl(&self) -> &Arc<dyn NativeEGL> {
        &self.native
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    #[inline]
    fn state(&self) -> Result<&DisplayState, Error> {
        self.state.as_ref().ok_or(Error::NotInitialized)
    }

    pub fn options(&self) -> Option<&DisplayOptions> {
        self.state.as_ref().map(|state| &state.options)
    }

    pub fn extensions(&self) -> Option<&ExtensionSet> {
        self.state.as_ref().map(|state| &state.extensions)
    }

    /// The display's own renderer, which virtualized contexts share.
    pub fn renderer(&self) -> Option<&SharedRenderer> {
        self.state.as_ref().and_then(|state| state.renderer.as_deref())
    }

    /// The native config contexts and worker contexts are created with. `EGL_NO_CONFIG_KHR` when
    /// the driver supports config-less contexts.
    pub fn egl_config(&self) -> Option<EGLConfig> {
        self.state.as_ref().map(|state| state.egl_config)
    }

    /// The 1x1 fallback pbuffer. `EGL_NO_SURFACE` when the driver supports surfaceless contexts
    /// or the display isn't initialized.
    pub fn mock_surface(&self) -> EGLSurface {
        self.state
            .as_ref()
            .map_or(egl::NO_SURFACE, |state| state.mock_pbuffer)
    }

    /// What the calling thread has bound, as far as this display knows.
    pub fn current_native_context(&self) -> CurrentNativeContext {
        *current::lock(&self.tracker.current())
    }

    /// What `thread` has bound, if it has ever used this display.
    pub fn current_native_context_on(&self, thread: ThreadId) -> Option<CurrentNativeContext> {
        self.tracker.snapshot(thread)
    }

    /// Clears `egl_context` from every thread's binding record, then destroys it.
    ///
    /// Threads that had it bound will rebind on their next `make_current` instead of assuming
    /// the stale binding is still in place.
    pub fn destroy_native_context(&self, egl_context: EGLContext) {
        self.tracker.forget_context(egl_context);
        if !self.native.destroy_context(egl_context) {
            error!("eglDestroyContext failed with 0x{:04x}", self.native.get_error());
        }
    }

    fn create_state(
        &self,
        options: DisplayOptions,
        egl_version: GLVersion,
    ) -> Result<DisplayState, Error> {
        if egl_version < MINIMUM_EGL_VERSION {
            return Err(Error::UnsupportedEGLVersion(egl_version));
        }
        if !self.native.bind_api(options.egl_api()) {
            let err = self.native.get_error().to_windowing_api_error();
            return Err(Error::DisplayInitializationFailed(err));
        }

        let extensions = ExtensionSet::new(egl_version, &self.native.query_extensions());
        let renderable_types = options.renderable_types(extensions.flexible_context_version);
        if renderable_types.is_empty() {
            return Err(Error::NoRenderableType);
        }

        // Take the most capable renderable type that has an RGBA8/D24S8 config.
        let (renderable_type, format_config) =
            negotiate::first_success(renderable_types, Error::NoPixelFormatFound, |&renderable_type| {
                let attributes = config::format_config_attributes(renderable_type);
                match self.native.choose_config(&attributes.to_int_vector(), 1) {
                    None => {
                        let err = self.native.get_error().to_windowing_api_error();
                        Err(Error::PixelFormatSelectionFailed(err))
                    }
                    Some(configs) => configs.first().copied().ok_or(Error::NoPixelFormatFound),
                }
            })?;

        let mock_pbuffer = if extensions.surfaceless_context {
            egl::NO_SURFACE
        } else {
            let mock_attributes = [
                egl::WIDTH as EGLint,
                1,
                egl::HEIGHT as EGLint,
                1,
                egl::NONE as EGLint,
            ];
            let surface = self
                .native
                .create_pbuffer_surface(format_config, &mock_attributes);
            if surface == egl::NO_SURFACE {
                let err = self.native.get_error().to_windowing_api_error();
                return Err(Error::MockSurfaceCreationFailed(err));
            }
            surface
        };

        // The mock pbuffer always uses a real config. Contexts skip it when they can.
        let (config_attributes, egl_config) = if extensions.no_config_context {
            (config::base_config_attributes(renderable_type), EGL_NO_CONFIG_KHR)
        } else {
            (config::format_config_attributes(renderable_type), format_config)
        };

        let mut state = DisplayState {
            options,
            extensions,
            egl_config,
            catalog: ConfigCatalog::new(&config_attributes),
            mock_pbuffer,
            renderer: None,
        };

        let renderer = match self.create_renderer(&state, egl::NO_CONTEXT, true, false) {
            Ok(renderer) => renderer,
            Err(err) => {
                self.destroy_mock_pbuffer(mock_pbuffer);
                return Err(err);
            }
        };
        let max_es_version = renderer.max_supported_es_version();
        state.renderer = Some(Arc::new(renderer));

        if max_es_version < MINIMUM_ES_VERSION {
            self.release_state(state);
            return Err(Error::UnsupportedESVersion(max_es_version));
        }
        Ok(state)
    }

    // Creates a renderer. An external renderer adopts the context already current on this
    // thread; any other gets a freshly negotiated one.
    //
    // With `make_current_now` the new context is left bound to the mock pbuffer. Otherwise the
    // calling thread's previous binding is restored.
    fn create_renderer(
        &self,
        state: &DisplayState,
        share_context: EGLContext,
        make_current_now: bool,
        is_external: bool,
    ) -> Result<SharedRenderer, Error> {
        let native = &*self.native;
        let (native_context, attributes): (Box<dyn NativeContext>, AttributeVector) = if is_external
        {
            assert_eq!(share_context, egl::NO_CONTEXT);
            assert!(!make_current_now);
            let egl_context = native.get_current_context();
            if egl_context == egl::NO_CONTEXT {
                return Err(Error::NoCurrentContext);
            }
            let attributes = vec![
                EGL_CONTEXT_MAJOR_VERSION as EGLint,
                2,
                EGL_CONTEXT_MINOR_VERSION as EGLint,
                0,
                egl::NONE as EGLint,
            ];
            (Box::new(UnsafeEGLContextRef { egl_context }), attributes)
        } else {
            let (egl_context, attributes) = negotiate::create_native_context(
                native,
                &state.extensions,
                state.egl_config,
                share_context,
                state.options.requested_version,
            )?;
            if !native.make_current(state.mock_pbuffer, egl_context) {
                let err = native.get_error().to_windowing_api_error();
                if !native.destroy_context(egl_context) {
                    error!("eglDestroyContext failed with 0x{:04x}", native.get_error());
                }
                return Err(Error::MakeCurrentFailed(err));
            }
            (Box::new(OwnedEGLContext { egl_context }), attributes)
        };

        let functions = native.load_gl_functions();
        let renderer = SharedRenderer::new(native_context, attributes, functions, is_external);
        debug!(
            "created {}renderer {:?}: {}",
            if is_external { "external " } else { "" },
            renderer.egl_context(),
            renderer.description()
        );

        let current = self.tracker.current();
        let mut current = current::lock(&current);
        if make_current_now {
            current.surface = state.mock_pbuffer;
            current.context = renderer.egl_context();
        } else if !is_external && !native.make_current(current.surface, current.context) {
            let err = native.get_error().to_windowing_api_error();
            // The previous binding is gone. Unbind the new context so the thread really has
            // nothing current, matching the record.
            if !native.make_current(egl::NO_SURFACE, egl::NO_CONTEXT) {
                error!("eglMakeCurrent failed with 0x{:04x}", native.get_error());
            }
            *current = CurrentNativeContext::default();
            drop(current);
            self.release_renderer(renderer);
            return Err(Error::MakeCurrentFailed(err));
        }
        Ok(renderer)
    }

    fn release_renderer(&self, mut renderer: SharedRenderer) {
        // Adopted contexts stay recorded until the embedder releases them.
        if !renderer.is_external() {
            self.tracker.forget_context(renderer.egl_context());
        }
        renderer.destroy(&*self.native);
    }

    fn destroy_mock_pbuffer(&self, mock_pbuffer: EGLSurface) {
        if mock_pbuffer != egl::NO_SURFACE && !self.native.destroy_surface(mock_pbuffer) {
            error!("eglDestroySurface failed with 0x{:04x}", self.native.get_error());
        }
    }

    // Unbinds the calling thread and releases everything but the display connection itself.
    fn release_state(&self, mut state: DisplayState) {
        if !self.native.make_current(egl::NO_SURFACE, egl::NO_CONTEXT) {
            error!("eglMakeCurrent failed with 0x{:04x}", self.native.get_error());
        }
        self.destroy_mock_pbuffer(state.mock_pbuffer);
        state.mock_pbuffer = egl::NO_SURFACE;

        if let Some(renderer) = state.renderer.take() {
            match Arc::try_unwrap(renderer) {
                Ok(renderer) => self.release_renderer(renderer),
                Err(_) => panic!("Contexts must be destroyed before the display is terminated!"),
            }
        }

        self.tracker.clear();
    }
}

impl DisplayBackend for DisplayEGL {
    type Context = ContextEGL;
    type Surface = SurfaceEGL;
    type WorkerContext = WorkerContextEGL;
    type NativeWindow = NativeWindow;

    fn initialize(&mut self, attributes: &AttributeMap) -> Result<(), Error> {
        if self.state.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        let options = DisplayOptions::from_attributes(attributes)?;

        let egl_version = match self.native.initialize() {
            Some(egl_version) => egl_version,
            None => {
                let err = self.native.get_error().to_windowing_api_error();
                return Err(Error::DisplayInitializationFailed(err));
            }
        };

        match self.create_state(options, egl_version) {
            Ok(state) => {
                if let Some(renderer) = state.renderer.as_ref() {
                    info!("DisplayEGL initialized: {}", renderer.description());
                }
                self.state = Some(state);
                Ok(())
            }
            Err(err) => {
                self.tracker.clear();
                if !self.native.terminate() {
                    error!("eglTerminate failed with 0x{:04x}", self.native.get_error());
                }
                Err(err)
            }
        }
    }

    fn terminate(&mut self) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };
        self.release_state(state);
        if !self.native.terminate() {
            error!("eglTerminate failed with 0x{:04x}", self.native.get_error());
        }
    }

    fn create_context(
        &self,
        share_context: Option<&ContextEGL>,
        attributes: &AttributeMap,
    ) -> Result<ContextEGL, Error> {
        let state = self.state()?;
        let is_true = |attribute: EGLenum| {
            attributes.get(attribute as EGLint, egl::FALSE as EGLAttrib) == egl::TRUE as EGLAttrib
        };
        let is_external = is_true(EGL_EXTERNAL_CONTEXT_ANGLE);
        let reset_on_video_memory_purge = is_true(EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV);

        let renderer = if state.options.virtualized_contexts && !is_external {
            state.renderer()?.clone()
        } else {
            let native_share_context = if is_external {
                assert!(share_context.is_none(), "External contexts can't share!");
                egl::NO_CONTEXT
            } else {
                share_context.map_or(egl::NO_CONTEXT, |context| context.egl_context())
            };
            match self.create_renderer(state, native_share_context, false, is_external) {
                Ok(renderer) => Arc::new(renderer),
                Err(err) => {
                    error!("Failed to create a renderer for a new context: {}", err);
                    return Err(err);
                }
            }
        };

        Ok(ContextEGL::new(renderer, is_external, reset_on_video_memory_purge))
    }

    fn destroy_context(&self, context: &mut ContextEGL) -> Result<(), Error> {
        self.state()?;
        let renderer = match context.renderer.take() {
            Some(renderer) => renderer,
            None => return Ok(()),
        };
        // Virtualized contexts hold a clone of the display's renderer, which outlives them.
        if let Ok(renderer) = Arc::try_unwrap(renderer) {
            self.release_renderer(renderer);
        }
        Ok(())
    }

    fn make_current(
        &self,
        draw: Option<&SurfaceEGL>,
        _read: Option<&SurfaceEGL>,
        context: Option<&ContextEGL>,
    ) -> Result<(), Error> {
        let state = self.state()?;

        let mut new_surface = draw.map_or(egl::NO_SURFACE, |surface| surface.egl_surface());
        let mut new_context = context.map_or(egl::NO_CONTEXT, |context| context.egl_context());
        let draw_is_external = draw.map_or(false, |surface| {
            surface.is_external() && surface.egl_surface() == egl::NO_SURFACE
        });

        let current = self.tracker.current();
        let mut current = current::lock(&current);

        // The embedder binds its own context and drawable, so none of these transitions touch
        // the driver.
        if current.is_external_context || context.map_or(false, |context| context.is_external()) {
            assert_eq!(current.surface, egl::NO_SURFACE);
            if !current.is_external_context {
                assert_eq!(current.context, egl::NO_CONTEXT);
                assert!(draw_is_external, "External contexts need external surfaces!");
                current.context = new_context;
                current.is_external_context = true;
            } else if context.is_some() {
                assert_eq!(current.context, new_context);
                assert_eq!(new_surface, egl::NO_SURFACE);
                assert_ne!(new_context, egl::NO_CONTEXT);
                assert!(draw_is_external, "External contexts need external surfaces!");
            } else {
                assert_eq!(new_surface, egl::NO_SURFACE);
                assert_ne!(current.context, egl::NO_CONTEXT);
                current.context = egl::NO_CONTEXT;
                current.is_external_context = false;
            }
            return Ok(());
        }

        if state.options.virtualized_contexts && new_context != egl::NO_CONTEXT {
            let shared_context = state.renderer()?.egl_context();
            assert!(current.context == egl::NO_CONTEXT || current.context == shared_context);
            new_context = shared_context;

            // Binding no surface keeps whatever surface the shared context already has.
            if new_surface == egl::NO_SURFACE {
                new_surface = current.surface;
            }
            if new_surface == egl::NO_SURFACE && !state.extensions.surfaceless_context {
                new_surface = state.mock_pbuffer;
                debug_assert_ne!(new_surface, egl::NO_SURFACE);
            }
        }

        if !current.is_bound_to(new_surface, new_context) {
            if !self.native.make_current(new_surface, new_context) {
                let err = self.native.get_error().to_windowing_api_error();
                return Err(Error::MakeCurrentFailed(err));
            }
            debug!("eglMakeCurrent({:?}, {:?})", new_surface, new_context);
            current.surface = new_surface;
            current.context = new_context;
        }
        Ok(())
    }

    fn make_current_surfaceless(&self, _: &ContextEGL) -> Result<(), Error> {
        self.state()?;
        Ok(())
    }

    fn create_window_surface(
        &self,
        config_id: EGLint,
        window: NativeWindow,
        attributes: &AttributeMap,
    ) -> Result<SurfaceEGL, Error> {
        let state = self.state()?;
        let egl_config = state.catalog.native_config(&*self.native, config_id)?;
        SurfaceEGL::new_window(&*self.native, egl_config, config_id, window, attributes)
    }

    fn create_pbuffer_surface(
        &self,
        config_id: EGLint,
        attributes: &AttributeMap,
    ) -> Result<SurfaceEGL, Error> {
        let state = self.state()?;
        let egl_config = state.catalog.native_config(&*self.native, config_id)?;
        SurfaceEGL::new_pbuffer(&*self.native, egl_config, config_id, attributes)
    }

    fn create_pbuffer_from_client_buffer(
        &self,
        config_id: EGLint,
        buffer_type: EGLenum,
        client_buffer: EGLClientBuffer,
        attributes: &AttributeMap,
    ) -> Result<SurfaceEGL, Error> {
        self.validate_client_buffer(config_id, buffer_type, client_buffer, attributes)?;
        Ok(SurfaceEGL::new_external(attributes))
    }

    fn create_pixmap_surface(
        &self,
        _: EGLint,
        _: EGLNativePixmapType,
        _: &AttributeMap,
    ) -> Result<SurfaceEGL, Error> {
        warn!("Pixmap surfaces are unimplemented");
        Err(Error::Unimplemented)
    }

    fn destroy_surface(&self, surface: &mut SurfaceEGL) -> Result<(), Error> {
        self.state()?;
        surface.destroy(&*self.native)
    }

    fn validate_client_buffer(
        &self,
        _: EGLint,
        buffer_type: EGLenum,
        client_buffer: EGLClientBuffer,
        _: &AttributeMap,
    ) -> Result<(), Error> {
        self.state()?;
        match buffer_type {
            EGL_EXTERNAL_SURFACE_ANGLE if client_buffer.is_null() => Ok(()),
            EGL_EXTERNAL_SURFACE_ANGLE => Err(Error::InvalidClientBuffer),
            _ => Err(Error::UnsupportedClientBuffer),
        }
    }

    fn is_valid_native_window(&self, _: &NativeWindow) -> bool {
        true
    }

    fn generate_configs(&mut self) -> Result<ConfigSet, Error> {
        let state = self.state.as_mut().ok_or(Error::NotInitialized)?;
        state.catalog.generate(&*self.native, &state.extensions)
    }

    fn generate_extensions(&self) -> DisplayExtensions {
        match self.state {
            Some(ref state) => state
                .extensions
                .display_extensions(state.options.virtualized_contexts),
            None => DisplayExtensions::empty(),
        }
    }

    fn generate_caps(&self) -> Caps {
        // Every context is at least ES 2.0.
        Caps { texture_npot: true }
    }

    fn create_worker_context(
        &self,
        shared_context: Option<&ContextEGL>,
        attributes: &AttributeMap,
    ) -> Result<WorkerContextEGL, Error> {
        let state = self.state()?;
        let share_context = shared_context.map_or(egl::NO_CONTEXT, |context| context.egl_context());
        let egl_context = self.native.create_context(
            state.egl_config,
            share_context,
            &attributes.to_int_vector(),
        );
        if egl_context == egl::NO_CONTEXT {
            let err = self.native.get_error().to_windowing_api_error();
            return Err(Error::ContextCreationFailed(err));
        }
        Ok(WorkerContextEGL::new(self.native.clone(), egl_context))
    }

    fn wait_client(&self, _: &ContextEGL) -> Result<(), Error> {
        warn!("waitClient is unimplemented");
        Err(Error::Unimplemented)
    }

    fn wait_native(&self, _: &ContextEGL, _: EGLint) -> Result<(), Error> {
        warn!("waitNative is unimplemented");
        Err(Error::Unimplemented)
    }

    fn test_device_lost(&self) -> bool {
        false
    }

    fn restore_lost_device(&mut self) -> Result<(), Error> {
        warn!("restoreLostDevice is unimplemented");
        Err(Error::Unimplemented)
    }

    fn max_supported_es_version(&self) -> Result<GLVersion, Error> {
        Ok(self.state()?.renderer()?.max_supported_es_version())
    }
}
