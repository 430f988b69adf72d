// virtegl/src/platform/egl/functions.rs
//
//! The native EGL entry points this backend consumes.

use super::device;
use crate::egl::types::{EGLConfig, EGLContext, EGLDisplay, EGLNativeDisplayType};
use crate::egl::types::{EGLNativeWindowType, EGLSurface, EGLenum, EGLint};
use crate::egl::{self, Egl};
use crate::attributes::terminated_int_list;
use crate::{Error, GLVersion, Gl};

use glow::HasContext;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr;

/// The GL function table of a context, and what it can do.
pub struct GLFunctions {
    /// The function table, if the driver exposes one that can be called from Rust.
    pub gl: Option<Gl>,
    /// The highest OpenGL ES version the context can expose.
    pub max_es_version: GLVersion,
    /// A human-readable description of the renderer.
    pub description: String,
}

/// The subset of EGL used by the display backend, bound to one display connection.
///
/// Methods follow EGL's own conventions: failures are reported with sentinel values (`false`,
/// `None`, `EGL_NO_CONTEXT`, `EGL_NO_SURFACE`) and the reason is available from `get_error()`.
/// Every method operates on the display connection the implementation was created for, and
/// `make_current` always binds the same surface for drawing and reading. Attribute lists are
/// `EGL_NONE`-terminated; implementations that call into a driver must not read past the slice.
pub trait NativeEGL: Send + Sync {
    /// Initializes the display connection, returning the EGL version.
    fn initialize(&self) -> Option<GLVersion>;
    fn terminate(&self) -> bool;
    fn bind_api(&self, api: EGLenum) -> bool;
    /// Returns the space-separated extension string of the display.
    fn query_extensions(&self) -> String;

    /// Returns the number of configs matching `attributes`.
    fn config_count(&self, attributes: &[EGLint]) -> Option<EGLint>;
    fn choose_config(&self, attributes: &[EGLint], max_configs: EGLint) -> Option<Vec<EGLConfig>>;
    fn get_config_attrib(&self, config: EGLConfig, attribute: EGLint) -> Option<EGLint>;

    fn create_context(
        &self,
        config: EGLConfig,
        share_context: EGLContext,
        attributes: &[EGLint],
    ) -> EGLContext;
    fn destroy_context(&self, context: EGLContext) -> bool;
    fn make_current(&self, surface: EGLSurface, context: EGLContext) -> bool;
    /// Returns the context current on the calling thread, from any display.
    fn get_current_context(&self) -> EGLContext;

    fn create_pbuffer_surface(&self, config: EGLConfig, attributes: &[EGLint]) -> EGLSurface;
    fn create_window_surface(
        &self,
        config: EGLConfig,
        window: EGLNativeWindowType,
        attributes: &[EGLint],
    ) -> EGLSurface;
    fn destroy_surface(&self, surface: EGLSurface) -> bool;

    fn get_error(&self) -> EGLint;
    fn get_proc_address(&self, symbol_name: &str) -> *const c_void;

    /// Resolves the GL function table of the context current on the calling thread.
    fn load_gl_functions(&self) -> GLFunctions;
}

/// `NativeEGL` backed by an EGL library loaded at runtime.
pub struct FunctionsEGL {
    egl: Egl,
    egl_display: EGLDisplay,
}

unsafe impl Send for FunctionsEGL {}
unsafe impl Sync for FunctionsEGL {}

impl FunctionsEGL {
    /// Opens the system EGL library and the display for `native_display`.
    ///
    /// Pass `egl::DEFAULT_DISPLAY` for the platform's default display.
    pub fn new(native_display: EGLNativeDisplayType) -> Result<FunctionsEGL, Error> {
        if !device::system_library_available() {
            return Err(Error::NoEGLLibraryFound);
        }
        unsafe { FunctionsEGL::with_loader(device::lookup_system_symbol, native_display) }
    }

    /// Loads EGL entry points with `loader` and opens the display for `native_display`.
    ///
    /// # Safety
    ///
    /// Every non-null pointer `loader` returns must be the EGL entry point of that name.
    pub unsafe fn with_loader<F>(
        loader: F,
        native_display: EGLNativeDisplayType,
    ) -> Result<FunctionsEGL, Error>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        let egl = Egl::load_with(loader);
        if !egl.GetDisplay.is_loaded() {
            return Err(Error::NoEGLLibraryFound);
        }
        let egl_display = egl.GetDisplay(native_display);
        if egl_display == egl::NO_DISPLAY {
            return Err(Error::DisplayInitializationFailed(
                crate::WindowingApiError::BadDisplay,
            ));
        }
        Ok(FunctionsEGL { egl, egl_display })
    }

    #[inline]
    pub fn egl_display(&self) -> EGLDisplay {
        self.egl_display
    }
}

impl NativeEGL for FunctionsEGL {
    fn initialize(&self) -> Option<GLVersion> {
        let (mut major, mut minor) = (0, 0);
        unsafe {
            if self.egl.Initialize(self.egl_display, &mut major, &mut minor) == egl::FALSE {
                return None;
            }
        }
        Some(GLVersion::clamped(major.into(), minor.into()))
    }

    fn terminate(&self) -> bool {
        unsafe { self.egl.Terminate(self.egl_display) != egl::FALSE }
    }

    fn bind_api(&self, api: EGLenum) -> bool {
        unsafe { self.egl.BindAPI(api) != egl::FALSE }
    }

    fn query_extensions(&self) -> String {
        unsafe {
            let extensions = self
                .egl
                .QueryString(self.egl_display, egl::EXTENSIONS as EGLint);
            if extensions.is_null() {
                return String::new();
            }
            CStr::from_ptr(extensions).to_string_lossy().into_owned()
        }
    }

    fn config_count(&self, attributes: &[EGLint]) -> Option<EGLint> {
        let attributes = terminated_int_list(attributes);
        let mut config_count = 0;
        unsafe {
            let result = self.egl.ChooseConfig(
                self.egl_display,
                attributes.as_ptr(),
                ptr::null_mut(),
                0,
                &mut config_count,
            );
            if result == egl::FALSE {
                return None;
            }
        }
        Some(config_count)
    }

    fn choose_config(&self, attributes: &[EGLint], max_configs: EGLint) -> Option<Vec<EGLConfig>> {
        let attributes = terminated_int_list(attributes);
        let mut configs = vec![ptr::null(); max_configs.max(0) as usize];
        let mut config_count = 0;
        unsafe {
            let result = self.egl.ChooseConfig(
                self.egl_display,
                attributes.as_ptr(),
                configs.as_mut_ptr(),
                max_configs,
                &mut config_count,
            );
            if result == egl::FALSE {
                return None;
            }
        }
        configs.truncate(config_count.max(0) as usize);
        Some(configs)
    }

    fn get_config_attrib(&self, config: EGLConfig, attribute: EGLint) -> Option<EGLint> {
        let mut value = 0;
        unsafe {
            let result = self
                .egl
                .GetConfigAttrib(self.egl_display, config, attribute, &mut value);
            if result == egl::FALSE {
                return None;
            }
        }
        Some(value)
    }

    fn create_context(
        &self,
        config: EGLConfig,
        share_context: EGLContext,
        attributes: &[EGLint],
    ) -> EGLContext {
        let attributes = terminated_int_list(attributes);
        unsafe {
            self.egl
                .CreateContext(self.egl_display, config, share_context, attributes.as_ptr())
        }
    }

    fn destroy_context(&self, context: EGLContext) -> bool {
        unsafe { self.egl.DestroyContext(self.egl_display, context) != egl::FALSE }
    }

    fn make_current(&self, surface: EGLSurface, context: EGLContext) -> bool {
        unsafe { self.egl.MakeCurrent(self.egl_display, surface, surface, context) != egl::FALSE }
    }

    fn get_current_context(&self) -> EGLContext {
        unsafe { self.egl.GetCurrentContext() }
    }

    fn create_pbuffer_surface(&self, config: EGLConfig, attributes: &[EGLint]) -> EGLSurface {
        let attributes = terminated_int_list(attributes);
        unsafe {
            self.egl
                .CreatePbufferSurface(self.egl_display, config, attributes.as_ptr())
        }
    }

    fn create_window_surface(
        &self,
        config: EGLConfig,
        window: EGLNativeWindowType,
        attributes: &[EGLint],
    ) -> EGLSurface {
        let attributes = terminated_int_list(attributes);
        unsafe {
            self.egl
                .CreateWindowSurface(self.egl_display, config, window, attributes.as_ptr())
        }
    }

    fn destroy_surface(&self, surface: EGLSurface) -> bool {
        unsafe { self.egl.DestroySurface(self.egl_display, surface) != egl::FALSE }
    }

    fn get_error(&self) -> EGLint {
        unsafe { self.egl.GetError() }
    }

    fn get_proc_address(&self, symbol_name: &str) -> *const c_void {
        let symbol_name = match CString::new(symbol_name) {
            Ok(symbol_name) => symbol_name,
            Err(_) => return ptr::null(),
        };
        unsafe {
            self.egl
                .GetProcAddress(symbol_name.as_ptr() as *const u8 as *const c_char)
                as *const c_void
        }
    }

    fn load_gl_functions(&self) -> GLFunctions {
        unsafe {
            let gl = Gl::from_loader_function(|symbol_name| self.get_proc_address(symbol_name));
            let max_es_version = GLVersion::max_es_version(gl.version());
            let description = gl.get_parameter_string(glow::RENDERER);
            GLFunctions {
                gl: Some(gl),
                max_es_version,
                description,
            }
        }
    }
}
