// virtegl/src/platform/egl/surface.rs
//
//! Window, pbuffer and external surfaces.

use super::error::ToWindowingApiError;
use super::functions::NativeEGL;
use crate::egl;
use crate::egl::types::{EGLConfig, EGLNativeWindowType, EGLSurface, EGLint};
use crate::{AttributeMap, Error};

use euclid::default::Size2D;
use std::fmt::{self, Debug, Formatter};
use std::thread;

/// A native window that window surfaces can be created for.
#[derive(Clone, Copy, PartialEq)]
pub struct NativeWindow {
    pub(crate) window: EGLNativeWindowType,
}

unsafe impl Send for NativeWindow {}

impl Debug for NativeWindow {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "NativeWindow({:?})", self.window)
    }
}

impl NativeWindow {
    /// Wraps a platform window handle (an `ANativeWindow*`, an X11 `Window`, an `HWND`, ...).
    ///
    /// # Safety
    ///
    /// The window must be valid for the native display and outlive every surface created for it.
    #[inline]
    pub unsafe fn from_raw(window: EGLNativeWindowType) -> NativeWindow {
        NativeWindow { window }
    }

    #[inline]
    pub fn as_raw(&self) -> EGLNativeWindowType {
        self.window
    }

    /// Converts a `raw-window-handle` 0.6 window handle.
    ///
    /// Wayland surfaces need a `wl_egl_window` wrapper that this crate doesn't create, so they are
    /// rejected.
    #[cfg(feature = "rwh-06")]
    pub fn from_window_handle(handle: rwh_06::WindowHandle) -> Result<NativeWindow, Error> {
        use rwh_06::RawWindowHandle::{AndroidNdk, Win32, Xcb, Xlib};

        let window = match handle.as_raw() {
            AndroidNdk(handle) => handle.a_native_window.as_ptr().cast_const(),
            Xlib(handle) => handle.window as usize as EGLNativeWindowType,
            Xcb(handle) => handle.window.get() as usize as EGLNativeWindowType,
            Win32(handle) => handle.hwnd.get() as usize as EGLNativeWindowType,
            _ => return Err(Error::InvalidNativeWindow),
        };
        Ok(NativeWindow { window })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SurfaceKind {
    Window(NativeWindow),
    Pbuffer,
    External,
}

/// A surface that client contexts can be made current against.
///
/// Window and pbuffer surfaces wrap a native surface and must be released with the display's
/// `destroy_surface`. External surfaces stand in for a drawable the embedder binds itself; they
/// have no native surface.
pub struct SurfaceEGL {
    egl_surface: EGLSurface,
    config_id: EGLint,
    size: Option<Size2D<i32>>,
    kind: SurfaceKind,
    destroyed: bool,
}

unsafe impl Send for SurfaceEGL {}

impl Debug for SurfaceEGL {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Surface({:x})", self.egl_surface as usize)
    }
}

impl Drop for SurfaceEGL {
    fn drop(&mut self) {
        if !self.destroyed && self.egl_surface != egl::NO_SURFACE && !thread::panicking() {
            panic!("Surfaces must be destroyed explicitly with `destroy_surface`!")
        }
    }
}

impl SurfaceEGL {
    pub(crate) fn new_window(
        native: &dyn NativeEGL,
        egl_config: EGLConfig,
        config_id: EGLint,
        window: NativeWindow,
        attributes: &AttributeMap,
    ) -> Result<SurfaceEGL, Error> {
        let egl_surface =
            native.create_window_surface(egl_config, window.window, &attributes.to_int_vector());
        if egl_surface == egl::NO_SURFACE {
            let err = native.get_error().to_windowing_api_error();
            return Err(Error::SurfaceCreationFailed(err));
        }
        Ok(SurfaceEGL {
            egl_surface,
            config_id,
            size: None,
            kind: SurfaceKind::Window(window),
            destroyed: false,
        })
    }

    pub(crate) fn new_pbuffer(
        native: &dyn NativeEGL,
        egl_config: EGLConfig,
        config_id: EGLint,
        attributes: &AttributeMap,
    ) -> Result<SurfaceEGL, Error> {
        let mut pbuffer_attributes = AttributeMap::new();
        for attribute in [
            egl::WIDTH,
            egl::HEIGHT,
            egl::LARGEST_PBUFFER,
            egl::TEXTURE_FORMAT,
            egl::TEXTURE_TARGET,
            egl::MIPMAP_TEXTURE,
        ] {
            let attribute = attribute as EGLint;
            if attributes.contains(attribute) {
                pbuffer_attributes.insert(attribute, attributes.get(attribute, 0));
            }
        }

        let egl_surface =
            native.create_pbuffer_surface(egl_config, &pbuffer_attributes.to_int_vector());
        if egl_surface == egl::NO_SURFACE {
            let err = native.get_error().to_windowing_api_error();
            return Err(Error::SurfaceCreationFailed(err));
        }
        Ok(SurfaceEGL {
            egl_surface,
            config_id,
            size: Some(requested_size(attributes)),
            kind: SurfaceKind::Pbuffer,
            destroyed: false,
        })
    }

    pub(crate) fn new_external(attributes: &AttributeMap) -> SurfaceEGL {
        SurfaceEGL {
            egl_surface: egl::NO_SURFACE,
            config_id: 0,
            size: Some(requested_size(attributes)),
            kind: SurfaceKind::External,
            destroyed: false,
        }
    }

    /// The native surface. `EGL_NO_SURFACE` for external surfaces.
    #[inline]
    pub fn egl_surface(&self) -> EGLSurface {
        self.egl_surface
    }

    /// The display config the surface was created with, or 0 for external surfaces.
    #[inline]
    pub fn config_id(&self) -> EGLint {
        self.config_id
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.kind == SurfaceKind::External
    }

    #[inline]
    pub fn is_window(&self) -> bool {
        matches!(self.kind, SurfaceKind::Window(_))
    }

    #[inline]
    pub fn native_window(&self) -> Option<NativeWindow> {
        match self.kind {
            SurfaceKind::Window(window) => Some(window),
            _ => None,
        }
    }

    /// The requested size of pbuffer and external surfaces. Window surfaces track their window.
    #[inline]
    pub fn size(&self) -> Option<Size2D<i32>> {
        self.size
    }

    /// External surfaces never preserve their contents across presentation. Other surfaces
    /// follow the native driver.
    pub fn swap_behavior(&self) -> Option<EGLint> {
        match self.kind {
            SurfaceKind::External => Some(egl::BUFFER_DESTROYED as EGLint),
            _ => None,
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn destroy(&mut self, native: &dyn NativeEGL) -> Result<(), Error> {
        if self.destroyed {
            return Err(Error::SurfaceDestroyed);
        }
        if self.egl_surface != egl::NO_SURFACE && !native.destroy_surface(self.egl_surface) {
            let err = native.get_error().to_windowing_api_error();
            return Err(Error::SurfaceDestructionFailed(err));
        }
        self.egl_surface = egl::NO_SURFACE;
        self.destroyed = true;
        Ok(())
    }
}

fn requested_size(attributes: &AttributeMap) -> Size2D<i32> {
    Size2D::new(
        attributes.get_as_int(egl::WIDTH as EGLint, 0),
        attributes.get_as_int(egl::HEIGHT as EGLint, 0),
    )
}
