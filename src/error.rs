// virtegl/src/error.rs
//
//! Various errors that methods can produce.

use crate::info::GLVersion;

use std::error;
use std::fmt::{self, Display, Formatter};

/// Various errors that methods can produce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// The method failed for a miscellaneous reason.
    Failed,
    /// The backend supports this method in theory, but the functionality isn't implemented.
    Unimplemented,
    /// The display has not been initialized, or has already been terminated.
    NotInitialized,
    /// The display was already initialized.
    AlreadyInitialized,
    /// The system EGL library couldn't be located.
    NoEGLLibraryFound,
    /// The native display connection couldn't be opened or initialized.
    DisplayInitializationFailed(WindowingApiError),
    /// The native EGL implementation is older than the minimum this backend requires (1.4).
    UnsupportedEGLVersion(GLVersion),
    /// The requested platform type maps to no renderable API this backend can drive.
    NoRenderableType,
    /// Choosing an EGL config failed.
    PixelFormatSelectionFailed(WindowingApiError),
    /// The system couldn't choose an EGL config.
    NoPixelFormatFound,
    /// The config wasn't produced by this display's config catalog.
    UnknownConfig,
    /// The requested OpenGL ES version can't be expressed with the native context attributes.
    UnsupportedGLVersion(GLVersion),
    /// The display's renderer can't support OpenGL ES 2.0.
    UnsupportedESVersion(GLVersion),
    /// The system couldn't create an OpenGL ES context.
    ContextCreationFailed(WindowingApiError),
    /// The system couldn't make the context current or not current.
    MakeCurrentFailed(WindowingApiError),
    /// An external context was requested, but no native context is current on this thread.
    NoCurrentContext,
    /// The system couldn't create a surface.
    SurfaceCreationFailed(WindowingApiError),
    /// The system couldn't destroy a surface.
    SurfaceDestructionFailed(WindowingApiError),
    /// The fallback 1x1 surface for drivers without surfaceless support couldn't be created.
    MockSurfaceCreationFailed(WindowingApiError),
    /// The client buffer type isn't supported by this backend.
    UnsupportedClientBuffer,
    /// The client buffer isn't valid for the given buffer type.
    InvalidClientBuffer,
    /// The native window is invalid or of an unsupported kind.
    InvalidNativeWindow,
    /// The surface was already destroyed.
    SurfaceDestroyed,
}

/// Abstraction of the errors that EGL returns from `eglGetError()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowingApiError {
    /// Miscellaneous error.
    Failed,
    /// EGL is not initialized, or could not be initialized, for the specified EGL display
    /// connection.
    NotInitialized,
    /// EGL cannot access a requested resource (for example a context is bound in another
    /// thread).
    BadAccess,
    /// EGL failed to allocate resources for the requested operation.
    BadAlloc,
    /// An unrecognized attribute or attribute value was passed in the attribute list.
    BadAttribute,
    /// The EGL configuration is unsupported.
    BadConfig,
    /// An EGLContext argument does not name a valid EGL rendering context.
    BadContext,
    /// The current surface of the calling thread is a window, pixel buffer or pixmap that is no
    /// longer valid.
    BadCurrentSurface,
    /// An EGLDisplay argument does not name a valid EGL display connection.
    BadDisplay,
    /// Arguments are inconsistent (for example, a valid context requires buffers not supplied by
    /// a valid surface).
    BadMatch,
    /// A NativePixmapType argument does not refer to a valid native pixmap.
    BadNativePixmap,
    /// A NativeWindowType argument does not refer to a valid native window.
    BadNativeWindow,
    /// One or more argument values are invalid.
    BadParameter,
    /// An EGLSurface argument does not name a valid surface configured for GL rendering.
    BadSurface,
    /// A power management event has occurred. The application must destroy all contexts and
    /// reinitialise OpenGL ES state and objects to continue rendering.
    ContextLost,
}

impl WindowingApiError {
    /// Returns the EGL error code that this error was translated from.
    ///
    /// `Failed` has no EGL counterpart and reports 0.
    pub fn code(self) -> i32 {
        use crate::egl;
        let code = match self {
            WindowingApiError::Failed => return 0,
            WindowingApiError::NotInitialized => egl::NOT_INITIALIZED,
            WindowingApiError::BadAccess => egl::BAD_ACCESS,
            WindowingApiError::BadAlloc => egl::BAD_ALLOC,
            WindowingApiError::BadAttribute => egl::BAD_ATTRIBUTE,
            WindowingApiError::BadConfig => egl::BAD_CONFIG,
            WindowingApiError::BadContext => egl::BAD_CONTEXT,
            WindowingApiError::BadCurrentSurface => egl::BAD_CURRENT_SURFACE,
            WindowingApiError::BadDisplay => egl::BAD_DISPLAY,
            WindowingApiError::BadMatch => egl::BAD_MATCH,
            WindowingApiError::BadNativePixmap => egl::BAD_NATIVE_PIXMAP,
            WindowingApiError::BadNativeWindow => egl::BAD_NATIVE_WINDOW,
            WindowingApiError::BadParameter => egl::BAD_PARAMETER,
            WindowingApiError::BadSurface => egl::BAD_SURFACE,
            WindowingApiError::ContextLost => egl::CONTEXT_LOST,
        };
        code as i32
    }
}

impl Display for WindowingApiError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?} (0x{:04x})", self, self.code())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Error::Failed => f.write_str("the operation failed"),
            Error::Unimplemented => f.write_str("the operation is not implemented by this backend"),
            Error::NotInitialized => f.write_str("the display is not initialized"),
            Error::AlreadyInitialized => f.write_str("the display is already initialized"),
            Error::NoEGLLibraryFound => f.write_str("the EGL library could not be loaded"),
            Error::DisplayInitializationFailed(err) => {
                write!(f, "eglInitialize failed with {}", err)
            }
            Error::UnsupportedEGLVersion(version) => write!(
                f,
                "EGL >= 1.4 is required, found {}.{}",
                version.major, version.minor
            ),
            Error::NoRenderableType => f.write_str("no available renderable types"),
            Error::PixelFormatSelectionFailed(err) => {
                write!(f, "eglChooseConfig failed with {}", err)
            }
            Error::NoPixelFormatFound => f.write_str("no matching EGL config"),
            Error::UnknownConfig => f.write_str("the config was not generated by this display"),
            Error::UnsupportedGLVersion(version) => write!(
                f,
                "unsupported requested context version {}.{}",
                version.major, version.minor
            ),
            Error::UnsupportedESVersion(version) => write!(
                f,
                "OpenGL ES 2.0 is not supportable (maximum is {}.{})",
                version.major, version.minor
            ),
            Error::ContextCreationFailed(err) => write!(f, "eglCreateContext failed with {}", err),
            Error::MakeCurrentFailed(err) => write!(f, "eglMakeCurrent failed with {}", err),
            Error::NoCurrentContext => f.write_str("no native context is current on this thread"),
            Error::SurfaceCreationFailed(err) => write!(f, "surface creation failed with {}", err),
            Error::SurfaceDestructionFailed(err) => {
                write!(f, "eglDestroySurface failed with {}", err)
            }
            Error::MockSurfaceCreationFailed(err) => {
                write!(f, "eglCreatePbufferSurface failed with {}", err)
            }
            Error::UnsupportedClientBuffer => f.write_str("unsupported client buffer type"),
            Error::InvalidClientBuffer => f.write_str("invalid client buffer"),
            Error::InvalidNativeWindow => f.write_str("invalid native window"),
            Error::SurfaceDestroyed => f.write_str("the surface was already destroyed"),
        }
    }
}

impl error::Error for Error {}
