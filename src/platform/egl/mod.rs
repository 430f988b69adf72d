// virtegl/src/platform/egl/mod.rs
//
//! The EGL display backend.

mod config;
mod context;
mod current;
mod device;
mod display;
mod error;
mod extensions;
pub mod ffi;
mod functions;
mod negotiate;
mod options;
mod renderer;
mod surface;
mod worker;

pub use self::config::{ConfigSet, DepthStencilFormat, DisplayConfig, RenderTargetFormat};
pub use self::context::ContextEGL;
pub use self::current::CurrentNativeContext;
pub use self::display::DisplayEGL;
pub use self::extensions::{Caps, DisplayExtensions, ExtensionSet};
pub use self::functions::{FunctionsEGL, GLFunctions, NativeEGL};
pub use self::options::{DisplayOptions, VIRTUALIZED_CONTEXTS_ENV};
pub use self::renderer::SharedRenderer;
pub use self::surface::{NativeWindow, SurfaceEGL};
pub use self::worker::WorkerContextEGL;
