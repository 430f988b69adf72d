// virtegl/src/platform/egl/options.rs
//
//! Display options, resolved once from the attributes passed to `initialize`.

use super::ffi::EGL_OPENGL_ES3_BIT;
use super::ffi::{EGL_PLATFORM_ANGLE_CONTEXT_VIRTUALIZATION_ANGLE, EGL_PLATFORM_ANGLE_TYPE_ANGLE};
use super::ffi::{EGL_PLATFORM_ANGLE_MAX_VERSION_MAJOR_ANGLE as MAX_VERSION_MAJOR};
use super::ffi::{EGL_PLATFORM_ANGLE_MAX_VERSION_MINOR_ANGLE as MAX_VERSION_MINOR};
use super::ffi::{EGL_PLATFORM_ANGLE_TYPE_DEFAULT_ANGLE, EGL_PLATFORM_ANGLE_TYPE_OPENGLES_ANGLE};
use super::ffi::EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE;
use crate::egl;
use crate::egl::types::{EGLAttrib, EGLenum, EGLint};
use crate::{AttributeMap, Error, GLApi, GLVersion, WindowingApiError};

use log::warn;
use std::env;

/// Overrides whether client contexts share one native context, when the display attributes
/// don't say.
pub const VIRTUALIZED_CONTEXTS_ENV: &str = "VIRTEGL_VIRTUALIZED_CONTEXTS";

/// How a display drives the native driver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayOptions {
    /// The client API native contexts are created for.
    pub api: GLApi,
    /// An explicit context version, or `None` to take the best one available.
    pub requested_version: Option<GLVersion>,
    /// Whether every client context shares the display's native context.
    pub virtualized_contexts: bool,
}

impl Default for DisplayOptions {
    fn default() -> DisplayOptions {
        DisplayOptions {
            api: GLApi::GLES,
            requested_version: None,
            virtualized_contexts: true,
        }
    }
}

impl DisplayOptions {
    /// Resolves options from display attributes, consulting `VIRTEGL_VIRTUALIZED_CONTEXTS` when
    /// the virtualization attribute is absent.
    pub fn from_attributes(attributes: &AttributeMap) -> Result<DisplayOptions, Error> {
        let platform_type = attributes.get_as_int(
            EGL_PLATFORM_ANGLE_TYPE_ANGLE as EGLint,
            EGL_PLATFORM_ANGLE_TYPE_DEFAULT_ANGLE as EGLint,
        ) as EGLenum;
        let api = match platform_type {
            EGL_PLATFORM_ANGLE_TYPE_DEFAULT_ANGLE | EGL_PLATFORM_ANGLE_TYPE_OPENGLES_ANGLE => {
                GLApi::GLES
            }
            EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE => GLApi::GL,
            _ => return Err(Error::NoRenderableType),
        };

        let requested_version = match (
            version_component(attributes, MAX_VERSION_MAJOR)?,
            version_component(attributes, MAX_VERSION_MINOR)?,
        ) {
            (Some(major), Some(minor)) => Some(GLVersion::new(major, minor)),
            _ => None,
        };

        let dont_care = egl::DONT_CARE as EGLint;

        let virtualization = attributes.get_as_int(
            EGL_PLATFORM_ANGLE_CONTEXT_VIRTUALIZATION_ANGLE as EGLint,
            dont_care,
        );
        let virtualized_contexts = if virtualization != dont_care {
            virtualization != egl::FALSE as EGLint
        } else {
            virtualization_from_env().unwrap_or(true)
        };

        Ok(DisplayOptions {
            api,
            requested_version,
            virtualized_contexts,
        })
    }

    /// The renderable types to try when choosing a config, most capable first.
    pub(crate) fn renderable_types(&self, flexible_versions: bool) -> Vec<EGLint> {
        match self.api {
            GLApi::GL => vec![egl::OPENGL_BIT as EGLint],
            GLApi::GLES if flexible_versions => {
                vec![EGL_OPENGL_ES3_BIT, egl::OPENGL_ES2_BIT as EGLint]
            }
            GLApi::GLES => vec![egl::OPENGL_ES2_BIT as EGLint],
        }
    }

    /// The API native contexts are bound to.
    pub(crate) fn egl_api(&self) -> EGLenum {
        match self.api {
            GLApi::GL => egl::OPENGL_API,
            GLApi::GLES => egl::OPENGL_ES_API,
        }
    }
}

// `None` when the attribute is absent or `EGL_DONT_CARE`.
fn version_component(attributes: &AttributeMap, attribute: EGLenum) -> Result<Option<u8>, Error> {
    let dont_care = egl::DONT_CARE as EGLAttrib;
    match attributes.get(attribute as EGLint, dont_care) {
        value if value == dont_care => Ok(None),
        value => u8::try_from(value).map(Some).map_err(|_| {
            warn!("context version component 0x{:04x} is out of range: {}", attribute, value);
            Error::DisplayInitializationFailed(WindowingApiError::BadAttribute)
        }),
    }
}

fn virtualization_from_env() -> Option<bool> {
    let value = env::var(VIRTUALIZED_CONTEXTS_ENV).ok()?;
    match &*value.trim().to_ascii_lowercase() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => {
            warn!("ignoring {}={:?}", VIRTUALIZED_CONTEXTS_ENV, value);
            None
        }
    }
}
