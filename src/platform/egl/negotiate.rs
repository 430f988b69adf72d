// virtegl/src/platform/egl/negotiate.rs
//
//! Choosing context creation attributes that the native driver will accept.
//!
//! Drivers disagree about which context versions they can create, and some advertise
//! `EGL_EXT_create_context_robustness` but then refuse robust contexts. Creation therefore walks an
//! ordered list of attribute sets and keeps the first one that works.

use super::error::ToWindowingApiError;
use super::extensions::ExtensionSet;
use super::ffi::{EGL_CONTEXT_MAJOR_VERSION, EGL_CONTEXT_MINOR_VERSION};
use super::ffi::{EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY, EGL_LOSE_CONTEXT_ON_RESET};
use super::ffi::EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV;
use super::functions::NativeEGL;
use crate::egl;
use crate::egl::types::{EGLAttrib, EGLConfig, EGLContext, EGLint};
use crate::{AttributeMap, AttributeVector, Error, GLVersion, WindowingApiError};

use log::{debug, info};

/// Versions tried, in order, when the caller doesn't ask for one.
const ES_VERSIONS_FROM_2_0: [GLVersion; 4] = [
    GLVersion { major: 3, minor: 2 },
    GLVersion { major: 3, minor: 1 },
    GLVersion { major: 3, minor: 0 },
    GLVersion { major: 2, minor: 0 },
];

/// Returns the version attribute sets to try, most preferred first.
///
/// `flexible_versions` is whether the driver accepts explicit major/minor versions (EGL 1.5 or
/// `EGL_KHR_create_context`). Without them only ES 2.0 can be requested, and asking for anything
/// else fails without touching the driver.
pub(crate) fn candidate_attribute_lists(
    flexible_versions: bool,
    requested_version: Option<GLVersion>,
) -> Result<Vec<AttributeMap>, Error> {
    if !flexible_versions {
        match requested_version {
            Some(version) if version != GLVersion::new(2, 0) => {
                return Err(Error::UnsupportedGLVersion(version))
            }
            _ => {}
        }
        let mut fallback = AttributeMap::new();
        fallback.insert(egl::CONTEXT_CLIENT_VERSION as EGLint, 2);
        return Ok(vec![fallback]);
    }

    let versions = match requested_version {
        Some(version) => vec![version],
        None => ES_VERSIONS_FROM_2_0.to_vec(),
    };
    Ok(versions
        .into_iter()
        .map(|version| {
            let mut attributes = AttributeMap::new();
            attributes.insert(EGL_CONTEXT_MAJOR_VERSION as EGLint, version.major as EGLAttrib);
            attributes.insert(EGL_CONTEXT_MINOR_VERSION as EGLint, version.minor as EGLAttrib);
            attributes
        })
        .collect())
}

/// One native context creation attempt.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Attempt {
    pub(crate) attributes: AttributeVector,
    pub(crate) robust: bool,
}

/// Expands version candidates into creation attempts.
///
/// With robustness available, each candidate is tried robustly first and then without the
/// robustness attributes, before moving to the next candidate.
pub(crate) fn expand_attempts(
    candidates: &[AttributeMap],
    robustness: bool,
    video_memory_purge: bool,
) -> Vec<Attempt> {
    let mut attempts = vec![];
    for candidate in candidates {
        if robustness {
            let mut robust = candidate.clone();
            robust.insert(
                EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY as EGLint,
                EGL_LOSE_CONTEXT_ON_RESET as EGLAttrib,
            );
            if video_memory_purge {
                robust.insert(
                    EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV as EGLint,
                    egl::TRUE as EGLAttrib,
                );
            }
            attempts.push(Attempt {
                attributes: robust.to_int_vector(),
                robust: true,
            });
        }
        attempts.push(Attempt {
            attributes: candidate.to_int_vector(),
            robust: false,
        });
    }
    attempts
}

/// Runs `attempt` over `candidates` in order and returns the first success together with the
/// candidate that produced it.
///
/// If every candidate fails, returns the last error, or `exhausted` if there were no candidates.
pub(crate) fn first_success<A, T, E, F>(
    candidates: impl IntoIterator<Item = A>,
    exhausted: E,
    mut attempt: F,
) -> Result<(A, T), E>
where
    F: FnMut(&A) -> Result<T, E>,
{
    let mut last_error = exhausted;
    for candidate in candidates {
        match attempt(&candidate) {
            Ok(value) => return Ok((candidate, value)),
            Err(err) => last_error = err,
        }
    }
    Err(last_error)
}

/// Creates a native context, returning it with the attribute list it was created with.
pub(crate) fn create_native_context(
    native: &dyn NativeEGL,
    extensions: &ExtensionSet,
    config: EGLConfig,
    share_context: EGLContext,
    requested_version: Option<GLVersion>,
) -> Result<(EGLContext, AttributeVector), Error> {
    let candidates =
        candidate_attribute_lists(extensions.flexible_context_version, requested_version)?;
    let attempts = expand_attempts(
        &candidates,
        extensions.create_context_robustness,
        extensions.robustness_video_memory_purge,
    );

    let exhausted = Error::ContextCreationFailed(WindowingApiError::Failed);
    let (attempt, egl_context) = first_success(attempts, exhausted, |attempt| {
        let egl_context = native.create_context(config, share_context, &attempt.attributes);
        if egl_context != egl::NO_CONTEXT {
            return Ok(egl_context);
        }
        let err = native.get_error().to_windowing_api_error();
        if attempt.robust {
            info!("EGL_EXT_create_context_robustness available but robust context creation failed.");
        }
        Err(Error::ContextCreationFailed(err))
    })?;

    debug!("created native context with attributes {:?}", attempt.attributes);
    Ok((egl_context, attempt.attributes))
}
