// virtegl/src/info.rs
//
//! OpenGL and EGL version information.

/// The API (OpenGL or OpenGL ES).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GLApi {
    /// OpenGL (full or desktop OpenGL).
    GL,
    /// OpenGL ES (embedded OpenGL).
    GLES,
}

/// A `major.minor` version number.
///
/// Used both for OpenGL ES context versions and for the version of the native EGL
/// implementation. Versions compare lexicographically, so `3.0 < 3.1 < 3.2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GLVersion {
    /// The major version (e.g. 3 in 3.1).
    pub major: u8,
    /// The minor version (e.g. 1 in 3.1).
    pub minor: u8,
}

impl GLVersion {
    /// Creates a version structure with the given major and minor version numbers.
    #[inline]
    pub fn new(major: u8, minor: u8) -> GLVersion {
        GLVersion { major, minor }
    }

    /// Creates a version from components reported by a driver, clamping each to `0..=255`.
    pub(crate) fn clamped(major: i64, minor: i64) -> GLVersion {
        let clamp = |component: i64| component.clamp(0, u8::MAX.into()) as u8;
        GLVersion::new(clamp(major), clamp(minor))
    }

    // Maps the version reported by a GL function table to the highest OpenGL ES version that can
    // be exposed on top of it.
    pub(crate) fn max_es_version(version: &glow::Version) -> GLVersion {
        let reported = GLVersion::clamped(version.major.into(), version.minor.into());
        if version.is_embedded {
            return reported;
        }
        if reported >= GLVersion::new(4, 5) {
            GLVersion::new(3, 2)
        } else if reported >= GLVersion::new(4, 3) {
            GLVersion::new(3, 1)
        } else if reported >= GLVersion::new(3, 3) {
            GLVersion::new(3, 0)
        } else if reported >= GLVersion::new(2, 0) {
            GLVersion::new(2, 0)
        } else {
            reported
        }
    }
}
