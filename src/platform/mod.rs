// virtegl/src/platform/mod.rs
//
//! Platform-specific backends.

pub mod egl;

#[cfg(any(test, feature = "fake-egl"))]
pub mod fake;
