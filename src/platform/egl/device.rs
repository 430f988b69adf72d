// virtegl/src/platform/egl/device.rs
//
//! Locating the system EGL library.

#[cfg(not(windows))]
use libc::{dlopen, dlsym, RTLD_LAZY};
use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;
use std::sync::LazyLock;
#[cfg(windows)]
use winapi::shared::minwindef::HMODULE;
#[cfg(windows)]
use winapi::um::libloaderapi;

#[cfg(windows)]
static EGL_LIBRARY: LazyLock<Option<EGLLibraryWrapper>> = LazyLock::new(|| unsafe {
    let module = libloaderapi::LoadLibraryA(c"libEGL.dll".as_ptr());
    if module.is_null() {
        None
    } else {
        Some(EGLLibraryWrapper(module))
    }
});

#[cfg(android)]
const EGL_SONAMES: [&std::ffi::CStr; 2] = [c"/system/lib64/libEGL.so", c"/system/lib/libEGL.so"];

#[cfg(not(any(windows, android)))]
const EGL_SONAMES: [&std::ffi::CStr; 2] = [c"libEGL.so.1", c"libEGL.so"];

#[cfg(not(windows))]
static EGL_LIBRARY: LazyLock<Option<EGLLibraryWrapper>> = LazyLock::new(|| {
    for soname in EGL_SONAMES {
        unsafe {
            let handle = dlopen(soname.as_ptr(), RTLD_LAZY);
            if !handle.is_null() {
                return Some(EGLLibraryWrapper(handle));
            }
        }
    }
    None
});

#[cfg(windows)]
struct EGLLibraryWrapper(HMODULE);
#[cfg(not(windows))]
struct EGLLibraryWrapper(*mut c_void);

unsafe impl Send for EGLLibraryWrapper {}
unsafe impl Sync for EGLLibraryWrapper {}

/// Returns true if the system EGL library could be opened.
pub(crate) fn system_library_available() -> bool {
    EGL_LIBRARY.is_some()
}

#[cfg(windows)]
pub(crate) fn lookup_system_symbol(symbol_name: &str) -> *const c_void {
    let (library, symbol_name) = match (&*EGL_LIBRARY, CString::new(symbol_name)) {
        (Some(library), Ok(symbol_name)) => (library, symbol_name),
        _ => return ptr::null(),
    };
    unsafe { libloaderapi::GetProcAddress(library.0, symbol_name.as_ptr()) as *const c_void }
}

#[cfg(not(windows))]
pub(crate) fn lookup_system_symbol(symbol_name: &str) -> *const c_void {
    let (library, symbol_name) = match (&*EGL_LIBRARY, CString::new(symbol_name)) {
        (Some(library), Ok(symbol_name)) => (library, symbol_name),
        _ => return ptr::null(),
    };
    unsafe { dlsym(library.0, symbol_name.as_ptr()).cast_const() }
}
