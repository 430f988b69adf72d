// virtegl/src/platform/fake/mod.rs
//
//! An in-process EGL driver for tests.
//!
//! `FakeEGL` implements `NativeEGL` over plain bookkeeping. It records every call that changes
//! driver state, enforces the EGL rules the display backend relies on (config matching, context
//! versions, surfaceless binding, one thread per context) and lets tests inject failures.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLContext, EGLNativeWindowType, EGLSurface, EGLenum, EGLint};
use crate::platform::egl::ffi::{EGL_COLOR_COMPONENT_TYPE_EXT, EGL_COLOR_COMPONENT_TYPE_FIXED_EXT};
use crate::platform::egl::ffi::{EGL_CONTEXT_MAJOR_VERSION, EGL_CONTEXT_MINOR_VERSION};
use crate::platform::egl::ffi::{EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY, EGL_OPENGL_ES3_BIT};
use crate::platform::egl::ffi::EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV;
use crate::platform::egl::{GLFunctions, NativeEGL};
use crate::GLVersion;

use fnv::{FnvHashMap, FnvHashSet};
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

const CONFIG_HANDLE_BASE: usize = 0x100;
const FIRST_OBJECT_HANDLE: usize = 0x1000;

/// A native call that `FakeEGL` recorded. Handles are recorded as addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FakeCall {
    Initialize,
    Terminate,
    BindApi(EGLenum),
    /// `max_configs` is `None` for a count-only query.
    ChooseConfig {
        attributes: Vec<EGLint>,
        max_configs: Option<EGLint>,
    },
    CreateContext {
        config: usize,
        share_context: usize,
        attributes: Vec<EGLint>,
    },
    DestroyContext(usize),
    MakeCurrent {
        surface: usize,
        context: usize,
    },
    GetCurrentContext,
    CreatePbufferSurface {
        config: usize,
        attributes: Vec<EGLint>,
    },
    CreateWindowSurface {
        config: usize,
        window: usize,
    },
    DestroySurface(usize),
    LoadGLFunctions,
}

impl FakeCall {
    #[inline]
    pub fn is_make_current(&self) -> bool {
        matches!(self, FakeCall::MakeCurrent { .. })
    }

    #[inline]
    pub fn is_create_context(&self) -> bool {
        matches!(self, FakeCall::CreateContext { .. })
    }
}

/// A native config: a set of EGL config attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct FakeConfig {
    attributes: FnvHashMap<EGLint, EGLint>,
}

impl FakeConfig {
    /// An RGB window/pbuffer config renderable with ES 2 and ES 3.
    pub fn new(native_config_id: EGLint, rgba: [EGLint; 4], depth: EGLint, stencil: EGLint) -> Self {
        let es_bits = egl::OPENGL_ES2_BIT as EGLint | EGL_OPENGL_ES3_BIT;
        let mut attributes = FnvHashMap::default();
        for (attribute, value) in [
            (egl::CONFIG_ID, native_config_id),
            (egl::COLOR_BUFFER_TYPE, egl::RGB_BUFFER as EGLint),
            (egl::RED_SIZE, rgba[0]),
            (egl::GREEN_SIZE, rgba[1]),
            (egl::BLUE_SIZE, rgba[2]),
            (egl::ALPHA_SIZE, rgba[3]),
            (egl::BUFFER_SIZE, rgba.iter().sum::<EGLint>()),
            (egl::DEPTH_SIZE, depth),
            (egl::STENCIL_SIZE, stencil),
            (
                egl::SURFACE_TYPE,
                (egl::WINDOW_BIT | egl::PBUFFER_BIT | egl::PIXMAP_BIT) as EGLint,
            ),
            (egl::RENDERABLE_TYPE, es_bits),
            (egl::CONFORMANT, es_bits),
            (egl::CONFIG_CAVEAT, egl::NONE as EGLint),
            (egl::TRANSPARENT_TYPE, egl::NONE as EGLint),
            (egl::NATIVE_RENDERABLE, egl::TRUE as EGLint),
            (egl::MAX_PBUFFER_WIDTH, 4096),
            (egl::MAX_PBUFFER_HEIGHT, 4096),
            (egl::MAX_PBUFFER_PIXELS, 4096 * 4096),
            (egl::MAX_SWAP_INTERVAL, 1),
            (egl::MIN_SWAP_INTERVAL, 0),
            (
                EGL_COLOR_COMPONENT_TYPE_EXT,
                EGL_COLOR_COMPONENT_TYPE_FIXED_EXT as EGLint,
            ),
        ] {
            attributes.insert(attribute as EGLint, value);
        }
        FakeConfig { attributes }
    }

    /// Overrides one attribute.
    pub fn with(mut self, attribute: EGLenum, value: EGLint) -> FakeConfig {
        self.attributes.insert(attribute as EGLint, value);
        self
    }

    pub fn get(&self, attribute: EGLenum) -> EGLint {
        self.attributes
            .get(&(attribute as EGLint))
            .copied()
            .unwrap_or(0)
    }

    fn matches(&self, requested: &[EGLint]) -> bool {
        let requested = pairs(requested);
        // A config ID selects exactly one config and overrides everything else.
        if let Some(&(_, config_id)) = requested
            .iter()
            .find(|&&(attribute, _)| attribute == egl::CONFIG_ID as EGLint)
        {
            return self.get(egl::CONFIG_ID) == config_id;
        }
        requested.iter().all(|&(attribute, wanted)| {
            if wanted == egl::DONT_CARE {
                return true;
            }
            let actual = self.get(attribute as EGLenum);
            match attribute as EGLenum {
                egl::COLOR_BUFFER_TYPE
                | egl::CONFIG_CAVEAT
                | egl::TRANSPARENT_TYPE
                | egl::NATIVE_VISUAL_TYPE
                | egl::LEVEL => actual == wanted,
                egl::SURFACE_TYPE | egl::RENDERABLE_TYPE | egl::CONFORMANT => {
                    actual & wanted == wanted
                }
                _ => actual >= wanted,
            }
        })
    }
}

/// The configs `FakeEGL::new` starts with, native IDs 1 to 4: RGBA8/D24S8, RGB8/D24S8, an
/// RGBA16F/D24S8 config no client format maps to, and RGB565/D16.
pub fn default_configs() -> Vec<FakeConfig> {
    vec![
        FakeConfig::new(1, [8, 8, 8, 8], 24, 8),
        FakeConfig::new(2, [8, 8, 8, 0], 24, 8),
        FakeConfig::new(3, [16, 16, 16, 16], 24, 8),
        FakeConfig::new(4, [5, 6, 5, 0], 16, 0),
    ]
}

struct FakeState {
    egl_version: GLVersion,
    extensions: String,
    configs: Vec<FakeConfig>,
    max_context_version: GLVersion,
    reported_es_version: Option<GLVersion>,
    initialized: bool,
    next_handle: usize,
    // Live contexts and the version each was created with.
    contexts: FnvHashMap<usize, GLVersion>,
    surfaces: FnvHashSet<usize>,
    current: FnvHashMap<ThreadId, (usize, usize)>,
    errors: FnvHashMap<ThreadId, EGLint>,
    context_rejector: Option<Box<dyn Fn(&[EGLint]) -> bool + Send>>,
    make_current_failures: usize,
    fail_pbuffer_creation: bool,
    fail_initialize: bool,
    calls: Vec<FakeCall>,
}

impl FakeState {
    fn has_extension(&self, name: &str) -> bool {
        self.extensions.split_whitespace().any(|extension| extension == name)
    }

    fn fail(&mut self, error: EGLenum) {
        self.errors.insert(thread::current().id(), error as EGLint);
    }

    fn allocate_handle(&mut self) -> usize {
        let handle = self.next_handle;
        self.next_handle += 0x10;
        handle
    }

    fn config(&self, config: EGLConfig) -> Option<&FakeConfig> {
        (config as usize)
            .checked_sub(CONFIG_HANDLE_BASE)
            .and_then(|index| self.configs.get(index))
    }

    fn bound_elsewhere(&self, context: usize) -> bool {
        let this_thread = thread::current().id();
        self.current
            .iter()
            .any(|(&thread, &(_, bound))| thread != this_thread && bound == context)
    }
}

/// A scriptable in-process EGL driver.
pub struct FakeEGL {
    state: Mutex<FakeState>,
}

impl Default for FakeEGL {
    fn default() -> FakeEGL {
        FakeEGL::new()
    }
}

impl FakeEGL {
    /// An EGL 1.5 driver with no extensions that can create ES 3.0 contexts.
    pub fn new() -> FakeEGL {
        FakeEGL {
            state: Mutex::new(FakeState {
                egl_version: GLVersion::new(1, 5),
                extensions: String::new(),
                configs: default_configs(),
                max_context_version: GLVersion::new(3, 0),
                reported_es_version: None,
                initialized: false,
                next_handle: FIRST_OBJECT_HANDLE,
                contexts: FnvHashMap::default(),
                surfaces: FnvHashSet::default(),
                current: FnvHashMap::default(),
                errors: FnvHashMap::default(),
                context_rejector: None,
                make_current_failures: 0,
                fail_pbuffer_creation: false,
                fail_initialize: false,
                calls: vec![],
            }),
        }
    }

    fn state(&self) -> MutexGuard<FakeState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn set_egl_version(&self, egl_version: GLVersion) {
        self.state().egl_version = egl_version;
    }

    /// Sets the space-separated extension string.
    pub fn set_extensions(&self, extensions: &str) {
        self.state().extensions = extensions.to_owned();
    }

    pub fn set_configs(&self, configs: Vec<FakeConfig>) {
        self.state().configs = configs;
    }

    /// The newest context version `eglCreateContext` accepts.
    pub fn set_max_context_version(&self, version: GLVersion) {
        self.state().max_context_version = version;
    }

    /// Overrides the ES version GL function loading reports, regardless of the context.
    pub fn report_es_version(&self, version: GLVersion) {
        self.state().reported_es_version = Some(version);
    }

    /// Makes `eglCreateContext` fail with `EGL_BAD_MATCH` whenever `rejector` returns true for
    /// the attribute list.
    pub fn reject_contexts<F>(&self, rejector: F)
    where
        F: Fn(&[EGLint]) -> bool + Send + 'static,
    {
        self.state().context_rejector = Some(Box::new(rejector));
    }

    /// Makes the next `count` calls to `eglMakeCurrent` fail with `EGL_BAD_ACCESS`.
    pub fn fail_next_make_current(&self, count: usize) {
        self.state().make_current_failures = count;
    }

    pub fn fail_pbuffer_creation(&self, fail: bool) {
        self.state().fail_pbuffer_creation = fail;
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.state().fail_initialize = fail;
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }

    /// Returns the recorded calls and starts a new record.
    pub fn take_calls(&self) -> Vec<FakeCall> {
        std::mem::take(&mut self.state().calls)
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    pub fn live_contexts(&self) -> usize {
        self.state().contexts.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state().surfaces.len()
    }

    pub fn is_live_context(&self, context: EGLContext) -> bool {
        self.state().contexts.contains_key(&(context as usize))
    }

    /// What the driver has bound on the calling thread.
    pub fn bound_on_this_thread(&self) -> (EGLSurface, EGLContext) {
        let state = self.state();
        let (surface, context) = state
            .current
            .get(&thread::current().id())
            .copied()
            .unwrap_or((0, 0));
        (surface as EGLSurface, context as EGLContext)
    }

    /// Creates a context and binds it on the calling thread, as an embedder would before handing
    /// it over as an external context. Nothing is recorded.
    pub fn make_external_context_current(&self) -> EGLContext {
        let mut state = self.state();
        let context = state.allocate_handle();
        state.contexts.insert(context, GLVersion::new(2, 0));
        state.current.insert(thread::current().id(), (0, context));
        context as EGLContext
    }

    /// Unbinds and destroys a context made with `make_external_context_current`.
    pub fn release_external_context(&self, context: EGLContext) {
        let mut state = self.state();
        state.contexts.remove(&(context as usize));
        state.current.remove(&thread::current().id());
    }
}

fn pairs(attributes: &[EGLint]) -> Vec<(EGLint, EGLint)> {
    attributes
        .chunks(2)
        .take_while(|pair| pair[0] != egl::NONE as EGLint && pair.len() == 2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

fn is_terminated(attributes: &[EGLint]) -> bool {
    attributes
        .chunks(2)
        .any(|pair| pair[0] == egl::NONE as EGLint)
}

fn terminated(attributes: &[EGLint]) -> Vec<EGLint> {
    let mut list: Vec<_> = pairs(attributes)
        .into_iter()
        .flat_map(|(attribute, value)| [attribute, value])
        .collect();
    list.push(egl::NONE as EGLint);
    list
}

impl NativeEGL for FakeEGL {
    fn initialize(&self) -> Option<GLVersion> {
        let mut state = self.state();
        state.calls.push(FakeCall::Initialize);
        if state.fail_initialize {
            state.fail(egl::NOT_INITIALIZED);
            return None;
        }
        state.initialized = true;
        Some(state.egl_version)
    }

    fn terminate(&self) -> bool {
        let mut state = self.state();
        state.calls.push(FakeCall::Terminate);
        state.initialized = false;
        true
    }

    fn bind_api(&self, api: EGLenum) -> bool {
        let mut state = self.state();
        state.calls.push(FakeCall::BindApi(api));
        if api != egl::OPENGL_ES_API && api != egl::OPENGL_API {
            state.fail(egl::BAD_PARAMETER);
            return false;
        }
        true
    }

    fn query_extensions(&self) -> String {
        self.state().extensions.clone()
    }

    fn config_count(&self, attributes: &[EGLint]) -> Option<EGLint> {
        let mut state = self.state();
        state.calls.push(FakeCall::ChooseConfig {
            attributes: terminated(attributes),
            max_configs: None,
        });
        if !state.initialized {
            state.fail(egl::NOT_INITIALIZED);
            return None;
        }
        Some(state.configs.iter().filter(|config| config.matches(attributes)).count() as EGLint)
    }

    fn choose_config(&self, attributes: &[EGLint], max_configs: EGLint) -> Option<Vec<EGLConfig>> {
        let mut state = self.state();
        state.calls.push(FakeCall::ChooseConfig {
            attributes: terminated(attributes),
            max_configs: Some(max_configs),
        });
        if !state.initialized {
            state.fail(egl::NOT_INITIALIZED);
            return None;
        }
        Some(
            state
                .configs
                .iter()
                .enumerate()
                .filter(|(_, config)| config.matches(attributes))
                .map(|(index, _)| (CONFIG_HANDLE_BASE + index) as EGLConfig)
                .take(max_configs.max(0) as usize)
                .collect(),
        )
    }

    fn get_config_attrib(&self, config: EGLConfig, attribute: EGLint) -> Option<EGLint> {
        let mut state = self.state();
        let value = state.config(config).map(|config| config.get(attribute as EGLenum));
        let value = match value {
            Some(value) => value,
            None => {
                state.fail(egl::BAD_CONFIG);
                return None;
            }
        };
        let known = (egl::BUFFER_SIZE..=egl::CONFORMANT).contains(&(attribute as EGLenum))
            || attribute == EGL_COLOR_COMPONENT_TYPE_EXT as EGLint;
        if !known {
            state.fail(egl::BAD_ATTRIBUTE);
            return None;
        }
        Some(value)
    }

    fn create_context(
        &self,
        config: EGLConfig,
        share_context: EGLContext,
        attributes: &[EGLint],
    ) -> EGLContext {
        let mut state = self.state();
        state.calls.push(FakeCall::CreateContext {
            config: config as usize,
            share_context: share_context as usize,
            attributes: terminated(attributes),
        });

        if !state.initialized {
            state.fail(egl::NOT_INITIALIZED);
            return egl::NO_CONTEXT;
        }
        if !is_terminated(attributes) {
            state.fail(egl::BAD_ATTRIBUTE);
            return egl::NO_CONTEXT;
        }
        let config_ok = if config.is_null() {
            state.has_extension("EGL_KHR_no_config_context")
        } else {
            state.config(config).is_some()
        };
        if !config_ok {
            state.fail(egl::BAD_CONFIG);
            return egl::NO_CONTEXT;
        }
        if !share_context.is_null() && !state.contexts.contains_key(&(share_context as usize)) {
            state.fail(egl::BAD_CONTEXT);
            return egl::NO_CONTEXT;
        }

        let flexible = state.egl_version >= GLVersion::new(1, 5)
            || state.has_extension("EGL_KHR_create_context");
        let robust = state.has_extension("EGL_EXT_create_context_robustness");
        let purge = state.has_extension("EGL_NV_robustness_video_memory_purge");
        let (mut major, mut minor) = (1, 0);
        for (attribute, value) in pairs(attributes) {
            match attribute as EGLenum {
                egl::CONTEXT_CLIENT_VERSION => major = value,
                EGL_CONTEXT_MAJOR_VERSION if flexible => major = value,
                EGL_CONTEXT_MINOR_VERSION if flexible => minor = value,
                EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY if robust => {}
                EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV if purge => {}
                _ => {
                    state.fail(egl::BAD_ATTRIBUTE);
                    return egl::NO_CONTEXT;
                }
            }
        }
        let version = match (u8::try_from(major), u8::try_from(minor)) {
            (Ok(major), Ok(minor)) => Some(GLVersion::new(major, minor)),
            _ => None,
        };
        let rejected = state
            .context_rejector
            .as_ref()
            .map_or(false, |rejector| rejector(attributes));
        let version = match version {
            Some(version) if version <= state.max_context_version && !rejected => version,
            _ => {
                state.fail(egl::BAD_MATCH);
                return egl::NO_CONTEXT;
            }
        };

        let context = state.allocate_handle();
        state.contexts.insert(context, version);
        context as EGLContext
    }

    fn destroy_context(&self, context: EGLContext) -> bool {
        let mut state = self.state();
        state.calls.push(FakeCall::DestroyContext(context as usize));
        if state.contexts.remove(&(context as usize)).is_none() {
            state.fail(egl::BAD_CONTEXT);
            return false;
        }
        true
    }

    fn make_current(&self, surface: EGLSurface, context: EGLContext) -> bool {
        let mut state = self.state();
        let (surface, context) = (surface as usize, context as usize);
        state.calls.push(FakeCall::MakeCurrent { surface, context });

        if state.make_current_failures > 0 {
            state.make_current_failures -= 1;
            state.fail(egl::BAD_ACCESS);
            return false;
        }
        if context != 0 && !state.contexts.contains_key(&context) {
            state.fail(egl::BAD_CONTEXT);
            return false;
        }
        if surface != 0 && !state.surfaces.contains(&surface) {
            state.fail(egl::BAD_SURFACE);
            return false;
        }
        if context != 0 && surface == 0 && !state.has_extension("EGL_KHR_surfaceless_context") {
            state.fail(egl::BAD_MATCH);
            return false;
        }
        if context != 0 && state.bound_elsewhere(context) {
            state.fail(egl::BAD_ACCESS);
            return false;
        }

        let thread = thread::current().id();
        if context == 0 {
            state.current.remove(&thread);
        } else {
            state.current.insert(thread, (surface, context));
        }
        true
    }

    fn get_current_context(&self) -> EGLContext {
        let mut state = self.state();
        state.calls.push(FakeCall::GetCurrentContext);
        state
            .current
            .get(&thread::current().id())
            .map_or(egl::NO_CONTEXT, |&(_, context)| context as EGLContext)
    }

    fn create_pbuffer_surface(&self, config: EGLConfig, attributes: &[EGLint]) -> EGLSurface {
        let mut state = self.state();
        state.calls.push(FakeCall::CreatePbufferSurface {
            config: config as usize,
            attributes: terminated(attributes),
        });
        if state.config(config).is_none() {
            state.fail(egl::BAD_CONFIG);
            return egl::NO_SURFACE;
        }
        if state.fail_pbuffer_creation {
            state.fail(egl::BAD_ALLOC);
            return egl::NO_SURFACE;
        }
        let surface = state.allocate_handle();
        state.surfaces.insert(surface);
        surface as EGLSurface
    }

    fn create_window_surface(
        &self,
        config: EGLConfig,
        window: EGLNativeWindowType,
        _: &[EGLint],
    ) -> EGLSurface {
        let mut state = self.state();
        state.calls.push(FakeCall::CreateWindowSurface {
            config: config as usize,
            window: window as usize,
        });
        if state.config(config).is_none() {
            state.fail(egl::BAD_CONFIG);
            return egl::NO_SURFACE;
        }
        if window.is_null() {
            state.fail(egl::BAD_NATIVE_WINDOW);
            return egl::NO_SURFACE;
        }
        let surface = state.allocate_handle();
        state.surfaces.insert(surface);
        surface as EGLSurface
    }

    fn destroy_surface(&self, surface: EGLSurface) -> bool {
        let mut state = self.state();
        state.calls.push(FakeCall::DestroySurface(surface as usize));
        if !state.surfaces.remove(&(surface as usize)) {
            state.fail(egl::BAD_SURFACE);
            return false;
        }
        true
    }

    fn get_error(&self) -> EGLint {
        self.state()
            .errors
            .remove(&thread::current().id())
            .unwrap_or(egl::SUCCESS as EGLint)
    }

    fn get_proc_address(&self, _: &str) -> *const c_void {
        ptr::null()
    }

    fn load_gl_functions(&self) -> GLFunctions {
        let mut state = self.state();
        state.calls.push(FakeCall::LoadGLFunctions);
        let context_version = state
            .current
            .get(&thread::current().id())
            .and_then(|&(_, context)| state.contexts.get(&context))
            .copied()
            .unwrap_or(state.max_context_version);
        let max_es_version = state.reported_es_version.unwrap_or(context_version);
        GLFunctions {
            gl: None,
            max_es_version,
            description: format!("Fake EGL {}.{}", state.egl_version.major, state.egl_version.minor),
        }
    }
}
