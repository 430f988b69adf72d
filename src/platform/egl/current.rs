// virtegl/src/platform/egl/current.rs
//
//! Per-thread record of the native surface and context that are bound.

use crate::egl;
use crate::egl::types::{EGLContext, EGLSurface};

use fnv::FnvHashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

/// What the display believes is bound on one thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentNativeContext {
    pub surface: EGLSurface,
    pub context: EGLContext,
    /// True while an embedder-owned context is current. The display never calls
    /// `eglMakeCurrent` in this state.
    pub is_external_context: bool,
}

unsafe impl Send for CurrentNativeContext {}

impl Default for CurrentNativeContext {
    fn default() -> CurrentNativeContext {
        CurrentNativeContext {
            surface: egl::NO_SURFACE,
            context: egl::NO_CONTEXT,
            is_external_context: false,
        }
    }
}

impl CurrentNativeContext {
    #[inline]
    pub(crate) fn is_bound_to(&self, surface: EGLSurface, context: EGLContext) -> bool {
        self.surface == surface && self.context == context
    }
}

type CurrentState = Arc<Mutex<CurrentNativeContext>>;

/// Tracks the binding of every thread that has touched a display.
///
/// Entries are created on first use and live until the display terminates.
#[derive(Default)]
pub(crate) struct CurrentContextTracker {
    table: RwLock<FnvHashMap<ThreadId, CurrentState>>,
}

impl CurrentContextTracker {
    // Lock the lookup table for reading
    fn table(&self) -> RwLockReadGuard<FnvHashMap<ThreadId, CurrentState>> {
        self.table.read().unwrap_or_else(|err| err.into_inner())
    }

    // Lock the lookup table for writing
    fn table_mut(&self) -> RwLockWriteGuard<FnvHashMap<ThreadId, CurrentState>> {
        self.table.write().unwrap_or_else(|err| err.into_inner())
    }

    pub(crate) fn state_for(&self, thread: ThreadId) -> CurrentState {
        if let Some(state) = self.table().get(&thread) {
            return state.clone();
        }
        self.table_mut().entry(thread).or_default().clone()
    }

    /// The state of the calling thread.
    #[inline]
    pub(crate) fn current(&self) -> CurrentState {
        self.state_for(thread::current().id())
    }

    pub(crate) fn snapshot(&self, thread: ThreadId) -> Option<CurrentNativeContext> {
        self.table().get(&thread).map(|state| *lock(state))
    }

    /// Clears every thread's binding of `context`.
    pub(crate) fn forget_context(&self, context: EGLContext) {
        for state in self.table().values() {
            let mut state = lock(state);
            if state.context == context {
                state.surface = egl::NO_SURFACE;
                state.context = egl::NO_CONTEXT;
            }
        }
    }

    pub(crate) fn clear(&self) {
        self.table_mut().clear()
    }

    #[inline]
    pub(crate) fn thread_count(&self) -> usize {
        self.table().len()
    }
}

pub(crate) fn lock(state: &Mutex<CurrentNativeContext>) -> MutexGuard<CurrentNativeContext> {
    state.lock().unwrap_or_else(|err| err.into_inner())
}
