// virtegl/src/context.rs
//
//! Declarations common to all contexts.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// A locally-unique identifier for a logical client context.
///
/// Several logical contexts may share one native context when virtualization is enabled, so this
/// identifies the client-visible object, not the native handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextID(pub u64);

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

impl ContextID {
    pub(crate) fn next() -> ContextID {
        ContextID(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for ContextID {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}
