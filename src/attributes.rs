// virtegl/src/attributes.rs
//
//! EGL attribute lists.

use crate::egl;
use crate::egl::types::{EGLAttrib, EGLint};

use std::borrow::Cow;
use std::collections::btree_map::{self, BTreeMap};
use std::iter::FromIterator;

/// A flattened, `EGL_NONE`-terminated attribute list in the form the native API consumes.
pub type AttributeVector = Vec<EGLint>;

/// An ordered map of EGL attributes to values.
///
/// Keys are kept sorted, so flattening the same set of attributes always yields the same vector
/// regardless of insertion order. Inserting an existing key replaces its value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap {
    attributes: BTreeMap<EGLint, EGLAttrib>,
}

impl AttributeMap {
    #[inline]
    pub fn new() -> AttributeMap {
        AttributeMap::default()
    }

    /// Parses an `EGL_NONE`-terminated attribute list. A trailing unpaired key is ignored.
    pub fn from_int_list(list: &[EGLint]) -> AttributeMap {
        let mut map = AttributeMap::new();
        for pair in list.chunks(2) {
            if pair[0] == egl::NONE as EGLint || pair.len() < 2 {
                break;
            }
            map.insert(pair[0], pair[1] as EGLAttrib);
        }
        map
    }

    #[inline]
    pub fn insert(&mut self, attribute: EGLint, value: EGLAttrib) {
        self.attributes.insert(attribute, value);
    }

    #[inline]
    pub fn remove(&mut self, attribute: EGLint) -> Option<EGLAttrib> {
        self.attributes.remove(&attribute)
    }

    #[inline]
    pub fn contains(&self, attribute: EGLint) -> bool {
        self.attributes.contains_key(&attribute)
    }

    /// Returns the value of `attribute`, or `default` if it isn't present.
    #[inline]
    pub fn get(&self, attribute: EGLint, default: EGLAttrib) -> EGLAttrib {
        self.attributes.get(&attribute).copied().unwrap_or(default)
    }

    #[inline]
    pub fn get_as_int(&self, attribute: EGLint, default: EGLint) -> EGLint {
        self.get(attribute, default as EGLAttrib) as EGLint
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn iter(&self) -> btree_map::Iter<EGLint, EGLAttrib> {
        self.attributes.iter()
    }

    /// Flattens the map into `key, value, ..., EGL_NONE`.
    pub fn to_int_vector(&self) -> AttributeVector {
        let mut vector = Vec::with_capacity(self.attributes.len() * 2 + 1);
        for (&attribute, &value) in &self.attributes {
            vector.push(attribute);
            vector.push(value as EGLint);
        }
        vector.push(egl::NONE as EGLint);
        vector
    }
}

/// Returns `list` up to and including its terminating `EGL_NONE`.
///
/// A list without one is copied, dropping any trailing unpaired key, and terminated, so the
/// result is always safe to hand to the driver.
pub(crate) fn terminated_int_list(list: &[EGLint]) -> Cow<[EGLint]> {
    let end = list
        .chunks(2)
        .position(|pair| pair[0] == egl::NONE as EGLint);
    match end {
        Some(end) => Cow::Borrowed(&list[..end * 2 + 1]),
        None => {
            let mut terminated = list[..list.len() / 2 * 2].to_vec();
            terminated.push(egl::NONE as EGLint);
            Cow::Owned(terminated)
        }
    }
}

impl FromIterator<(EGLint, EGLAttrib)> for AttributeMap {
    fn from_iter<I>(iter: I) -> AttributeMap
    where
        I: IntoIterator<Item = (EGLint, EGLAttrib)>,
    {
        AttributeMap {
            attributes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = (&'a EGLint, &'a EGLAttrib);
    type IntoIter = btree_map::Iter<'a, EGLint, EGLAttrib>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}
