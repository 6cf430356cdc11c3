use ::indexmap::IndexMap;

use super::error::ObjectErr;
use super::error::ObjectResult;
use super::name::Name;
use super::Object;
use super::ObjectKind;
use crate::context::Context;

pub(crate) const KEY_TYPE: &str = "Type";
pub(crate) const KEY_SUBTYPE: &str = "Subtype";
pub(crate) const KEY_LENGTH: &str = "Length";
pub(crate) const KEY_FILTER: &str = "Filter";
pub(crate) const KEY_DECODEPARMS: &str = "DecodeParms";
pub(crate) const KEY_KIDS: &str = "Kids";
pub(crate) const KEY_PARENT: &str = "Parent";

/// REFERENCE: [7.3.7 Dictionary objects, p29-30]
/// Entries keep their insertion order so serialization is deterministic.
/// Equality ignores the order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary(IndexMap<Name, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(key.as_bytes())
    }

    pub fn get_name(&self, key: &Name) -> Option<&Object> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.0.get_mut(key.as_bytes())
    }

    /// Inserts or replaces an entry. A replaced entry keeps its position.
    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> Option<Object> {
        self.0.insert(key.into(), value.into())
    }

    pub fn delete(&mut self, key: &str) -> Option<Object> {
        self.0.shift_remove(key.as_bytes())
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key.as_bytes())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.0.iter()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.0.values_mut()
    }

    /// Resolves the entry under `key` through `context`. Missing entries and
    /// dangling references are treated as null.
    pub fn lookup<'a>(
        &'a self,
        key: &str,
        context: &'a Context,
        kinds: &[ObjectKind],
    ) -> ObjectResult<&'a Object> {
        context.lookup(self.get(key).unwrap_or(context.null()), kinds)
    }

    /// Like [`Dictionary::lookup`], but yields `None` for missing entries,
    /// dangling references and values of other kinds
    pub fn lookup_maybe<'a>(
        &'a self,
        key: &str,
        context: &'a Context,
        kinds: &[ObjectKind],
    ) -> Option<&'a Object> {
        self.get(key)
            .and_then(|value| context.lookup_maybe(value, kinds))
    }

    /// Like [`Dictionary::lookup`], failing when the entry is absent
    pub fn lookup_required<'a>(
        &'a self,
        key: &'static str,
        context: &'a Context,
        kinds: &[ObjectKind],
    ) -> ObjectResult<&'a Object> {
        match self.get(key) {
            None => Err(ObjectErr::MissingEntry(key)),
            Some(value) => context.lookup(value, kinds),
        }
    }

    /// Checks `/Type` against `expected`
    pub fn has_type(&self, expected: &str) -> bool {
        matches!(self.get(KEY_TYPE), Some(Object::Name(name)) if name == expected)
    }
}

mod convert {
    use super::*;

    impl<K, V> FromIterator<(K, V)> for Dictionary
    where
        K: Into<Name>,
        V: Into<Object>,
    {
        fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
            Self(
                iter.into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            )
        }
    }

    impl IntoIterator for Dictionary {
        type Item = (Name, Object);
        type IntoIter = ::indexmap::map::IntoIter<Name, Object>;

        fn into_iter(self) -> Self::IntoIter {
            self.0.into_iter()
        }
    }
}
