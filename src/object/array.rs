use super::error::ObjectErr;
use super::error::ObjectResult;
use super::Object;
use super::ObjectKind;
use crate::context::Context;

/// REFERENCE: [7.3.6 Array objects, p28]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(Vec<Object>);

/// REFERENCE: [7.9.5 Rectangles, p90]
/// Lower-left corner with a width and a height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, object: impl Into<Object>) {
        self.0.push(object.into());
    }

    /// Inserts before `index`, appending when `index` is past the end
    pub fn insert(&mut self, index: usize, object: impl Into<Object>) {
        let index = index.min(self.0.len());
        self.0.insert(index, object.into());
    }

    pub fn remove(&mut self, index: usize) -> Option<Object> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Object> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Object> {
        self.0.get_mut(index)
    }

    /// Replaces the entry at `index`, returning the previous one. Nothing is
    /// stored when `index` is out of bounds.
    pub fn set(&mut self, index: usize, object: impl Into<Object>) -> Option<Object> {
        self.0
            .get_mut(index)
            .map(|entry| ::std::mem::replace(entry, object.into()))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Object> + ExactSizeIterator {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.0.iter_mut()
    }

    /// Resolves the entry at `index` through `context`. Missing entries and
    /// dangling references are treated as null.
    pub fn lookup<'a>(
        &'a self,
        index: usize,
        context: &'a Context,
        kinds: &[ObjectKind],
    ) -> ObjectResult<&'a Object> {
        context.lookup(self.get(index).unwrap_or(context.null()), kinds)
    }

    pub fn lookup_maybe<'a>(
        &'a self,
        index: usize,
        context: &'a Context,
        kinds: &[ObjectKind],
    ) -> Option<&'a Object> {
        self.get(index)
            .and_then(|entry| context.lookup_maybe(entry, kinds))
    }

    /// Interprets `[llx lly urx ury]` as a rectangle. Entries may be
    /// references to numbers.
    pub fn as_rectangle(&self, context: &Context) -> ObjectResult<Rectangle> {
        if self.0.len() != 4 {
            return Err(ObjectErr::NotARectangle(self.0.len()));
        }
        let mut values = [0.0; 4];
        for (index, value) in values.iter_mut().enumerate() {
            let number = self.lookup(index, context, &[ObjectKind::Number])?;
            *value = number.as_f64().unwrap_or_default();
        }
        let [llx, lly, urx, ury] = values;
        Ok(Rectangle {
            x: llx,
            y: lly,
            width: urx - llx,
            height: ury - lly,
        })
    }
}

mod convert {
    use super::*;

    impl From<Vec<Object>> for Array {
        fn from(value: Vec<Object>) -> Self {
            Self(value)
        }
    }

    impl<T> FromIterator<T> for Array
    where
        T: Into<Object>,
    {
        fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
            Self(iter.into_iter().map(Into::into).collect())
        }
    }

    impl IntoIterator for Array {
        type Item = Object;
        type IntoIter = ::std::vec::IntoIter<Object>;

        fn into_iter(self) -> Self::IntoIter {
            self.0.into_iter()
        }
    }

    impl<'a> IntoIterator for &'a Array {
        type Item = &'a Object;
        type IntoIter = ::std::slice::Iter<'a, Object>;

        fn into_iter(self) -> Self::IntoIter {
            self.0.iter()
        }
    }

    impl From<Rectangle> for Array {
        fn from(value: Rectangle) -> Self {
            Self::from_iter([
                value.x,
                value.y,
                value.x + value.width,
                value.y + value.height,
            ])
        }
    }
}
