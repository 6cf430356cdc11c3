#[macro_export]
macro_rules! impl_from {
    ($from:ty, $variant:ident, $to:ty) => {
        impl From<$from> for $to {
            fn from(value: $from) -> Self {
                Self::$variant(value.into())
            }
        }
    };
}

/// Implements `From<$from>` for `Object` and the matching `TryFrom<&Object>`
/// for `&$from`.
#[macro_export]
macro_rules! impl_object_variant {
    ($from:ty, $variant:ident) => {
        impl From<$from> for $crate::object::Object {
            fn from(value: $from) -> Self {
                Self::$variant(value)
            }
        }

        impl<'object> TryFrom<&'object $crate::object::Object> for &'object $from {
            type Error = $crate::object::error::ObjectErr;

            fn try_from(value: &'object $crate::object::Object) -> Result<Self, Self::Error> {
                if let $crate::object::Object::$variant(value) = value {
                    Ok(value)
                } else {
                    Err($crate::object::error::ObjectErr::UnexpectedType {
                        expected: vec![$crate::object::ObjectKind::$variant],
                        found: value.kind(),
                    })
                }
            }
        }
    };
}
