use ::once_cell::sync::Lazy;
use ::std::cmp::Ordering;
use ::std::collections::HashSet;
use ::std::fmt::Debug;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::hash::Hash;
use ::std::hash::Hasher;
use ::std::sync::Arc;
use ::std::sync::Mutex;
use ::std::sync::PoisonError;

use crate::fmt::debug_bytes;
use crate::parse::character_set::is_regular;
use crate::Byte;

/// Names seen by any document in this process. Entries are never removed, so
/// the table grows with the number of distinct names, not with the number of
/// documents.
static INTERNED: Lazy<Mutex<HashSet<Arc<[Byte]>>>> = Lazy::new(Default::default);

fn intern(bytes: &[Byte]) -> Arc<[Byte]> {
    let mut table = INTERNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(interned) = table.get(bytes) {
        return Arc::clone(interned);
    }
    let interned: Arc<[Byte]> = Arc::from(bytes);
    table.insert(Arc::clone(&interned));
    interned
}

/// REFERENCE: [7.3.5 Name objects, p27-28]
/// The bytes are stored with `#xx` escapes already resolved. Two names with
/// the same bytes share one allocation.
#[derive(Clone)]
pub struct Name(Arc<[Byte]>);

impl Name {
    pub fn new(bytes: impl AsRef<[Byte]>) -> Self {
        Self(intern(bytes.as_ref()))
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        ::std::str::from_utf8(&self.0).ok()
    }

    /// The name as written in a file, `#xx`-escaping bytes that are not
    /// printable regular characters
    pub(crate) fn escaped(&self) -> Vec<Byte> {
        let mut escaped = Vec::with_capacity(self.0.len() + 1);
        escaped.push(b'/');
        for &byte in self.0.iter() {
            if byte == b'#' || !byte.is_ascii_graphic() || !is_regular(byte) {
                escaped.extend_from_slice(format!("#{:02X}", byte).as_bytes());
            } else {
                escaped.push(byte);
            }
        }
        escaped
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for &byte in self.escaped().iter() {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "/{}", debug_bytes(&self.0))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == other.as_bytes()
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

mod convert {
    use ::std::borrow::Borrow;

    use super::*;

    impl Borrow<[Byte]> for Name {
        fn borrow(&self) -> &[Byte] {
            &self.0
        }
    }

    impl From<&str> for Name {
        fn from(value: &str) -> Self {
            Self::new(value)
        }
    }

    impl From<String> for Name {
        fn from(value: String) -> Self {
            Self::new(value)
        }
    }

    impl From<&[Byte]> for Name {
        fn from(value: &[Byte]) -> Self {
            Self::new(value)
        }
    }
}
