use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::GenerationNumber;
use crate::ObjectNumber;

/// REFERENCE: [7.3.10 Indirect objects, p33]
/// Identity of an indirect object. Ordered by object number, then generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub(crate) object_number: ObjectNumber,
    pub(crate) generation_number: GenerationNumber,
}

impl Reference {
    pub fn new(object_number: ObjectNumber, generation_number: GenerationNumber) -> Self {
        Self {
            object_number,
            generation_number,
        }
    }

    pub fn object_number(&self) -> ObjectNumber {
        self.object_number
    }

    pub fn generation_number(&self) -> GenerationNumber {
        self.generation_number
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {} R", self.object_number, self.generation_number)
    }
}
