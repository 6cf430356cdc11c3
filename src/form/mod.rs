//! Interactive form fields over the dictionaries of a [`Context`].
//!
//! Fields store nothing of their own: each is a reference to a field
//! dictionary, classified on demand by [`AcroField::classify`].
//!
//! REFERENCE: [12.7 Interactive forms, p430-449]

mod acroform;
mod field;
pub mod flags;
mod terminal;
mod widget;

pub use self::acroform::AcroForm;
pub use self::field::Field;
pub use self::field::NonTerminalField;
pub use self::field::TerminalField;
pub use self::terminal::CheckBox;
pub use self::terminal::ChoiceField;
pub use self::terminal::ComboBox;
pub use self::terminal::GenericField;
pub use self::terminal::ListBox;
pub use self::terminal::PushButton;
pub use self::terminal::Quadding;
pub use self::terminal::RadioButton;
pub use self::terminal::SignatureField;
pub use self::terminal::TextField;
pub use self::widget::Widget;

use self::field::inherited;
use self::field::KEY_FF;
use self::field::KEY_FT;
use self::field::KEY_T;
use crate::context::Context;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_KIDS;
use crate::object::Object;
use crate::object::ObjectKind;
use crate::object::Reference;

/// REFERENCE: [Table 226 — Entries common to all field dictionaries, p432]
pub(crate) const FT_BUTTON: &str = "Btn";
pub(crate) const FT_TEXT: &str = "Tx";
pub(crate) const FT_CHOICE: &str = "Ch";
pub(crate) const FT_SIGNATURE: &str = "Sig";

/// Either string form decoded as text
pub(crate) fn text(object: &Object) -> Option<String> {
    match object {
        Object::String(string) => Some(string.decode_text()),
        Object::HexString(string) => Some(string.decode_text()),
        _ => None,
    }
}

/// A node of the field hierarchy, classified by its dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcroField {
    NonTerminal(NonTerminalField),
    Text(TextField),
    ComboBox(ComboBox),
    ListBox(ListBox),
    PushButton(PushButton),
    RadioButton(RadioButton),
    CheckBox(CheckBox),
    Signature(SignatureField),
    Generic(GenericField),
}

impl AcroField {
    /// A field is non-terminal when one of its kids has a `/T`. Otherwise
    /// the inherited `/FT` and `/Ff` pick the terminal type. A missing or
    /// unknown `/FT` yields a [`GenericField`].
    pub fn classify(context: &Context, reference: Reference) -> PdfResult<Self> {
        let dictionary = context.dictionary(reference)?;
        let has_field_kids = dictionary
            .lookup_maybe(KEY_KIDS, context, &[ObjectKind::Array])
            .and_then(Object::as_array)
            .is_some_and(|kids| {
                kids.iter().any(|kid| {
                    context
                        .lookup_maybe(kid, &[ObjectKind::Dictionary])
                        .and_then(Object::as_dictionary)
                        .is_some_and(|kid| kid.has(KEY_T))
                })
            });
        if has_field_kids {
            return Ok(Self::NonTerminal(NonTerminalField::new(reference)));
        }

        let field_type = inherited(context, reference, KEY_FT).and_then(Object::as_name);
        let field_flags = inherited(context, reference, KEY_FF)
            .and_then(Object::as_i64)
            .map_or(0, |flags| flags as u32);
        let field = match field_type {
            Some(name) if *name == FT_TEXT => Self::Text(TextField::new(reference)),
            Some(name) if *name == FT_CHOICE => {
                if flags::is_set(field_flags, flags::choice::COMBO) {
                    Self::ComboBox(ComboBox::new(reference))
                } else {
                    Self::ListBox(ListBox::new(reference))
                }
            }
            Some(name) if *name == FT_BUTTON => {
                if flags::is_set(field_flags, flags::button::PUSH_BUTTON) {
                    Self::PushButton(PushButton::new(reference))
                } else if flags::is_set(field_flags, flags::button::RADIO) {
                    Self::RadioButton(RadioButton::new(reference))
                } else {
                    Self::CheckBox(CheckBox::new(reference))
                }
            }
            Some(name) if *name == FT_SIGNATURE => Self::Signature(SignatureField::new(reference)),
            _ => Self::Generic(GenericField::new(reference)),
        };
        Ok(field)
    }

    pub fn as_field(&self) -> &dyn Field {
        match self {
            Self::NonTerminal(field) => field,
            Self::Text(field) => field,
            Self::ComboBox(field) => field,
            Self::ListBox(field) => field,
            Self::PushButton(field) => field,
            Self::RadioButton(field) => field,
            Self::CheckBox(field) => field,
            Self::Signature(field) => field,
            Self::Generic(field) => field,
        }
    }

    /// `None` for non-terminal fields
    pub fn as_terminal(&self) -> Option<&dyn TerminalField> {
        match self {
            Self::NonTerminal(_) => None,
            Self::Text(field) => Some(field),
            Self::ComboBox(field) => Some(field),
            Self::ListBox(field) => Some(field),
            Self::PushButton(field) => Some(field),
            Self::RadioButton(field) => Some(field),
            Self::CheckBox(field) => Some(field),
            Self::Signature(field) => Some(field),
            Self::Generic(field) => Some(field),
        }
    }

    pub fn reference(&self) -> Reference {
        self.as_field().reference()
    }

    /// The field classes of the kids that are field dictionaries
    pub fn children(&self, context: &Context) -> Vec<AcroField> {
        let field = match self {
            Self::NonTerminal(field) => field,
            _ => return Vec::new(),
        };
        field
            .kids(context)
            .into_iter()
            .filter_map(|kid| Self::classify(context, kid).ok())
            .collect()
    }
}
