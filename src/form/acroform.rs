use ::log::warn;
use ::std::collections::HashSet;

use super::AcroField;
use crate::context::Context;
use crate::error::PdfResult;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::Object;
use crate::object::ObjectErr;
use crate::object::ObjectKind;
use crate::object::Reference;

pub(crate) const KEY_ACRO_FORM: &str = "AcroForm";
pub(crate) const KEY_FIELDS: &str = "Fields";
const KEY_NEED_APPEARANCES: &str = "NeedAppearances";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Indirect(Reference),
    /// Stored directly in the catalog of the given reference
    Catalog(Reference),
}

/// The interactive form dictionary of a document
///
/// REFERENCE: [12.7.2 Interactive form dictionary, p431-432]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcroForm(Location);

impl AcroForm {
    /// The form named by the catalog's `/AcroForm`, if any
    pub fn from_context(context: &Context) -> PdfResult<Option<Self>> {
        let root = context.trailer_info.root.ok_or(ObjectErr::MissingEntry("Root"))?;
        let catalog = context.dictionary(root)?;
        let location = match catalog.get(KEY_ACRO_FORM) {
            Some(Object::Reference(reference))
                if context.get(*reference).and_then(Object::as_dictionary).is_some() =>
            {
                Location::Indirect(*reference)
            }
            Some(Object::Dictionary(_)) => Location::Catalog(root),
            _ => return Ok(None),
        };
        Ok(Some(Self(location)))
    }

    /// Registers an empty form and links it from the catalog
    pub fn create(context: &mut Context) -> PdfResult<Self> {
        let root = context.trailer_info.root.ok_or(ObjectErr::MissingEntry("Root"))?;
        let reference = context.register(Dictionary::from_iter([(KEY_FIELDS, Array::new())]));
        context.dictionary_mut(root)?.set(KEY_ACRO_FORM, reference);
        Ok(Self(Location::Indirect(reference)))
    }

    pub fn dictionary<'a>(&self, context: &'a Context) -> PdfResult<&'a Dictionary> {
        match self.0 {
            Location::Indirect(reference) => Ok(context.dictionary(reference)?),
            Location::Catalog(root) => Ok(context
                .dictionary(root)?
                .get(KEY_ACRO_FORM)
                .and_then(Object::as_dictionary)
                .ok_or(ObjectErr::MissingEntry(KEY_ACRO_FORM))?),
        }
    }

    fn dictionary_mut<'a>(&self, context: &'a mut Context) -> PdfResult<&'a mut Dictionary> {
        match self.0 {
            Location::Indirect(reference) => Ok(context.dictionary_mut(reference)?),
            Location::Catalog(root) => Ok(context
                .dictionary_mut(root)?
                .get_mut(KEY_ACRO_FORM)
                .and_then(Object::as_dictionary_mut)
                .ok_or(ObjectErr::MissingEntry(KEY_ACRO_FORM))?),
        }
    }

    /// The root fields listed in `/Fields`
    pub fn fields(&self, context: &Context) -> Vec<AcroField> {
        let fields = match self.dictionary(context).ok().and_then(|dictionary| {
            dictionary.lookup_maybe(KEY_FIELDS, context, &[ObjectKind::Array])
        }) {
            Some(Object::Array(fields)) => fields,
            _ => return Vec::new(),
        };
        fields
            .iter()
            .filter_map(Object::as_reference)
            .filter_map(|reference| AcroField::classify(context, reference).ok())
            .collect()
    }

    /// Every field of the hierarchy, depth-first. A field reachable twice is
    /// listed once.
    pub fn all_fields(&self, context: &Context) -> Vec<AcroField> {
        let mut visited = HashSet::new();
        let mut pending = self.fields(context);
        pending.reverse();
        let mut fields = Vec::new();
        while let Some(field) = pending.pop() {
            if !visited.insert(field.reference()) {
                warn!("Field {} is reachable more than once", field.reference());
                continue;
            }
            pending.extend(field.children(context).into_iter().rev());
            fields.push(field);
        }
        fields
    }

    /// The field with the given fully qualified name
    pub fn field(&self, context: &Context, name: &str) -> Option<AcroField> {
        self.all_fields(context).into_iter().find(|field| {
            field.as_field().fully_qualified_name(context).as_deref() == Some(name)
        })
    }

    /// Appends a root field to `/Fields`
    pub fn add_field(&self, context: &mut Context, field: Reference) -> PdfResult<()> {
        let indirect = self
            .dictionary(context)?
            .get(KEY_FIELDS)
            .and_then(Object::as_reference);
        if let Some(fields) = indirect {
            if let Some(fields) = context.get_mut(fields).and_then(Object::as_array_mut) {
                fields.push(field);
                return Ok(());
            }
        }
        let dictionary = self.dictionary_mut(context)?;
        match dictionary.get_mut(KEY_FIELDS).and_then(Object::as_array_mut) {
            Some(fields) => fields.push(field),
            None => {
                dictionary.set(KEY_FIELDS, Array::from_iter([field]));
            }
        }
        Ok(())
    }

    pub fn need_appearances(&self, context: &Context) -> bool {
        self.dictionary(context)
            .ok()
            .and_then(|dictionary| dictionary.get(KEY_NEED_APPEARANCES))
            .and_then(Object::as_bool)
            .unwrap_or_default()
    }

    pub fn set_need_appearances(&self, context: &mut Context, need_appearances: bool) -> PdfResult<()> {
        self.dictionary_mut(context)?
            .set(KEY_NEED_APPEARANCES, need_appearances);
        Ok(())
    }
}
