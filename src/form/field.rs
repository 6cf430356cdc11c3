use ::log::warn;
use ::std::collections::HashSet;

use super::flags;
use super::text;
use super::widget::Widget;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_KIDS;
use crate::object::dictionary::KEY_PARENT;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::Object;
use crate::object::ObjectKind;
use crate::object::Reference;

pub(crate) const KEY_T: &str = "T";
pub(crate) const KEY_FT: &str = "FT";
pub(crate) const KEY_FF: &str = "Ff";
pub(crate) const KEY_V: &str = "V";

/// The dictionary of `reference` followed by those of its ancestors, nearest
/// first. The walk stops at the first reference seen twice.
pub(crate) fn ancestry(context: &Context, reference: Reference) -> Vec<&Dictionary> {
    let mut visited = HashSet::new();
    let mut dictionaries = Vec::new();
    let mut next = Some(reference);
    while let Some(reference) = next {
        if !visited.insert(reference) {
            warn!("Field hierarchy cycle at {}", reference);
            break;
        }
        let dictionary = match context.dictionary(reference) {
            Ok(dictionary) => dictionary,
            Err(_) => break,
        };
        dictionaries.push(dictionary);
        next = dictionary.get(KEY_PARENT).and_then(Object::as_reference);
    }
    dictionaries
}

/// REFERENCE: [12.7.3.1 General, p432] The first definition found walking up
/// from the field wins.
pub(crate) fn inherited<'a>(context: &'a Context, reference: Reference, key: &str) -> Option<&'a Object> {
    ancestry(context, reference)
        .into_iter()
        .find_map(|dictionary| dictionary.get(key))
        .map(|value| context.resolve(value))
}

/// Appends `kid` to `/Kids`, creating the array when missing
pub(crate) fn push_kid(context: &mut Context, parent: Reference, kid: Reference) -> PdfResult<()> {
    // `/Kids` may itself be stored indirectly
    let indirect = context
        .dictionary(parent)?
        .get(KEY_KIDS)
        .and_then(Object::as_reference);
    if let Some(kids) = indirect {
        if let Some(array) = context.get_mut(kids).and_then(Object::as_array_mut) {
            array.push(kid);
            return Ok(());
        }
    }
    let dictionary = context.dictionary_mut(parent)?;
    match dictionary.get_mut(KEY_KIDS).and_then(Object::as_array_mut) {
        Some(kids) => kids.push(kid),
        None => {
            dictionary.set(KEY_KIDS, Array::from_iter([kid]));
        }
    }
    Ok(())
}

/// The behaviour shared by every node of the field hierarchy. Fields are
/// views over dictionaries owned by a [`Context`]; they store nothing else.
///
/// REFERENCE: [12.7.3 Field dictionaries, p432-435]
pub trait Field {
    fn reference(&self) -> Reference;

    fn dictionary<'a>(&self, context: &'a Context) -> PdfResult<&'a Dictionary> {
        Ok(context.dictionary(self.reference())?)
    }

    /// `/T`
    fn partial_name(&self, context: &Context) -> Option<String> {
        let dictionary = context.dictionary(self.reference()).ok()?;
        text(dictionary.lookup_maybe(KEY_T, context, &[])?)
    }

    /// The partial names from the root down, joined by periods
    fn fully_qualified_name(&self, context: &Context) -> Option<String> {
        let mut names = ancestry(context, self.reference())
            .into_iter()
            .filter_map(|dictionary| text(dictionary.lookup_maybe(KEY_T, context, &[])?))
            .collect::<Vec<_>>();
        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join("."))
    }

    /// `/Ff`, inherited
    fn flags(&self, context: &Context) -> u32 {
        inherited(context, self.reference(), KEY_FF)
            .and_then(Object::as_i64)
            .map_or(0, |flags| flags as u32)
    }

    fn has_flag(&self, context: &Context, flag: u32) -> bool {
        flags::is_set(self.flags(context), flag)
    }

    /// Sets or clears `flag` on the field's own dictionary
    fn set_flag(&self, context: &mut Context, flag: u32, enable: bool) -> PdfResult<()> {
        let flags = self.flags(context);
        let flags = if enable { flags | flag } else { flags & !flag };
        context
            .dictionary_mut(self.reference())?
            .set(KEY_FF, i64::from(flags));
        Ok(())
    }

    /// Indirect entries of `/Kids`, fields and widgets alike
    fn kids(&self, context: &Context) -> Vec<Reference> {
        context
            .dictionary(self.reference())
            .ok()
            .and_then(|dictionary| dictionary.lookup_maybe(KEY_KIDS, context, &[ObjectKind::Array]))
            .and_then(Object::as_array)
            .map(|kids| kids.iter().filter_map(Object::as_reference).collect())
            .unwrap_or_default()
    }
}

/// A field without field children: it carries a value and is presented by
/// widgets.
pub trait TerminalField: Field {
    fn type_name(&self) -> &'static str;

    /// Kids without `/T`, or the field itself when it has no `/Kids`
    fn widgets(&self, context: &Context) -> Vec<Widget> {
        let reference = self.reference();
        let has_kids = context
            .dictionary(reference)
            .map_or(false, |dictionary| dictionary.has(KEY_KIDS));
        if !has_kids {
            return vec![Widget::new(reference)];
        }
        self.kids(context)
            .into_iter()
            .filter(|&kid| {
                context
                    .dictionary(kid)
                    .map_or(false, |dictionary| !dictionary.has(KEY_T))
            })
            .map(Widget::new)
            .collect()
    }

    /// `/V`, inherited. Null values are treated as absent.
    fn value<'a>(&self, context: &'a Context) -> Option<&'a Object> {
        inherited(context, self.reference(), KEY_V).filter(|value| !value.is_null())
    }

    fn set_value(&self, _context: &mut Context, _value: Object) -> PdfResult<()> {
        Err(PdfError::MethodNotImplemented {
            type_name: self.type_name(),
            method: "set_value",
        })
    }

    /// Attaches a widget annotation to the field
    fn add_widget(&self, context: &mut Context, widget: Reference) -> PdfResult<()> {
        context
            .dictionary_mut(widget)?
            .set(KEY_PARENT, self.reference());
        push_kid(context, self.reference(), widget)
    }
}

/// A field whose kids include other fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonTerminalField(Reference);

impl NonTerminalField {
    pub(crate) fn new(reference: Reference) -> Self {
        Self(reference)
    }

    pub fn create(context: &mut Context) -> Self {
        Self(context.register(Dictionary::new()))
    }

    /// Appends `field` to `/Kids` and points its `/Parent` here
    pub fn add_field(&self, context: &mut Context, field: Reference) -> PdfResult<()> {
        context.dictionary_mut(field)?.set(KEY_PARENT, self.0);
        push_kid(context, self.0, field)
    }
}

impl Field for NonTerminalField {
    fn reference(&self) -> Reference {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::GenericField;
    use crate::object::PdfString;

    fn hierarchy(context: &mut Context) -> (Reference, Reference, Reference) {
        let root = context.register(Dictionary::from_iter([
            (KEY_T, Object::from(PdfString::from_text("form"))),
            (KEY_FT, Object::from("Tx")),
            (KEY_FF, Object::from(4)),
        ]));
        let middle = context.register(Dictionary::from_iter([
            (KEY_T, Object::from(PdfString::from_text("address"))),
            (KEY_PARENT, root.into()),
        ]));
        let leaf = context.register(Dictionary::from_iter([
            (KEY_T, Object::from(PdfString::from_text("city"))),
            (KEY_PARENT, middle.into()),
        ]));
        (root, middle, leaf)
    }

    #[test]
    fn field_inheritance() {
        let mut context = Context::new();
        let (_, middle, leaf) = hierarchy(&mut context);
        assert_eq!(
            inherited(&context, leaf, KEY_FT),
            Some(&Object::from("Tx"))
        );
        let field = GenericField::new(leaf);
        assert_eq!(
            field.fully_qualified_name(&context),
            Some("form.address.city".to_string())
        );
        assert_eq!(field.partial_name(&context), Some("city".to_string()));
        assert!(field.has_flag(&context, flags::common::NO_EXPORT));

        // Overridden below the root
        context
            .dictionary_mut(middle)
            .unwrap()
            .set(KEY_FF, 1);
        assert_eq!(field.flags(&context), 1);
        field
            .set_flag(&mut context, flags::common::REQUIRED, true)
            .unwrap();
        assert_eq!(field.flags(&context), 3);
    }

    #[test]
    fn field_parent_cycle() {
        let mut context = Context::new();
        let (root, _, leaf) = hierarchy(&mut context);
        context
            .dictionary_mut(root)
            .unwrap()
            .set(KEY_PARENT, leaf);
        assert_eq!(ancestry(&context, leaf).len(), 3);
        assert_eq!(inherited(&context, leaf, "Missing"), None);
    }

    #[test]
    fn field_widgets() {
        let mut context = Context::new();
        let field = GenericField::new(context.register(Dictionary::new()));
        assert_eq!(
            field.widgets(&context),
            vec![Widget::new(field.reference())]
        );

        let child = context.register(Dictionary::from_iter([(KEY_T, "child")]));
        let widget = context.register(Dictionary::from_iter([("Subtype", "Widget")]));
        context
            .dictionary_mut(field.reference())
            .unwrap()
            .set(KEY_KIDS, Array::from_iter([child, widget]));
        assert_eq!(field.widgets(&context), vec![Widget::new(widget)]);
        assert_eq!(field.kids(&context), vec![child, widget]);
    }

    #[test]
    fn non_terminal_add_field() {
        let mut context = Context::new();
        let parent = NonTerminalField::create(&mut context);
        let first = context.register(Dictionary::new());
        parent.add_field(&mut context, first).unwrap();
        assert_eq!(parent.kids(&context), vec![first]);
        assert_eq!(
            context.dictionary(first).unwrap().get(KEY_PARENT),
            Some(&Object::from(parent.reference()))
        );

        // Kids stored indirectly
        let kids = context.register(Array::new());
        context
            .dictionary_mut(parent.reference())
            .unwrap()
            .set(KEY_KIDS, kids);
        let second = context.register(Dictionary::new());
        parent.add_field(&mut context, second).unwrap();
        assert_eq!(
            context.get(kids),
            Some(&Object::from(Array::from_iter([second])))
        );
    }

    #[test]
    fn terminal_set_value_not_implemented() {
        let mut context = Context::new();
        let field = GenericField::new(context.register(Dictionary::new()));
        assert_eq!(
            field.set_value(&mut context, Object::from(1)),
            Err(PdfError::MethodNotImplemented {
                type_name: "GenericField",
                method: "set_value"
            })
        );
    }
}
