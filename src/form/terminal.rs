use super::field::Field;
use super::field::TerminalField;
use super::field::KEY_FT;
use super::field::KEY_V;
use super::flags;
use super::text;
use super::widget::STATE_OFF;
use super::FT_BUTTON;
use super::FT_TEXT;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_KIDS;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::Name;
use crate::object::Object;
use crate::object::ObjectErr;
use crate::object::ObjectKind;
use crate::object::PdfString;
use crate::object::Reference;

pub(crate) const KEY_MAX_LEN: &str = "MaxLen";
pub(crate) const KEY_Q: &str = "Q";
pub(crate) const KEY_OPT: &str = "Opt";
/// REFERENCE: [Table 232 — Additional entries specific to a choice field, p447]
pub(crate) const KEY_I: &str = "I";
const DEFAULT_ON_VALUE: &str = "Yes";

macro_rules! terminal_field {
    ($(#[$attribute:meta])* $field:ident) => {
        $(#[$attribute])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $field(Reference);

        impl $field {
            pub(crate) fn new(reference: Reference) -> Self {
                Self(reference)
            }
        }

        impl Field for $field {
            fn reference(&self) -> Reference {
                self.0
            }
        }
    };
}

terminal_field!(
    /// REFERENCE: [12.7.4.3 Text fields, p443-444]
    TextField
);
terminal_field!(
    /// A choice field showing a drop-down list
    ComboBox
);
terminal_field!(
    /// A choice field showing a scrollable list
    ListBox
);
terminal_field!(
    /// REFERENCE: [12.7.4.2.2 Pushbuttons, p440] Pushbuttons retain no value.
    PushButton
);
terminal_field!(
    /// REFERENCE: [12.7.4.2.4 Radio buttons, p442-443]
    RadioButton
);
terminal_field!(
    /// REFERENCE: [12.7.4.2.3 Check boxes, p440-441]
    CheckBox
);
terminal_field!(
    /// REFERENCE: [12.7.4.5 Signature fields, p448]
    SignatureField
);
terminal_field!(
    /// A terminal field with a missing or unknown `/FT`
    GenericField
);

/// REFERENCE: [Table 228 — Additional entries common to all fields containing
/// variable text, p439]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadding {
    Left = 0,
    Centered = 1,
    Right = 2,
}

impl TextField {
    pub fn create(context: &mut Context) -> Self {
        Self(context.register(Dictionary::from_iter([
            (KEY_FT, Object::from(FT_TEXT)),
            (KEY_KIDS, Array::new().into()),
        ])))
    }

    /// The value decoded as text
    pub fn text(&self, context: &Context) -> Option<String> {
        self.value(context).and_then(text)
    }

    pub fn max_length(&self, context: &Context) -> Option<usize> {
        context
            .dictionary(self.0)
            .ok()?
            .lookup_maybe(KEY_MAX_LEN, context, &[ObjectKind::Number])?
            .as_usize()
    }

    pub fn set_max_length(&self, context: &mut Context, max_length: Option<usize>) -> PdfResult<()> {
        let dictionary = context.dictionary_mut(self.0)?;
        match max_length {
            Some(max_length) => dictionary.set(KEY_MAX_LEN, max_length),
            None => dictionary.delete(KEY_MAX_LEN),
        };
        Ok(())
    }

    pub fn quadding(&self, context: &Context) -> Option<Quadding> {
        let quadding = context
            .dictionary(self.0)
            .ok()?
            .lookup_maybe(KEY_Q, context, &[ObjectKind::Number])?
            .as_i64()?;
        match quadding {
            0 => Some(Quadding::Left),
            1 => Some(Quadding::Centered),
            2 => Some(Quadding::Right),
            _ => None,
        }
    }

    pub fn set_quadding(&self, context: &mut Context, quadding: Quadding) -> PdfResult<()> {
        context
            .dictionary_mut(self.0)?
            .set(KEY_Q, quadding as i64);
        Ok(())
    }
}

impl TerminalField for TextField {
    fn type_name(&self) -> &'static str {
        stringify!(TextField)
    }

    /// Accepts either string form no longer than `/MaxLen`
    fn set_value(&self, context: &mut Context, value: Object) -> PdfResult<()> {
        let length = match &value {
            Object::String(string) => string.decode_text().chars().count(),
            Object::HexString(string) => string.decode_text().chars().count(),
            value => {
                return Err(ObjectErr::UnexpectedType {
                    expected: vec![ObjectKind::String, ObjectKind::HexString],
                    found: value.kind(),
                }
                .into())
            }
        };
        if let Some(max_length) = self.max_length(context) {
            if length > max_length {
                return Err(ObjectErr::InvalidValue(
                    KEY_MAX_LEN,
                    format!("{} characters exceed {}", length, max_length),
                )
                .into());
            }
        }
        context.dictionary_mut(self.0)?.set(KEY_V, value);
        Ok(())
    }
}

/// The behaviour shared by combo boxes and list boxes
///
/// REFERENCE: [12.7.4.4 Choice fields, p444-447]
pub trait ChoiceField: TerminalField {
    /// `/Opt` as pairs of export value and displayed text
    fn options(&self, context: &Context) -> Vec<(String, String)> {
        let options = context
            .dictionary(self.reference())
            .ok()
            .and_then(|dictionary| dictionary.lookup_maybe(KEY_OPT, context, &[ObjectKind::Array]))
            .and_then(Object::as_array);
        let options = match options {
            Some(options) => options,
            None => return Vec::new(),
        };
        options
            .iter()
            .filter_map(|option| match context.resolve(option) {
                Object::Array(pair) => {
                    let export = text(context.resolve(pair.get(0)?))?;
                    let display = pair
                        .get(1)
                        .and_then(|display| text(context.resolve(display)))
                        .unwrap_or_else(|| export.clone());
                    Some((export, display))
                }
                option => text(option).map(|option| (option.clone(), option)),
            })
            .collect()
    }

    /// The selected values, one or many
    fn values(&self, context: &Context) -> Vec<String> {
        match self.value(context) {
            Some(Object::Array(values)) => values
                .iter()
                .filter_map(|value| text(context.resolve(value)))
                .collect(),
            Some(value) => text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn is_multi_select(&self, context: &Context) -> bool {
        self.has_flag(context, flags::choice::MULTI_SELECT)
    }

    /// Replaces the selection. Only editable combo boxes accept values
    /// outside a non-empty `/Opt`.
    fn set_values(&self, context: &mut Context, values: &[&str]) -> PdfResult<()> {
        let field_flags = self.flags(context);
        let options = self.options(context);
        let editable = flags::is_set(field_flags, flags::choice::COMBO)
            && flags::is_set(field_flags, flags::choice::EDIT);
        if !editable && !options.is_empty() {
            if let Some(value) = values
                .iter()
                .find(|value| !options.iter().any(|(export, _)| export == *value))
            {
                return Err(PdfError::InvalidFieldValue {
                    field: self.reference(),
                    value: value.to_string(),
                    expected: options.into_iter().map(|(export, _)| export).collect(),
                });
            }
        }
        if values.len() > 1 && !flags::is_set(field_flags, flags::choice::MULTI_SELECT) {
            return Err(ObjectErr::InvalidValue(
                KEY_V,
                format!("{} values for a single-selection field", values.len()),
            )
            .into());
        }

        let dictionary = context.dictionary_mut(self.reference())?;
        match values {
            [] => {
                dictionary.delete(KEY_V);
            }
            [value] => {
                dictionary.set(KEY_V, PdfString::from_text(value));
            }
            values => {
                dictionary.set(
                    KEY_V,
                    values
                        .iter()
                        .map(|value| PdfString::from_text(value))
                        .collect::<Array>(),
                );
            }
        }
        // REFERENCE: [Table 232, p447] `/I` lists the selected indices of a
        // multiple selection in ascending order
        if values.len() > 1 {
            let indices = options
                .iter()
                .enumerate()
                .filter(|(_, (export, _))| values.contains(&export.as_str()))
                .map(|(index, _)| index)
                .collect::<Array>();
            dictionary.set(KEY_I, indices);
        } else {
            dictionary.delete(KEY_I);
        }
        Ok(())
    }
}

/// Choice values are text or, for multiple selection, arrays of text
fn choice_values(value: &Object, context: &Context) -> PdfResult<Vec<String>> {
    let unexpected = |found: &Object| -> PdfError {
        ObjectErr::UnexpectedType {
            expected: vec![ObjectKind::String, ObjectKind::HexString, ObjectKind::Array],
            found: found.kind(),
        }
        .into()
    };
    match value {
        Object::Array(values) => values
            .iter()
            .map(|value| {
                let value = context.resolve(value);
                text(value).ok_or_else(|| unexpected(value))
            })
            .collect(),
        value => text(value).map(|value| vec![value]).ok_or_else(|| unexpected(value)),
    }
}

macro_rules! choice_field {
    ($field:ident) => {
        impl ChoiceField for $field {}

        impl TerminalField for $field {
            fn type_name(&self) -> &'static str {
                stringify!($field)
            }

            fn set_value(&self, context: &mut Context, value: Object) -> PdfResult<()> {
                let values = choice_values(&value, context)?;
                let values = values.iter().map(String::as_str).collect::<Vec<_>>();
                self.set_values(context, &values)
            }
        }
    };
}

choice_field!(ComboBox);
choice_field!(ListBox);

impl TerminalField for PushButton {
    fn type_name(&self) -> &'static str {
        stringify!(PushButton)
    }
}

impl TerminalField for SignatureField {
    fn type_name(&self) -> &'static str {
        stringify!(SignatureField)
    }
}

impl TerminalField for GenericField {
    fn type_name(&self) -> &'static str {
        stringify!(GenericField)
    }
}

/// A button value must be a name from `accepted` or `Off`. Every widget shows
/// its on-state when it matches the value and `Off` otherwise.
fn set_button_state(
    field: &impl TerminalField,
    context: &mut Context,
    value: Object,
    accepted: &[Name],
) -> PdfResult<()> {
    let value = match value {
        Object::Name(value) => value,
        value => {
            return Err(ObjectErr::UnexpectedType {
                expected: vec![ObjectKind::Name],
                found: value.kind(),
            }
            .into())
        }
    };
    if value != STATE_OFF && !accepted.contains(&value) {
        return Err(PdfError::InvalidFieldValue {
            field: field.reference(),
            value: value.to_string(),
            expected: accepted
                .iter()
                .map(ToString::to_string)
                .chain([Name::from(STATE_OFF).to_string()])
                .collect(),
        });
    }

    context
        .dictionary_mut(field.reference())?
        .set(KEY_V, value.clone());
    for widget in field.widgets(context) {
        let state = match widget.on_value(context) {
            Some(on_value) if on_value == value => value.clone(),
            _ => Name::from(STATE_OFF),
        };
        widget.set_appearance_state(context, state)?;
    }
    Ok(())
}

/// `/V` as a name, `Off` when unset
fn button_state(field: &impl TerminalField, context: &Context) -> Name {
    field
        .value(context)
        .and_then(Object::as_name)
        .cloned()
        .unwrap_or_else(|| Name::from(STATE_OFF))
}

impl RadioButton {
    /// The on-state of each widget, one per option
    pub fn on_values(&self, context: &Context) -> Vec<Name> {
        self.widgets(context)
            .into_iter()
            .filter_map(|widget| widget.on_value(context))
            .collect()
    }

    /// The selected option, if any
    pub fn selected(&self, context: &Context) -> Option<Name> {
        Some(button_state(self, context)).filter(|state| *state != STATE_OFF)
    }
}

impl TerminalField for RadioButton {
    fn type_name(&self) -> &'static str {
        stringify!(RadioButton)
    }

    fn set_value(&self, context: &mut Context, value: Object) -> PdfResult<()> {
        let on_values = self.on_values(context);
        set_button_state(self, context, value, &on_values)
    }
}

impl CheckBox {
    pub fn create(context: &mut Context) -> Self {
        Self(context.register(Dictionary::from_iter([
            (KEY_FT, Object::from(FT_BUTTON)),
            (KEY_KIDS, Array::new().into()),
        ])))
    }

    /// The first widget's on-state, `Yes` when there is none
    pub fn on_value(&self, context: &Context) -> Name {
        self.widgets(context)
            .first()
            .and_then(|widget| widget.on_value(context))
            .unwrap_or_else(|| Name::from(DEFAULT_ON_VALUE))
    }

    pub fn is_checked(&self, context: &Context) -> bool {
        button_state(self, context) == self.on_value(context)
    }

    pub fn check(&self, context: &mut Context) -> PdfResult<()> {
        let on_value = self.on_value(context);
        self.set_value(context, on_value.into())
    }

    pub fn uncheck(&self, context: &mut Context) -> PdfResult<()> {
        self.set_value(context, Name::from(STATE_OFF).into())
    }
}

impl TerminalField for CheckBox {
    fn type_name(&self) -> &'static str {
        stringify!(CheckBox)
    }

    /// Only the on-state and `Off` are accepted
    fn set_value(&self, context: &mut Context, value: Object) -> PdfResult<()> {
        let on_value = self.on_value(context);
        set_button_state(self, context, value, &[on_value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::widget::KEY_AP;
    use crate::form::widget::KEY_AS;
    use crate::object::dictionary::KEY_PARENT;
    use crate::object::HexString;

    fn widget(context: &mut Context, parent: Reference, on_value: &str) -> Reference {
        let normal = Dictionary::from_iter([(on_value, Object::Null), (STATE_OFF, Object::Null)]);
        context.register(Dictionary::from_iter([
            ("Subtype", Object::from("Widget")),
            (KEY_AP, Dictionary::from_iter([("N", normal)]).into()),
            (KEY_PARENT, parent.into()),
        ]))
    }

    fn appearance_states(context: &Context, widgets: &[Reference]) -> Vec<Object> {
        widgets
            .iter()
            .map(|&widget| {
                context
                    .dictionary(widget)
                    .unwrap()
                    .get(KEY_AS)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn text_field_value() {
        let mut context = Context::new();
        let field = TextField::create(&mut context);
        assert_eq!(field.text(&context), None);
        field
            .set_value(&mut context, PdfString::from_text("Zürich").into())
            .unwrap();
        assert_eq!(field.text(&context), Some("Zürich".to_string()));
        field
            .set_value(&mut context, HexString::from_text("Bern").into())
            .unwrap();
        assert_eq!(field.text(&context), Some("Bern".to_string()));

        assert_eq!(
            field.set_value(&mut context, Object::from("Bern")),
            Err(ObjectErr::UnexpectedType {
                expected: vec![ObjectKind::String, ObjectKind::HexString],
                found: ObjectKind::Name
            }
            .into())
        );

        field.set_max_length(&mut context, Some(3)).unwrap();
        assert_eq!(field.max_length(&context), Some(3));
        assert!(matches!(
            field.set_value(&mut context, PdfString::from_text("Basel").into()),
            Err(PdfError::Object(ObjectErr::InvalidValue(KEY_MAX_LEN, _)))
        ));

        field.set_quadding(&mut context, Quadding::Right).unwrap();
        assert_eq!(field.quadding(&context), Some(Quadding::Right));
    }

    #[test]
    fn choice_field_values() {
        let mut context = Context::new();
        let options = Array::from_iter([
            Object::from(PdfString::from_text("red")),
            Array::from_iter([PdfString::from_text("g"), PdfString::from_text("Green")]).into(),
            Object::from(PdfString::from_text("blue")),
        ]);
        let field = ListBox::new(context.register(Dictionary::from_iter([
            (KEY_FT, Object::from("Ch")),
            (KEY_OPT, options.into()),
        ])));
        assert_eq!(
            field.options(&context),
            vec![
                ("red".to_string(), "red".to_string()),
                ("g".to_string(), "Green".to_string()),
                ("blue".to_string(), "blue".to_string()),
            ]
        );

        field.set_values(&mut context, &["g"]).unwrap();
        assert_eq!(field.values(&context), vec!["g".to_string()]);

        assert_eq!(
            field.set_values(&mut context, &["purple"]),
            Err(PdfError::InvalidFieldValue {
                field: field.reference(),
                value: "purple".to_string(),
                expected: vec!["red".to_string(), "g".to_string(), "blue".to_string()],
            })
        );
        assert!(matches!(
            field.set_values(&mut context, &["red", "blue"]),
            Err(PdfError::Object(ObjectErr::InvalidValue(KEY_V, _)))
        ));

        field
            .set_flag(&mut context, flags::choice::MULTI_SELECT, true)
            .unwrap();
        let selection = Array::from_iter([
            PdfString::from_text("blue"),
            PdfString::from_text("red"),
        ]);
        field.set_value(&mut context, selection.into()).unwrap();
        assert_eq!(
            field.values(&context),
            vec!["blue".to_string(), "red".to_string()]
        );
        assert_eq!(
            context.dictionary(field.reference()).unwrap().get(KEY_I),
            Some(&Array::from_iter([0, 2]).into())
        );

        field.set_values(&mut context, &[]).unwrap();
        assert!(field.values(&context).is_empty());
    }

    #[test]
    fn combo_box_editable() {
        let mut context = Context::new();
        let field = ComboBox::new(context.register(Dictionary::from_iter([
            (KEY_FT, Object::from("Ch")),
            (
                KEY_OPT,
                Array::from_iter([PdfString::from_text("a")]).into(),
            ),
            (
                "Ff",
                Object::from(flags::choice::COMBO | flags::choice::EDIT),
            ),
        ])));
        field.set_values(&mut context, &["typed"]).unwrap();
        assert_eq!(field.values(&context), vec!["typed".to_string()]);
    }

    #[test]
    fn check_box_contract() {
        let mut context = Context::new();
        let field = CheckBox::create(&mut context);
        let first = widget(&mut context, field.reference(), "On");
        let second = widget(&mut context, field.reference(), "On");
        field.add_widget(&mut context, first).unwrap();
        field.add_widget(&mut context, second).unwrap();

        assert_eq!(field.on_value(&context), Name::from("On"));
        assert!(!field.is_checked(&context));

        field.check(&mut context).unwrap();
        assert!(field.is_checked(&context));
        assert_eq!(field.value(&context), Some(&Object::from("On")));
        assert_eq!(
            appearance_states(&context, &[first, second]),
            vec![Object::from("On"), Object::from("On")]
        );

        field.uncheck(&mut context).unwrap();
        assert_eq!(
            appearance_states(&context, &[first, second]),
            vec![Object::from("Off"), Object::from("Off")]
        );

        assert_eq!(
            field.set_value(&mut context, Object::from("Yes")),
            Err(PdfError::InvalidFieldValue {
                field: field.reference(),
                value: "/Yes".to_string(),
                expected: vec!["/On".to_string(), "/Off".to_string()],
            })
        );
        // The rejected value leaves the field untouched
        assert_eq!(field.value(&context), Some(&Object::from("Off")));
    }

    #[test]
    fn check_box_default_on_value() {
        let mut context = Context::new();
        let field = CheckBox::create(&mut context);
        assert_eq!(field.on_value(&context), Name::from("Yes"));
        field
            .set_value(&mut context, Object::from("Yes"))
            .unwrap();
        assert!(field.is_checked(&context));
    }

    #[test]
    fn radio_button_options() {
        let mut context = Context::new();
        let field = RadioButton::new(context.register(Dictionary::from_iter([
            (KEY_FT, Object::from(FT_BUTTON)),
            ("Ff", Object::from(flags::button::RADIO)),
            (KEY_KIDS, Array::new().into()),
        ])));
        let left = widget(&mut context, field.reference(), "Left");
        let right = widget(&mut context, field.reference(), "Right");
        field.add_widget(&mut context, left).unwrap();
        field.add_widget(&mut context, right).unwrap();

        assert_eq!(
            field.on_values(&context),
            vec![Name::from("Left"), Name::from("Right")]
        );
        assert_eq!(field.selected(&context), None);
        field
            .set_value(&mut context, Object::from("Right"))
            .unwrap();
        assert_eq!(field.selected(&context), Some(Name::from("Right")));
        assert_eq!(
            appearance_states(&context, &[left, right]),
            vec![Object::from("Off"), Object::from("Right")]
        );
        assert!(matches!(
            field.set_value(&mut context, Object::from("Middle")),
            Err(PdfError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn push_button_has_no_value() {
        let mut context = Context::new();
        let field = PushButton::new(context.register(Dictionary::new()));
        assert_eq!(
            field.set_value(&mut context, Object::from("On")),
            Err(PdfError::MethodNotImplemented {
                type_name: "PushButton",
                method: "set_value"
            })
        );
    }
}
