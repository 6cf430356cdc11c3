use crate::context::Context;
use crate::error::PdfResult;
use crate::object::Name;
use crate::object::Object;
use crate::object::ObjectKind;
use crate::object::Rectangle;
use crate::object::Reference;

pub(crate) const KEY_AP: &str = "AP";
pub(crate) const KEY_AS: &str = "AS";
pub(crate) const KEY_RECT: &str = "Rect";
/// REFERENCE: [Table 168 — Entries in an appearance dictionary, p390]
const APPEARANCES: [&str; 2] = ["N", "D"];
pub(crate) const STATE_OFF: &str = "Off";

/// A widget annotation presenting a terminal field on a page
///
/// REFERENCE: [12.5.6.19 Widget annotations, p408-410]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Widget(Reference);

impl Widget {
    pub(crate) fn new(reference: Reference) -> Self {
        Self(reference)
    }

    pub fn reference(&self) -> Reference {
        self.0
    }

    /// The first appearance state other than `Off`, from the normal
    /// appearances or else the down appearances
    pub fn on_value(&self, context: &Context) -> Option<Name> {
        let dictionary = context.dictionary(self.0).ok()?;
        let appearances = dictionary
            .lookup_maybe(KEY_AP, context, &[ObjectKind::Dictionary])?
            .as_dictionary()?;
        APPEARANCES.iter().find_map(|key| {
            appearances
                .lookup_maybe(key, context, &[ObjectKind::Dictionary])?
                .as_dictionary()?
                .keys()
                .find(|state| *state != STATE_OFF)
                .cloned()
        })
    }

    /// `/AS`
    pub fn appearance_state(&self, context: &Context) -> Option<Name> {
        context
            .dictionary(self.0)
            .ok()?
            .lookup_maybe(KEY_AS, context, &[ObjectKind::Name])
            .and_then(Object::as_name)
            .cloned()
    }

    pub fn set_appearance_state(&self, context: &mut Context, state: Name) -> PdfResult<()> {
        context.dictionary_mut(self.0)?.set(KEY_AS, state);
        Ok(())
    }

    pub fn rectangle(&self, context: &Context) -> PdfResult<Rectangle> {
        let dictionary = context.dictionary(self.0)?;
        let rectangle = dictionary.lookup_required(KEY_RECT, context, &[ObjectKind::Array])?;
        Ok(context.lookup_array(rectangle)?.as_rectangle(context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Array;
    use crate::object::Dictionary;
    use crate::object::ObjectErr;

    #[test]
    fn widget_on_value() {
        let mut context = Context::new();
        let on = context.register(Dictionary::new());
        let normal = Dictionary::from_iter([("Off", Object::Null), ("Choice1", on.into())]);
        let widget = Widget::new(context.register(Dictionary::from_iter([(
            KEY_AP,
            Dictionary::from_iter([("N", normal)]),
        )])));
        assert_eq!(widget.on_value(&context), Some(Name::from("Choice1")));

        // Down appearances when there is no normal one
        let down = Dictionary::from_iter([("Off", Object::Null), ("Yes", Object::Null)]);
        let widget = Widget::new(context.register(Dictionary::from_iter([(
            KEY_AP,
            Dictionary::from_iter([("D", down)]),
        )])));
        assert_eq!(widget.on_value(&context), Some(Name::from("Yes")));

        let widget = Widget::new(context.register(Dictionary::new()));
        assert_eq!(widget.on_value(&context), None);
    }

    #[test]
    fn widget_appearance_state() {
        let mut context = Context::new();
        let widget = Widget::new(context.register(Dictionary::new()));
        assert_eq!(widget.appearance_state(&context), None);
        widget
            .set_appearance_state(&mut context, Name::from("Off"))
            .unwrap();
        assert_eq!(widget.appearance_state(&context), Some(Name::from("Off")));
    }

    #[test]
    fn widget_rectangle() {
        let mut context = Context::new();
        let widget = Widget::new(context.register(Dictionary::from_iter([(
            KEY_RECT,
            Array::from_iter([10, 20, 110, 40]),
        )])));
        let rectangle = widget.rectangle(&context).unwrap();
        assert_eq!(rectangle.width, 100.0);
        assert_eq!(rectangle.height, 20.0);

        let widget = Widget::new(context.register(Dictionary::from_iter([(
            KEY_RECT,
            Array::from_iter([10, 20]),
        )])));
        assert_eq!(
            widget.rectangle(&context),
            Err(ObjectErr::NotARectangle(2).into())
        );
    }
}
