use ::indexmap::IndexMap;
use ::log::warn;
use ::std::collections::HashSet;

use super::content::ContentStream;
use super::Document;
use crate::context::Context;
use crate::error::PdfResult;
use crate::object::dictionary::KEY_KIDS;
use crate::object::dictionary::KEY_PARENT;
use crate::object::dictionary::KEY_TYPE;
use crate::object::Array;
use crate::object::Dictionary;
use crate::object::Name;
use crate::object::Object;
use crate::object::ObjectErr;
use crate::object::ObjectKind;
use crate::object::Rectangle;
use crate::object::Reference;
use crate::object::Stream;
use crate::Byte;

pub(crate) const KEY_PAGES: &str = "Pages";
pub(crate) const KEY_COUNT: &str = "Count";
const KEY_MEDIA_BOX: &str = "MediaBox";
const KEY_RESOURCES: &str = "Resources";
const KEY_CONTENTS: &str = "Contents";
const KEY_FONT: &str = "Font";
const KEY_XOBJECT: &str = "XObject";
pub(crate) const TYPE_PAGES: &str = "Pages";
const TYPE_PAGE: &str = "Page";

/// A leaf of the page tree
///
/// REFERENCE: [7.7.3.3 Page objects, p76-80]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef(Reference);

impl PageRef {
    pub fn reference(&self) -> Reference {
        self.0
    }

    /// REFERENCE: [7.7.3.4 Inheritance of page attributes, p80] The first
    /// definition found walking up from the page wins.
    fn inherited<'a>(&self, context: &'a Context, key: &str) -> Option<&'a Object> {
        let mut visited = HashSet::new();
        let mut next = Some(self.0);
        while let Some(node) = next {
            if !visited.insert(node) {
                warn!("Page tree cycle at {}", node);
                return None;
            }
            let dictionary = context.dictionary(node).ok()?;
            if let Some(value) = dictionary.get(key) {
                return Some(context.resolve(value));
            }
            next = dictionary.get(KEY_PARENT).and_then(Object::as_reference);
        }
        None
    }

    pub fn media_box(&self, context: &Context) -> PdfResult<Rectangle> {
        let media_box = self
            .inherited(context, KEY_MEDIA_BOX)
            .ok_or(ObjectErr::MissingEntry(KEY_MEDIA_BOX))?;
        Ok(context.lookup_array(media_box)?.as_rectangle(context)?)
    }

    /// The resource dictionary, possibly inherited
    pub fn resources<'a>(&self, context: &'a Context) -> Option<&'a Dictionary> {
        self.inherited(context, KEY_RESOURCES)
            .and_then(Object::as_dictionary)
    }

    /// The decoded content streams, concatenated with a line break between
    /// them
    ///
    /// REFERENCE: [7.8.2 Content streams, p82]
    pub fn contents(&self, context: &Context) -> PdfResult<Vec<Byte>> {
        let dictionary = context.dictionary(self.0)?;
        let streams = match dictionary.lookup_maybe(KEY_CONTENTS, context, &[]) {
            Some(Object::Array(array)) => array
                .iter()
                .filter_map(|stream| context.lookup_maybe(stream, &[ObjectKind::Stream]))
                .filter_map(Object::as_stream)
                .collect(),
            Some(Object::Stream(stream)) => vec![stream],
            _ => Vec::new(),
        };
        let mut contents = Vec::new();
        for stream in streams {
            if !contents.is_empty() {
                contents.push(b'\n');
            }
            contents.extend(stream.decode(context)?);
        }
        Ok(contents)
    }
}

impl Document {
    /// The page tree root named by the catalog
    fn page_tree(&self) -> Option<Reference> {
        self.context
            .catalog()
            .ok()?
            .get(KEY_PAGES)
            .and_then(Object::as_reference)
    }

    /// Every page in document order. Nodes reached twice are skipped.
    pub fn pages(&self) -> Vec<PageRef> {
        let mut pending = match self.page_tree() {
            Some(root) => vec![root],
            None => return Vec::new(),
        };
        let mut visited = HashSet::new();
        let mut pages = Vec::new();
        while let Some(node) = pending.pop() {
            if !visited.insert(node) {
                warn!("Page tree node {} is reachable more than once", node);
                continue;
            }
            let dictionary = match self.context.dictionary(node) {
                Ok(dictionary) => dictionary,
                Err(err) => {
                    warn!("Page tree node {}: {}", node, err);
                    continue;
                }
            };
            let is_intermediate = dictionary.has_type(TYPE_PAGES)
                || (!dictionary.has_type(TYPE_PAGE) && dictionary.has(KEY_KIDS));
            if !is_intermediate {
                pages.push(PageRef(node));
                continue;
            }
            if let Some(kids) = dictionary
                .lookup_maybe(KEY_KIDS, &self.context, &[ObjectKind::Array])
                .and_then(Object::as_array)
            {
                pending.extend(kids.iter().rev().filter_map(Object::as_reference));
            }
        }
        pages
    }

    /// Appends a page of `[width, height]` points to the page tree root
    pub fn add_page(&mut self, size: [f64; 2]) -> PdfResult<PageRef> {
        let root = match self.page_tree() {
            Some(root) => root,
            None => {
                let root = self.context.register(Dictionary::from_iter([
                    (KEY_TYPE, Object::from(TYPE_PAGES)),
                    (KEY_KIDS, Array::new().into()),
                    (KEY_COUNT, 0.into()),
                ]));
                let catalog = self
                    .context
                    .trailer_info
                    .root
                    .ok_or(ObjectErr::MissingEntry("Root"))?;
                self.context.dictionary_mut(catalog)?.set(KEY_PAGES, root);
                root
            }
        };
        let [width, height] = size;
        let page = self.context.register(Dictionary::from_iter([
            (KEY_TYPE, Object::from(TYPE_PAGE)),
            (KEY_PARENT, root.into()),
            (
                KEY_MEDIA_BOX,
                Array::from(Rectangle {
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                })
                .into(),
            ),
            (KEY_RESOURCES, Dictionary::new().into()),
        ]));

        let indirect_kids = self
            .context
            .dictionary(root)?
            .get(KEY_KIDS)
            .and_then(Object::as_reference);
        let pushed = indirect_kids
            .and_then(|kids| self.context.get_mut(kids))
            .and_then(Object::as_array_mut)
            .map(|kids| kids.push(page))
            .is_some();
        let tree = self.context.dictionary_mut(root)?;
        if !pushed {
            match tree.get_mut(KEY_KIDS).and_then(Object::as_array_mut) {
                Some(kids) => kids.push(page),
                None => {
                    tree.set(KEY_KIDS, Array::from_iter([page]));
                }
            }
        }
        let count = tree.get(KEY_COUNT).and_then(Object::as_i64).unwrap_or(0);
        tree.set(KEY_COUNT, count + 1);
        Ok(PageRef(page))
    }

    /// Registers `content` as a new stream appended to the page's `/Contents`
    /// and lists the fonts and images it draws in the page resources
    pub fn add_content(&mut self, page: PageRef, content: ContentStream) -> PdfResult<()> {
        let page = page.0;
        let ContentStream {
            fonts, images, ..
        } = &content;
        self.merge_resources(page, KEY_FONT, fonts)?;
        self.merge_resources(page, KEY_XOBJECT, images)?;
        let stream = self
            .context
            .register(Stream::flate(Dictionary::new(), content.into_bytes(), true));

        let current = self.context.dictionary(page)?.get(KEY_CONTENTS).cloned();
        let contents = match current {
            None | Some(Object::Null) => Object::from(stream),
            Some(Object::Array(mut array)) => {
                array.push(stream);
                array.into()
            }
            Some(Object::Reference(reference))
                if matches!(self.context.get(reference), Some(Object::Array(_))) =>
            {
                if let Some(array) = self.context.get_mut(reference).and_then(Object::as_array_mut) {
                    array.push(stream);
                }
                return Ok(());
            }
            Some(existing) => Array::from_iter([existing, stream.into()]).into(),
        };
        self.context
            .dictionary_mut(page)?
            .set(KEY_CONTENTS, contents);
        Ok(())
    }

    /// Adds `entries` to the `category` subdictionary of the page resources.
    /// Inherited resources are copied onto the page first and indirect
    /// dictionaries are updated in place.
    fn merge_resources(
        &mut self,
        page: Reference,
        category: &str,
        entries: &IndexMap<Name, Reference>,
    ) -> PdfResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let context = &self.context;
        let own = context.dictionary(page)?.get(KEY_RESOURCES);
        let resources_reference = own.and_then(Object::as_reference);
        let mut resources = PageRef(page)
            .resources(context)
            .cloned()
            .unwrap_or_default();
        let category_reference = resources.get(category).and_then(Object::as_reference);
        let mut category_dictionary = resources
            .lookup_maybe(category, context, &[ObjectKind::Dictionary])
            .and_then(Object::as_dictionary)
            .cloned()
            .unwrap_or_default();

        for (name, reference) in entries {
            category_dictionary.set(name.clone(), *reference);
        }
        match category_reference {
            Some(reference) => self.context.assign(reference, category_dictionary),
            None => {
                resources.set(category, category_dictionary);
            }
        }
        match resources_reference {
            Some(reference) => self.context.assign(reference, resources),
            None => {
                self.context
                    .dictionary_mut(page)?
                    .set(KEY_RESOURCES, resources);
            }
        }
        Ok(())
    }
}
