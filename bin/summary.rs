use ::pdfdoc::Document;
use ::pdfdoc::ObjectKind;
use ::pdfdoc::Version;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

/// What the command line reports for each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Summary {
    version: Version,
    objects: usize,
    invalid: usize,
    pages: usize,
    fields: usize,
}

impl Summary {
    pub(super) fn new(document: &Document) -> Self {
        let context = document.context();
        let invalid = context
            .enumerate_indirect_objects()
            .filter(|(_, object)| object.kind() == ObjectKind::Invalid)
            .count();
        let fields = match document.form() {
            Ok(Some(form)) => form.all_fields(context).len(),
            _ => 0,
        };
        Self {
            version: context.version(),
            objects: context.object_count(),
            invalid,
            pages: document.pages().len(),
            fields,
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}, {} objects ({} invalid), {} pages, {} form fields",
            self.version, self.objects, self.invalid, self.pages, self.fields
        )
    }
}
