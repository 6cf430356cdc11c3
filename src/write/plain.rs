use super::serialize::Serializer;
use super::stream::CompressionPlan;
use super::xref::size;
use super::xref::table;
use super::xref::trailer_entries;
use super::xref::Location;
use super::Strategy;
use crate::context::Context;
use crate::error::PdfError;
use crate::error::PdfResult;
use crate::parse::EOF;
use crate::parse::KW_STARTXREF;
use crate::parse::KW_TRAILER;
use crate::Byte;
use crate::ObjectNumber;
use crate::Offset;

/// Every object at its own offset, located by a classic cross-reference
/// table and a trailer dictionary.
///
/// REFERENCE: [7.5 File structure, p53-60]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Plain;

impl Strategy for Plain {
    fn plan(&self, context: &Context) -> PdfResult<CompressionPlan> {
        Ok(CompressionPlan::uncompressed(context))
    }

    fn finish(
        &self,
        serializer: &Serializer,
        context: &Context,
        _plan: &CompressionPlan,
        mut locations: Vec<(ObjectNumber, Location)>,
        offset: Offset,
    ) -> PdfResult<Vec<Byte>> {
        locations.insert(0, (0, Location::FreeHead));
        let mut tail = table(&locations);
        let trailer = trailer_entries(&context.trailer_info, size(&locations));
        tail.extend_from_slice(KW_TRAILER.as_bytes());
        tail.push(b'\n');
        serializer
            .object(&mut tail, &trailer.into())
            .map_err(|err| PdfError::write(None, err))?;
        tail.extend_from_slice(format!("\n{}\n{}\n{}\n", KW_STARTXREF, offset, EOF).as_bytes());
        Ok(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Reference;

    #[test]
    fn plain_finish() {
        let mut context = Context::new();
        context.trailer_info.root = Some(Reference::new(1, 0));
        let locations = vec![(
            1,
            Location::Offset {
                offset: 15,
                generation: 0,
            },
        )];
        let tail = Plain
            .finish(
                &Serializer::new(true),
                &context,
                &CompressionPlan::default(),
                locations,
                48,
            )
            .unwrap();
        assert_eq!(
            String::from_utf8(tail).unwrap(),
            "xref\n0 2\n0000000000 65535 f\r\n0000000015 00000 n\r\n\
             trailer\n<<\n/Size 2\n/Root 1 0 R\n>>\nstartxref\n48\n%%EOF\n"
        );
    }
}
