use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::error::Result;

/// Source comments are kept; jte shares the `<%-- --%>` syntax.
#[derive(Default)]
pub struct CommentConverter {
    text: String,
}

impl Converter for CommentConverter {
    fn tag(&self) -> &str {
        "%--"
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(CommentConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.text = tag.body.clone().unwrap_or_default();
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.write_literal(&format!("<%--{}--%>", self.text));
        Ok(())
    }
}
