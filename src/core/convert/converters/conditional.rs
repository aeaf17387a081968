use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_expression_attribute;
use crate::error::Result;

/// `<c:if test="...">` without `var`.
#[derive(Default)]
pub struct IfConverter {
    condition: String,
}

impl Converter for IfConverter {
    fn tag(&self) -> &str {
        "c:if"
    }

    // With `var` the tag stores its result instead of guarding a body.
    fn can_convert(&self, tag: &Tag, _parent: Option<&dyn Converter>) -> bool {
        tag.name == self.tag() && !tag.attributes.contains("var")
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(IfConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.condition = convert_expression_attribute(tag.required("test")?)?;
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.append(&format!("@if({})", self.condition));
        Ok(())
    }

    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.append("@endif");
        Ok(())
    }
}
