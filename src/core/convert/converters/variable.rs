use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_attribute_value;
use crate::error::Result;

/// `<c:set var="x" value="..."/>` as a local variable.
#[derive(Default)]
pub struct SetConverter {
    var: String,
    value: String,
}

impl Converter for SetConverter {
    fn tag(&self) -> &str {
        "c:set"
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(SetConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.var = tag.required("var")?.to_string();
        self.value = convert_attribute_value(tag.required("value")?)?;
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.append(&format!("!{{var {} = {};}}", self.var, self.value));
        Ok(())
    }
}
