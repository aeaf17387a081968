use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_attribute_value;
use crate::error::Result;

/// `<c:out value="..."/>`
#[derive(Default)]
pub struct OutConverter {
    expression: String,
    unescaped: bool,
}

impl Converter for OutConverter {
    fn tag(&self) -> &str {
        "c:out"
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(OutConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        let value = convert_attribute_value(tag.required("value")?)?;
        self.expression = match tag.attributes.get("default") {
            Some(default) => format!(
                "{} != null ? {} : {}",
                value,
                value,
                convert_attribute_value(default)?
            ),
            None => value,
        };
        self.unescaped = tag
            .attributes
            .get("escapeXml")
            .is_some_and(|escape| escape.trim() == "false");
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        let marker = if self.unescaped { "$unsafe" } else { "$" };
        ctx.append(&format!("{}{{{}}}", marker, self.expression));
        Ok(())
    }
}
