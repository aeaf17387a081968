use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_expression_attribute;
use crate::error::{Error, Result};

/// `<c:forEach>` over a collection or a numeric range.
#[derive(Default)]
pub struct ForEachConverter {
    header: String,
}

impl Converter for ForEachConverter {
    fn tag(&self) -> &str {
        "c:forEach"
    }

    // Loop status objects and sub-ranges of a collection have no jte
    // equivalent; such loops are left for manual conversion.
    fn can_convert(&self, tag: &Tag, _parent: Option<&dyn Converter>) -> bool {
        let attributes = &tag.attributes;
        let collection_range = attributes.contains("items")
            && ["begin", "end", "step"].iter().any(|name| attributes.contains(name));
        tag.name == self.tag() && !attributes.contains("varStatus") && !collection_range
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(ForEachConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        let var = tag.required("var")?;

        if let Some(items) = tag.attributes.get("items") {
            self.header = format!("@for(var {} : {})", var, convert_expression_attribute(items)?);
            return Ok(());
        }

        let Some(begin) = tag.attributes.get("begin") else {
            return Err(Error::config_missing_attribute(&tag.name, "items"));
        };
        let begin = convert_expression_attribute(begin)?;
        let end = convert_expression_attribute(tag.required("end")?)?;
        let step = match tag.attributes.get("step") {
            Some(step) => format!("{} += {}", var, convert_expression_attribute(step)?),
            None => format!("{}++", var),
        };
        self.header = format!("@for(int {var} = {begin}; {var} <= {end}; {step})");
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.append(&self.header);
        Ok(())
    }

    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.append("@endfor");
        Ok(())
    }
}
