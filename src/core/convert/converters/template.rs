use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_attribute_value;
use crate::error::Result;

/// The inclusion tag left behind by usage rewriting, e.g.
/// `<my:jte jte="tag/my/simple.jte" title="${t}"/>`, becomes a template call.
pub struct TemplateTagConverter {
    tag_name: String,
    template: String,
    arguments: Vec<String>,
    has_body: bool,
}

impl TemplateTagConverter {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            template: String::new(),
            arguments: Vec::new(),
            has_body: false,
        }
    }
}

impl Converter for TemplateTagConverter {
    fn tag(&self) -> &str {
        &self.tag_name
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(TemplateTagConverter::new(self.tag_name.clone()))
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        let file = tag.required("jte")?;
        self.template = file.strip_suffix(".jte").unwrap_or(file).replace('/', ".");

        self.arguments = tag
            .attributes
            .iter()
            .filter(|(name, _)| *name != "jte")
            .map(|(name, value)| -> Result<String> {
                Ok(format!("{} = {}", name, convert_attribute_value(value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.has_body = !tag.self_closing;
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        let mut arguments = self.arguments.clone();
        if self.has_body {
            arguments.push("content = @`".to_string());
        }
        let mut call = format!("@template.{}({}", self.template, arguments.join(", "));
        if !self.has_body {
            call.push(')');
        }
        ctx.append(&call);
        Ok(())
    }

    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        if self.has_body {
            ctx.append("`)");
        }
        Ok(())
    }
}
