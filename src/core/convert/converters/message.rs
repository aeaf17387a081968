//! Localized messages: `<fmt:message>` with nested `<fmt:param>` values
//! flattened into one lookup call.

use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_attribute_value;
use crate::error::Result;

const MESSAGE: &str = "fmt:message";

pub struct FormatMessageConverter {
    function: String,
    key: String,
    var: Option<String>,
}

impl FormatMessageConverter {
    /// `function` is the lookup the generated code calls, e.g. `localize`.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            key: String::new(),
            var: None,
        }
    }
}

impl Converter for FormatMessageConverter {
    fn tag(&self) -> &str {
        MESSAGE
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(FormatMessageConverter::new(self.function.clone()))
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.key = convert_attribute_value(tag.required("key")?)?;
        self.var = tag.attributes.get("var").map(str::to_string);
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        let call = format!("{}({}", self.function, self.key);
        match &self.var {
            Some(var) => ctx.append(&format!("!{{var {} = {}", var, call)),
            None => ctx.append(&format!("${{{}", call)),
        }
        Ok(())
    }

    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.append(if self.var.is_some() { ");}" } else { ")}" });
        Ok(())
    }

    /// Closes the call right after its last argument.
    fn drop_closing_tag_line(&self) -> bool {
        true
    }
}

/// One argument of the enclosing message lookup, given by `value` or by
/// the tag body.
#[derive(Default)]
pub struct FormatParamConverter {
    value: Option<String>,
    body: String,
}

impl Converter for FormatParamConverter {
    fn tag(&self) -> &str {
        "fmt:param"
    }

    fn can_convert(&self, tag: &Tag, parent: Option<&dyn Converter>) -> bool {
        tag.name == self.tag() && parent.is_some_and(|parent| parent.tag() == MESSAGE)
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(FormatParamConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.value = tag
            .attributes
            .get("value")
            .map(convert_attribute_value)
            .transpose()?;
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        if let Some(value) = &self.value {
            ctx.append(&format!(", {}", value));
        }
        Ok(())
    }

    // The body is trimmed like JSTL trims it; `value` wins over a body.
    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        if self.value.is_none() {
            let argument = convert_attribute_value(self.body.trim())?;
            ctx.append(&format!(", {}", argument));
        }
        Ok(())
    }

    fn collect_body(&mut self, source: &str) -> bool {
        self.body.push_str(source);
        true
    }

    fn drop_opening_tag_line(&self) -> bool {
        true
    }

    fn drop_closing_tag_line(&self) -> bool {
        true
    }

    fn drop_line_break_after_tag(&self) -> bool {
        true
    }
}
