//! Page-level directives: `<%@ taglib %>`, `<%@ tag %>`, `<%@ page %>` and
//! `<%@ attribute %>`.

use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::error::Result;

/// Tag-library declarations have no jte counterpart; the line disappears.
pub struct TaglibConverter;

impl Converter for TaglibConverter {
    fn tag(&self) -> &str {
        "@taglib"
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(TaglibConverter)
    }

    fn convert_tag_begin(&mut self, _ctx: &mut ConversionContext) -> Result<()> {
        Ok(())
    }

    fn drop_opening_tag_line(&self) -> bool {
        true
    }
}

/// `<%@ tag %>` and `<%@ page %>`. Only the `import` attribute survives,
/// as one `@import` line per entry.
pub struct PageDirectiveConverter {
    directive: &'static str,
    imports: Vec<String>,
}

impl PageDirectiveConverter {
    pub fn new(directive: &'static str) -> Self {
        Self {
            directive,
            imports: Vec::new(),
        }
    }
}

impl Converter for PageDirectiveConverter {
    fn tag(&self) -> &str {
        self.directive
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(PageDirectiveConverter::new(self.directive))
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.imports = tag
            .attributes
            .get("import")
            .map(|imports| {
                imports
                    .split(',')
                    .map(str::trim)
                    .filter(|import| !import.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        let lines: Vec<String> = self
            .imports
            .iter()
            .map(|import| format!("@import {}", import))
            .collect();
        let separator = ctx.formatting().line_separator.clone();
        ctx.append(&lines.join(&separator));
        Ok(())
    }

    fn drop_opening_tag_line(&self) -> bool {
        self.imports.is_empty()
    }
}

/// `<%@ attribute name="x" %>` becomes a template parameter.
#[derive(Default)]
pub struct AttributeConverter {
    name: String,
    java_type: String,
    default_value: Option<&'static str>,
}

fn default_for(java_type: &str) -> &'static str {
    match java_type {
        "boolean" => "false",
        "int" | "long" | "short" | "byte" | "double" | "float" => "0",
        "char" => "'\\0'",
        _ => "null",
    }
}

impl Converter for AttributeConverter {
    fn tag(&self) -> &str {
        "@attribute"
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(AttributeConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.name = tag.required("name")?.to_string();

        let fragment = tag.attributes.get("fragment") == Some("true");
        self.java_type = if fragment {
            "gg.jte.Content".to_string()
        } else {
            let declared = tag.attributes.get("type").unwrap_or("String").trim();
            declared
                .strip_prefix("java.lang.")
                .unwrap_or(declared)
                .to_string()
        };

        let required = tag
            .attributes
            .get("required")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        self.default_value = if required {
            None
        } else {
            Some(default_for(&self.java_type))
        };
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        let mut param = format!("@param {} {}", self.java_type, self.name);
        if let Some(default_value) = self.default_value {
            param.push_str(" = ");
            param.push_str(default_value);
        }
        ctx.append(&param);
        Ok(())
    }
}
