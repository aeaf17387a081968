use super::{Converter, Tag};
use crate::convert::attributes::skip_expression;
use crate::convert::context::ConversionContext;
use crate::convert::expression::translate;
use crate::error::{Error, Result};

/// Rewrite every unescaped `${}` in raw tag text to its Java form, so tags
/// left as they are still evaluate in jte.
fn translate_expressions(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut copied = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        let escaped = i > 0 && bytes[i - 1] == b'\\';
        if bytes[i] == b'$' && bytes[i + 1] == b'{' && !escaped {
            let end = skip_expression(bytes, i)
                .ok_or_else(|| Error::syntax_unterminated(format!("expression in '{}'", raw), None))?;
            out.push_str(&raw[copied..i]);
            out.push_str(&format!("${{{}}}", translate(&raw[i..end])?));
            copied = end;
            i = end;
        } else {
            i += 1;
        }
    }

    out.push_str(&raw[copied..]);
    Ok(out)
}

/// Stands in for tags no registered converter accepts. The tag is written
/// back as found, and its closing tag with it, so nesting stays balanced.
#[derive(Default)]
pub struct PassThrough {
    name: String,
    raw: String,
    self_closing: bool,
}

impl Converter for PassThrough {
    fn tag(&self) -> &str {
        &self.name
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(PassThrough::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.name = tag.name.clone();
        self.raw = translate_expressions(&tag.raw)?;
        self.self_closing = tag.self_closing;
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        ctx.write_literal(&self.raw);
        Ok(())
    }

    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        if !self.self_closing {
            ctx.write_literal(&format!("</{}>", self.name));
        }
        Ok(())
    }
}
