//! Converter plugins, one per source construct.
//!
//! Each registered converter is a prototype: the engine asks it whether it
//! accepts a tag, then works on a fresh instance from [`Converter::new_instance`]
//! for that single occurrence.

pub mod choose;
pub mod comment;
pub mod conditional;
pub mod directives;
pub mod for_each;
pub mod message;
pub mod output;
pub mod passthrough;
pub mod template;
pub mod variable;

pub use choose::{ChooseConverter, OtherwiseConverter, WhenConverter};
pub use comment::CommentConverter;
pub use conditional::IfConverter;
pub use directives::{AttributeConverter, PageDirectiveConverter, TaglibConverter};
pub use for_each::ForEachConverter;
pub use message::{FormatMessageConverter, FormatParamConverter};
pub use output::OutConverter;
pub use passthrough::PassThrough;
pub use template::TemplateTagConverter;
pub use variable::SetConverter;

use super::attributes::AttributeMap;
use super::context::ConversionContext;
use crate::error::{Error, Result};

/// One occurrence of a construct in the source.
///
/// Directives are named `@name`, comments `%--`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: AttributeMap,
    /// Text of a comment.
    pub body: Option<String>,
    /// The tag exactly as written.
    pub raw: String,
    pub self_closing: bool,
    pub line: usize,
}

impl Tag {
    /// Attribute value, or a configuration error naming the tag.
    pub fn required(&self, attribute: &str) -> Result<&str> {
        self.attributes
            .get(attribute)
            .ok_or_else(|| Error::config_missing_attribute(&self.name, attribute))
    }
}

pub trait Converter {
    /// Name of the construct this converter handles.
    fn tag(&self) -> &str;

    /// Whether this converter handles `tag` given the innermost open converter.
    fn can_convert(&self, tag: &Tag, _parent: Option<&dyn Converter>) -> bool {
        tag.name == self.tag()
    }

    fn new_instance(&self) -> Box<dyn Converter>;

    /// Read the attributes of the occurrence. Missing required attributes fail here.
    fn consume(&mut self, _tag: &Tag) -> Result<()> {
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()>;

    fn convert_tag_end(&mut self, _ctx: &mut ConversionContext) -> Result<()> {
        Ok(())
    }

    fn drop_opening_tag_line(&self) -> bool {
        false
    }

    fn drop_closing_tag_line(&self) -> bool {
        false
    }

    fn drop_line_break_after_tag(&self) -> bool {
        false
    }

    /// False for grouping constructs whose body lines move up one level.
    fn indents_body(&self) -> bool {
        true
    }

    /// Claim the next branch of a grouping construct. Returns how many
    /// branches were claimed before this one.
    fn claim_branch(&mut self) -> usize {
        0
    }

    /// Take body source text (literal runs and `${}` expressions) that
    /// becomes part of generated code instead of template output. Returns
    /// false to leave it to the output.
    fn collect_body(&mut self, _source: &str) -> bool {
        false
    }
}
