//! JSP to jte template conversion.

pub mod attributes;
pub mod context;
pub mod converters;
pub mod expression;
pub mod parser;

pub use context::{ConversionContext, FormattingConfig};
pub use converters::{Converter, Tag};
pub use parser::{jsp_parser, Parser};
