//! `c:choose` groups and their `c:when` / `c:otherwise` branches.
//!
//! The group emits no line of its own. Its first branch opens the chain
//! with `@if`, later branches continue it, and the group closes it.

use super::{Converter, Tag};
use crate::convert::context::ConversionContext;
use crate::convert::expression::convert_expression_attribute;
use crate::error::{Error, Result};

const CHOOSE: &str = "c:choose";

fn inside_choose(parent: Option<&dyn Converter>) -> bool {
    parent.is_some_and(|parent| parent.tag() == CHOOSE)
}

/// Number of branches the enclosing group had before this one.
fn claim_branch(ctx: &mut ConversionContext) -> usize {
    ctx.current_mut()
        .map(|group| group.claim_branch())
        .unwrap_or(0)
}

#[derive(Default)]
pub struct ChooseConverter {
    branches: usize,
}

impl Converter for ChooseConverter {
    fn tag(&self) -> &str {
        CHOOSE
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(ChooseConverter::default())
    }

    fn convert_tag_begin(&mut self, _ctx: &mut ConversionContext) -> Result<()> {
        Ok(())
    }

    // A group without converted branches opened no chain.
    fn convert_tag_end(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        if self.branches > 0 {
            ctx.append("@endif");
        }
        Ok(())
    }

    fn drop_opening_tag_line(&self) -> bool {
        true
    }

    fn drop_closing_tag_line(&self) -> bool {
        self.branches == 0
    }

    fn indents_body(&self) -> bool {
        false
    }

    fn claim_branch(&mut self) -> usize {
        let claimed = self.branches;
        self.branches += 1;
        claimed
    }
}

#[derive(Default)]
pub struct WhenConverter {
    condition: String,
}

impl Converter for WhenConverter {
    fn tag(&self) -> &str {
        "c:when"
    }

    fn can_convert(&self, tag: &Tag, parent: Option<&dyn Converter>) -> bool {
        tag.name == self.tag() && inside_choose(parent)
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(WhenConverter::default())
    }

    fn consume(&mut self, tag: &Tag) -> Result<()> {
        self.condition = convert_expression_attribute(tag.required("test")?)?;
        Ok(())
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        let keyword = if claim_branch(ctx) == 0 { "@if" } else { "@elseif" };
        ctx.append(&format!("{}({})", keyword, self.condition));
        Ok(())
    }

    fn drop_closing_tag_line(&self) -> bool {
        true
    }
}

pub struct OtherwiseConverter;

impl Converter for OtherwiseConverter {
    fn tag(&self) -> &str {
        "c:otherwise"
    }

    fn can_convert(&self, tag: &Tag, parent: Option<&dyn Converter>) -> bool {
        tag.name == self.tag() && inside_choose(parent)
    }

    fn new_instance(&self) -> Box<dyn Converter> {
        Box::new(OtherwiseConverter)
    }

    fn convert_tag_begin(&mut self, ctx: &mut ConversionContext) -> Result<()> {
        if claim_branch(ctx) == 0 {
            return Err(Error::syntax_unexpected(
                "<c:otherwise>",
                "must follow at least one <c:when> branch",
            ));
        }
        ctx.append("@else");
        Ok(())
    }

    fn drop_closing_tag_line(&self) -> bool {
        true
    }
}
