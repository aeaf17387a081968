//! State of one conversion: the open-converter stack and the output buffer.

use super::converters::Converter;

/// Output formatting for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingConfig {
    /// Emitted once, before all converted content.
    pub prefix: Option<String>,
    pub indentation_char: char,
    pub indentation_count: usize,
    pub line_separator: String,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            indentation_char: ' ',
            indentation_count: 4,
            line_separator: "\n".to_string(),
        }
    }
}

/// An open construct on the context stack.
pub struct ConverterInstance {
    converter: Box<dyn Converter>,
    line: usize,
    passthrough: bool,
}

impl ConverterInstance {
    pub fn new(converter: Box<dyn Converter>, line: usize, passthrough: bool) -> Self {
        Self {
            converter,
            line,
            passthrough,
        }
    }

    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }

    pub fn converter_mut(&mut self) -> &mut dyn Converter {
        self.converter.as_mut()
    }

    /// Claim the next branch of a grouping construct. Returns how many
    /// branches were claimed before this one.
    pub fn claim_branch(&mut self) -> usize {
        self.converter.claim_branch()
    }

    /// Source line of the opening tag.
    pub fn line(&self) -> usize {
        self.line
    }

    /// True when no registered converter accepted the tag.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    pub fn into_converter(self) -> Box<dyn Converter> {
        self.converter
    }
}

/// Result of removing the line a tag sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDrop {
    /// Blanks and the preceding line separator were removed.
    Dropped,
    /// Nothing precedes the tag in the output.
    AtStart,
    /// The tag follows other content on its line.
    MidLine,
}

pub struct ConversionContext {
    stack: Vec<ConverterInstance>,
    output: String,
    formatting: FormattingConfig,
    prefix_len: usize,
    line_start: bool,
    stripped: usize,
}

impl ConversionContext {
    pub fn new(formatting: FormattingConfig) -> Self {
        let output = formatting.prefix.clone().unwrap_or_default();
        let prefix_len = output.len();
        let line_start = output.is_empty() || output.ends_with(formatting.line_separator.as_str());
        Self {
            stack: Vec::new(),
            output,
            formatting,
            prefix_len,
            line_start,
            stripped: 0,
        }
    }

    pub fn formatting(&self) -> &FormattingConfig {
        &self.formatting
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    // ========================================================================
    // Stack
    // ========================================================================

    /// The innermost open converter.
    pub fn current(&self) -> Option<&dyn Converter> {
        self.stack.last().map(|instance| instance.converter())
    }

    pub fn current_mut(&mut self) -> Option<&mut ConverterInstance> {
        self.stack.last_mut()
    }

    pub fn push(&mut self, instance: ConverterInstance) {
        self.stack.push(instance);
    }

    pub fn pop(&mut self) -> Option<ConverterInstance> {
        self.stack.pop()
    }

    /// Innermost open construct that was converted (pass-through tags excluded).
    pub fn innermost_converted(&self) -> Option<&ConverterInstance> {
        self.stack.iter().rev().find(|instance| !instance.is_passthrough())
    }

    /// Characters removed from the start of each literal line: one unit per
    /// open converter that does not indent its body.
    fn dedent_width(&self) -> usize {
        let transparent = self
            .stack
            .iter()
            .filter(|instance| !instance.converter().indents_body())
            .count();
        transparent * self.formatting.indentation_count
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Append converter output verbatim.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.output.push_str(text);
        self.line_start = text.ends_with(self.formatting.line_separator.as_str());
        self.stripped = 0;
    }

    /// Append source text, normalizing line breaks and removing the
    /// indentation of grouping constructs that emit no line of their own.
    pub fn write_literal(&mut self, text: &str) {
        let indent = self.formatting.indentation_char;
        let dedent = self.dedent_width();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    self.new_line();
                }
                '\n' => self.new_line(),
                c if self.line_start && c == indent && self.stripped < dedent => {
                    self.stripped += 1;
                }
                c => {
                    self.line_start = false;
                    self.output.push(c);
                }
            }
        }
    }

    fn new_line(&mut self) {
        self.output.push_str(&self.formatting.line_separator);
        self.line_start = true;
        self.stripped = 0;
    }

    /// Remove trailing blanks and, when the tag starts its own line, the
    /// line separator before it. The prefix is never touched.
    pub fn drop_line_before(&mut self) -> LineDrop {
        let trimmed = self.output.trim_end_matches([' ', '\t']).len();
        self.output.truncate(trimmed.max(self.prefix_len));

        let separator = self.formatting.line_separator.as_str();
        let result = if self.output.len() == self.prefix_len {
            LineDrop::AtStart
        } else if self.output.ends_with(separator) {
            let len = self.output.len() - separator.len();
            self.output.truncate(len.max(self.prefix_len));
            LineDrop::Dropped
        } else {
            LineDrop::MidLine
        };

        self.line_start =
            self.output.len() == self.prefix_len || self.output.ends_with(separator);
        self.stripped = 0;
        result
    }
}
