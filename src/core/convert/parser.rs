//! The conversion engine: scans template text, matches constructs against
//! the registered converters and drives them through begin and end.

use super::attributes::{find_tag_end, parse_attributes, skip_expression, AttributeMap};
use super::context::{ConversionContext, ConverterInstance, FormattingConfig, LineDrop};
use super::converters::*;
use super::expression::translate;
use crate::error::{Error, Result};

pub struct Parser {
    converters: Vec<Box<dyn Converter>>,
    formatting: FormattingConfig,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parser with every JSP converter registered.
///
/// `jte_tag` is the inclusion tag usage rewriting leaves in other templates,
/// `message_function` the lookup `fmt:message` calls.
pub fn jsp_parser(jte_tag: &str, message_function: &str) -> Parser {
    let mut parser = Parser::new();
    parser.register(Box::new(TaglibConverter));
    parser.register(Box::new(PageDirectiveConverter::new("@tag")));
    parser.register(Box::new(PageDirectiveConverter::new("@page")));
    parser.register(Box::new(AttributeConverter::default()));
    parser.register(Box::new(IfConverter::default()));
    parser.register(Box::new(ForEachConverter::default()));
    parser.register(Box::new(ChooseConverter::default()));
    parser.register(Box::new(WhenConverter::default()));
    parser.register(Box::new(OtherwiseConverter));
    parser.register(Box::new(OutConverter::default()));
    parser.register(Box::new(TemplateTagConverter::new(jte_tag)));
    parser.register(Box::new(CommentConverter::default()));
    parser.register(Box::new(SetConverter::default()));
    parser.register(Box::new(FormatMessageConverter::new(message_function)));
    parser.register(Box::new(FormatParamConverter::default()));
    parser
}

impl Parser {
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
            formatting: FormattingConfig::default(),
        }
    }

    /// Add a converter. Earlier registrations win when several accept a tag.
    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.push(converter);
    }

    pub fn formatting(&self) -> &FormattingConfig {
        &self.formatting
    }

    pub fn set_formatting(&mut self, formatting: FormattingConfig) {
        self.formatting = formatting;
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.formatting.prefix = Some(prefix.into());
    }

    pub fn set_indentation_char(&mut self, indentation_char: char) {
        self.formatting.indentation_char = indentation_char;
    }

    pub fn set_indentation_count(&mut self, indentation_count: usize) {
        self.formatting.indentation_count = indentation_count;
    }

    pub fn set_line_separator(&mut self, line_separator: impl Into<String>) {
        self.formatting.line_separator = line_separator.into();
    }

    /// Convert one template. Never touches the filesystem.
    pub fn convert(&self, source: &str) -> Result<String> {
        let mut ctx = ConversionContext::new(self.formatting.clone());
        let mut lines = LineCounter::default();
        let mut pos = 0;

        while let Some(found) = next_construct(source, pos, &mut lines)? {
            let literal = &source[pos..found.start];
            pos = found.end;

            match found.construct {
                Construct::Expression(raw) => {
                    write_body(&mut ctx, literal);
                    if !collect_body(&mut ctx, &raw) {
                        ctx.append(&format!("${{{}}}", translate(&raw)?));
                    }
                }
                Construct::Close { name, raw } => {
                    let matches_top = ctx.current().is_some_and(|top| top.tag() == name);
                    if !matches_top {
                        write_body(&mut ctx, literal);
                        ctx.write_literal(&raw);
                        continue;
                    }

                    let collected = collect_body(&mut ctx, literal);
                    // Popped before the literal so its indentation is
                    // measured against the enclosing level.
                    if let Some(instance) = ctx.pop() {
                        if !collected {
                            ctx.write_literal(literal);
                        }
                        pos = self.close(&mut ctx, instance, source, pos)?;
                    }
                }
                Construct::Open(tag) => {
                    write_body(&mut ctx, literal);
                    pos = self.open(&mut ctx, tag, source, pos)?;
                }
            }
        }

        ctx.write_literal(&source[pos..]);

        if let Some(open) = ctx.innermost_converted() {
            return Err(Error::syntax_unterminated(
                format!("<{}>", open.converter().tag()),
                Some(open.line()),
            ));
        }

        Ok(ctx.into_output())
    }

    fn open(&self, ctx: &mut ConversionContext, tag: Tag, source: &str, pos: usize) -> Result<usize> {
        let prototype = self
            .converters
            .iter()
            .find(|converter| converter.can_convert(&tag, ctx.current()));

        let passthrough = prototype.is_none();
        let mut converter: Box<dyn Converter> = match prototype {
            Some(prototype) => prototype.new_instance(),
            None => Box::new(PassThrough::default()),
        };
        converter.consume(&tag)?;

        let mut skip_break = converter.drop_line_break_after_tag();
        if converter.drop_opening_tag_line() && ctx.drop_line_before() == LineDrop::AtStart {
            skip_break = true;
        }

        converter.convert_tag_begin(ctx)?;
        let pos = if skip_break { skip_line_break(source, pos) } else { pos };

        if tag.self_closing {
            converter.convert_tag_end(ctx)?;
        } else {
            ctx.push(ConverterInstance::new(converter, tag.line, passthrough));
        }

        Ok(pos)
    }

    fn close(
        &self,
        ctx: &mut ConversionContext,
        instance: ConverterInstance,
        source: &str,
        pos: usize,
    ) -> Result<usize> {
        let mut converter = instance.into_converter();

        let mut skip_break = converter.drop_line_break_after_tag();
        if converter.drop_closing_tag_line() && ctx.drop_line_before() == LineDrop::AtStart {
            skip_break = true;
        }

        converter.convert_tag_end(ctx)?;
        Ok(if skip_break { skip_line_break(source, pos) } else { pos })
    }
}

/// Offer body source to the innermost converter.
fn collect_body(ctx: &mut ConversionContext, source: &str) -> bool {
    ctx.current_mut()
        .is_some_and(|top| top.converter_mut().collect_body(source))
}

fn write_body(ctx: &mut ConversionContext, literal: &str) {
    if !collect_body(ctx, literal) {
        ctx.write_literal(literal);
    }
}

// ============================================================================
// Scanning
// ============================================================================

enum Construct {
    Open(Tag),
    Close { name: String, raw: String },
    Expression(String),
}

struct Found {
    start: usize,
    end: usize,
    construct: Construct,
}

/// Tracks the 1-based line of increasing source offsets.
#[derive(Default)]
struct LineCounter {
    line: usize,
    offset: usize,
}

impl LineCounter {
    fn at(&mut self, source: &str, offset: usize) -> usize {
        self.line += source[self.offset..offset].matches('\n').count();
        self.offset = offset;
        self.line + 1
    }
}

/// Skip blanks and one line break.
fn skip_line_break(source: &str, pos: usize) -> usize {
    let bytes = source.as_bytes();
    let mut i = pos;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if bytes[i..].starts_with(b"\r\n") {
        i + 2
    } else if bytes.get(i) == Some(&b'\n') || bytes.get(i) == Some(&b'\r') {
        i + 1
    } else {
        i
    }
}

/// End of a `ns:name` at `start`, if one starts there.
fn qualified_name_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'-')) {
        i += 1;
    }
    if bytes.get(i) != Some(&b':') {
        return None;
    }
    i += 1;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'-' | b'.'))
    {
        i += 1;
    }
    Some(i)
}

fn next_construct(source: &str, from: usize, lines: &mut LineCounter) -> Result<Option<Found>> {
    let bytes = source.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        let found = match bytes[i] {
            b'<' => scan_markup(source, i, lines)?,
            b'$' if bytes.get(i + 1) == Some(&b'{') && (i == 0 || bytes[i - 1] != b'\\') => {
                let end = skip_expression(bytes, i).ok_or_else(|| {
                    Error::syntax_unterminated("expression", Some(lines.at(source, i)))
                })?;
                Some(Found {
                    start: i,
                    end,
                    construct: Construct::Expression(source[i..end].to_string()),
                })
            }
            _ => None,
        };

        if found.is_some() {
            return Ok(found);
        }
        i += 1;
    }

    Ok(None)
}

fn scan_markup(source: &str, start: usize, lines: &mut LineCounter) -> Result<Option<Found>> {
    let bytes = source.as_bytes();
    let rest = &source[start..];

    if rest.starts_with("<%--") {
        let line = lines.at(source, start);
        let body_start = start + 4;
        let body_end = source[body_start..]
            .find("--%>")
            .map(|offset| body_start + offset)
            .ok_or_else(|| Error::syntax_unterminated("comment", Some(line)))?;
        let end = body_end + 4;
        return Ok(Some(Found {
            start,
            end,
            construct: Construct::Open(Tag {
                name: "%--".to_string(),
                attributes: AttributeMap::new(),
                body: Some(source[body_start..body_end].to_string()),
                raw: source[start..end].to_string(),
                self_closing: true,
                line,
            }),
        }));
    }

    if rest.starts_with("<%@") {
        let line = lines.at(source, start);
        let mut name_start = start + 3;
        while name_start < bytes.len() && bytes[name_start].is_ascii_whitespace() {
            name_start += 1;
        }
        let mut name_end = name_start;
        while name_end < bytes.len() && bytes[name_end].is_ascii_alphabetic() {
            name_end += 1;
        }
        if name_end == name_start {
            return Err(Error::syntax_unexpected(
                format!("directive at line {}", line),
                "has no name",
            ));
        }
        let close = find_tag_end(source, name_end, "%>")
            .ok_or_else(|| Error::syntax_unterminated("directive", Some(line)))?;
        let end = close + 2;
        return Ok(Some(Found {
            start,
            end,
            construct: Construct::Open(Tag {
                name: format!("@{}", &source[name_start..name_end]),
                attributes: parse_attributes(&source[name_end..close])?,
                body: None,
                raw: source[start..end].to_string(),
                self_closing: true,
                line,
            }),
        }));
    }

    if rest.starts_with("</") {
        let Some(name_end) = qualified_name_end(bytes, start + 2) else {
            return Ok(None);
        };
        let mut i = name_end;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'>') {
            return Ok(None);
        }
        return Ok(Some(Found {
            start,
            end: i + 1,
            construct: Construct::Close {
                name: source[start + 2..name_end].to_string(),
                raw: source[start..i + 1].to_string(),
            },
        }));
    }

    let Some(name_end) = qualified_name_end(bytes, start + 1) else {
        return Ok(None);
    };
    match bytes.get(name_end) {
        Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => {}
        _ => return Ok(None),
    }

    let line = lines.at(source, start);
    let name = &source[start + 1..name_end];
    let close = find_tag_end(source, name_end, ">")
        .ok_or_else(|| Error::syntax_unterminated(format!("<{}>", name), Some(line)))?;
    let self_closing = bytes[close - 1] == b'/' && close - 1 >= name_end;
    let attributes_end = if self_closing { close - 1 } else { close };

    Ok(Some(Found {
        start,
        end: close + 1,
        construct: Construct::Open(Tag {
            name: name.to_string(),
            attributes: parse_attributes(&source[name_end..attributes_end]).map_err(|err| {
                let problem = format!("{} (line {})", err.message, line);
                Error { message: problem, ..err }
            })?,
            body: None,
            raw: source[start..close + 1].to_string(),
            self_closing,
            line,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(source: &str) -> Result<String> {
        jsp_parser("my:jte", "localize").convert(source)
    }

    #[test]
    fn literal_text_is_copied() {
        assert_eq!(convert("<div class=\"x\">hi</div>\n").unwrap(), "<div class=\"x\">hi</div>\n");
    }

    #[test]
    fn text_expressions_are_translated() {
        assert_eq!(
            convert("<a href=\"${link.url}\">${link.label}</a>").unwrap(),
            "<a href=\"${link.getUrl()}\">${link.getLabel()}</a>"
        );
    }

    #[test]
    fn escaped_expression_is_literal() {
        assert_eq!(convert("\\${x}").unwrap(), "\\${x}");
    }

    #[test]
    fn tag_header_is_converted() {
        let source = "<%@ tag pageEncoding=\"UTF-8\" %>\n\
                      <%@ taglib prefix=\"c\" uri=\"jakarta.tags.core\" %>\n\
                      <%@ attribute name=\"title\" required=\"true\" %>\n\
                      <%@ attribute name=\"count\" type=\"java.lang.Integer\" %>\n\
                      <h1>${title}</h1>\n";
        assert_eq!(
            convert(source).unwrap(),
            "@param String title\n@param Integer count = null\n<h1>${title}</h1>\n"
        );
    }

    #[test]
    fn if_keeps_body_indentation() {
        let source = "<c:if test=\"${user.admin}\">\n    <b>admin</b>\n</c:if>\n";
        assert_eq!(convert(source).unwrap(), "@if(user.getAdmin())\n    <b>admin</b>\n@endif\n");
    }

    #[test]
    fn choose_becomes_if_chain() {
        let source = "<c:choose>\n\
                      \x20   <c:when test=\"${a}\">\n\
                      \x20       A\n\
                      \x20   </c:when>\n\
                      \x20   <c:when test=\"${b}\">\n\
                      \x20       B\n\
                      \x20   </c:when>\n\
                      \x20   <c:otherwise>\n\
                      \x20       C\n\
                      \x20   </c:otherwise>\n\
                      </c:choose>\n";
        assert_eq!(
            convert(source).unwrap(),
            "@if(a)\n    A\n@elseif(b)\n    B\n@else\n    C\n@endif\n"
        );
    }

    #[test]
    fn nested_choose_keeps_outer_indentation() {
        let source = "<div>\n\
                      \x20   <c:choose>\n\
                      \x20       <c:when test=\"${a}\">A</c:when>\n\
                      \x20   </c:choose>\n\
                      </div>\n";
        assert_eq!(convert(source).unwrap(), "<div>\n    @if(a)A\n    @endif\n</div>\n");
    }

    #[test]
    fn for_each_loop() {
        let source = "<ul>\n<c:forEach var=\"item\" items=\"${items}\">\n    <li>${item.name}</li>\n</c:forEach>\n</ul>";
        assert_eq!(
            convert(source).unwrap(),
            "<ul>\n@for(var item : items)\n    <li>${item.getName()}</li>\n@endfor\n</ul>"
        );
    }

    #[test]
    fn message_parameters_are_flattened() {
        let source = "<fmt:message key=\"welcome\">\n    <fmt:param value=\"${user.name}\"/>\n    <fmt:param value=\"${count}\"/>\n</fmt:message>\n";
        assert_eq!(
            convert(source).unwrap(),
            "${localize(\"welcome\", user.getName(), count)}\n"
        );
    }

    #[test]
    fn message_on_one_line() {
        let source = "<p><fmt:message key=\"k\"><fmt:param value=\"a\"/></fmt:message></p>";
        assert_eq!(convert(source).unwrap(), "<p>${localize(\"k\", \"a\")}</p>");
    }

    #[test]
    fn message_parameter_from_body() {
        let source = "<fmt:message key=\"k\"><fmt:param>${x}</fmt:param></fmt:message>";
        assert_eq!(convert(source).unwrap(), "${localize(\"k\", x)}");

        let source = "<fmt:message key=\"count\">\n    <fmt:param>\n        ${total}\n    </fmt:param>\n</fmt:message>\n";
        assert_eq!(convert(source).unwrap(), "${localize(\"count\", total)}\n");
    }

    #[test]
    fn empty_choose_emits_nothing() {
        assert_eq!(convert("<c:choose>\n</c:choose>\n").unwrap(), "");
        assert_eq!(
            convert("<div>\n    <c:choose>\n    </c:choose>\n</div>\n").unwrap(),
            "<div>\n</div>\n"
        );
    }

    #[test]
    fn collection_sub_range_is_left_for_manual_conversion() {
        let source = "<c:forEach var=\"x\" items=\"${list}\" begin=\"1\" end=\"2\">${x}</c:forEach>";
        let out = convert(source).unwrap();
        assert_eq!(out, source);
        assert!(crate::dependencies::validate(&out, &[]).is_err());
    }

    #[test]
    fn unknown_tags_pass_through_balanced() {
        let source = "<c:if test=\"${x}\"><my:box title=\"${t}\">in</my:box></c:if>";
        assert_eq!(
            convert(source).unwrap(),
            "@if(x)<my:box title=\"${t}\">in</my:box>@endif"
        );
    }

    #[test]
    fn stray_closing_tag_is_literal() {
        assert_eq!(convert("a</c:if>b").unwrap(), "a</c:if>b");
    }

    #[test]
    fn template_call_with_body() {
        let source = "<my:jte jte=\"layout/page.jte\" title=\"Home\">\n    <p>body</p>\n</my:jte>\n";
        assert_eq!(
            convert(source).unwrap(),
            "@template.layout.page(title = \"Home\", content = @`\n    <p>body</p>\n`)\n"
        );
    }

    #[test]
    fn comments_and_variables() {
        let source = "<%-- header --%>\n<c:set var=\"n\" value=\"${list.size()}\"/>\n${n}";
        assert_eq!(
            convert(source).unwrap(),
            "<%-- header --%>\n!{var n = list.size();}\n${n}"
        );
    }

    #[test]
    fn prefix_and_separator_are_applied() {
        let mut parser = jsp_parser("my:jte", "localize");
        parser.set_prefix("@import static example.JteContext.*\n");
        parser.set_line_separator("\r\n");
        let out = parser
            .convert("<%@ taglib prefix=\"c\" uri=\"x\" %>\n<p>${a}</p>\n")
            .unwrap();
        assert_eq!(out, "@import static example.JteContext.*\n<p>${a}</p>\r\n");
    }

    #[test]
    fn unclosed_converted_tag_is_syntax_error() {
        let err = convert("line\n<c:if test=\"${a}\">\nbody").unwrap_err();
        assert_eq!(err.message, "<c:if> is never terminated (line 2)");
    }

    #[test]
    fn unterminated_constructs_fail() {
        assert!(convert("<%-- open").unwrap_err().code.is_syntax());
        assert!(convert("<%@ page import=\"a\"").unwrap_err().code.is_syntax());
        assert!(convert("<c:out value=\"x\"").unwrap_err().code.is_syntax());
        assert!(convert("text ${a").unwrap_err().code.is_syntax());
    }

    #[test]
    fn missing_attribute_aborts() {
        let err = convert("<c:out/>").unwrap_err();
        assert_eq!(err.message, "<c:out> requires the attribute 'value'");
    }

    #[test]
    fn registration_order_decides() {
        let mut parser = Parser::new();
        parser.register(Box::new(OutConverter::default()));
        assert_eq!(
            parser.convert("<c:out value=\"${a}\"/><c:if test=\"${b}\">x</c:if>").unwrap(),
            "${a}<c:if test=\"${b}\">x</c:if>"
        );
    }
}
