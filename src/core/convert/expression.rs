//! Expression-language fragments (`${...}`) rewritten as Java expressions.

use super::attributes::skip_expression;
use crate::error::{Error, Result};
use crate::utils::case::capitalize;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ws(String),
    Ident(String),
    Number(String),
    Str { quote: char, inner: String },
    Op(String),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Ws(s) | Token::Ident(s) | Token::Number(s) | Token::Op(s) => s.clone(),
            Token::Str { quote, inner } => format!("{}{}{}", quote, inner, quote),
        }
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self, Token::Op(o) if o == op)
    }
}

const TWO_CHAR_OPS: [&str; 6] = ["==", "!=", "<=", ">=", "&&", "||"];
const ONE_CHAR_OPS: &str = "+-*/%<>!?:.,()[]";

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            tokens.push(Token::Ws(chars[start..i].iter().collect()));
        } else if c.is_ascii_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Number(chars[start..i].iter().collect()));
        } else if c == '\'' || c == '"' {
            i += 1;
            let mut inner = String::new();
            loop {
                match chars.get(i) {
                    None => {
                        return Err(Error::syntax_unterminated(
                            format!("string literal in expression '{}'", expr),
                            None,
                        ))
                    }
                    Some('\\') => {
                        inner.push('\\');
                        if let Some(next) = chars.get(i + 1) {
                            inner.push(*next);
                        }
                        i += 2;
                    }
                    Some(ch) if *ch == c => {
                        i += 1;
                        break;
                    }
                    Some(ch) => {
                        inner.push(*ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str { quote: c, inner });
        } else {
            let pair: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            if TWO_CHAR_OPS.contains(&pair.as_str()) {
                tokens.push(Token::Op(pair));
                i += 2;
            } else if ONE_CHAR_OPS.contains(c) {
                tokens.push(Token::Op(c.to_string()));
                i += 1;
            } else {
                return Err(Error::syntax_unexpected(
                    format!("expression '{}'", expr),
                    format!("contains unexpected character '{}'", c),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Render an EL string literal as a Java string literal.
fn java_string(quote: char, inner: &str) -> String {
    let mut out = String::with_capacity(inner.len() + 2);
    out.push('"');
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push_str("\\\\"),
            },
            '"' if quote == '\'' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Translator<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Translator<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(Token::Ws(_))) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, token: &Token) -> Error {
        Error::syntax_unexpected(
            format!("expression '{}'", self.source),
            format!("contains unexpected token '{}'", token.text()),
        )
    }

    fn unterminated(&self, closing: &str) -> Error {
        Error::syntax_unterminated(
            format!("'{}' bracket in expression '{}'", closing, self.source),
            None,
        )
    }

    /// Translate tokens until `stop` (not consumed) or the end of input.
    fn translate_sequence(&mut self, stop: Option<&str>) -> Result<String> {
        let mut out = String::new();

        loop {
            let Some(token) = self.peek().cloned() else {
                return match stop {
                    Some(closing) => Err(self.unterminated(closing)),
                    None => Ok(out),
                };
            };

            match &token {
                Token::Op(op) if Some(op.as_str()) == stop => return Ok(out),
                Token::Ws(ws) => {
                    out.push_str(ws);
                    self.pos += 1;
                }
                Token::Ident(word) => match keyword_operator(word) {
                    Some(op) => {
                        out.push_str(op);
                        self.pos += 1;
                        if op == "!" {
                            self.skip_ws();
                        }
                    }
                    None if word == "empty" => {
                        self.pos += 1;
                        self.skip_ws();
                        let operand = self.translate_operand()?;
                        out.push_str(&format!("({} == null || {}.isEmpty())", operand, operand));
                    }
                    None => out.push_str(&self.translate_operand()?),
                },
                Token::Number(_) | Token::Str { .. } => out.push_str(&self.translate_operand()?),
                Token::Op(op) if op == "(" || op == "[" => out.push_str(&self.translate_operand()?),
                Token::Op(op) if op == ")" || op == "]" || op == "." => {
                    return Err(self.unexpected(&token));
                }
                Token::Op(op) => {
                    out.push_str(op);
                    self.pos += 1;
                }
            }
        }
    }

    fn translate_operand(&mut self) -> Result<String> {
        let Some(token) = self.next() else {
            return Err(Error::syntax_unexpected(
                format!("expression '{}'", self.source),
                "ends where an operand is expected",
            ));
        };

        let mut out = match &token {
            Token::Ident(name) => {
                let namespaced = self.peek().is_some_and(|t| t.is_op(":"))
                    && matches!(self.peek_at(1), Some(Token::Ident(_)))
                    && self.peek_at(2).is_some_and(|t| t.is_op("("));
                if namespaced {
                    self.pos += 1;
                    let function = self.next().map(|t| t.text()).unwrap_or_default();
                    format!("{}:{}", name, function)
                } else {
                    name.clone()
                }
            }
            Token::Number(n) => n.clone(),
            Token::Str { quote, inner } => java_string(*quote, inner),
            Token::Op(op) if op == "(" => {
                let inner = self.translate_sequence(Some(")"))?;
                self.pos += 1;
                format!("({})", inner)
            }
            Token::Op(op) if op == "[" => {
                let inner = self.translate_sequence(Some("]"))?;
                self.pos += 1;
                format!("java.util.List.of({})", inner)
            }
            other => return Err(self.unexpected(other)),
        };

        // Postfix chain: property access, indexing, calls.
        loop {
            let next = self.peek().cloned();
            match next {
                Some(t) if t.is_op(".") => {
                    let Some(Token::Ident(property)) = self.peek_at(1).cloned() else {
                        let bad = self.peek_at(1).cloned().unwrap_or(Token::Op(".".to_string()));
                        return Err(self.unexpected(&bad));
                    };
                    self.pos += 2;
                    if self.peek().is_some_and(|t| t.is_op("(")) {
                        out.push('.');
                        out.push_str(&property);
                    } else {
                        out.push_str(&format!(".get{}()", capitalize(&property)));
                    }
                }
                Some(t) if t.is_op("[") => {
                    self.pos += 1;
                    let index = self.translate_sequence(Some("]"))?;
                    self.pos += 1;
                    out.push_str(&format!(".get({})", index.trim()));
                }
                Some(t) if t.is_op("(") => {
                    self.pos += 1;
                    let args = self.translate_sequence(Some(")"))?;
                    self.pos += 1;
                    out.push_str(&format!("({})", args));
                }
                _ => break,
            }
        }

        Ok(out)
    }
}

fn keyword_operator(word: &str) -> Option<&'static str> {
    match word {
        "and" => Some("&&"),
        "or" => Some("||"),
        "not" => Some("!"),
        "eq" => Some("=="),
        "ne" => Some("!="),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "le" => Some("<="),
        "ge" => Some(">="),
        "div" => Some("/"),
        "mod" => Some("%"),
        _ => None,
    }
}

/// Translate one fragment. A surrounding `${ }` is stripped when present.
pub fn translate(fragment: &str) -> Result<String> {
    let trimmed = fragment.trim();
    let expr = trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut translator = Translator {
        source: expr,
        tokens: tokenize(expr)?,
        pos: 0,
    };
    let translated = translator.translate_sequence(None)?;
    Ok(translated.trim().to_string())
}

fn is_single_expression(raw: &str) -> bool {
    raw.starts_with("${") && skip_expression(raw.as_bytes(), 0) == Some(raw.len())
}

/// Quote text as a Java string literal.
pub fn java_string_literal(text: &str) -> String {
    let mut out = String::from("\"");
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_simple_operand(java: &str) -> bool {
    java.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '(' | ')'))
}

/// Convert an attribute value used as a Java value.
///
/// `${e}` alone becomes the translated expression, plain text a string
/// literal, and text mixed with expressions a string concatenation.
pub fn convert_attribute_value(raw: &str) -> Result<String> {
    if is_single_expression(raw) {
        return translate(raw);
    }

    let bytes = raw.as_bytes();
    let mut parts = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let end = skip_expression(bytes, i).ok_or_else(|| {
                Error::syntax_unterminated(format!("expression in '{}'", raw), None)
            })?;
            if literal_start < i {
                parts.push(java_string_literal(&raw[literal_start..i]));
            }
            let java = translate(&raw[i..end])?;
            parts.push(if is_simple_operand(&java) {
                java
            } else {
                format!("({})", java)
            });
            i = end;
            literal_start = end;
        } else {
            i += 1;
        }
    }

    if literal_start < raw.len() || parts.is_empty() {
        parts.push(java_string_literal(&raw[literal_start..]));
    }

    Ok(parts.join(" + "))
}

/// Convert an attribute used in a boolean or numeric position: `${e}` alone
/// is translated, anything else is kept verbatim.
pub fn convert_expression_attribute(raw: &str) -> Result<String> {
    if is_single_expression(raw.trim()) {
        translate(raw)
    } else {
        Ok(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_access_becomes_getters() {
        assert_eq!(translate("${user.name}").unwrap(), "user.getName()");
        assert_eq!(
            translate("${order.customer.address}").unwrap(),
            "order.getCustomer().getAddress()"
        );
    }

    #[test]
    fn method_calls_are_kept() {
        assert_eq!(translate("${user.format(date, 2)}").unwrap(), "user.format(date, 2)");
        assert_eq!(translate("${list.size()}").unwrap(), "list.size()");
    }

    #[test]
    fn index_and_list_literals() {
        assert_eq!(translate("${items[0]}").unwrap(), "items.get(0)");
        assert_eq!(translate("${map['key'].value}").unwrap(), "map.get(\"key\").getValue()");
        assert_eq!(translate("${[1, 2]}").unwrap(), "java.util.List.of(1, 2)");
    }

    #[test]
    fn keyword_operators() {
        assert_eq!(
            translate("${a eq b and c ne d or not e}").unwrap(),
            "a == b && c != d || !e"
        );
        assert_eq!(translate("${a lt 1 or b gt 2}").unwrap(), "a < 1 || b > 2");
        assert_eq!(translate("${a le 1 and b ge 2}").unwrap(), "a <= 1 && b >= 2");
        assert_eq!(translate("${total div 2 mod 3}").unwrap(), "total / 2 % 3");
    }

    #[test]
    fn empty_operator() {
        assert_eq!(
            translate("${empty user.name}").unwrap(),
            "(user.getName() == null || user.getName().isEmpty())"
        );
        assert_eq!(
            translate("${not empty items}").unwrap(),
            "!(items == null || items.isEmpty())"
        );
    }

    #[test]
    fn strings_and_literals() {
        assert_eq!(translate("${'it\\'s'}").unwrap(), "\"it's\"");
        assert_eq!(translate("${\"plain\"}").unwrap(), "\"plain\"");
        assert_eq!(translate("${'say \"hi\"'}").unwrap(), "\"say \\\"hi\\\"\"");
        assert_eq!(translate("${flag ? 1.5 : null}").unwrap(), "flag ? 1.5 : null");
        assert_eq!(translate("${true}").unwrap(), "true");
    }

    #[test]
    fn namespaced_functions_are_kept() {
        assert_eq!(translate("${fn:length(items) gt 0}").unwrap(), "fn:length(items) > 0");
        assert_eq!(translate("${a ? b:c}").unwrap(), "a ? b:c");
    }

    #[test]
    fn malformed_expressions_fail() {
        assert!(translate("${'open}").unwrap_err().code.is_syntax());
        assert!(translate("${items[0}").unwrap_err().code.is_syntax());
        assert!(translate("${a)}").unwrap_err().code.is_syntax());
        assert!(translate("${a.}").unwrap_err().code.is_syntax());
        assert!(translate("${a # b}").unwrap_err().code.is_syntax());
    }

    #[test]
    fn attribute_values() {
        assert_eq!(convert_attribute_value("${user.name}").unwrap(), "user.getName()");
        assert_eq!(convert_attribute_value("Hello").unwrap(), "\"Hello\"");
        assert_eq!(convert_attribute_value("").unwrap(), "\"\"");
        assert_eq!(
            convert_attribute_value("Hello ${user.name}!").unwrap(),
            "\"Hello \" + user.getName() + \"!\""
        );
        assert_eq!(
            convert_attribute_value("row-${i + 1}").unwrap(),
            "\"row-\" + (i + 1)"
        );
        assert!(convert_attribute_value("a ${b").is_err());
    }

    #[test]
    fn expression_attributes_keep_plain_text() {
        assert_eq!(convert_expression_attribute("${count gt 1}").unwrap(), "count > 1");
        assert_eq!(convert_expression_attribute("10").unwrap(), "10");
    }
}
