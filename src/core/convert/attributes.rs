//! Attribute lists of JSP tags and directives.
//!
//! Values are kept raw (expression-language fragments included); converters
//! decide how to translate them.

use crate::error::{Error, Result};

/// Ordered attribute name/value pairs of one tag occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert an attribute. Duplicate names are rejected.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::syntax_malformed_attribute(
                format!("attribute '{}'", name),
                "is declared more than once",
            ));
        }
        self.entries.push((name, value.into()));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse the raw text between a tag name and the end of the tag.
pub fn parse_attributes(raw: &str) -> Result<AttributeMap> {
    let bytes = raw.as_bytes();
    let mut attributes = AttributeMap::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            if bytes[i] == b'"' || bytes[i] == b'\'' {
                return Err(Error::syntax_malformed_attribute(
                    format!("attribute list '{}'", raw.trim()),
                    "has a quoted value without a name",
                ));
            }
            i += 1;
        }
        let name = &raw[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            return Err(Error::syntax_malformed_attribute(
                format!("attribute '{}'", name),
                "has no value",
            ));
        }
        i += 1;

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            return Err(Error::syntax_malformed_attribute(
                format!("attribute '{}'", name),
                "must have a quoted value",
            ));
        }

        let quote = bytes[i];
        let end = skip_quoted(bytes, i)
            .ok_or_else(|| Error::syntax_unterminated(format!("value of attribute '{}'", name), None))?;
        let value = unescape_quotes(&raw[i + 1..end - 1], quote);
        attributes.insert(name, value)?;
        i = end;
    }

    Ok(attributes)
}

/// Find the start of `terminator` (e.g. `>` or `%>`) at or after `from`,
/// skipping quoted values and expression-language fragments.
pub fn find_tag_end(source: &str, from: usize, terminator: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let term = terminator.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_quoted(bytes, i)?,
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = skip_expression(bytes, i)?,
            _ if bytes[i..].starts_with(term) => return Some(i),
            _ => i += 1,
        }
    }

    None
}

/// Return the index just past the `}` closing the `${` at `start`.
///
/// String literals inside the expression may contain `}` and either quote.
pub fn skip_expression(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 2;
    let mut depth = 1usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' | b'\'' => i = skip_el_string(bytes, i)?,
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }

    None
}

fn skip_el_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Return the index just past the quote closing the value opened at `start`.
fn skip_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = skip_expression(bytes, i)?,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }

    None
}

fn unescape_quotes(value: &str, quote: u8) -> String {
    let escaped = format!("\\{}", quote as char);
    value.replace(&escaped, &(quote as char).to_string())
}
