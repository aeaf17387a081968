use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigIllegalName,
    ConfigMissingAttribute,
    ConfigInvalidValue,
    ConfigInvalidJson,

    SyntaxMalformedAttribute,
    SyntaxUnterminated,
    SyntaxUnexpected,

    DependencyUnresolved,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigIllegalName => "config.illegal_name",
            ErrorCode::ConfigMissingAttribute => "config.missing_attribute",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",

            ErrorCode::SyntaxMalformedAttribute => "syntax.malformed_attribute",
            ErrorCode::SyntaxUnterminated => "syntax.unterminated",
            ErrorCode::SyntaxUnexpected => "syntax.unexpected",

            ErrorCode::DependencyUnresolved => "dependency.unresolved",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// True for the codes raised while translating markup, before anything is written.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ErrorCode::SyntaxMalformedAttribute
                | ErrorCode::SyntaxUnterminated
                | ErrorCode::SyntaxUnexpected
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllegalNameDetails {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingAttributeDetails {
    pub tag: String,
    pub attribute: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxDetails {
    pub construct: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedDependencyDetails {
    pub tag: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    /// A target template name that is not a valid jte identifier.
    pub fn config_illegal_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!(
            "Illegal jte tag name '{}'. Tag names should be camel case.",
            name
        );
        Self::new(
            ErrorCode::ConfigIllegalName,
            message,
            to_details(IllegalNameDetails { name }),
        )
    }

    pub fn config_missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        let tag = tag.into();
        let attribute = attribute.into();
        let message = format!(
            "<{}> requires the attribute '{}'",
            tag.trim_start_matches('@'),
            attribute
        );
        Self::new(
            ErrorCode::ConfigMissingAttribute,
            message,
            to_details(MissingAttributeDetails { tag, attribute }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let problem = problem.into();
        let message = format!("Invalid configuration value for '{}': {}", key, problem);
        Self::new(
            ErrorCode::ConfigInvalidValue,
            message,
            to_details(ConfigInvalidValueDetails {
                key,
                value,
                problem,
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let path = path.into();
        let message = format!("Invalid JSON in {}: {}", path, err);
        Self::new(
            ErrorCode::ConfigInvalidJson,
            message,
            to_details(ConfigInvalidJsonDetails {
                path,
                error: err.to_string(),
            }),
        )
    }

    pub fn syntax_malformed_attribute(
        construct: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::syntax(ErrorCode::SyntaxMalformedAttribute, construct, problem, None)
    }

    pub fn syntax_unterminated(construct: impl Into<String>, line: Option<usize>) -> Self {
        Self::syntax(
            ErrorCode::SyntaxUnterminated,
            construct,
            "is never terminated",
            line,
        )
    }

    pub fn syntax_unexpected(construct: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::syntax(ErrorCode::SyntaxUnexpected, construct, problem, None)
    }

    fn syntax(
        code: ErrorCode,
        construct: impl Into<String>,
        problem: impl Into<String>,
        line: Option<usize>,
    ) -> Self {
        let construct = construct.into();
        let problem = problem.into();
        let message = match line {
            Some(line) => format!("{} {} (line {})", construct, problem, line),
            None => format!("{} {}", construct, problem),
        };
        Self::new(
            code,
            message,
            to_details(SyntaxDetails {
                construct,
                problem,
                line,
            }),
        )
    }

    /// A namespaced tag that survived conversion and is not allow-listed.
    pub fn dependency_unresolved(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let message = format!(
            "The tag {tag}/> is used by this tag and not converted to jte yet. You should convert {tag}/> first. If this is a tag that should be always converted by hand, implement getNotConvertedTags() and add it there."
        );
        Self::new(
            ErrorCode::DependencyUnresolved,
            message,
            to_details(UnresolvedDependencyDetails { tag }),
        )
        .with_hint("Add the tag to not_converted_tags in jsp2jte.json to keep it as-is")
    }

    pub fn validation_missing_argument(args: Vec<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            message,
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            problem.clone(),
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem,
                value,
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        let message = match &context {
            Some(context) => format!("IO error ({}): {}", context, error),
            None => format!("IO error: {}", error),
        };
        Self::new(
            ErrorCode::InternalIoError,
            message,
            to_details(InternalIoErrorDetails { error, context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            format!("Unexpected error: {}", error),
            serde_json::json!({ "error": error }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_name_message_names_value_verbatim() {
        let err = Error::config_illegal_name("tag/not-so-simple.jte");
        assert_eq!(
            err.message,
            "Illegal jte tag name 'tag/not-so-simple.jte'. Tag names should be camel case."
        );
        assert_eq!(err.code.as_str(), "config.illegal_name");
        assert_eq!(err.details["name"], "tag/not-so-simple.jte");
    }

    #[test]
    fn unresolved_dependency_message() {
        let err = Error::dependency_unresolved("<my:simple-dependency");
        assert_eq!(
            err.to_string(),
            "The tag <my:simple-dependency/> is used by this tag and not converted to jte yet. You should convert <my:simple-dependency/> first. If this is a tag that should be always converted by hand, implement getNotConvertedTags() and add it there."
        );
        assert_eq!(err.hints.len(), 1);
    }

    #[test]
    fn missing_attribute_strips_directive_marker() {
        let err = Error::config_missing_attribute("@attribute", "name");
        assert_eq!(err.message, "<attribute> requires the attribute 'name'");
        assert_eq!(err.details["tag"], "@attribute");
    }

    #[test]
    fn syntax_errors_carry_line() {
        let err = Error::syntax_unterminated("<c:if>", Some(3));
        assert_eq!(err.message, "<c:if> is never terminated (line 3)");
        assert!(err.code.is_syntax());
        assert!(!ErrorCode::DependencyUnresolved.is_syntax());
    }
}
