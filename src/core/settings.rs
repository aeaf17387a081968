use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::convert::FormattingConfig;
use crate::error::{Error, Result};
use crate::utils::io;

pub const SETTINGS_FILE: &str = "jsp2jte.json";

/// Contents of jsp2jte.json. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterSettings {
    #[serde(default = "default_jsp_root")]
    pub jsp_root: String,

    #[serde(default = "default_jte_root")]
    pub jte_root: String,

    /// Inclusion tag written into templates that used a converted tag.
    #[serde(default = "default_jte_tag")]
    pub jte_tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default = "default_indentation_char")]
    pub indentation_char: char,

    #[serde(default = "default_indentation_count")]
    pub indentation_count: usize,

    #[serde(default = "default_line_separator")]
    pub line_separator: String,

    /// Tags (`ns:name`) allowed to remain in converted output.
    #[serde(default)]
    pub not_converted_tags: Vec<String>,

    /// Function `fmt:message` lookups call.
    #[serde(default = "default_message_function")]
    pub message_function: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            jsp_root: default_jsp_root(),
            jte_root: default_jte_root(),
            jte_tag: default_jte_tag(),
            prefix: None,
            indentation_char: default_indentation_char(),
            indentation_count: default_indentation_count(),
            line_separator: default_line_separator(),
            not_converted_tags: Vec::new(),
            message_function: default_message_function(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_jsp_root() -> String {
    ".".to_string()
}

fn default_jte_root() -> String {
    "jte".to_string()
}

fn default_jte_tag() -> String {
    "jte:template".to_string()
}

fn default_indentation_char() -> char {
    ' '
}

fn default_indentation_count() -> usize {
    4
}

fn default_line_separator() -> String {
    "\n".to_string()
}

fn default_message_function() -> String {
    "localize".to_string()
}

// =============================================================================
// Loading
// =============================================================================

impl ConverterSettings {
    pub fn jsp_root_path(&self) -> PathBuf {
        expand_path(&self.jsp_root)
    }

    pub fn jte_root_path(&self) -> PathBuf {
        expand_path(&self.jte_root)
    }

    pub fn formatting(&self) -> FormattingConfig {
        FormattingConfig {
            prefix: self.prefix.clone(),
            indentation_char: self.indentation_char,
            indentation_count: self.indentation_count,
            line_separator: self.line_separator.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (namespace, name) = self.jte_tag.split_once(':').unwrap_or(("", ""));
        if namespace.is_empty() || name.is_empty() || name.contains(':') {
            return Err(Error::config_invalid_value(
                "jte_tag",
                Some(self.jte_tag.clone()),
                "must be a namespaced tag name such as 'my:jte'",
            ));
        }
        if self.line_separator.is_empty() {
            return Err(Error::config_invalid_value(
                "line_separator",
                None,
                "must not be empty",
            ));
        }
        if self.message_function.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "message_function",
                None,
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Load settings from `path`, or from `./jsp2jte.json` when `path` is `None`.
///
/// A missing default file yields the defaults; a missing explicit file is an error.
pub fn load(path: Option<&Path>) -> Result<ConverterSettings> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(SETTINGS_FILE), false),
    };

    if !path.exists() {
        if explicit {
            return Err(Error::config_invalid_value(
                "config",
                Some(path.display().to_string()),
                "file not found",
            ));
        }
        return Ok(ConverterSettings::default());
    }

    let content = io::read_file(&path)?;
    let settings: ConverterSettings = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
    settings.validate()?;

    Ok(settings)
}
