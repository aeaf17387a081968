//! Rewrites references to a converted tag across the source tree.
//!
//! Every `<ns:name` usage becomes `<{jte_tag} jte="{new file}"` and its
//! closing tag `</{jte_tag}>`. Rewrites are planned in memory first and
//! written afterwards, so a read failure leaves the tree untouched.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::convert::attributes::find_tag_end;
use crate::error::{Error, Result};
use crate::log_status;
use crate::utils::io;

/// File suffixes that may reference a tag.
const TEMPLATE_SUFFIXES: &[&str] = &[".jsp", ".jsp.inc", ".tag"];

const SKIP_DIRS: &[&str] = &[".git", ".svn", "node_modules"];

/// Old tag reference and the template that replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPrefixMapping {
    /// `<namespace:name`
    pub old_prefix: String,
    /// New template path relative to the jte root, `/`-separated.
    pub new_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEdit {
    /// File path relative to the JSP root.
    pub file: String,
    pub replacements: usize,
    #[serde(skip)]
    pub new_content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageRewrite {
    pub old_prefix: String,
    pub new_file: String,
    pub edits: Vec<FileEdit>,
    pub total_replacements: usize,
    /// Obsolete source file, once removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
    pub applied: bool,
}

/// `<` + parent directory name + `:` + file name up to its first `.`.
/// Tags under a `tags` directory belong to the `include` namespace.
pub fn extract_tag_prefix(jsp_tag: &Path) -> Result<String> {
    let invalid = || {
        Error::validation_invalid_argument(
            "jsp_file",
            format!("Cannot derive a tag name from '{}'", jsp_tag.display()),
            Some(jsp_tag.to_string_lossy().to_string()),
        )
    };

    let file_name = jsp_tag
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(invalid)?;
    let namespace = jsp_tag
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(invalid)?;

    let namespace = if namespace == "tags" {
        "include".to_string()
    } else {
        namespace
    };
    let name = file_name.split('.').next().unwrap_or_default();

    Ok(format!("<{}:{}", namespace, name))
}

/// Path of `jte_file` relative to `jte_root`, with `/` separators.
pub fn relative_template_path(jte_file: &Path, jte_root: &Path) -> String {
    jte_file
        .strip_prefix(jte_root)
        .unwrap_or(jte_file)
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn tag_prefix_mapping(jsp_tag: &Path, jte_file: &Path, jte_root: &Path) -> Result<TagPrefixMapping> {
    Ok(TagPrefixMapping {
        old_prefix: extract_tag_prefix(jsp_tag)?,
        new_file: relative_template_path(jte_file, jte_root),
    })
}

// ============================================================================
// Matching
// ============================================================================

/// Whether the tag whose name ends at `name_end` closes itself (`/>`).
/// An unterminated tag counts as closed.
fn is_self_closing(content: &str, name_end: usize) -> bool {
    find_tag_end(content, name_end, ">")
        .map_or(true, |end| end > 0 && content.as_bytes()[end - 1] == b'/')
}

/// Rewrite opening and closing usages of the mapped tag in one file's content.
///
/// An opening usage is the prefix followed by whitespace, `/` or `>`. A
/// closing tag is rewritten only when it closes a rewritten opening, so a
/// stray closing tag is left alone and files stay balanced.
pub fn rewrite_content(content: &str, mapping: &TagPrefixMapping, jte_tag: &str) -> (String, usize) {
    let opening = format!("<{} jte=\"{}\"", jte_tag, mapping.new_file);
    let old_closing = format!("</{}", mapping.old_prefix.trim_start_matches('<'));
    let closing = format!("</{}", jte_tag);

    let bytes = content.as_bytes();
    let mut result = String::with_capacity(content.len());
    let mut open_usages = 0usize;
    let mut count = 0;
    let mut copied = 0;
    let mut search = 0;

    while let Some(offset) = content[search..].find('<') {
        let start = search + offset;
        let rest = &content[start..];

        let (end, replacement) = if rest.starts_with(&mapping.old_prefix) {
            let end = start + mapping.old_prefix.len();
            let is_usage = bytes
                .get(end)
                .is_some_and(|b| b.is_ascii_whitespace() || *b == b'/' || *b == b'>');
            if is_usage && !is_self_closing(content, end) {
                open_usages += 1;
            }
            (end, is_usage.then_some(opening.as_str()))
        } else if rest.starts_with(&old_closing) {
            let end = start + old_closing.len();
            let is_closing = open_usages > 0
                && bytes.get(end).is_some_and(|b| b.is_ascii_whitespace() || *b == b'>');
            if is_closing {
                open_usages -= 1;
            }
            (end, is_closing.then_some(closing.as_str()))
        } else {
            (start + 1, None)
        };

        if let Some(replacement) = replacement {
            result.push_str(&content[copied..start]);
            result.push_str(replacement);
            copied = end;
            count += 1;
        }
        search = end;
    }

    result.push_str(&content[copied..]);
    (result, count)
}

// ============================================================================
// Tree walk
// ============================================================================

fn is_template_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| TEMPLATE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

fn walk_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("list {}", dir.display()))))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("list {}", dir.display()))))?;
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            if SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            walk_recursive(&path, files)?;
        } else if is_template_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Template files under `root`, sorted.
pub fn collect_template_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_recursive(root, &mut files)?;
    files.sort();
    Ok(files)
}

// ============================================================================
// Plan / apply
// ============================================================================

/// Read every template under `jsp_root` except `old_file` and compute the rewrites.
pub fn plan_rewrites(
    jsp_root: &Path,
    old_file: &Path,
    mapping: &TagPrefixMapping,
    jte_tag: &str,
) -> Result<UsageRewrite> {
    let mut edits = Vec::new();

    for path in collect_template_files(jsp_root)? {
        if path == old_file {
            continue;
        }
        let content = io::read_file(&path)?;
        let (new_content, replacements) = rewrite_content(&content, mapping, jte_tag);
        if replacements > 0 {
            edits.push(FileEdit {
                file: relative_template_path(&path, jsp_root),
                replacements,
                new_content,
            });
        }
    }

    Ok(UsageRewrite {
        old_prefix: mapping.old_prefix.clone(),
        new_file: mapping.new_file.clone(),
        total_replacements: edits.iter().map(|edit| edit.replacements).sum(),
        edits,
        deleted: None,
        applied: false,
    })
}

/// Write planned rewrites to disk.
pub fn apply_rewrites(rewrite: &mut UsageRewrite, jsp_root: &Path) -> Result<()> {
    for edit in &rewrite.edits {
        let path = jsp_root.join(&edit.file);
        io::write_file(&path, &edit.new_content)?;
        log_status!(
            "usages",
            "Rewrote {} usage(s) in {}",
            edit.replacements,
            edit.file
        );
    }
    rewrite.applied = true;
    Ok(())
}
