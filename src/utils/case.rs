//! Casing helpers for template file names.

use heck::ToLowerCamelCase;

/// Camel-case every hyphenated segment of a `/`-separated path.
///
/// Segments without a hyphen are kept as written, so `tag/my/not-so-simple`
/// becomes `tag/my/notSoSimple` while `tag/my/simpleTag` is untouched.
pub fn camel_case_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.contains('-') {
                segment.to_lower_camel_case()
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Upper-case the first character (`name` -> `Name`).
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}
