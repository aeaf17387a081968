//! Post-conversion check for namespaced tags that survived conversion.

use regex::Regex;

use crate::error::{Error, Result};

const TAG_REFERENCE: &str = r"<[a-zA-Z\-]+:[a-zA-Z\-]+\b";

fn tag_reference_regex() -> Result<Regex> {
    Regex::new(TAG_REFERENCE).map_err(|e| Error::internal_unexpected(format!("Invalid regex: {}", e)))
}

/// Every namespaced tag reference (`<ns:name`) left in converted output, in order.
pub fn find_unresolved_tags(target: &str) -> Result<Vec<String>> {
    let regex = tag_reference_regex()?;
    Ok(regex
        .find_iter(target)
        .map(|found| found.as_str().to_string())
        .collect())
}

/// Fail on the first reference not in `allowed` (entries written `ns:name`).
pub fn validate(target: &str, allowed: &[String]) -> Result<()> {
    let allowed: Vec<String> = allowed
        .iter()
        .map(|tag| format!("<{}", tag.trim_start_matches('<')))
        .collect();

    for reference in find_unresolved_tags(target)? {
        if !allowed.contains(&reference) {
            return Err(Error::dependency_unresolved(reference));
        }
    }

    Ok(())
}
