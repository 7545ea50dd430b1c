use crate::error::{BrokerError, Result};

/// Canonical form of a language tag: `en-us.UTF-8@euro` becomes `en_US`.
///
/// The wildcard `*` passes through untouched.
pub fn normalize(tag: &str) -> Result<String> {
    let trimmed = tag.trim();
    if trimmed == "*" {
        return Ok(trimmed.to_string());
    }

    // Drop encoding and modifier suffixes
    let core = trimmed
        .split(['.', '@'])
        .next()
        .unwrap_or("")
        .replace('-', "_");

    let mut parts = core.split('_');
    let language = parts.next().unwrap_or("");
    if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BrokerError::InvalidTag(tag.to_string()));
    }

    let mut normalized = language.to_ascii_lowercase();
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BrokerError::InvalidTag(tag.to_string()));
        }
        normalized.push('_');
        // Two letter subtags are territories
        if part.len() == 2 {
            normalized.push_str(&part.to_ascii_uppercase());
        } else {
            normalized.push_str(part);
        }
    }

    Ok(normalized)
}

/// `en_US` -> `en`. None when the tag has no territory part.
pub fn base_language(tag: &str) -> Option<&str> {
    tag.split_once('_').map(|(language, _)| language)
}

/// The tag followed by its base-language fallback, if any.
pub fn candidates(tag: &str) -> Vec<&str> {
    let mut candidates = vec![tag];
    candidates.extend(base_language(tag));
    candidates
}
