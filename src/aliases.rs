//! Alias expansion for request URLs.
//!
//! An alias maps a short name to a base URL, so `api/users` with
//! `api -> https://e.com/v1` becomes `https://e.com/v1/users`.

use crate::storage::Storage;

/// Splits a URL reference into the candidate alias name and the path suffix.
///
/// Returns `None` for full `http://` and `https://` URLs, which are never
/// alias references.
pub fn split_alias_reference(raw: &str) -> Option<(&str, &str)> {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return None;
    }
    Some(raw.split_once('/').unwrap_or((raw, "")))
}

/// Joins an alias base URL and a path suffix with exactly one `/`.
pub fn join_alias(base: &str, suffix: &str) -> String {
    let base = base.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, suffix)
    }
}

/// Expands an alias reference using the alias table in `storage`.
///
/// Full URLs and unknown names come back unchanged. A storage failure is
/// treated like an unknown name.
pub fn resolve_alias(raw: &str, storage: &dyn Storage) -> String {
    let Some((name, suffix)) = split_alias_reference(raw) else {
        return raw.to_string();
    };

    match storage.get_alias(name) {
        Ok(Some(base)) => {
            let resolved = join_alias(&base, suffix);
            log::debug!("resolved alias {} -> {}", raw, resolved);
            resolved
        }
        Ok(None) => raw.to_string(),
        Err(e) => {
            log::warn!("alias lookup for '{}' failed: {}", name, e);
            raw.to_string()
        }
    }
}
