//! Slug validation and derivation for account paths.
//!
//! Account groups and slugified vendors feed into the `type:group:vendor`
//! path, which is the per-user uniqueness key, so the alphabet is kept
//! deliberately small.

use crate::error::TypeError;

/// Minimum slug length.
pub const MIN_SLUG_LEN: usize = 2;
/// Maximum slug length.
pub const MAX_SLUG_LEN: usize = 40;

/// Returns `true` if `s` is a valid slug.
///
/// Rules:
/// - 2 to 40 characters
/// - lowercase ASCII letters, digits, and underscores only
///
/// # Examples
///
/// ```
/// use folio_types::slug::is_slug;
///
/// assert!(is_slug("bank"));
/// assert!(is_slug("credit_card"));
/// assert!(!is_slug("x"));
/// assert!(!is_slug("Bank"));
/// assert!(!is_slug("eating-out"));
/// ```
pub fn is_slug(s: &str) -> bool {
    let len = s.chars().count();
    if !(MIN_SLUG_LEN..=MAX_SLUG_LEN).contains(&len) {
        return false;
    }
    s.chars().all(is_slug_char)
}

/// [`is_slug`] as a `Result`, naming the offending value.
pub fn check_slug(s: &str) -> Result<(), TypeError> {
    if is_slug(s) {
        return Ok(());
    }
    let reason = if s.chars().count() < MIN_SLUG_LEN {
        "shorter than 2 characters".to_string()
    } else if s.chars().count() > MAX_SLUG_LEN {
        "longer than 40 characters".to_string()
    } else {
        "only lowercase letters, digits, and underscores are allowed".to_string()
    };
    Err(TypeError::InvalidSlug {
        value: s.to_string(),
        reason,
    })
}

/// Derive a slug from free text.
///
/// Lowercases the input, maps every run of non-slug characters to a single
/// underscore, collapses repeated underscores, stops at 40 characters, and
/// trims leading/trailing underscores. May return a string too short to
/// satisfy [`is_slug`] (including empty input, which stays empty).
///
/// # Examples
///
/// ```
/// use folio_types::slug::slugify;
///
/// assert_eq!(slugify("Monzo Bank"), "monzo_bank");
/// assert_eq!(slugify("  Café -- Nero  "), "caf_nero");
/// assert_eq!(slugify(""), "");
/// ```
pub fn slugify(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let mut out: Vec<char> = Vec::with_capacity(s.len().min(MAX_SLUG_LEN));
    let mut prev_underscore = false;
    for c in s.to_lowercase().chars() {
        if is_slug_char(c) {
            if c == '_' {
                if prev_underscore {
                    continue;
                }
                prev_underscore = true;
            } else {
                prev_underscore = false;
            }
            out.push(c);
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
        if out.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug: String = out.into_iter().collect();
    slug.trim_matches('_').to_string()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_valid_slugs() {
        let max = "x".repeat(40);
        for s in ["ab", "bank", "credit_card", "a1", max.as_str()] {
            assert!(is_slug(s), "{s:?} should be a slug");
        }
    }

    #[test]
    fn rejects_invalid_slugs() {
        let over = "x".repeat(41);
        for s in ["", "a", "Bank", "eating-out", "has space", over.as_str()] {
            assert!(!is_slug(s), "{s:?} should not be a slug");
        }
    }

    #[test]
    fn check_slug_names_the_reason() {
        let err = check_slug("a").unwrap_err();
        assert!(matches!(err, TypeError::InvalidSlug { .. }));
    }

    #[test]
    fn slugify_basics() {
        assert_eq!(slugify("Monzo Bank"), "monzo_bank");
        assert_eq!(slugify("System"), "system");
        assert_eq!(slugify("credit_card"), "credit_card");
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("a--b"), "a_b");
        assert_eq!(slugify("__ab__"), "ab");
        assert_eq!(slugify("  spaced  out  "), "spaced_out");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café"), "caf");
    }

    #[test]
    fn slugify_caps_length() {
        let long = "a".repeat(120);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
        // the cap applies before trimming, so a trailing underscore at the
        // boundary can shorten the result
        let boundary = format!("{} tail", "a".repeat(39));
        assert_eq!(slugify(&boundary), "a".repeat(39));
    }

    #[test]
    fn slugify_empty_stays_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    proptest! {
        #[test]
        fn slugify_is_idempotent(s in ".{0,80}") {
            let once = slugify(&s);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        #[test]
        fn slugify_output_alphabet(s in ".{0,80}") {
            let out = slugify(&s);
            let ok = out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            prop_assert!(ok);
            prop_assert!(out.len() <= MAX_SLUG_LEN);
            prop_assert!(!out.starts_with('_') && !out.ends_with('_'));
        }
    }
}
