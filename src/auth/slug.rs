//! Tenant slug derivation.
//!
//! Slugs are lowercase `a-z0-9-`: unsupported characters are dropped, runs of
//! whitespace and hyphens collapse into a single `-`, and the result never starts
//! or ends with `-`. Uniqueness is enforced by the store.

const SLUG_MAX: usize = 64;
const FALLBACK_SLUG: &str = "tenant";

/// Derives the slug for a tenant name. Names with no usable characters fall
/// back to `tenant` so every tenant still gets a non-empty slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch.is_ascii_whitespace() || ch == '-' {
            pending_dash = true;
        }
    }

    let truncated: String = slug.chars().take(SLUG_MAX).collect();
    let trimmed = truncated.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Appends `-{suffix}` to a base slug to resolve a collision.
/// Returns `None` when the result would not fit or leaves an empty base.
#[must_use]
pub fn with_suffix(base: &str, suffix: usize) -> Option<String> {
    let suffix = format!("-{suffix}");
    if suffix.len() >= SLUG_MAX {
        return None;
    }
    let allowed = SLUG_MAX.saturating_sub(suffix.len());
    let base_part: String = base.chars().take(allowed).collect();
    let base_part = base_part.trim_end_matches('-');
    if base_part.is_empty() {
        return None;
    }
    Some(format!("{base_part}{suffix}"))
}

/// Candidate slugs for a base, in the order they should be tried.
pub(crate) fn candidates(base: &str, attempts: usize) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((2..=attempts).filter_map(move |n| with_suffix(base, n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Blood Bank Jakarta!!"), "blood-bank-jakarta");
        assert_eq!(slugify("  A -- B  "), "a-b");
        assert_eq!(slugify("PMI Kota_Bandung"), "pmi-kotabandung");
        assert_eq!(slugify("RS. Harapan (Pusat)"), "rs-harapan-pusat");
    }

    #[test]
    fn slugify_never_has_edge_dashes() {
        for input in ["-lead", "trail-", "--both--", " - x - ", "\tTabs\tand\nlines\n"] {
            let slug = slugify(input);
            assert!(!slug.starts_with('-'), "{input:?} -> {slug:?}");
            assert!(!slug.ends_with('-'), "{input:?} -> {slug:?}");
            assert!(!slug.contains("--"), "{input:?} -> {slug:?}");
        }
    }

    #[test]
    fn slugify_splits_on_ascii_whitespace_only() {
        assert_eq!(slugify("A\u{a0}B"), "ab");
        assert_eq!(slugify("A\u{2003}B"), "ab");
        assert_eq!(slugify("A\r\x0cB"), "a-b");
    }

    #[test]
    fn slugify_is_deterministic() {
        assert_eq!(slugify("Jane Donor"), slugify("Jane Donor"));
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify(""), "tenant");
        assert_eq!(slugify("!!!"), "tenant");
        assert_eq!(slugify("Ünïcödé"), "ncd");
    }

    #[test]
    fn slugify_respects_max_length() {
        let long = "a ".repeat(100);
        let slug = slugify(&long);
        assert!(slug.len() <= SLUG_MAX);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn with_suffix_appends() {
        assert_eq!(with_suffix("blood-bank", 2), Some("blood-bank-2".to_string()));
        let long = "a".repeat(SLUG_MAX);
        let suffixed = with_suffix(&long, 3).unwrap();
        assert_eq!(suffixed.len(), SLUG_MAX);
        assert!(suffixed.ends_with("-3"));
        assert_eq!(with_suffix("", 2), None);
    }

    #[test]
    fn candidates_start_with_base() {
        let all: Vec<String> = candidates("jane", 3).collect();
        assert_eq!(all, vec!["jane", "jane-2", "jane-3"]);
    }
}
