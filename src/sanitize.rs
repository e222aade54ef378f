//! Normalisation helpers applied to untrusted payload fields.

use std::sync::LazyLock;

use regex::Regex;

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://\S+\.(?:jpe?g|png|gif|webp|avif|svg)(?:\?\S*)?$")
        .expect("image url pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Truncates to at most `max` characters, never splitting a code point.
pub fn truncate(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}

pub fn is_image_url(url: &str) -> bool {
    IMAGE_URL.is_match(url.trim())
}

/// Keeps a media URL only when it looks like an image link.
pub fn image_or_empty(url: Option<&str>) -> String {
    match url.map(str::trim) {
        Some(url) if is_image_url(url) => url.to_string(),
        _ => String::new(),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `"Rio de Janeiro-Brazil"` becomes `"rio-de-janeiro-brazil"`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Trims each tag, drops blanks and keeps the first `max`.
pub fn clean_tags(tags: &[String], max: usize) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

/// Case-insensitive "contains" pattern for a user-supplied search term.
pub fn search_pattern(term: &str) -> String {
    regex::escape(term.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_pattern() {
        assert!(is_image_url("https://cdn.example.com/paris.jpg"));
        assert!(is_image_url("http://img.example.com/a/b.WEBP?w=400"));
        assert!(!is_image_url("https://example.com/page.html"));
        assert!(!is_image_url("javascript:alert(1)"));
        assert!(!is_image_url(""));
    }

    #[test]
    fn test_image_or_empty_drops_bad_links() {
        assert_eq!(image_or_empty(Some("not a url")), "");
        assert_eq!(image_or_empty(None), "");
        assert_eq!(
            image_or_empty(Some(" https://x.io/a.png ")),
            "https://x.io/a.png"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Paris-France"), "paris-france");
        assert_eq!(slugify("Rio de Janeiro-Brazil"), "rio-de-janeiro-brazil");
        assert_eq!(slugify("  São Paulo -- Brazil "), "são-paulo-brazil");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("09:30:00", 5), "09:30");
        assert_eq!(truncate("ééééé", 3), "ééé");
    }

    #[test]
    fn test_clean_tags() {
        let tags = vec![" food ".to_string(), "".to_string(), "art".to_string()];
        assert_eq!(clean_tags(&tags, 1), vec!["food".to_string()]);
        assert_eq!(clean_tags(&tags, 10).len(), 2);
    }
}
