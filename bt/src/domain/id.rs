//! Domain ID generation
//!
//! All IDs use the format: `{8-char-hex}-{type}-{slug}`
//! Example: `3f9a01c2-todo-as-a-shopper-i-want-to-pay`

/// Maximum slug length in characters
const MAX_SLUG_CHARS: usize = 40;

/// Generate a domain ID from type and title
///
/// The hex part comes from the random tail of a UUIDv7, so two IDs created
/// in the same millisecond still differ.
pub fn generate_id(domain_type: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    let hex = &uuid[uuid.len() - 8..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex, domain_type)
    } else {
        format!("{}-{}-{}", hex, domain_type, slug)
    }
}

/// Slugify a title for use in IDs
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    slug.chars()
        .take(MAX_SLUG_CHARS)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("todo", "Add OAuth Authentication");
        let (hex, rest) = id.split_once('-').unwrap();
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "todo-add-oauth-authentication");
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id("todo", "same"), generate_id("todo", "same"));
    }

    #[test]
    fn test_generate_id_empty_title() {
        let id = generate_id("chat", "!!!");
        assert!(id.ends_with("-chat"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Don't Stop"), "dont-stop");
        assert_eq!(slugify("  --multiple---dashes--  "), "multiple-dashes");
        assert_eq!(slugify("Là khách hàng"), "là-khách-hàng");
    }

    #[test]
    fn test_slugify_truncates() {
        let slug = slugify("As a shopper I want to save my cart so that I can pay later");
        assert!(slug.chars().count() <= MAX_SLUG_CHARS);
        assert!(!slug.ends_with('-'));
        assert!(slug.starts_with("as-a-shopper"));
    }
}
