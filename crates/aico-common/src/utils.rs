//! Common utility functions used across AICO components

use uuid::Uuid;

/// Generate a unique ID for various entities
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Short display form of an existing id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Keep the first `max_chars` characters of `text`, appending "..." when cut
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// Turn a snake_case identifier into Title Case words
pub fn title_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ids() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);

        assert_eq!(short_id(&id1), &id1[..8]);
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_with_ellipsis("a longer sentence", 8), "a longer...");
        assert_eq!(truncate_with_ellipsis("thé vert", 3), "thé...");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("social_media_manager"), "Social Media Manager");
        assert_eq!(title_case("ceo"), "Ceo");
        assert_eq!(title_case(""), "");
    }
}
