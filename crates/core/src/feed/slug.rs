//! Slug derivation for topic titles.

/// Longest slug emitted, leaving room for a collision suffix.
const MAX_SLUG_LEN: usize = 40;

/// Derive a URL-safe slug from a title: lowercase, alphanumerics and
/// dashes only, runs collapsed, capped at 40 chars.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true; // Suppress a leading dash

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if (c.is_whitespace() || c == '-') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug
    }
}
