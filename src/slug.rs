//! URL slugs for blog posts.
//!
//! A post's slug is derived from its title every time the post is saved:
//! lowercased, every run of non-alphanumeric characters collapsed into a
//! single dash, no leading or trailing dash.
//!
//! - `"Suya Night Special!!"` → `"suya-night-special"`
//! - `"  Jollof & Plantain  "` → `"jollof-plantain"`
//! - `"Café Week"` → `"cafe-week"` (non-ASCII letters are transliterated)

/// Derive a slug from a title.
pub fn slugify(title: &str) -> String {
    ::slug::slugify(title)
}

/// Whether `candidate` is already in canonical slug form.
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && !candidate.contains("--")
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
