//! CLI output formatting for the `check` command.
//!
//! # Information-First Display
//!
//! Output is an inventory of what the site would serve: every record shows
//! its semantic identity (positional index + name) on the header line, with
//! secondary details on indented context lines.
//!
//! # Output Format
//!
//! ```text
//! Config
//!     Site: Simple Bistro
//!     Server: 127.0.0.1:3000
//!     Store: firestore (project bistro-prod)
//!     Media: cloudinary (cloud demo, folder restaurant)
//!     Admin: admin@example.com (login enabled)
//!
//! Dishes
//! 001 Suya Platter ($12.50)
//!     Category: Grills
//!     Popular
//!     Description: Spiced beef skewers
//!
//! Posts
//! 001 Suya Night Special
//!     Slug: suya-night-special
//!     By: Chef Ada on 2024-05-01
//!
//! Categories
//! 001 Grills
//!
//! Found 1 dish, 1 post, 1 category
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::{MediaBackend, SiteConfig, StoreBackend};
use crate::types::{Category, Dish, Post};

/// Descriptions longer than this are cut in the inventory.
const DESCRIPTION_CHARS: usize = 60;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + name, with optional detail.
///
/// ```text
/// 001 Suya Platter ($12.50)
/// 001 Soups
/// ```
fn entity_header(index: usize, name: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), name, d),
        None => format!("{} {}", format_index(index), name),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// ============================================================================
// Config
// ============================================================================

pub fn format_config_summary(config: &SiteConfig) -> Vec<String> {
    let store = match config.store.backend {
        StoreBackend::Memory => "memory (content is lost on restart)".to_string(),
        StoreBackend::Firestore => format!("firestore (project {})", config.store.project_id),
    };
    let media = match config.media.backend {
        MediaBackend::Memory => "memory (placeholder URLs)".to_string(),
        MediaBackend::Cloudinary => format!(
            "cloudinary (cloud {}, folder {})",
            config.media.cloud_name, config.media.folder
        ),
    };
    let login = if config.admin.password_sha256.is_empty() {
        "login disabled"
    } else {
        "login enabled"
    };

    vec![
        "Config".to_string(),
        format!("{}Site: {}", indent(1), config.site.name),
        format!("{}Server: {}", indent(1), config.server.address()),
        format!("{}Store: {store}", indent(1)),
        format!("{}Media: {media}", indent(1)),
        format!("{}Admin: {} ({login})", indent(1), config.admin.email),
    ]
}

pub fn print_config_summary(config: &SiteConfig) {
    for line in format_config_summary(config) {
        println!("{line}");
    }
}

// ============================================================================
// Content inventory
// ============================================================================

pub fn format_inventory(
    dishes: &[Dish],
    posts: &[Post],
    categories: &[Category],
    currency: &str,
) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Dishes".to_string());
    for (i, dish) in dishes.iter().enumerate() {
        let price = format!("{currency}{}", dish.price);
        lines.push(entity_header(i + 1, &dish.name, Some(&price)));
        if !dish.category.is_empty() {
            lines.push(format!("{}Category: {}", indent(1), dish.category));
        }
        if dish.popular {
            lines.push(format!("{}Popular", indent(1)));
        }
        if let Some(order) = dish.order {
            lines.push(format!("{}Order: {order}", indent(1)));
        }
        if !dish.description.is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(&dish.description, DESCRIPTION_CHARS)
            ));
        }
        if dish.image_url.is_none() {
            lines.push(format!("{}No image", indent(1)));
        }
    }

    lines.push(String::new());
    lines.push("Posts".to_string());
    for (i, post) in posts.iter().enumerate() {
        lines.push(entity_header(i + 1, &post.title, None));
        lines.push(format!("{}Slug: {}", indent(1), post.slug));
        let date = post.created_at.format("%Y-%m-%d");
        if post.author.is_empty() {
            lines.push(format!("{}On: {date}", indent(1)));
        } else {
            lines.push(format!("{}By: {} on {date}", indent(1), post.author));
        }
    }

    lines.push(String::new());
    lines.push("Categories".to_string());
    for (i, category) in categories.iter().enumerate() {
        lines.push(entity_header(i + 1, &category.name, None));
    }

    lines.push(String::new());
    lines.push(format!(
        "Found {}, {}, {}",
        plural(dishes.len(), "dish", "dishes"),
        plural(posts.len(), "post", "posts"),
        plural(categories.len(), "category", "categories"),
    ));
    lines
}

pub fn print_inventory(dishes: &[Dish], posts: &[Post], categories: &[Category], currency: &str) {
    for line in format_inventory(dishes, posts, categories, currency) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{category, dish, post};

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("hello", 10), "hello");
    }

    #[test]
    fn truncate_desc_exact() {
        assert_eq!(truncate_desc("hello", 5), "hello");
    }

    #[test]
    fn truncate_desc_long() {
        assert_eq!(truncate_desc("hello world", 5), "hello...");
    }

    #[test]
    fn truncate_desc_multibyte() {
        assert_eq!(truncate_desc("égusi soup", 3), "égu...");
    }

    #[test]
    fn format_index_padding() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn entity_header_with_detail() {
        assert_eq!(entity_header(1, "Suya", Some("$12")), "001 Suya ($12)");
        assert_eq!(entity_header(2, "Soups", None), "002 Soups");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "dish", "dishes"), "1 dish");
        assert_eq!(plural(0, "dish", "dishes"), "0 dishes");
    }

    // =========================================================================
    // Sections
    // =========================================================================

    #[test]
    fn config_summary_defaults() {
        let lines = format_config_summary(&SiteConfig::default());
        assert_eq!(lines[0], "Config");
        assert_eq!(lines[2], "    Server: 127.0.0.1:3000");
        assert!(lines[3].contains("memory"));
        assert!(lines[5].ends_with("(login disabled)"));
    }

    #[test]
    fn inventory_lists_everything() {
        let mut suya = dish("Suya Platter", "Grills", Some(1), 1);
        suya.popular = true;
        suya.description = "Spiced beef skewers".to_string();
        let lines = format_inventory(
            &[suya],
            &[post("Suya Night Special", 2)],
            &[category("Grills")],
            "$",
        );

        assert_eq!(lines[0], "Dishes");
        assert_eq!(lines[1], "001 Suya Platter ($9.50)");
        assert!(lines.contains(&"    Category: Grills".to_string()));
        assert!(lines.contains(&"    Popular".to_string()));
        assert!(lines.contains(&"    Order: 1".to_string()));
        assert!(lines.contains(&"    Slug: suya-night-special".to_string()));
        assert!(lines.contains(&"    By: Chef Ada on 2024-05-01".to_string()));
        assert!(lines.contains(&"001 Grills".to_string()));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Found 1 dish, 1 post, 1 category")
        );
    }

    #[test]
    fn empty_inventory() {
        let lines = format_inventory(&[], &[], &[], "$");
        assert_eq!(
            lines,
            vec![
                "Dishes",
                "",
                "Posts",
                "",
                "Categories",
                "",
                "Found 0 dishes, 0 posts, 0 categories"
            ]
        );
    }
}
