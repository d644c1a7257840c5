//! Ordering and filtering for the public listings.
//!
//! The store hands back whole collections in no particular order. Everything
//! the visitor sees as "sorted" or "filtered" is decided here, in memory:
//!
//! | View | Order | Filter |
//! |------|-------|--------|
//! | Blog | `created_at`, newest first | case-insensitive substring of the title |
//! | Menu | manual `order` ascending, then `created_at` newest first | exact category, `All` passes everything |
//!
//! Dishes with a manual `order` always come before dishes without one.

use crate::types::{Category, Dish, Post};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Menu filter value that matches every dish.
pub const ALL_CATEGORIES: &str = "All";

/// Newest first.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub fn sort_dishes(dishes: &mut [Dish]) {
    dishes.sort_by(compare_dishes);
}

fn compare_dishes(a: &Dish, b: &Dish) -> Ordering {
    match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| b.created_at.cmp(&a.created_at)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    }
}

/// Posts whose title contains `query`, ignoring case. A blank query keeps
/// everything.
pub fn filter_posts<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
    let needle = query.trim().to_lowercase();
    posts
        .iter()
        .filter(|post| needle.is_empty() || post.title.to_lowercase().contains(&needle))
        .collect()
}

/// Dishes in exactly `category`. Blank or [`ALL_CATEGORIES`] keeps
/// everything.
pub fn filter_dishes<'a>(dishes: &'a [Dish], category: &str) -> Vec<&'a Dish> {
    let category = category.trim();
    dishes
        .iter()
        .filter(|dish| {
            category.is_empty() || category == ALL_CATEGORIES || dish.category == category
        })
        .collect()
}

/// Popular dishes, keeping the incoming order.
pub fn popular_dishes(dishes: &[Dish]) -> Vec<&Dish> {
    dishes.iter().filter(|dish| dish.popular).collect()
}

/// Distinct category names for filter tabs and select options.
///
/// Names from the categories collection come first in their stored order,
/// followed by any names only found on dishes. Duplicates and blanks are
/// dropped.
pub fn category_choices(categories: &[Category], dishes: &[Dish]) -> Vec<String> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .map(|c| c.name.trim())
        .chain(dishes.iter().map(|d| d.category.trim()))
        .filter(|name| !name.is_empty() && seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}
