//! Shared test utilities for the simple-bistro test suite.
//!
//! Provides record builders, form drafts, a tiny valid PNG, an in-memory
//! content service, and lookup helpers that panic with the available names
//! on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = memory_service();
//! fx.service.create_dish(&dish_draft("Suya Platter"), None).await.unwrap();
//!
//! let dishes = fx.service.list_dishes().await.unwrap();
//! let suya = find_dish(&dishes, "Suya Platter");
//! assert_eq!(suya.price, "12.50");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use crate::content::ContentService;
use crate::media::{MediaFile, MemoryMedia};
use crate::store::MemoryStore;
use crate::types::{Category, Dish, DishDraft, Post, PostDraft};

// =========================================================================
// Images
// =========================================================================

/// PNG signature followed by an IHDR chunk header for a 1x1 image. Enough
/// for format sniffing.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    bytes
}

pub fn png_file(name: &str) -> MediaFile {
    MediaFile {
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: png_bytes(),
    }
}

// =========================================================================
// Records
// =========================================================================

/// 2024-05-01 at the given hour, UTC.
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

pub fn post(title: &str, hour: u32) -> Post {
    Post {
        id: format!("post-{hour}"),
        title: title.to_string(),
        author: "Chef Ada".to_string(),
        content: format!("All about {title}."),
        image: None,
        slug: crate::slug::slugify(title),
        created_at: at(hour),
        updated_at: at(hour),
    }
}

pub fn dish(name: &str, category: &str, order: Option<i64>, hour: u32) -> Dish {
    Dish {
        id: format!("dish-{hour}"),
        name: name.to_string(),
        category: category.to_string(),
        price: "9.50".to_string(),
        description: String::new(),
        image_url: None,
        popular: false,
        order_link: None,
        order,
        created_at: at(hour),
        updated_at: at(hour),
    }
}

pub fn category(name: &str) -> Category {
    Category {
        id: format!("cat-{name}"),
        name: name.to_string(),
        created_at: at(0),
    }
}

// =========================================================================
// Drafts
// =========================================================================

pub fn post_draft(title: &str) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        author: "Chef Ada".to_string(),
        content: "We fired up the grill.".to_string(),
    }
}

pub fn dish_draft(name: &str) -> DishDraft {
    DishDraft {
        name: name.to_string(),
        category: "Grills".to_string(),
        price: "12.50".to_string(),
        description: "Spiced beef skewers".to_string(),
        popular: false,
        order_link: String::new(),
        order: String::new(),
    }
}

// =========================================================================
// In-memory service
// =========================================================================

/// A content service over in-memory backends, with handles to both
/// backends for inspecting side effects.
pub struct Fixture {
    pub service: ContentService,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MemoryMedia>,
    pub max_upload_bytes: usize,
}

pub fn memory_service() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(MemoryMedia::new("restaurant"));
    let max_upload_bytes = 4096;
    Fixture {
        service: ContentService::new(store.clone(), media.clone(), max_upload_bytes),
        store,
        media,
        max_upload_bytes,
    }
}

// =========================================================================
// Lookups: panic with the available names on a miss
// =========================================================================

/// Find a dish by name. Panics if not found.
pub fn find_dish<'a>(dishes: &'a [Dish], name: &str) -> &'a Dish {
    dishes.iter().find(|d| d.name == name).unwrap_or_else(|| {
        let names: Vec<&str> = dishes.iter().map(|d| d.name.as_str()).collect();
        panic!("dish '{name}' not found. Available: {names:?}")
    })
}

/// Find a post by title. Panics if not found.
pub fn find_post<'a>(posts: &'a [Post], title: &str) -> &'a Post {
    posts.iter().find(|p| p.title == title).unwrap_or_else(|| {
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        panic!("post '{title}' not found. Available: {titles:?}")
    })
}
