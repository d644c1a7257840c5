//! Content records and the form drafts they are built from.
//!
//! Each record converts to a store [`Document`] with `to_document` and back
//! with `from_document`. Field names on the wire are camelCase to match the
//! existing data (`imageUrl`, `orderLink`, `createdAt`, ...).
//!
//! Drafts (`PostDraft`, `DishDraft`) hold exactly what the admin typed, as
//! text. They are what a form re-renders after a failed save, so nothing the
//! admin entered is lost. [`validate`](crate::validate) turns a draft into
//! an input (`PostInput`, `DishInput`) whose invariants hold.

use crate::slug::{is_valid_slug, slugify};
use crate::store::{Document, DocumentError, FieldValue, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp used when a stored document predates the timestamp fields.
fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

// ============================================================================
// Post
// ============================================================================

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Markdown body.
    pub content: String,
    /// Public URL of the cover image on the media host.
    pub image: Option<String>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("title".into(), self.title.clone().into());
        doc.insert("author".into(), self.author.clone().into());
        doc.insert("content".into(), self.content.clone().into());
        if let Some(image) = &self.image {
            doc.insert("image".into(), image.clone().into());
        }
        doc.insert("slug".into(), self.slug.clone().into());
        doc.insert("createdAt".into(), self.created_at.into());
        doc.insert("updatedAt".into(), self.updated_at.into());
        doc
    }

    pub fn from_document(id: &str, doc: &Document) -> Result<Self, DocumentError> {
        let title = doc.required_str("title")?;
        let created_at = doc.optional_timestamp("createdAt")?.unwrap_or_else(epoch);
        Ok(Self {
            id: id.to_string(),
            slug: doc
                .optional_str("slug")?
                .filter(|s| is_valid_slug(s))
                .unwrap_or_else(|| slugify(&title)),
            title,
            author: doc.optional_str("author")?.unwrap_or_default(),
            content: doc.optional_str("content")?.unwrap_or_default(),
            image: doc.optional_str("image")?.filter(|s| !s.is_empty()),
            created_at,
            updated_at: doc.optional_timestamp("updatedAt")?.unwrap_or(created_at),
        })
    }
}

/// A post form exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub author: String,
    pub content: String,
}

impl From<&Post> for PostDraft {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            author: post.author.clone(),
            content: post.content.clone(),
        }
    }
}

/// Validated post fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub author: String,
    pub content: String,
}

// ============================================================================
// Dish
// ============================================================================

/// A menu item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    /// Free-text copy of a category name. Not a reference; renaming a
    /// category does not touch existing dishes.
    pub category: String,
    /// Decimal string, e.g. `"12.50"`.
    pub price: String,
    pub description: String,
    pub image_url: Option<String>,
    pub popular: bool,
    pub order_link: Option<String>,
    /// Manual sort position. Dishes with one sort ahead of dishes without.
    pub order: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dish {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("name".into(), self.name.clone().into());
        doc.insert("category".into(), self.category.clone().into());
        doc.insert("price".into(), self.price.clone().into());
        doc.insert("description".into(), self.description.clone().into());
        if let Some(url) = &self.image_url {
            doc.insert("imageUrl".into(), url.clone().into());
        }
        doc.insert("popular".into(), self.popular.into());
        if let Some(link) = &self.order_link {
            doc.insert("orderLink".into(), link.clone().into());
        }
        if let Some(order) = self.order {
            doc.insert("order".into(), FieldValue::Integer(order));
        }
        doc.insert("createdAt".into(), self.created_at.into());
        doc.insert("updatedAt".into(), self.updated_at.into());
        doc
    }

    pub fn from_document(id: &str, doc: &Document) -> Result<Self, DocumentError> {
        let created_at = doc.optional_timestamp("createdAt")?.unwrap_or_else(epoch);
        Ok(Self {
            id: id.to_string(),
            name: doc.required_str("name")?,
            category: doc.optional_str("category")?.unwrap_or_default(),
            price: doc.required_decimal_text("price")?,
            description: doc.optional_str("description")?.unwrap_or_default(),
            image_url: doc.optional_str("imageUrl")?.filter(|s| !s.is_empty()),
            popular: doc.optional_bool("popular")?.unwrap_or(false),
            order_link: doc.optional_str("orderLink")?.filter(|s| !s.is_empty()),
            order: doc.optional_i64("order")?,
            created_at,
            updated_at: doc.optional_timestamp("updatedAt")?.unwrap_or(created_at),
        })
    }
}

/// A dish form exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DishDraft {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub popular: bool,
    pub order_link: String,
    pub order: String,
}

impl From<&Dish> for DishDraft {
    fn from(dish: &Dish) -> Self {
        Self {
            name: dish.name.clone(),
            category: dish.category.clone(),
            price: dish.price.clone(),
            description: dish.description.clone(),
            popular: dish.popular,
            order_link: dish.order_link.clone().unwrap_or_default(),
            order: dish.order.map(|o| o.to_string()).unwrap_or_default(),
        }
    }
}

/// Validated dish fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DishInput {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub popular: bool,
    pub order_link: Option<String>,
    pub order: Option<i64>,
}

// ============================================================================
// Category
// ============================================================================

/// A menu category name. Append-only; duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("name".into(), self.name.clone().into());
        doc.insert("createdAt".into(), self.created_at.into());
        doc
    }

    pub fn from_document(id: &str, doc: &Document) -> Result<Self, DocumentError> {
        Ok(Self {
            id: id.to_string(),
            name: doc.required_str("name")?,
            created_at: doc.optional_timestamp("createdAt")?.unwrap_or_else(epoch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn dish() -> Dish {
        Dish {
            id: "d1".to_string(),
            name: "Suya Platter".to_string(),
            category: "Grills".to_string(),
            price: "12.50".to_string(),
            description: "Spiced beef skewers".to_string(),
            image_url: Some("https://cdn.test/suya.jpg".to_string()),
            popular: true,
            order_link: None,
            order: Some(2),
            created_at: at(10),
            updated_at: at(11),
        }
    }

    #[test]
    fn dish_document_field_names() {
        let doc = dish().to_document();
        assert!(doc.contains_key("imageUrl"));
        assert!(doc.contains_key("createdAt"));
        assert!(doc.contains_key("updatedAt"));
        assert_eq!(doc.get("order"), Some(&FieldValue::Integer(2)));
        // Absent optional fields are not written
        assert!(!doc.contains_key("orderLink"));
    }

    #[test]
    fn dish_survives_store_boundary() {
        let original = dish();
        let decoded = Dish::from_document("d1", &original.to_document()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn dish_tolerates_legacy_shapes() {
        let mut doc = Document::new();
        doc.insert("name".into(), "Pepper Soup".into());
        doc.insert("price".into(), FieldValue::Double(8.0));
        let decoded = Dish::from_document("x", &doc).unwrap();
        assert_eq!(decoded.price, "8");
        assert_eq!(decoded.category, "");
        assert!(!decoded.popular);
        assert_eq!(decoded.order, None);
        assert_eq!(decoded.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn dish_without_name_is_rejected() {
        let mut doc = dish().to_document();
        doc.remove("name");
        assert_eq!(
            Dish::from_document("x", &doc),
            Err(DocumentError::Missing("name"))
        );
    }

    #[test]
    fn empty_image_url_reads_as_none() {
        let mut doc = dish().to_document();
        doc.insert("imageUrl".into(), "".into());
        assert_eq!(Dish::from_document("x", &doc).unwrap().image_url, None);
    }

    #[test]
    fn post_missing_slug_is_derived() {
        let mut doc = Document::new();
        doc.insert("title".into(), "Suya Night Special!!".into());
        doc.insert("createdAt".into(), at(9).into());
        let post = Post::from_document("p1", &doc).unwrap();
        assert_eq!(post.slug, "suya-night-special");
        assert_eq!(post.updated_at, at(9));
    }

    #[test]
    fn post_with_broken_slug_is_rederived() {
        let mut doc = Document::new();
        doc.insert("title".into(), "Jollof Wars".into());
        doc.insert("slug".into(), "Jollof Wars".into());
        assert_eq!(Post::from_document("p1", &doc).unwrap().slug, "jollof-wars");
    }

    #[test]
    fn draft_from_dish_renders_optional_fields_as_text() {
        let draft = DishDraft::from(&dish());
        assert_eq!(draft.order, "2");
        assert_eq!(draft.order_link, "");
        assert!(draft.popular);
    }

    #[test]
    fn category_roundtrip() {
        let category = Category {
            id: "c1".to_string(),
            name: "Soups".to_string(),
            created_at: at(8),
        };
        let decoded = Category::from_document("c1", &category.to_document()).unwrap();
        assert_eq!(decoded, category);
    }
}
