//! Content service: the save, read, and delete workflows behind the admin
//! forms and public views.
//!
//! ## Save order
//!
//! Every create or update runs the same steps, stopping at the first
//! failure:
//!
//! ```text
//! 1. validate     draft fields + image constraints     (no network)
//! 2. load         existing record, edit token check    (updates only)
//! 3. upload       new image to the media host          (if one was chosen)
//! 4. write        one insert or replace on the store
//! ```
//!
//! A failure in step 1 or 2 never touches the media host. A failure in
//! step 4 after an upload discards the uploaded image again, best effort.
//! On update without a new image the stored image URL is kept as is.
//!
//! ## Edit tokens
//!
//! An edit form carries the `updated_at` it was rendered with. If the
//! record's `updated_at` has moved on by the time the form is submitted,
//! the save is refused with [`SaveError::Conflict`] rather than
//! overwriting someone else's change.
//!
//! ## Reads
//!
//! Listings skip documents that do not decode (logged), so one bad record
//! never hides the rest of the menu.

use crate::listing;
use crate::media::{self, MediaError, MediaFile, MediaHost, UploadedMedia};
use crate::slug::slugify;
use crate::store::{Collection, ContentStore, Document, DocumentError, StoreError};
use crate::types::{Category, Dish, DishDraft, Post, PostDraft};
use crate::validate::{self, ValidationError};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("image upload failed: {0}")]
    Upload(#[from] MediaError),
    #[error("saving failed: {0}")]
    Write(#[from] StoreError),
    #[error("{collection} {id} no longer exists")]
    NotFound { collection: Collection, id: String },
    #[error("this {0} was changed by someone else since the form was opened")]
    Conflict(&'static str),
}

type Decode<T> = fn(&str, &Document) -> Result<T, DocumentError>;

/// Current time at the store's timestamp precision (microseconds), so an
/// edit token read back from the store compares equal to what was written.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    media: Arc<dyn MediaHost>,
    max_upload_bytes: usize,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        media: Arc<dyn MediaHost>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            media,
            max_upload_bytes,
        }
    }

    // ------------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------------

    pub async fn create_post(
        &self,
        draft: &PostDraft,
        image: Option<&MediaFile>,
    ) -> Result<Post, SaveError> {
        let input = validate::validate_post(draft)?;
        self.check_image(image)?;
        let uploaded = self.upload(image).await?;

        let now = now();
        let mut post = Post {
            id: String::new(),
            slug: slugify(&input.title),
            title: input.title,
            author: input.author,
            content: input.content,
            image: uploaded.as_ref().map(|m| m.url.clone()),
            created_at: now,
            updated_at: now,
        };
        let written = self.store.insert(Collection::Posts, post.to_document()).await;
        post.id = self.settle(uploaded, written).await?;
        info!(id = %post.id, title = %post.title, "post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        id: &str,
        draft: &PostDraft,
        image: Option<&MediaFile>,
        edit_token: Option<DateTime<Utc>>,
    ) -> Result<Post, SaveError> {
        let input = validate::validate_post(draft)?;
        self.check_image(image)?;
        let existing = self
            .load_for_edit(Collection::Posts, id, Post::from_document)
            .await?;
        check_token("post", existing.updated_at, edit_token)?;
        let uploaded = self.upload(image).await?;

        let post = Post {
            id: existing.id,
            slug: slugify(&input.title),
            title: input.title,
            author: input.author,
            content: input.content,
            image: uploaded.as_ref().map(|m| m.url.clone()).or(existing.image),
            created_at: existing.created_at,
            updated_at: now(),
        };
        let written = self.store.replace(Collection::Posts, id, post.to_document()).await;
        self.settle(uploaded, written).await.map_err(|e| gone(e, Collection::Posts, id))?;
        info!(%id, title = %post.title, "post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        self.store.remove(Collection::Posts, id).await?;
        info!(%id, "post deleted");
        Ok(())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        self.get(Collection::Posts, id, Post::from_document).await
    }

    /// Every readable post, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.list(Collection::Posts, Post::from_document).await?;
        listing::sort_posts(&mut posts);
        Ok(posts)
    }

    // ------------------------------------------------------------------------
    // Dishes
    // ------------------------------------------------------------------------

    pub async fn create_dish(
        &self,
        draft: &DishDraft,
        image: Option<&MediaFile>,
    ) -> Result<Dish, SaveError> {
        let input = validate::validate_dish(draft)?;
        self.check_image(image)?;
        let uploaded = self.upload(image).await?;

        let now = now();
        let mut dish = Dish {
            id: String::new(),
            name: input.name,
            category: input.category,
            price: input.price,
            description: input.description,
            image_url: uploaded.as_ref().map(|m| m.url.clone()),
            popular: input.popular,
            order_link: input.order_link,
            order: input.order,
            created_at: now,
            updated_at: now,
        };
        let written = self.store.insert(Collection::Dishes, dish.to_document()).await;
        dish.id = self.settle(uploaded, written).await?;
        info!(id = %dish.id, name = %dish.name, "dish created");
        Ok(dish)
    }

    pub async fn update_dish(
        &self,
        id: &str,
        draft: &DishDraft,
        image: Option<&MediaFile>,
        edit_token: Option<DateTime<Utc>>,
    ) -> Result<Dish, SaveError> {
        let input = validate::validate_dish(draft)?;
        self.check_image(image)?;
        let existing = self
            .load_for_edit(Collection::Dishes, id, Dish::from_document)
            .await?;
        check_token("dish", existing.updated_at, edit_token)?;
        let uploaded = self.upload(image).await?;

        let dish = Dish {
            id: existing.id,
            name: input.name,
            category: input.category,
            price: input.price,
            description: input.description,
            image_url: uploaded
                .as_ref()
                .map(|m| m.url.clone())
                .or(existing.image_url),
            popular: input.popular,
            order_link: input.order_link,
            order: input.order,
            created_at: existing.created_at,
            updated_at: now(),
        };
        let written = self.store.replace(Collection::Dishes, id, dish.to_document()).await;
        self.settle(uploaded, written).await.map_err(|e| gone(e, Collection::Dishes, id))?;
        info!(%id, name = %dish.name, "dish updated");
        Ok(dish)
    }

    pub async fn delete_dish(&self, id: &str) -> Result<(), StoreError> {
        self.store.remove(Collection::Dishes, id).await?;
        info!(%id, "dish deleted");
        Ok(())
    }

    pub async fn get_dish(&self, id: &str) -> Result<Option<Dish>, StoreError> {
        self.get(Collection::Dishes, id, Dish::from_document).await
    }

    /// Every readable dish in menu order.
    pub async fn list_dishes(&self) -> Result<Vec<Dish>, StoreError> {
        let mut dishes = self.list(Collection::Dishes, Dish::from_document).await?;
        listing::sort_dishes(&mut dishes);
        Ok(dishes)
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    /// Append a category. Existing names are not checked; duplicates are
    /// stored and collapsed at display time.
    pub async fn add_category(&self, name: &str) -> Result<Category, SaveError> {
        let name = validate::validate_category(name)?;
        let mut category = Category {
            id: String::new(),
            name,
            created_at: now(),
        };
        category.id = self
            .store
            .insert(Collection::Categories, category.to_document())
            .await?;
        info!(id = %category.id, name = %category.name, "category added");
        Ok(category)
    }

    /// Categories in the order they were added.
    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self
            .list(Collection::Categories, Category::from_document)
            .await?;
        categories.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(categories)
    }

    // ------------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------------

    fn check_image(&self, image: Option<&MediaFile>) -> Result<(), ValidationError> {
        match image {
            Some(file) => media::check_upload(file, self.max_upload_bytes),
            None => Ok(()),
        }
    }

    async fn upload(&self, image: Option<&MediaFile>) -> Result<Option<UploadedMedia>, MediaError> {
        let Some(file) = image else {
            return Ok(None);
        };
        match self.media.upload(file).await {
            Ok(uploaded) => Ok(Some(uploaded)),
            Err(err) => {
                warn!(file = %file.file_name, error = %err, "image upload failed");
                Err(err)
            }
        }
    }

    /// Resolve a store write. On failure, try to remove the image uploaded
    /// for it so it does not sit unreferenced on the media host.
    async fn settle<T>(
        &self,
        uploaded: Option<UploadedMedia>,
        written: Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let err = match written {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        warn!(error = %err, "store write failed");
        if let Some(media) = uploaded {
            match self.media.discard(&media).await {
                Ok(()) => info!(url = %media.url, "discarded image from failed save"),
                Err(discard_err) => {
                    warn!(url = %media.url, error = %discard_err, "could not discard orphaned image")
                }
            }
        }
        Err(err)
    }

    async fn load_for_edit<T>(
        &self,
        collection: Collection,
        id: &str,
        decode: Decode<T>,
    ) -> Result<T, SaveError> {
        self.get(collection, id, decode)
            .await?
            .ok_or_else(|| SaveError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn get<T>(
        &self,
        collection: Collection,
        id: &str,
        decode: Decode<T>,
    ) -> Result<Option<T>, StoreError> {
        let Some(doc) = self.store.fetch(collection, id).await? else {
            return Ok(None);
        };
        decode(id, &doc)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                collection,
                id: id.to_string(),
                source,
            })
    }

    async fn list<T>(&self, collection: Collection, decode: Decode<T>) -> Result<Vec<T>, StoreError> {
        let docs = self.store.fetch_all(collection).await?;
        Ok(docs
            .iter()
            .filter_map(|(id, doc)| match decode(id, doc) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(%collection, %id, error = %err, "skipping malformed document");
                    None
                }
            })
            .collect())
    }
}

fn check_token(
    kind: &'static str,
    current: DateTime<Utc>,
    submitted: Option<DateTime<Utc>>,
) -> Result<(), SaveError> {
    match submitted {
        Some(token) if token != current => {
            warn!(kind, %current, %token, "stale edit token");
            Err(SaveError::Conflict(kind))
        }
        _ => Ok(()),
    }
}

/// A replace that finds the document gone is a not-found, not a write error.
fn gone(err: StoreError, collection: Collection, id: &str) -> SaveError {
    match err {
        StoreError::NotFound { .. } => SaveError::NotFound {
            collection,
            id: id.to_string(),
        },
        other => SaveError::Write(other),
    }
}
