//! Firestore REST client.
//!
//! Talks to `projects/{project}/databases/{database}/documents` over the v1
//! REST API. Only the five operations of [`ContentStore`] are used:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | insert | `POST …/{collection}` |
//! | fetch | `GET …/{collection}/{id}` (404 → `None`) |
//! | fetch_all | `GET …/{collection}?pageSize=300&pageToken=…` until exhausted |
//! | replace | `PATCH …/{collection}/{id}?currentDocument.exists=true` |
//! | remove | `DELETE …/{collection}/{id}` |
//!
//! A `PATCH` without an update mask replaces the whole field map, which is
//! exactly the full-overwrite semantics edits need. The `exists` precondition
//! stops a patch from resurrecting a document another session deleted.
//!
//! Requests carry the API key as the `key` query parameter and, when
//! `STORE_ACCESS_TOKEN` is set, a bearer token. No request timeout is set; the
//! client default applies.

use super::{Collection, ContentStore, Document, StoreError};
use crate::config::StoreConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const PAGE_SIZE: &str = "300";

pub struct FirestoreStore {
    client: Client,
    /// `{endpoint}/projects/{project}/databases/{database}/documents`
    documents_url: String,
    api_key: String,
    access_token: Option<String>,
}

#[derive(Serialize)]
struct WriteBody<'a> {
    fields: &'a Document,
}

/// Document as returned by the API. Fields are decoded separately so one
/// unreadable document does not sink a whole listing.
#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: serde_json::Value,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

impl FirestoreStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("simple-bistro/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            documents_url: documents_url(config),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.documents_url, collection.as_str())
    }

    /// `None` for anything that is not a plain document id, so a decoded
    /// path parameter can never step into another collection.
    fn document_url(&self, collection: Collection, id: &str) -> Option<String> {
        is_document_id(id)
            .then(|| format!("{}/{}/{}", self.documents_url, collection.as_str(), id))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = if self.api_key.is_empty() {
            request
        } else {
            request.query(&[("key", self.api_key.as_str())])
        };
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn decode(
        collection: Collection,
        raw: RawDocument,
    ) -> Result<(String, Document), StoreError> {
        let id = document_id(&raw.name).to_string();
        let fields = if raw.fields.is_null() {
            Document::new()
        } else {
            serde_json::from_value(raw.fields).map_err(|e| StoreError::Rejected {
                status: 200,
                message: format!("undecodable fields in {collection}/{id}: {e}"),
            })?
        };
        Ok((id, fields))
    }
}

/// Build the documents root URL from config.
pub fn documents_url(config: &StoreConfig) -> String {
    format!(
        "{}/projects/{}/databases/{}/documents",
        config.endpoint.trim_end_matches('/'),
        config.project_id,
        config.database
    )
}

/// Last path segment of a full resource name
/// (`projects/p/databases/d/documents/dishes/abc` → `abc`).
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Generated ids are alphanumeric; `-` and `_` are allowed for ids written
/// by other tools. Separators, dots, and escapes are not.
pub fn is_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 1500
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Turn a non-success response into a [`StoreError::Rejected`].
async fn rejection(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or(text);
    StoreError::Rejected { status, message }
}

#[async_trait]
impl ContentStore for FirestoreStore {
    async fn insert(&self, collection: Collection, fields: Document) -> Result<String, StoreError> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .json(&WriteBody { fields: &fields });
        let response = self.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let created: RawDocument = response.json().await?;
        let id = document_id(&created.name).to_string();
        debug!(%collection, %id, "document created");
        Ok(id)
    }

    async fn fetch(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let Some(url) = self.document_url(collection, id) else {
            return Ok(None);
        };
        let request = self.client.get(url);
        let response = self.authorize(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let raw: RawDocument = response.json().await?;
        let (_, fields) = Self::decode(collection, raw)?;
        Ok(Some(fields))
    }

    async fn fetch_all(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.collection_url(collection))
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = self.authorize(request).send().await?;
            if !response.status().is_success() {
                return Err(rejection(response).await);
            }
            let page: ListResponse = response.json().await?;

            for raw in page.documents {
                match Self::decode(collection, raw) {
                    Ok(entry) => documents.push(entry),
                    Err(e) => warn!(%collection, error = %e, "skipping document"),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let Some(url) = self.document_url(collection, id) else {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        };
        let request = self
            .client
            .patch(url)
            .query(&[("currentDocument.exists", "true")])
            .json(&WriteBody { fields: &fields });
        let response = self.authorize(request).send().await?;
        // A failed `exists` precondition comes back as 404 (or 400
        // FAILED_PRECONDITION on some API versions).
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return match rejection(response).await {
                StoreError::Rejected { message, .. } if message.contains("NOT_FOUND") => {
                    Err(StoreError::NotFound {
                        collection,
                        id: id.to_string(),
                    })
                }
                other => Err(other),
            };
        }
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let Some(url) = self.document_url(collection, id) else {
            return Ok(());
        };
        let request = self.client.delete(url);
        let response = self.authorize(request).send().await?;
        // Deleting an absent document is a no-op on the server side too.
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(rejection(response).await)
    }
}
