//! Multipart parsing for the post and dish forms.
//!
//! Text fields are collected by name; the `image` file part becomes a
//! [`MediaFile`]. A file input left empty still sends a part with no file
//! name and no bytes, which reads as "no new image".

use super::error::AppError;
use crate::media::MediaFile;
use crate::types::{DishDraft, PostDraft};
use axum::extract::Multipart;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

const IMAGE_FIELD: &str = "image";

/// Raw fields of one submitted form.
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    pub image: Option<MediaFile>,
}

impl FormFields {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = FormFields::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::MalformedForm(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::MalformedForm(e.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    fields.image = Some(MediaFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::MalformedForm(e.to_string()))?;
                fields.text.insert(name, value);
            }
        }
        Ok(fields)
    }

    fn text(&self, name: &str) -> String {
        self.text.get(name).cloned().unwrap_or_default()
    }

    fn checked(&self, name: &str) -> bool {
        self.text.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn post_draft(&self) -> PostDraft {
        PostDraft {
            title: self.text("title"),
            author: self.text("author"),
            content: self.text("content"),
        }
    }

    pub fn dish_draft(&self) -> DishDraft {
        DishDraft {
            name: self.text("name"),
            category: self.text("category"),
            price: self.text("price"),
            description: self.text("description"),
            popular: self.checked("popular"),
            order_link: self.text("order_link"),
            order: self.text("order"),
        }
    }

    /// The `edit_token` hidden field. Absent or blank means "don't check".
    pub fn edit_token(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        parse_edit_token(&self.text("edit_token"))
    }

    /// The submitted edit token, as the form re-renders it.
    pub fn raw_edit_token(&self) -> Option<String> {
        self.text.get("edit_token").filter(|t| !t.trim().is_empty()).cloned()
    }
}

pub fn format_edit_token(updated_at: DateTime<Utc>) -> String {
    updated_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_edit_token(raw: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|_| AppError::MalformedForm(format!("invalid edit token {raw:?}")))
}
