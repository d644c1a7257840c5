//! Cloudinary Media Host.
//!
//! ## Upload
//!
//! Unsigned upload: a multipart `POST {endpoint}/{cloud_name}/image/upload`
//! carrying `file`, `upload_preset`, and `folder`. The JSON response's
//! `secure_url` is the stored image URL; `public_id` is kept so the asset can
//! be deleted again.
//!
//! ## Delete
//!
//! Deleting needs the signed API. With `api_key` and `api_secret`
//! configured, `discard` posts to `…/image/destroy` with a SHA-256 signature
//! over the sorted parameters plus the secret:
//!
//! ```text
//! signature = sha256("public_id={id}&timestamp={unix}" + api_secret)
//! ```
//!
//! Without credentials the orphaned asset is only logged.

use super::{MediaError, MediaFile, MediaHost, UploadedMedia};
use crate::config::MediaConfig;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

pub struct CloudinaryHost {
    client: Client,
    /// `{endpoint}/{cloud_name}/image`
    image_url: String,
    upload_preset: String,
    folder: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    #[serde(default)]
    public_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryHost {
    pub fn from_config(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = Client::builder()
            .user_agent(concat!("simple-bistro/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &MediaConfig) -> Self {
        Self {
            client,
            image_url: format!(
                "{}/{}/image",
                config.endpoint.trim_end_matches('/'),
                config.cloud_name
            ),
            upload_preset: config.upload_preset.clone(),
            folder: config.folder.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn can_sign(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Signature over already-sorted `key=value` pairs.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

async fn rejection(response: reqwest::Response) -> MediaError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or(text);
    MediaError::Rejected { status, message }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, file: &MediaFile) -> Result<UploadedMedia, MediaError> {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        let response = self
            .client
            .post(format!("{}/upload", self.image_url))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let body: UploadResponse = response.json().await?;
        info!(url = %body.secure_url, "image uploaded");
        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn discard(&self, media: &UploadedMedia) -> Result<(), MediaError> {
        let Some(public_id) = media.public_id.as_deref() else {
            warn!(url = %media.url, "orphaned image has no public id; leaving it");
            return Ok(());
        };
        if !self.can_sign() {
            warn!(url = %media.url, "no signed credentials; orphaned image left on media host");
            return Ok(());
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.api_secret,
        );
        let params = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];
        let response = self
            .client
            .post(format!("{}/destroy", self.image_url))
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let body: DestroyResponse = response.json().await?;
        info!(%public_id, result = %body.result, "orphaned image discarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MediaConfig {
        MediaConfig {
            cloud_name: "demo".to_string(),
            upload_preset: "unsigned".to_string(),
            ..MediaConfig::default()
        }
    }

    #[test]
    fn builds_image_url() {
        let host = CloudinaryHost::with_client(Client::new(), &config());
        assert_eq!(host.image_url, "https://api.cloudinary.com/v1_1/demo/image");
        assert_eq!(host.folder, "restaurant");
    }

    #[test]
    fn signing_requires_both_credentials() {
        let mut cfg = config();
        cfg.api_key = "key".to_string();
        assert!(!CloudinaryHost::with_client(Client::new(), &cfg).can_sign());
        cfg.api_secret = "secret".to_string();
        assert!(CloudinaryHost::with_client(Client::new(), &cfg).can_sign());
    }

    #[test]
    fn signature_matches_manual_digest() {
        let sig = sign(&[("public_id", "restaurant/suya"), ("timestamp", "1700000000")], "s3cr3t");
        let expected = format!(
            "{:x}",
            Sha256::digest(b"public_id=restaurant/suya&timestamp=1700000000s3cr3t")
        );
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn upload_response_decodes() {
        let body: UploadResponse = serde_json::from_str(
            r#"{"secure_url": "https://res.cloudinary.com/demo/image/upload/v1/restaurant/suya.jpg",
                "public_id": "restaurant/suya", "bytes": 1234}"#,
        )
        .unwrap();
        assert!(body.secure_url.starts_with("https://"));
        assert_eq!(body.public_id.as_deref(), Some("restaurant/suya"));
    }

    #[test]
    fn error_body_decodes() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": {"message": "Upload preset not found"}}"#).unwrap();
        assert_eq!(body.error.message, "Upload preset not found");
    }

    #[tokio::test]
    async fn discard_without_credentials_is_a_logged_no_op() {
        let host = CloudinaryHost::with_client(Client::new(), &config());
        let media = UploadedMedia {
            url: "https://res.cloudinary.com/demo/x.jpg".to_string(),
            public_id: Some("restaurant/x".to_string()),
        };
        assert!(host.discard(&media).await.is_ok());
    }
}
