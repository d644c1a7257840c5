//! In-process Media Host.
//!
//! Hands back `memory://{folder}/{n}-{file_name}` URLs and remembers what was
//! uploaded and discarded. Uploads can be switched to fail.

use super::{MediaError, MediaFile, MediaHost, UploadedMedia};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Ledger {
    uploaded: Vec<UploadedMedia>,
    discarded: Vec<UploadedMedia>,
}

pub struct MemoryMedia {
    folder: String,
    fail_uploads: AtomicBool,
    ledger: Mutex<Ledger>,
}

impl MemoryMedia {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
            fail_uploads: AtomicBool::new(false),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub async fn uploaded(&self) -> Vec<UploadedMedia> {
        self.ledger.lock().await.uploaded.clone()
    }

    pub async fn discarded(&self) -> Vec<UploadedMedia> {
        self.ledger.lock().await.discarded.clone()
    }
}

#[async_trait]
impl MediaHost for MemoryMedia {
    async fn upload(&self, file: &MediaFile) -> Result<UploadedMedia, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected {
                status: 502,
                message: "uploads disabled".to_string(),
            });
        }
        let mut ledger = self.ledger.lock().await;
        let public_id = format!("{}/{}-{}", self.folder, ledger.uploaded.len() + 1, file.file_name);
        let media = UploadedMedia {
            url: format!("memory://{public_id}"),
            public_id: Some(public_id),
        };
        ledger.uploaded.push(media.clone());
        Ok(media)
    }

    async fn discard(&self, media: &UploadedMedia) -> Result<(), MediaError> {
        self.ledger.lock().await.discarded.push(media.clone());
        Ok(())
    }
}
