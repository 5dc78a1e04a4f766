//! Blob store boundary.
//!
//! Uploads raw bytes as a multipart form and hands back the durable URL the
//! blob store reports. The URL is opaque to everything else and is stored
//! verbatim as a message's media reference.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use tidings_shared::{ChatError, MediaKind, Result, ValidationError};

use crate::config::ClientConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

pub struct MediaIngest {
    http: reqwest::Client,
    base_url: String,
    preset: String,
    max_size: usize,
}

impl MediaIngest {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.upload_url.clone(),
            preset: config.upload_preset.clone(),
            max_size: config.max_upload_size,
        }
    }

    /// Upload `blob` and return its durable URL.
    ///
    /// Fails with a transport error unless the blob store answers 2xx with a
    /// `secure_url`.
    pub async fn upload(
        &self,
        blob: Bytes,
        kind: MediaKind,
        file_name: Option<&str>,
    ) -> Result<String> {
        if blob.is_empty() {
            return Err(ValidationError::EmptyUpload.into());
        }
        if blob.len() > self.max_size {
            return Err(ValidationError::UploadTooLarge {
                size: blob.len(),
                max: self.max_size,
            }
            .into());
        }

        let url = format!("{}/{}/upload", self.base_url, kind.resource_type());
        let size = blob.len();
        let part = Part::bytes(blob.to_vec()).file_name(file_name.unwrap_or("blob").to_string());
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        debug!(url = %url, size, ?kind, "uploading blob");

        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("upload request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ChatError::transport(format!(
                "blob store answered {}",
                resp.status()
            )));
        }

        let body: UploadResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::transport(format!("invalid upload response: {e}")))?;

        info!(size, ?kind, "blob uploaded");
        Ok(body.secure_url)
    }
}
