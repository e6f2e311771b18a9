//! Client for the external asset host that stores uploaded event images.

use async_trait::async_trait;

use crate::config::Config;
use crate::utils::error::AppError;

/// One image received with a creation request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Transmits the image to the asset host and returns the durable URL it
    /// assigned. Must complete before the event record is persisted.
    async fn upload_image(&self, image: ImageUpload) -> Result<String, AppError>;
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    #[serde(alias = "secure_url")]
    url: String,
}

/// Uploads via a multipart POST to the configured endpoint. The response is
/// expected to carry the durable URL as `url` (or `secure_url`).
pub struct HttpAssetStore {
    client: reqwest::Client,
    upload_url: String,
}

impl HttpAssetStore {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()?;

        Ok(Self {
            client,
            upload_url: config.asset_upload_url.clone(),
        })
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload_image(&self, image: ImageUpload) -> Result<String, AppError> {
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(&image.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::AssetUpload(format!(
                "asset host responded with {}",
                response.status()
            )));
        }

        let body: UploadResponse = response.json().await?;
        tracing::info!(url = %body.url, "image uploaded to asset host");
        Ok(body.url)
    }
}
