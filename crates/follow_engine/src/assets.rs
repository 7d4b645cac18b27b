use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use engine_logging::{engine_debug, engine_info};
use follow_core::{asset_percent, ImageRef, ListEntry};
use futures_util::future::join_all;
use url::Url;

use crate::fetch::ProgressSink;
use crate::http::{ApiClient, RequestAuth};
use crate::{FailureKind, FetchError, ProgressUpdate};

#[derive(Debug, Clone)]
pub struct MaterializerSettings {
    /// Images converted concurrently; batches run one after another.
    pub batch_size: usize,
    pub item_timeout: Duration,
    pub batch_pause: Duration,
}

impl Default for MaterializerSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            item_timeout: Duration::from_millis(3000),
            batch_pause: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("image load failed: {0}")]
    Load(#[from] FetchError),
    #[error("not an image: {0}")]
    NotImage(String),
    #[error("empty image body")]
    Empty,
}

/// Turns a remote image reference into a self-contained `data:` URL.
#[async_trait::async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(&self, url: &str) -> Result<String, ConvertError>;
}

/// Downloads the image and inlines it as base64.
pub struct HttpImageConverter {
    client: Arc<ApiClient>,
}

impl HttpImageConverter {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ImageConverter for HttpImageConverter {
    async fn convert(&self, url: &str) -> Result<String, ConvertError> {
        let url = Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self.client.get(url, RequestAuth::Anonymous).await?;
        let content_type = response
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ConvertError::NotImage(content_type));
        }
        encode_data_url(&content_type, &response.body)
    }
}

fn encode_data_url(content_type: &str, body: &Bytes) -> Result<String, ConvertError> {
    if body.is_empty() {
        return Err(ConvertError::Empty);
    }
    Ok(format!("data:{content_type};base64,{}", STANDARD.encode(body)))
}

/// Converts the images of a display set with bounded concurrency.
pub struct AssetMaterializer<'a> {
    converter: &'a dyn ImageConverter,
    settings: &'a MaterializerSettings,
}

impl<'a> AssetMaterializer<'a> {
    pub fn new(converter: &'a dyn ImageConverter, settings: &'a MaterializerSettings) -> Self {
        Self {
            converter,
            settings,
        }
    }

    /// Returns the entries in input order. Any image that could not be converted in
    /// time keeps its remote reference.
    pub async fn materialize(
        &self,
        entries: Vec<ListEntry>,
        sink: &dyn ProgressSink,
    ) -> Vec<ListEntry> {
        let batch_size = self.settings.batch_size.max(1);
        let total = entries.len();
        let batches = total.div_ceil(batch_size);
        let mut converted = 0usize;
        let mut output = Vec::with_capacity(total);

        for (index, batch) in entries.chunks(batch_size).enumerate() {
            let results = join_all(batch.iter().map(|entry| self.materialize_one(entry))).await;
            for (entry, was_converted) in results {
                converted += usize::from(was_converted);
                output.push(entry);
            }

            sink.emit(ProgressUpdate {
                percent: asset_percent(index + 1, batches),
                message: format!("Converting images... {converted}/{total}"),
            });

            if index + 1 < batches {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        engine_info!("Converted {}/{} profile pictures", converted, total);
        output
    }

    async fn materialize_one(&self, entry: &ListEntry) -> (ListEntry, bool) {
        let Some(url) = entry.image.as_ref().and_then(ImageRef::remote_url) else {
            return (entry.clone(), false);
        };

        match tokio::time::timeout(self.settings.item_timeout, self.converter.convert(url)).await {
            Ok(Ok(data_url)) => {
                let mut converted = entry.clone();
                converted.image = Some(ImageRef::parse(data_url));
                (converted, true)
            }
            Ok(Err(err)) => {
                engine_debug!("Image for @{} not converted: {}", entry.handle, err);
                (entry.clone(), false)
            }
            Err(_) => {
                engine_debug!(
                    "Image for @{} timed out after {:?}",
                    entry.handle,
                    self.settings.item_timeout
                );
                (entry.clone(), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_carries_content_type_and_base64_payload() {
        let url = encode_data_url("image/png", &Bytes::from_static(b"\x89PNG")).unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn empty_body_is_not_converted() {
        assert!(matches!(
            encode_data_url("image/jpeg", &Bytes::new()),
            Err(ConvertError::Empty)
        ));
    }
}
