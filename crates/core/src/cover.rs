//! Cover image embedding.
//!
//! Renderers want covers they can inline. [`LinkImages`] hands the remote
//! URL through untouched; [`InlineImages`] downloads the cover, scales it to
//! the card size and returns a base64 `data:` URI.

use async_trait::async_trait;

use crate::Result;

/// Turns a cover URL into something a renderer can embed.
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(&self, url: &str, width: u32, height: u32) -> Result<String>;
}

/// Leaves cover URLs as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkImages;

#[async_trait]
impl ImageEncoder for LinkImages {
    async fn encode(&self, url: &str, _width: u32, _height: u32) -> Result<String> {
        Ok(url.to_string())
    }
}

#[cfg(feature = "inline-images")]
pub use inline::InlineImages;

#[cfg(feature = "inline-images")]
mod inline {
    use std::sync::Arc;

    use async_trait::async_trait;
    use base64::Engine;
    use image::codecs::jpeg::JpegEncoder;
    use image::imageops::FilterType;

    use super::ImageEncoder;
    use crate::fetch::Transport;
    use crate::{Result, VnshelfError};

    /// JPEG quality for embedded covers.
    const COVER_QUALITY: u8 = 85;

    /// Downloads covers and embeds them as JPEG data URIs.
    pub struct InlineImages {
        transport: Arc<dyn Transport>,
    }

    impl InlineImages {
        pub fn new(transport: Arc<dyn Transport>) -> Self {
            Self { transport }
        }
    }

    #[async_trait]
    impl ImageEncoder for InlineImages {
        async fn encode(&self, url: &str, width: u32, height: u32) -> Result<String> {
            let bytes = self.transport.get_bytes(url).await?;
            let jpeg = scale_to_jpeg(&bytes, width, height)?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
            Ok(format!("data:image/jpeg;base64,{encoded}"))
        }
    }

    /// Fits the image inside `width` x `height`, keeping its aspect ratio.
    fn scale_to_jpeg(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let img = image::load_from_memory(bytes).map_err(|e| VnshelfError::Image(e.to_string()))?;
        let scaled = img.resize(width.max(1), height.max(1), FilterType::Lanczos3);

        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, COVER_QUALITY);
        scaled.to_rgb8().write_with_encoder(encoder).map_err(|e| VnshelfError::Image(e.to_string()))?;
        Ok(buf)
    }

}
