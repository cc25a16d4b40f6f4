//! Image retrieval.
//!
//! The engine only sees the [`AssetLoader`] contract. [`DefaultAssetLoader`]
//! resolves `data:` URLs, `http(s)://` URLs and local paths, then decodes the
//! bytes to RGB8.

use base64::Engine;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AssetError;

/// Decoded image, 8-bit RGB, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::EmptyData);
        }
        let img = ::image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;
        let rgb = img.to_rgb8();
        Ok(RasterImage {
            width: rgb.width(),
            height: rgb.height(),
            pixels: rgb.into_raw(),
        })
    }
}

// Pixel data is not useful in debug output.
impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Fetches and decodes images for image components. Implementations own
/// their timeout and retry policy; a failure only degrades one component.
pub trait AssetLoader: Sync {
    fn load(&self, url: &str) -> Result<Arc<RasterImage>, AssetError>;
}

#[derive(Debug, Clone)]
pub struct DefaultAssetLoader {
    agent: ureq::Agent,
}

impl DefaultAssetLoader {
    pub fn new(timeout: Duration) -> Self {
        DefaultAssetLoader {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.agent.get(url).call().map_err(|e| AssetError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Default for DefaultAssetLoader {
    fn default() -> Self {
        DefaultAssetLoader::new(Duration::from_millis(5_000))
    }
}

/// Decodes the payload of a `data:` URL, base64 or percent-encoded.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let rest = url.strip_prefix("data:").ok_or(AssetError::InvalidDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(AssetError::InvalidDataUrl)?;
    if meta.ends_with(";base64") {
        Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

impl AssetLoader for DefaultAssetLoader {
    fn load(&self, url: &str) -> Result<Arc<RasterImage>, AssetError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AssetError::EmptySource);
        }

        let bytes = if url.starts_with("data:") {
            decode_data_url(url)?
        } else if url.starts_with("http://") || url.starts_with("https://") {
            log::debug!("fetching image {}", url);
            self.fetch(url)?
        } else {
            std::fs::read(url)?
        };

        RasterImage::decode(&bytes).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = ::image::RgbImage::from_pixel(width, height, ::image::Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        ::image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        )
    }

    #[test]
    fn test_loads_base64_data_url() {
        let loader = DefaultAssetLoader::default();
        let image = loader.load(&png_data_url(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.pixels.len(), 3 * 2 * 3);
        assert_eq!(&image.pixels[..3], &[200, 10, 10]);
    }

    #[test]
    fn test_failures_are_typed() {
        let loader = DefaultAssetLoader::default();
        assert!(matches!(loader.load("  "), Err(AssetError::EmptySource)));
        assert!(matches!(loader.load("data:image/png;base64"), Err(AssetError::InvalidDataUrl)));
        assert!(matches!(loader.load("data:image/png;base64,@@@"), Err(AssetError::Base64(_))));
        assert!(matches!(loader.load("data:image/png;base64,"), Err(AssetError::EmptyData)));
        assert!(matches!(loader.load("data:text/plain,hello"), Err(AssetError::Decode(_))));
        assert!(matches!(loader.load("/definitely/not/here.png"), Err(AssetError::Io(_))));
    }
}
