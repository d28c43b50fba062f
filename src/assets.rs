//! Asset fetching and decoding
//!
//! Resolves image and mask references (remote URL or local path) into
//! in-memory rasters. No resizing and no content validation happens here --
//! anything beyond decodability is the model's concern.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, WorkerError};

/// Threshold above which a mask channel value counts as "inside".
const MASK_THRESHOLD: u8 = 128;

/// Decoded RGB raster, `width * height * 3` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples.
    pub data: Vec<u8>,
}

impl PixelImage {
    pub fn from_rgb8(buffer: image::RgbImage) -> Self {
        let (width, height) = buffer.dimensions();
        Self {
            width,
            height,
            data: buffer.into_raw(),
        }
    }

    /// Re-encode as PNG, the wire format the inference bridge accepts.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let buffer: image::RgbImage =
            image::ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                .ok_or_else(|| WorkerError::AssetDecode {
                    reason: "raster dimensions do not match buffer length".to_string(),
                })?;
        let mut bytes = Vec::new();
        buffer
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .map_err(|e| WorkerError::AssetDecode {
                reason: format!("PNG encoding failed: {e}"),
            })?;
        Ok(bytes)
    }
}

/// Boolean raster derived from a binarized mask image.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<bool>,
}

impl MaskBuffer {
    /// Binarize a decoded raster: the first channel is the luminance proxy,
    /// values above the threshold are inside the mask.
    pub fn from_image(image: &PixelImage) -> Self {
        let data = image
            .data
            .chunks_exact(3)
            .map(|px| px[0] > MASK_THRESHOLD)
            .collect();
        Self {
            width: image.width,
            height: image.height,
            data,
        }
    }

    pub fn coverage(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().filter(|&&b| b).count() as f32 / self.data.len() as f32
    }
}

/// Fetches assets referenced by jobs, remote or local.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: reqwest::blocking::Client,
}

impl AssetFetcher {
    /// Build a fetcher whose remote requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::AssetTransport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Resolve a reference into a decoded RGB image.
    pub fn fetch_image(&self, reference: &str) -> Result<PixelImage> {
        let bytes = self.fetch_bytes(reference)?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| WorkerError::AssetDecode {
            reason: format!("{reference}: {e}"),
        })?;
        let image = PixelImage::from_rgb8(decoded.to_rgb8());
        debug!(
            reference,
            width = image.width,
            height = image.height,
            "decoded image"
        );
        Ok(image)
    }

    /// Resolve a mask reference: same fetch path, then binarization.
    pub fn fetch_mask(&self, reference: &str) -> Result<MaskBuffer> {
        let image = self.fetch_image(reference)?;
        Ok(MaskBuffer::from_image(&image))
    }

    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>> {
        if is_remote(reference) {
            self.download(reference)
        } else {
            self.read_local(reference)
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response =
            self.client
                .get(url)
                .send()
                .map_err(|e| WorkerError::AssetTransport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::AssetFetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| WorkerError::AssetTransport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    fn read_local(&self, path: &str) -> Result<Vec<u8>> {
        if !Path::new(path).exists() {
            return Err(WorkerError::AssetNotFound {
                path: path.to_string(),
            });
        }
        Ok(fs::read(path)?)
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}
