//! Pre-loaded image resources

use crate::{ImageId, ReportError, Result};
use image::{ImageFormat, ImageReader};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

impl From<image::ImageError> for ReportError {
    fn from(err: image::ImageError) -> Self {
        ReportError::ImageError(err.to_string())
    }
}

/// A decoded-and-verified image ready to be handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    /// Store id
    pub id: ImageId,
    /// Detected encoding
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Original encoded bytes
    pub data: Vec<u8>,
}

impl ImageResource {
    /// Inspect encoded image bytes (JPEG or PNG)
    pub fn from_bytes(id: ImageId, data: Vec<u8>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| ReportError::ImageError(format!("image {id}: {e}")))?;
        let format = reader
            .format()
            .ok_or_else(|| ReportError::ImageError(format!("image {id}: unknown format")))?;
        let (width, height) = reader.into_dimensions()?;

        Ok(Self {
            id,
            format,
            width,
            height,
            data,
        })
    }
}

/// Read-only lookup of pre-loaded images
pub trait ImageStore: Send + Sync {
    /// Get an image by id
    fn get(&self, id: ImageId) -> Option<Arc<ImageResource>>;
}

/// Image store held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageStore {
    images: HashMap<ImageId, Arc<ImageResource>>,
}

impl InMemoryImageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and add an image from bytes
    pub fn insert_bytes(&mut self, id: ImageId, data: Vec<u8>) -> Result<()> {
        let resource = ImageResource::from_bytes(id, data)?;
        self.images.insert(id, Arc::new(resource));
        Ok(())
    }

    /// Decode and add an image from a file
    pub fn insert_file<P: AsRef<Path>>(&mut self, id: ImageId, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            ReportError::ImageError(format!("Failed to read image {}: {}", path.display(), e))
        })?;
        self.insert_bytes(id, data)
    }

    /// Number of stored images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageStore for InMemoryImageStore {
    fn get(&self, id: ImageId) -> Option<Arc<ImageResource>> {
        self.images.get(&id).cloned()
    }
}

#[cfg(test)]
pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
