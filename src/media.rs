use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{ImageFormat, ImageReader};
use uuid::Uuid;

use crate::AppResult;

/// A file part taken from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A decoded-and-checked upload, ready to be written.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl Upload {
    /// Accepts the upload only if it decodes as an image.
    pub fn into_image(self) -> Result<ImageUpload, image::ImageError> {
        let reader = ImageReader::new(Cursor::new(&self.bytes)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or(image::ImageError::Unsupported(
                image::error::ImageFormatHint::Unknown.into(),
            ))?;
        reader.decode()?;

        Ok(ImageUpload {
            bytes: self.bytes,
            format,
        })
    }
}

/// Directory that holds uploaded files, one subdirectory per kind.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the image under `kind/` and returns its path relative to the
    /// media root.
    pub async fn save(&self, kind: &str, image: &ImageUpload) -> AppResult<String> {
        let extension = image.format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{kind}/{}.{extension}", Uuid::now_v7().simple());

        tokio::fs::create_dir_all(self.root.join(kind)).await?;
        tokio::fs::write(self.root.join(&relative), &image.bytes).await?;

        tracing::debug!(path = %relative, "stored upload");
        Ok(relative)
    }
}

impl MediaStore {
    /// Removes a file written by `save` whose database write never landed.
    pub async fn discard(&self, relative: Option<&str>) {
        let Some(relative) = relative else {
            return;
        };
        if let Err(err) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!(path = %relative, %err, "could not remove orphaned upload");
        }
    }
}
