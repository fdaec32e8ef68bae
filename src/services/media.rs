use std::path::{Component, Path, PathBuf};

use log::info;
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted upload, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const POSTS_DIR: &str = "posts";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image formats we accept, detected from the file's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime(self) -> mime::Mime {
        match self {
            Self::Gif => mime::IMAGE_GIF,
            Self::Png => mime::IMAGE_PNG,
            Self::Jpeg => mime::IMAGE_JPEG,
            // `mime` has no constant for webp
            Self::Webp => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        }
    }
}

/// Checks an upload the way the post form needs it: the declared type (when the
/// browser sent one) must be an image, and the bytes must be a format we know.
pub fn validate_image(content_type: Option<&str>, bytes: &[u8]) -> Result<ImageKind, String> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(format!(
            "The image is too large; the limit is {} MB.",
            MAX_IMAGE_BYTES / (1024 * 1024)
        ));
    }
    if let Some(declared) = content_type {
        let is_image = declared
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false);
        if !is_image {
            return Err("Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string());
        }
    }
    ImageKind::sniff(bytes).ok_or_else(|| {
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string()
    })
}

/// Uploaded files on local disk, below `root`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stores a validated post image and returns its path relative to the media root.
    pub async fn save_post_image(&self, kind: ImageKind, bytes: &[u8]) -> Result<String, MediaError> {
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let relative = format!("{POSTS_DIR}/{file_name}");
        info!("stored post image {} ({} bytes)", relative, bytes.len());
        Ok(relative)
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        if let Some(path) = self.resolve(relative) {
            let _ = tokio::fs::remove_file(path).await;
        }
    }

    /// Maps a request path onto the media root, refusing anything that could
    /// escape it (`..`, absolute paths, drive prefixes).
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        let mut resolved = self.root.clone();
        let mut parts = 0;
        for component in candidate.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    parts += 1;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        (parts > 0).then_some(resolved)
    }
}
