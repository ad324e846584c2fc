use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use axum::body::Bytes;
use image::{ImageFormat, ImageReader, Limits};
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const PUBLIC_PREFIX: &str = "/uploads";
pub const ITEM_PLACEHOLDER: &str = "/uploads/item_placeholder.svg";
const PLACEHOLDER_FILE: &str = "item_placeholder.svg";
const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300"><rect width="400" height="300" fill="#e5e7eb"/><text x="200" y="158" font-family="sans-serif" font-size="20" fill="#6b7280" text-anchor="middle">No photo</text></svg>"##;

const ITEM_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const ITEM_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];
/// Largest width or height accepted for any upload.
pub const MAX_IMAGE_DIMENSION: u32 = 8192;
const MAX_DECODE_ALLOC: u64 = 192 * 1024 * 1024;

const AVATAR_MIMES: &[&str] = &["image/png", "image/jpeg"];
const AVATAR_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg];

/// A file part pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Local-disk storage for item photos and avatars, served under [`PUBLIC_PREFIX`].
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_bytes: usize,
}

impl MediaStore {
    pub fn new(root: PathBuf, max_bytes: usize) -> Self {
        Self { root, max_bytes }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload folders and the placeholder shown for items without a photo.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.root.join("items")).await?;
        fs::create_dir_all(self.root.join("avatars")).await?;
        let placeholder = self.root.join(PLACEHOLDER_FILE);
        if !fs::try_exists(&placeholder).await? {
            fs::write(&placeholder, PLACEHOLDER_SVG).await?;
        }
        Ok(())
    }

    pub async fn store_item_photo(&self, owner: Uuid, upload: &Upload) -> AppResult<String> {
        if !allowed_extension(&upload.file_name, ITEM_EXTENSIONS) {
            return Err(AppError::BadRequest("Invalid image file".into()));
        }
        self.check_size(upload)?;
        validate_image(&upload.bytes, ITEM_FORMATS)?;
        self.write("items", owner, upload).await
    }

    pub async fn store_avatar(&self, owner: Uuid, upload: &Upload) -> AppResult<String> {
        let declared = upload.content_type.as_deref().unwrap_or_default();
        if !AVATAR_MIMES.contains(&declared) {
            return Err(AppError::BadRequest(format!(
                "Avatar must be PNG or JPEG (max {} MB)",
                self.max_bytes / (1024 * 1024)
            )));
        }
        self.check_size(upload)?;
        validate_image(&upload.bytes, AVATAR_FORMATS)?;
        self.write("avatars", owner, upload).await
    }

    fn check_size(&self, upload: &Upload) -> AppResult<()> {
        if upload.bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest("File is too large".into()));
        }
        Ok(())
    }

    async fn write(&self, folder: &str, owner: Uuid, upload: &Upload) -> AppResult<String> {
        let tag = Uuid::new_v4().simple().to_string();
        let file_name = format!("{owner}_{}_{}", &tag[..8], secure_filename(&upload.file_name));
        let dest = self.root.join(folder).join(&file_name);
        fs::create_dir_all(self.root.join(folder))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        fs::write(&dest, &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        tracing::debug!(path = %dest.display(), bytes = upload.bytes.len(), "stored upload");
        Ok(format!("{PUBLIC_PREFIX}/{folder}/{file_name}"))
    }
}

pub fn allowed_extension(file_name: &str, allowed: &[&str]) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| allowed.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sniffs the format from the leading bytes and decodes the whole image.
pub fn validate_image(bytes: &[u8], allowed: &[ImageFormat]) -> AppResult<ImageFormat> {
    let format = image::guess_format(bytes)
        .map_err(|_| AppError::BadRequest("Invalid image file".into()))?;
    if !allowed.contains(&format) {
        return Err(AppError::BadRequest("Invalid image file".into()));
    }
    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(decode_limits());
    reader
        .decode()
        .map_err(|_| AppError::BadRequest("Invalid image file".into()))?;
    Ok(format)
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Reduces a client supplied file name to a safe single path component.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
