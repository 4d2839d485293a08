use std::{
    io,
    path::{Path, PathBuf},
};

use actix_multipart::form::tempfile::TempFile;
use chrono::Utc;
use derive_more::Display;
use infer::Infer;
use rand::Rng;
use tokio::fs;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
pub const PUBLIC_UPLOAD_PREFIX: &str = "/uploads";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// An image received alongside a mutation request, still sitting in its
/// temporary location.
#[derive(Debug, Clone, Copy)]
pub struct IncomingImage<'a> {
    pub file_name: Option<&'a str>,
    pub path: &'a Path,
    pub size: usize,
}

impl<'a> IncomingImage<'a> {
    /// Browsers send an empty file part when no file was picked.
    pub fn from_temp_file(file: &'a TempFile) -> Option<Self> {
        let file_name = file.file_name.as_deref().filter(|n| !n.is_empty());
        if file.size == 0 && file_name.is_none() {
            return None;
        }

        Some(IncomingImage {
            file_name,
            path: file.file.path(),
            size: file.size,
        })
    }
}

/// Returns the lowercased extension if it is one of the accepted image types.
pub fn image_extension(original_filename: Option<&str>) -> Result<String, UploadError> {
    let ext = original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    match ext {
        Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(UploadError::InvalidExtension),
    }
}

/// Checks extension and size before anything touches the upload directory.
pub fn check_image(original_filename: Option<&str>, size: usize, max_size: usize) -> Result<String, UploadError> {
    let ext = image_extension(original_filename)?;
    if size > max_size {
        return Err(UploadError::FileTooLarge(max_size));
    }
    Ok(ext)
}

/// `<unix-millis>-<random>.<ext>`
pub fn generate_file_name(ext: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    format!("{millis}-{suffix}.{ext}")
}

/// File names the store itself generates; anything else is never served.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Stores product images on local disk under a directory that is also
/// served read-only at [`PUBLIC_UPLOAD_PREFIX`].
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_size: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_size: usize) -> Self {
        UploadStore {
            dir: dir.into(),
            max_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Validates the image, copies it into the upload directory and returns
    /// its public reference (`/uploads/<generated-name>`).
    pub async fn save_image(&self, image: IncomingImage<'_>) -> Result<String, UploadError> {
        let ext = check_image(image.file_name, image.size, self.max_size)?;

        // Tolerant sniffing: unknown content passes, a known non-image type does not.
        match Infer::new().get_from_path(image.path) {
            Ok(Some(kind)) if !matches!(kind.mime_type(), "image/png" | "image/jpeg") => {
                return Err(UploadError::InvalidType(kind.mime_type().to_string()));
            }
            Ok(_) => {}
            Err(e) => return Err(UploadError::MimeDetectionFailed(e.to_string())),
        }

        let metadata = fs::metadata(image.path).await.map_err(UploadError::IoError)?;
        if metadata.len() > self.max_size as u64 {
            return Err(UploadError::FileTooLarge(self.max_size));
        }

        self.ensure_dir().await.map_err(UploadError::IoError)?;

        let file_name = generate_file_name(&ext);
        fs::copy(image.path, self.dir.join(&file_name))
            .await
            .map_err(UploadError::IoError)?;

        tracing::debug!(file = %file_name, bytes = metadata.len(), "Stored product image");
        Ok(format!("{PUBLIC_UPLOAD_PREFIX}/{file_name}"))
    }

    /// Maps a public reference back to its file on disk.
    pub fn resolve(&self, public_ref: &str) -> Option<PathBuf> {
        let name = public_ref
            .strip_prefix(PUBLIC_UPLOAD_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))?;
        is_safe_file_name(name).then(|| self.dir.join(name))
    }

    /// Deletes a stored image. References outside the upload namespace were
    /// never written by this store and are left alone.
    pub async fn remove(&self, public_ref: &str) -> Result<(), UploadError> {
        let Some(path) = self.resolve(public_ref) else {
            tracing::debug!(reference = %public_ref, "Skipping removal of foreign image reference");
            return Ok(());
        };
        fs::remove_file(path).await.map_err(UploadError::IoError)
    }
}

/// All errors related to product image handling.
#[derive(Debug, Display)]
pub enum UploadError {
    #[display("Only .jpg, .jpeg, .png allowed")]
    InvalidExtension,

    #[display("Image must not exceed {_0} bytes")]
    FileTooLarge(usize),

    #[display("Invalid image type: {_0}")]
    InvalidType(String),

    #[display("Failed to store image: {_0}")]
    IoError(io::Error),

    #[display("MIME detection failed: {_0}")]
    MimeDetectionFailed(String),
}

impl UploadError {
    /// Whether the client can fix the request by sending a different file.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            UploadError::InvalidExtension | UploadError::FileTooLarge(_) | UploadError::InvalidType(_)
        )
    }
}
