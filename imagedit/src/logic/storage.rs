use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];
pub const FALLBACK_EXTENSION: &str = "jpg";

// suffix of files still being written
const TMP_SUFFIX: &str = ".tmp";

/// Lowercased text after the last `.`, if any.
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

pub fn validate_extension(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// `<uuid-v4><suffix>.<ext>`, keeping the original extension when allowed.
pub fn generate_filename(original: &str, suffix: &str) -> String {
    let ext = extension(original)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    format!("{}{suffix}.{ext}", Uuid::new_v4())
}

pub fn replace_extension(filename: &str, ext: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    format!("{stem}.{ext}")
}

/// Rejects names that could escape the storage directory, and in-progress
/// `.tmp` writes.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.to_lowercase().ends_with(TMP_SUFFIX)
}

/// `image/<ext>`, as served by the download route.
pub fn media_type(filename: &str) -> String {
    format!(
        "image/{}",
        extension(filename).unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
    )
}

/// Upload and output directories. Files are addressed by generated unique
/// names, so concurrent requests never write the same path.
#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
}

impl Storage {
    pub fn new(upload_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    pub async fn create_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.upload_dir).await?;
        fs::create_dir_all(&self.processed_dir).await
    }

    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.upload_dir.join(filename)
    }

    pub fn processed_path(&self, filename: &str) -> PathBuf {
        self.processed_dir.join(filename)
    }

    pub async fn save_upload(&self, filename: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.upload_path(filename);
        write_atomic(&path, data).await?;
        log::debug!("saved upload {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    pub async fn save_processed(&self, filename: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.processed_path(filename);
        write_atomic(&path, data).await?;
        log::info!("saved output {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    /// Reads a processed file. Unsafe names give `InvalidInput`.
    pub async fn read_processed(&self, filename: &str) -> io::Result<Vec<u8>> {
        if !is_safe_filename(filename) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid filename: {filename}"),
            ));
        }

        fs::read(self.processed_path(filename)).await
    }
}

// A failed write never leaves a partial file at `path`.
async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TMP_SUFFIX);
    let tmp = PathBuf::from(tmp);

    if let Err(e) = fs::write(&tmp, data).await {
        _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp, path).await {
        _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    Ok(())
}
