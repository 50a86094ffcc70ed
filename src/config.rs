// Runtime configuration handed to the web layer at startup.

use std::path::{Path, PathBuf};

pub const DEFAULT_UPLOAD_DIR: &str = "/tmp/rembg_uploads";

/// Settings the request handlers need. Built once in main and shared through
/// the application state, so tests can swap in their own values.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Directory used for temporary output files, created on first use.
    pub upload_dir: PathBuf,
    /// Lowercase filename extensions accepted for upload.
    pub allowed_extensions: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
        }
    }
}

impl ServiceConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            ..Self::default()
        }
    }

    /// Whether the declared filename carries an accepted extension.
    /// The extension is the text after the last '.', compared
    /// case-insensitively; a name without a '.' is always rejected.
    pub fn allows_file(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Creates the upload directory if it does not exist yet.
    pub fn ensure_upload_dir(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.upload_dir)?;
        Ok(&self.upload_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions() {
        let config = ServiceConfig::default();
        assert!(config.allows_file("photo.jpg"));
        assert!(config.allows_file("photo.jpeg"));
        assert!(config.allows_file("photo.png"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let config = ServiceConfig::default();
        assert!(config.allows_file("photo.JPG"));
        assert!(config.allows_file("PHOTO.Png"));
    }

    #[test]
    fn uses_text_after_last_dot() {
        let config = ServiceConfig::default();
        assert!(config.allows_file("a.b.png"));
        assert!(!config.allows_file("archive.png.zip"));
    }

    #[test]
    fn rejects_disallowed_or_missing_extensions() {
        let config = ServiceConfig::default();
        assert!(!config.allows_file("notes.txt"));
        assert!(!config.allows_file("png"));
        assert!(!config.allows_file(""));
        assert!(!config.allows_file("trailing."));
    }

    #[test]
    fn custom_extension_set_is_honored() {
        let config = ServiceConfig {
            allowed_extensions: vec!["webp".to_string()],
            ..ServiceConfig::default()
        };
        assert!(config.allows_file("photo.webp"));
        assert!(!config.allows_file("photo.png"));
    }
}
