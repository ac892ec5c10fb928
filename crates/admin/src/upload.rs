//! Storage of files sent through upload fields.

use crate::{error::AdminError, response::ApiResponse};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;
use uuid::Uuid;

pub const UPLOAD_DIR: &str = "upload";

/// Where an upload field stores its files and how they are served back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub base_path: Option<PathBuf>,
    /// Folder under `base_path`; files go to its `upload/` child.
    pub relative_path: Option<String>,
    /// Prefix of the download URL, e.g. `/admin/file/download`.
    pub download_url: String,
}

/// What the form widget shows for a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Name the client sent.
    pub filename: String,
    /// The upload field's name.
    pub title: String,
    pub src: String,
    /// Path relative to the base folder.
    pub path: String,
}

impl From<&UploadResult> for ApiResponse {
    fn from(result: &UploadResult) -> Self {
        match serde_json::to_value(result) {
            Ok(data) => ApiResponse::with_data(data),
            Err(e) => ApiResponse::error(500, e.to_string()),
        }
    }
}

/// Eight hex chars of a fresh v4 UUID followed by the client's extension.
pub fn stored_name(original: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{}{}", &id[..8], ext)
}

impl UploadTarget {
    pub fn new(base_path: impl Into<PathBuf>, relative_path: &str, download_url: &str) -> Self {
        Self {
            base_path: Some(base_path.into()),
            relative_path: Some(relative_path.to_string()),
            download_url: download_url.trim_end_matches('/').to_string(),
        }
    }

    /// Writes `contents` under a generated name and describes the result.
    pub fn save(
        &self,
        field_name: &str,
        original: &str,
        contents: &[u8],
    ) -> Result<UploadResult, AdminError> {
        let (Some(base), Some(relative)) = (&self.base_path, &self.relative_path) else {
            return Err(AdminError::Upload(
                "upload folder is not properly configured".to_string(),
            ));
        };

        let relative_dir = join_url(relative, UPLOAD_DIR);
        let dir = base.join(&relative_dir);
        fs::create_dir_all(&dir)?;

        let name = stored_name(original);
        fs::write(dir.join(&name), contents)?;

        let path = join_url(&relative_dir, &name);
        info!("Stored upload '{}' for field '{}' at {}", original, field_name, path);

        Ok(UploadResult {
            filename: original.to_string(),
            title: field_name.to_string(),
            src: join_url(&self.download_url, &path),
            path,
        })
    }
}

fn join_url(left: &str, right: &str) -> String {
    let left = left.trim_end_matches('/');
    if left.is_empty() {
        right.to_string()
    } else {
        format!("{left}/{right}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = stored_name("report.final.pdf");
        assert_eq!(name.len(), 12);
        assert!(name.ends_with(".pdf"));
        assert!(name[..8].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_stored_name_without_extension() {
        let name = stored_name("README");
        assert_eq!(name.len(), 8);
    }

    #[test]
    fn test_unconfigured_target() {
        let err = UploadTarget::default().save("avatar", "a.png", b"x").unwrap_err();
        assert_eq!(err.code(), 500);
        assert_eq!(
            ApiResponse::from(&err).msg,
            "upload folder is not properly configured"
        );
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("media/", "upload"), "media/upload");
        assert_eq!(join_url("", "upload"), "upload");
    }
}
