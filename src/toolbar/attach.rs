//! Reading a chosen image into a data URL.

use crate::error::AttachError;
use crate::filepicker::image_mime;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bubbletea_rs::{Cmd, Msg};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The image was read and encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachedMsg {
    /// Toolbar that started the read.
    pub toolbar_id: i64,
    /// `data:<mime>;base64,<payload>`.
    pub data_url: String,
}

/// The image could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachFailedMsg {
    /// Toolbar that started the read.
    pub toolbar_id: i64,
    /// File that was chosen.
    pub path: PathBuf,
    /// Why it failed.
    pub error: String,
}

/// Encodes raw bytes as a data URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Reads `path` fully and encodes it.
pub async fn read_data_url(path: &Path) -> Result<String, AttachError> {
    let mime = image_mime(path).ok_or_else(|| AttachError::UnsupportedType {
        path: path.to_path_buf(),
    })?;
    let bytes = tokio::fs::read(path).await.map_err(|source| AttachError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), mime, "read image");
    Ok(data_url(mime, &bytes))
}

/// Reads `path` in the background.
pub fn read_cmd(toolbar_id: i64, path: PathBuf) -> Cmd {
    Box::pin(async move {
        let msg: Msg = match read_data_url(&path).await {
            Ok(data_url) => Box::new(ImageAttachedMsg {
                toolbar_id,
                data_url,
            }),
            Err(err) => Box::new(ImageAttachFailedMsg {
                toolbar_id,
                path,
                error: err.to_string(),
            }),
        };
        Some(msg)
    })
}
