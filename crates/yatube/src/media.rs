//! Uploaded images.
//!
//! Images are stored below `<media root>/posts/` and referenced from posts by
//! their path relative to the media root, which is also their url below
//! `/media/`.
use std::path::Path;

use crate::AppResult;

/// Directory below the media root holding post images.
pub const POSTS_DIR: &str = "posts";

/// Reduces an uploaded file name to a safe single path segment.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned.to_owned()
    }
}

/// Copies an uploaded temp file into the media root and returns its relative
/// path. A name that is already taken gets a random prefix.
pub async fn store_image(root: &Path, name: &str, upload: &Path) -> AppResult<String> {
    let dir = root.join(POSTS_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    let mut file_name = sanitize_file_name(name);
    if tokio::fs::try_exists(dir.join(&file_name)).await? {
        file_name = format!("{}_{file_name}", uuid::Uuid::new_v4().simple());
    }
    tokio::fs::copy(upload, dir.join(&file_name)).await?;
    tracing::debug!(file = %file_name, "image stored");
    Ok(format!("{POSTS_DIR}/{file_name}"))
}
