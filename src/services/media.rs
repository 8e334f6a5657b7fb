use std::path::Path;
use uuid::Uuid;

use super::error::{PortfolioError, PortfolioResult};
use crate::models::media::MediaType;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

pub fn allowed_extensions(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Image => IMAGE_EXTENSIONS,
        MediaType::Video => VIDEO_EXTENSIONS,
        MediaType::Document => DOCUMENT_EXTENSIONS,
    }
}

/// Reject anything that is not a bare file name, so the name can be used as
/// the last segment of the media URL and of the on-disk path.
pub fn validate_filename(filename: &str) -> PortfolioResult<()> {
    let bare = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == filename);

    if filename.is_empty() || !bare || filename.contains(['/', '\\']) {
        return Err(PortfolioError::Validation(format!(
            "invalid media filename: {filename:?}"
        )));
    }
    Ok(())
}

/// Resolve the declared type of an upload and check the file extension
/// against that type's allow-list (case-insensitive).
pub fn check_media_type(declared: &str, filename: &str) -> PortfolioResult<MediaType> {
    let media_type = MediaType::parse(declared).ok_or(PortfolioError::InvalidMediaType)?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(PortfolioError::InvalidMediaType)?;

    if allowed_extensions(media_type).contains(&extension.as_str()) {
        Ok(media_type)
    } else {
        Err(PortfolioError::InvalidMediaType)
    }
}

/// Server-assigned URL of an uploaded file: `{prefix}/{portfolio}/{project}/{filename}`.
pub fn media_url(prefix: &str, portfolio_id: Uuid, project_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{portfolio_id}/{project_id}/{filename}",
        prefix.trim_end_matches('/')
    )
}
