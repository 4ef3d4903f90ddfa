// src/media/keys.rs
//! Storage key, extension and content-type derivation.

use crate::constants::{FALLBACK_MEDIA_EXTENSION, MAX_EXTENSION_LENGTH};
use crate::types::StoragePrefix;
use url::Url;
use uuid::Uuid;

/// Where a media reference was found; selects the key prefix and extension rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaVariant {
    /// An image inside the article body
    Body,
    /// The page's `og:image` thumbnail
    Thumbnail,
}

/// Canonical key format: `{prefix}.{uuid}.{extension}`.
pub fn object_key(prefix: &StoragePrefix, extension: &str) -> String {
    format!("{}.{}.{}", prefix, Uuid::new_v4(), extension)
}

/// Extension named by the reference itself, if any.
///
/// Body references are parsed as URLs and read from the path. Thumbnail
/// references are read from the raw tail with any `?query` truncated.
pub fn extension_from_reference(reference: &str, variant: MediaVariant) -> Option<String> {
    let tail = match variant {
        MediaVariant::Body => Url::parse(reference)
            .ok()?
            .path_segments()?
            .next_back()?
            .to_string(),
        MediaVariant::Thumbnail => reference.rsplit('/').next()?.to_string(),
    };

    let (_, extension) = tail.rsplit_once('.')?;
    let extension = match variant {
        MediaVariant::Thumbnail => extension.split(['?', '#']).next().unwrap_or_default(),
        MediaVariant::Body => extension,
    };
    sanitize_extension(extension)
}

/// Extension from a media type's subtype: `image/svg+xml` → `svg`.
pub fn extension_from_media_type(media_type: &str) -> Option<String> {
    let essence = media_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.split('+').next()?;
    sanitize_extension(subtype)
}

/// Picks the reference's extension, then the response's, then the fallback.
pub fn resolve_extension(
    reference: &str,
    variant: MediaVariant,
    media_type: Option<&str>,
) -> String {
    extension_from_reference(reference, variant)
        .or_else(|| media_type.and_then(extension_from_media_type))
        .unwrap_or_else(|| FALLBACK_MEDIA_EXTENSION.to_string())
}

/// Content type from the response, else guessed from the extension.
pub fn resolve_content_type(declared: Option<&str>, extension: &str) -> String {
    declared
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_ext(extension)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

fn sanitize_extension(raw: &str) -> Option<String> {
    let extension = raw.trim().to_ascii_lowercase();
    let valid = !extension.is_empty()
        && extension.len() <= MAX_EXTENSION_LENGTH
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(extension)
}
