// src/extractor/slug.rs
//! Slug derivation from the source URL.

use crate::types::ContentType;
use url::Url;

/// Derives the raw (still encoded) slug for a non-press-release article.
pub fn derive_slug(url: &Url, content_type: ContentType) -> String {
    if content_type == ContentType::Voice {
        if let Some(token) = voice_token(url) {
            return token;
        }
    }
    path_slug(url)
}

/// Path-position rule: segments from the third onward, the third alone, or the query.
fn path_slug(url: &Url) -> String {
    let path = url.path().trim_start_matches('/');
    let segments: Vec<&str> = path.split('/').collect();
    let query = url.query().unwrap_or_default();

    match segments.len() {
        n if n > 3 => format!("/{}", segments[2..].join("/")),
        3 if segments[2].is_empty() => format!("/?{}", query),
        3 => format!("/{}", segments[2]),
        _ => match segments.iter().rev().find(|s| !s.is_empty()) {
            Some(last) => format!("/{}", last),
            None if !query.is_empty() => format!("/?{}", query),
            None => "/".to_string(),
        },
    }
}

/// Voice pages name the speaker in the last `=` token of the trailing segment.
fn voice_token(url: &Url) -> Option<String> {
    let trailing = url.path().rsplit('/').next().unwrap_or_default();
    let tail = if url.path().ends_with('/') {
        format!("{}?{}", trailing, url.query().unwrap_or_default())
    } else {
        trailing.to_string()
    };

    tail.rsplit_once('=')
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
