// src/types/domain_types.rs
//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// API key for Notion API authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new API key with validation
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();

        if key.is_empty() {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key cannot be empty".to_string(),
            });
        }

        if !key.starts_with("secret_") && !key.starts_with("ntn_") {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key must start with 'secret_' or 'ntn_'".to_string(),
            });
        }

        if key.len() < 20 {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key is too short".to_string(),
            });
        }

        Ok(Self(key))
    }

    /// Get the API key as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact API key in display
        write!(f, "{}...", self.0.chars().take(10).collect::<String>())
    }
}

/// Validated http(s) URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedUrl(Url);

impl Serialize for ValidatedUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidatedUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ValidatedUrl::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl ValidatedUrl {
    /// Create a new validated URL
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        match Url::parse(url.trim()) {
            Ok(parsed_url) => {
                if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
                    return Err(ValidationError::InvalidUrl {
                        url: url.to_string(),
                        reason: "Only HTTP and HTTPS URLs are supported".to_string(),
                    });
                }
                Ok(Self(parsed_url))
            }
            Err(e) => Err(ValidationError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Get the URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A URI-decoded, non-empty path identifier stored on each destination page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Decodes percent-escapes and validates the result.
    ///
    /// Escapes of URI delimiters (`%2F`, `%3F`, `%23` and the like) stay encoded.
    /// Malformed escapes (invalid UTF-8 after decoding) keep the raw text.
    pub fn decode(raw: &str) -> Result<Self, ValidationError> {
        let mut decoded = String::with_capacity(raw.len());
        let mut last = 0;
        for reserved in RESERVED_ESCAPE.find_iter(raw) {
            decoded.push_str(&decode_segment(&raw[last..reserved.start()]));
            decoded.push_str(reserved.as_str());
            last = reserved.end();
        }
        decoded.push_str(&decode_segment(&raw[last..]));

        if decoded.trim().is_empty() {
            return Err(ValidationError::InvalidSlug {
                slug: raw.to_string(),
                reason: "slug cannot be empty".to_string(),
            });
        }

        Ok(Self(decoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

lazy_static! {
    static ref RESERVED_ESCAPE: Regex = Regex::new(r"(?i)%(23|24|26|2B|2C|2F|3A|3B|3D|3F|40)")
        .expect("reserved escape regex is valid");
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object-storage key prefix, without leading or trailing separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePrefix(String);

impl StoragePrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        let trimmed = prefix.trim().trim_matches(|c| c == '/' || c == '.');

        if trimmed.is_empty() {
            return Err(ValidationError::InvalidPrefix {
                prefix,
                reason: "prefix cannot be empty".to_string(),
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidPrefix {
                prefix,
                reason: "prefix cannot contain whitespace".to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_validation() {
        assert!(ApiKey::new("secret_abcdefghijklmnopqrs").is_ok());
        assert!(ApiKey::new("ntn_abcdefghijklmnopqrs").is_ok());
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("invalid_key").is_err());
        assert!(ApiKey::new("secret_short").is_err());
    }

    #[test]
    fn test_api_key_display_is_redacted_on_char_boundaries() {
        let key = ApiKey::new("secret_あいうえおかきくけこ").unwrap();
        assert_eq!(key.to_string(), "secret_あいう...");

        let ascii = ApiKey::new("secret_abcdefghijklmnopqrs").unwrap();
        assert_eq!(ascii.to_string(), "secret_abc...");
    }

    #[test]
    fn test_url_validation() {
        assert!(ValidatedUrl::parse("https://example.org/news/2023/01").is_ok());
        assert!(ValidatedUrl::parse("http://localhost:8080").is_ok());
        assert!(ValidatedUrl::parse("ftp://example.com").is_err());
        assert!(ValidatedUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_slug_is_decoded() {
        let slug = Slug::decode("/%E3%81%8A%E7%9F%A5%E3%82%89%E3%81%9B").unwrap();
        assert_eq!(slug.as_str(), "/お知らせ");
    }

    #[test]
    fn test_slug_decoding_is_idempotent() {
        let once = Slug::decode("/c/d%20e").unwrap();
        let twice = Slug::decode(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_slug_keeps_reserved_escapes() {
        let slug = Slug::decode("/a%2Fb%3Fq%23%E3%81%8A").unwrap();
        assert_eq!(slug.as_str(), "/a%2Fb%3Fq%23お");
        assert_eq!(Slug::decode(slug.as_str()).unwrap(), slug);
        assert_eq!(Slug::decode("/x%2fy").unwrap().as_str(), "/x%2fy");
    }

    #[test]
    fn test_slug_rejects_empty() {
        assert!(Slug::decode("").is_err());
        assert!(Slug::decode("%20").is_err());
    }

    #[test]
    fn test_storage_prefix_trims_separators() {
        assert_eq!(StoragePrefix::new("/articles/body/").unwrap().as_str(), "articles/body");
        assert!(StoragePrefix::new("//").is_err());
        assert!(StoragePrefix::new("has space").is_err());
    }
}
