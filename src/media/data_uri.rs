// src/media/data_uri.rs
//! Decoding of inline `data:` URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Media type assumed when a data URI names none.
const DEFAULT_DATA_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI")]
    NotDataUri,

    #[error("data URI has no ',' separating the header from the payload")]
    MissingPayload,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A decoded inline payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type without parameters, e.g. `image/png`
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Parses `data:[<media type>][;params][;base64],<payload>`.
pub fn parse_data_uri(input: &str) -> Result<DataUri, DataUriError> {
    let rest = input
        .trim()
        .strip_prefix("data:")
        .ok_or(DataUriError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;

    let mut parts = header.split(';');
    let media_type = parts
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_MEDIA_TYPE.to_string());
    let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(DataUri { media_type, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_png() {
        let uri = parse_data_uri("data:image/png;base64,AAAA").unwrap();
        assert_eq!(uri.media_type, "image/png");
        assert_eq!(uri.data, vec![0, 0, 0]);
    }

    #[test]
    fn ignores_parameters_and_whitespace() {
        let uri = parse_data_uri("data:image/svg+xml;charset=utf-8;base64,PHN2Zz4=\n").unwrap();
        assert_eq!(uri.media_type, "image/svg+xml");
        assert_eq!(uri.data, b"<svg>".to_vec());
    }

    #[test]
    fn percent_encoded_payload() {
        let uri = parse_data_uri("data:text/html,%3Cb%3E").unwrap();
        assert_eq!(uri.data, b"<b>".to_vec());
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_data_uri("https://x"), Err(DataUriError::NotDataUri));
        assert_eq!(parse_data_uri("data:image/png;base64"), Err(DataUriError::MissingPayload));
        assert!(matches!(
            parse_data_uri("data:image/png;base64,***"),
            Err(DataUriError::InvalidBase64(_))
        ));
    }
}
