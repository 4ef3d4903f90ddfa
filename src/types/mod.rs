use thiserror::Error;

mod content_type;
mod domain_types;
mod ids;

pub use content_type::*;
pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Invalid slug: {slug} - {reason}")]
    InvalidSlug { slug: String, reason: String },

    #[error("Invalid storage prefix: {prefix} - {reason}")]
    InvalidPrefix { prefix: String, reason: String },
}
