//! Domain model: input rows, extracted articles, destination blocks and records.

pub mod article;
pub mod blocks;
pub mod record;
pub mod rich_text;

pub use article::{split_categories, ArticleKind, ExtractedArticle, InputRow};
pub use blocks::{
    count_blocks, BlockNode, CodeContent, EmbedContent, EmptyContent, ExternalFile, FileObject,
    TextBlockContent,
};
pub use record::DestinationRecord;
pub use rich_text::{plain_text, Annotations, Link, RichText, TextContent};
