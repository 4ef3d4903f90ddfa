use super::rich_text::RichText;
use serde::{Deserialize, Serialize};

/// Text content shared by paragraph-like blocks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlockContent {
    pub rich_text: Vec<RichText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockNode>,
}

impl TextBlockContent {
    pub fn new(rich_text: Vec<RichText>) -> Self {
        Self {
            rich_text,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<BlockNode>) -> Self {
        self.children = children;
        self
    }
}

/// Code block content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeContent {
    pub rich_text: Vec<RichText>,
    pub language: String,
}

/// Embed block content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedContent {
    pub url: String,
}

/// Body of blocks that carry no content (dividers)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyContent {}

/// File object types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileObject {
    #[serde(rename = "external")]
    External { external: ExternalFile },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub url: String,
}

impl FileObject {
    pub fn external(url: impl Into<String>) -> Self {
        FileObject::External {
            external: ExternalFile { url: url.into() },
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FileObject::External { external } => &external.url,
        }
    }
}

/// A block in the destination document, serialized in the Notion API shape
/// (`{"type": "paragraph", "paragraph": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockNode {
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: TextBlockContent },
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: TextBlockContent },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: TextBlockContent },
    #[serde(rename = "heading_3")]
    Heading3 { heading_3: TextBlockContent },
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem {
        bulleted_list_item: TextBlockContent,
    },
    #[serde(rename = "numbered_list_item")]
    NumberedListItem {
        numbered_list_item: TextBlockContent,
    },
    #[serde(rename = "quote")]
    Quote { quote: TextBlockContent },
    #[serde(rename = "code")]
    Code { code: CodeContent },
    #[serde(rename = "divider")]
    Divider { divider: EmptyContent },
    #[serde(rename = "image")]
    Image { image: FileObject },
    #[serde(rename = "embed")]
    Embed { embed: EmbedContent },
}

impl BlockNode {
    pub fn paragraph(rich_text: Vec<RichText>) -> Self {
        BlockNode::Paragraph {
            paragraph: TextBlockContent::new(rich_text),
        }
    }

    /// Heading of the given markdown level; levels deeper than 3 collapse to heading 3.
    pub fn heading(level: u8, rich_text: Vec<RichText>) -> Self {
        let content = TextBlockContent::new(rich_text);
        match level {
            1 => BlockNode::Heading1 { heading_1: content },
            2 => BlockNode::Heading2 { heading_2: content },
            _ => BlockNode::Heading3 { heading_3: content },
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        BlockNode::Image {
            image: FileObject::external(url),
        }
    }

    pub fn embed(url: impl Into<String>) -> Self {
        BlockNode::Embed {
            embed: EmbedContent { url: url.into() },
        }
    }

    pub fn divider() -> Self {
        BlockNode::Divider {
            divider: EmptyContent::default(),
        }
    }

    /// Get block type name
    pub fn block_type(&self) -> &'static str {
        match self {
            BlockNode::Paragraph { .. } => "paragraph",
            BlockNode::Heading1 { .. } => "heading_1",
            BlockNode::Heading2 { .. } => "heading_2",
            BlockNode::Heading3 { .. } => "heading_3",
            BlockNode::BulletedListItem { .. } => "bulleted_list_item",
            BlockNode::NumberedListItem { .. } => "numbered_list_item",
            BlockNode::Quote { .. } => "quote",
            BlockNode::Code { .. } => "code",
            BlockNode::Divider { .. } => "divider",
            BlockNode::Image { .. } => "image",
            BlockNode::Embed { .. } => "embed",
        }
    }

    /// The external URL an image block currently points at.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            BlockNode::Image { image } => Some(image.url()),
            _ => None,
        }
    }

    /// Rewrites an image block's reference in place. Other blocks are untouched.
    pub fn set_image_url(&mut self, url: impl Into<String>) {
        if let BlockNode::Image { image } = self {
            *image = FileObject::external(url);
        }
    }

    /// Text content of blocks that have one.
    pub fn text_content(&self) -> Option<&TextBlockContent> {
        match self {
            BlockNode::Paragraph { paragraph: c }
            | BlockNode::Heading1 { heading_1: c }
            | BlockNode::Heading2 { heading_2: c }
            | BlockNode::Heading3 { heading_3: c }
            | BlockNode::BulletedListItem {
                bulleted_list_item: c,
            }
            | BlockNode::NumberedListItem {
                numbered_list_item: c,
            }
            | BlockNode::Quote { quote: c } => Some(c),
            _ => None,
        }
    }

    /// Mutable access to nested children, for blocks that can hold them.
    pub fn children_mut(&mut self) -> Option<&mut Vec<BlockNode>> {
        match self {
            BlockNode::Paragraph { paragraph: c }
            | BlockNode::BulletedListItem {
                bulleted_list_item: c,
            }
            | BlockNode::NumberedListItem {
                numbered_list_item: c,
            }
            | BlockNode::Quote { quote: c } => Some(&mut c.children),
            _ => None,
        }
    }

    /// Nested children, empty for blocks that cannot hold any.
    pub fn children(&self) -> &[BlockNode] {
        self.text_content()
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }
}

/// Counts blocks in a tree, nested children included.
pub fn count_blocks(blocks: &[BlockNode]) -> usize {
    blocks
        .iter()
        .map(|block| 1 + count_blocks(block.children()))
        .sum()
}
