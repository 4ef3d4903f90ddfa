use crate::constants::NOTION_MAX_RICH_TEXT_LENGTH;
use serde::{Deserialize, Serialize};

/// Text annotations as understood by the Notion API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: "default".to_string(),
        }
    }
}

impl Annotations {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

/// One run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: TextContent,
    #[serde(default, skip_serializing_if = "Annotations::is_plain")]
    pub annotations: Annotations,
}

impl RichText {
    /// Create a plain text run, the most common rich text variant.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            text: TextContent {
                content: content.into(),
                link: None,
            },
            annotations: Annotations::default(),
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_link(mut self, url: Option<String>) -> Self {
        self.text.link = url.map(|url| Link { url });
        self
    }

    pub fn content(&self) -> &str {
        &self.text.content
    }

    /// Splits this run into pieces no longer than the Notion content limit.
    ///
    /// Splits fall on char boundaries; each piece keeps the annotations and link.
    pub fn split_to_limit(self) -> Vec<RichText> {
        if self.text.content.chars().count() <= NOTION_MAX_RICH_TEXT_LENGTH {
            return vec![self];
        }

        let chars: Vec<char> = self.text.content.chars().collect();
        chars
            .chunks(NOTION_MAX_RICH_TEXT_LENGTH)
            .map(|chunk| RichText {
                text: TextContent {
                    content: chunk.iter().collect(),
                    link: self.text.link.clone(),
                },
                annotations: self.annotations.clone(),
            })
            .collect()
    }
}

/// Concatenated plain text of a rich text sequence.
pub fn plain_text(items: &[RichText]) -> String {
    items.iter().map(RichText::content).collect()
}
