// src/blocks/mod.rs
//! Block conversion: markdown to the destination block tree.
//!
//! `to_blocks` is a pure structural pass over pulldown-cmark events.
//! Image blocks keep their source reference until `resolve_media` routes
//! them through the media rehoster.

use crate::constants::{
    NOTION_CODE_LANGUAGES, NOTION_FALLBACK_CODE_LANGUAGE, NOTION_MAX_BLOCK_DEPTH,
};
use crate::media::{MediaRehoster, MediaVariant, UploadResult};
use crate::model::{Annotations, BlockNode, CodeContent, RichText, TextBlockContent};
use futures::future::join_all;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use url::Url;

/// Blocks after media resolution, with what happened to their images.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedBlocks {
    pub blocks: Vec<BlockNode>,
    /// Images left pointing at their original source after a failed rehost
    pub degraded: usize,
    /// Images removed because the source is gone or is not media
    pub dropped: usize,
}

/// Converts markdown into blocks. Image references are left unresolved.
pub fn to_blocks(markdown: &str) -> Vec<BlockNode> {
    let mut builder = TreeBuilder::new();
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    for event in parser {
        builder.handle(event);
    }
    limit_depth(builder.finish(), 1)
}

/// Rehosts every image in the tree, nested ones included, concurrently.
///
/// Output order equals source order.
pub async fn resolve_media(
    blocks: Vec<BlockNode>,
    rehoster: &MediaRehoster,
    base: &Url,
) -> ResolvedBlocks {
    let mut references = Vec::new();
    collect_image_refs(&blocks, &mut references);

    if references.is_empty() {
        return ResolvedBlocks {
            blocks,
            ..ResolvedBlocks::default()
        };
    }

    log::debug!("Rehosting {} media reference(s) from {}", references.len(), base);
    let results = join_all(
        references
            .iter()
            .map(|reference| rehoster.rehost(reference, base, MediaVariant::Body)),
    )
    .await;

    let mut resolved = ResolvedBlocks::default();
    let mut results = results.into_iter();
    resolved.blocks = apply_results(blocks, base, &mut results, &mut resolved);
    resolved
}

fn collect_image_refs(blocks: &[BlockNode], out: &mut Vec<String>) {
    for block in blocks {
        if let Some(url) = block.image_url() {
            out.push(url.to_string());
        }
        collect_image_refs(block.children(), out);
    }
}

/// Walks the tree in the same order as `collect_image_refs`, consuming one result per image.
fn apply_results(
    blocks: Vec<BlockNode>,
    base: &Url,
    results: &mut impl Iterator<Item = UploadResult>,
    stats: &mut ResolvedBlocks,
) -> Vec<BlockNode> {
    let mut kept = Vec::with_capacity(blocks.len());

    for mut block in blocks {
        if let Some(source) = block.image_url().map(str::to_string) {
            match results.next() {
                Some(UploadResult::Stored(stored)) => block.set_image_url(stored.public_url),
                Some(UploadResult::Embed { url }) => block = BlockNode::embed(url),
                Some(UploadResult::Skipped(skip)) => {
                    if skip.drops_block() || web_url(base, &source).is_none() {
                        log::debug!("Dropping image {:?}: {}", source, skip);
                        stats.dropped += 1;
                        continue;
                    }
                }
                Some(UploadResult::Failed(failure)) => match web_url(base, &source) {
                    Some(absolute) => {
                        log::warn!("Keeping original image {}: {}", absolute, failure);
                        block.set_image_url(absolute.to_string());
                        stats.degraded += 1;
                    }
                    None => {
                        log::warn!("Dropping image with no web source: {}", failure);
                        stats.dropped += 1;
                        continue;
                    }
                },
                None => {}
            }
        }

        if let Some(children) = block.children_mut() {
            let nested = std::mem::take(children);
            *children = apply_results(nested, base, results, stats);
        }

        kept.push(block);
    }

    kept
}

/// The absolute http(s) form of `source`. Notion only accepts such URLs for external files.
fn web_url(base: &Url, source: &str) -> Option<Url> {
    if source.trim().is_empty() {
        return None;
    }
    base.join(source)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Hoists blocks nested past `NOTION_MAX_BLOCK_DEPTH` up to the deepest allowed
/// level, right after their former parent.
fn limit_depth(blocks: Vec<BlockNode>, depth: usize) -> Vec<BlockNode> {
    let mut out = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        let nested = block.children_mut().map(std::mem::take).unwrap_or_default();
        if depth >= NOTION_MAX_BLOCK_DEPTH {
            out.push(block);
            out.extend(limit_depth(nested, depth));
        } else {
            if let Some(children) = block.children_mut() {
                *children = limit_depth(nested, depth + 1);
            }
            out.push(block);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Markdown event handling
// ---------------------------------------------------------------------------

enum FrameKind {
    Root,
    Quote,
    Item { ordered: bool },
}

/// An open container: the document root, a block quote or a list item.
struct Frame {
    kind: FrameKind,
    text: Vec<RichText>,
    children: Vec<BlockNode>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            text: Vec::new(),
            children: Vec::new(),
        }
    }

    fn into_block(self) -> Option<BlockNode> {
        let content = TextBlockContent::new(self.text).with_children(self.children);
        match self.kind {
            FrameKind::Root => None,
            FrameKind::Quote => Some(BlockNode::Quote { quote: content }),
            FrameKind::Item { ordered: false } => Some(BlockNode::BulletedListItem {
                bulleted_list_item: content,
            }),
            FrameKind::Item { ordered: true } => Some(BlockNode::NumberedListItem {
                numbered_list_item: content,
            }),
        }
    }
}

struct CodeBuffer {
    language: String,
    content: String,
}

struct TreeBuilder {
    frames: Vec<Frame>,
    lists: Vec<bool>,
    inline: Vec<RichText>,
    bold: usize,
    italic: usize,
    strikethrough: usize,
    link: Option<String>,
    image_depth: usize,
    code: Option<CodeBuffer>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            frames: vec![Frame::new(FrameKind::Root)],
            lists: Vec::new(),
            inline: Vec::new(),
            bold: 0,
            italic: 0,
            strikethrough: 0,
            link: None,
            image_depth: 0,
            code: None,
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.content.push_str(&text);
                } else if self.image_depth == 0 {
                    self.push_text(&text, false);
                }
            }
            Event::Code(text) => self.push_text(&text, true),
            Event::Html(html) => {
                if self.image_depth == 0 && !html.trim_start().starts_with("<!--") {
                    self.push_text(html.trim_end_matches('\n'), false);
                }
            }
            Event::SoftBreak => self.push_text(" ", false),
            Event::HardBreak => self.push_text("\n", false),
            Event::Rule => {
                self.flush_inline();
                self.push_block(BlockNode::divider());
            }
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::Heading(..) | Tag::TableRow | Tag::TableHead => {
                self.flush_inline()
            }
            Tag::BlockQuote => {
                self.flush_inline();
                self.frames.push(Frame::new(FrameKind::Quote));
            }
            Tag::List(start) => {
                self.flush_inline();
                self.lists.push(start.is_some());
            }
            Tag::Item => {
                self.flush_inline();
                let ordered = self.lists.last().copied().unwrap_or(false);
                self.frames.push(Frame::new(FrameKind::Item { ordered }));
            }
            Tag::CodeBlock(kind) => {
                self.flush_inline();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => code_language(&info),
                    CodeBlockKind::Indented => NOTION_FALLBACK_CODE_LANGUAGE.to_string(),
                };
                self.code = Some(CodeBuffer {
                    language,
                    content: String::new(),
                });
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link(_, destination, _) => self.link = absolute_link(&destination),
            Tag::Image(_, destination, _) => {
                if self.image_depth == 0 && !destination.trim().is_empty() {
                    self.flush_inline();
                    self.push_block(BlockNode::image(destination.trim().to_string()));
                }
                self.image_depth += 1;
            }
            Tag::TableCell => {
                if !self.inline.is_empty() {
                    self.push_text(" | ", false);
                }
            }
            Tag::FootnoteDefinition(_) | Tag::Table(_) => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::TableRow | Tag::TableHead => self.flush_inline(),
            Tag::Heading(level, _, _) => {
                let text = self.take_inline();
                if !text.is_empty() {
                    self.push_block(BlockNode::heading(heading_depth(level), text));
                }
            }
            Tag::BlockQuote | Tag::Item => {
                self.flush_inline();
                self.close_frame();
            }
            Tag::List(_) => {
                self.flush_inline();
                self.lists.pop();
            }
            Tag::CodeBlock(_) => {
                if let Some(code) = self.code.take() {
                    let rich_text = RichText::plain(code.content.trim_end_matches('\n')).split_to_limit();
                    self.push_block(BlockNode::Code {
                        code: CodeContent {
                            rich_text,
                            language: code.language,
                        },
                    });
                }
            }
            Tag::Emphasis => self.italic = self.italic.saturating_sub(1),
            Tag::Strong => self.bold = self.bold.saturating_sub(1),
            Tag::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            Tag::Link(..) => self.link = None,
            Tag::Image(..) => self.image_depth = self.image_depth.saturating_sub(1),
            Tag::TableCell | Tag::FootnoteDefinition(_) | Tag::Table(_) => {}
        }
    }

    fn finish(mut self) -> Vec<BlockNode> {
        self.flush_inline();
        while self.frames.len() > 1 {
            self.close_frame();
        }
        self.frames.pop().map(|root| root.children).unwrap_or_default()
    }

    fn annotations(&self, code: bool) -> Annotations {
        Annotations {
            bold: self.bold > 0,
            italic: self.italic > 0,
            strikethrough: self.strikethrough > 0,
            code,
            ..Annotations::default()
        }
    }

    /// Appends a text run, merging it into the previous run when formatting matches.
    fn push_text(&mut self, content: &str, code: bool) {
        if content.is_empty() {
            return;
        }
        let run = RichText::plain(content)
            .with_annotations(self.annotations(code))
            .with_link(self.link.clone());

        match self.inline.last_mut() {
            Some(last) if last.annotations == run.annotations && last.text.link == run.text.link => {
                last.text.content.push_str(content);
            }
            _ => self.inline.push(run),
        }
    }

    /// Takes the pending inline runs, trimmed and split to the content limit.
    fn take_inline(&mut self) -> Vec<RichText> {
        let mut runs = std::mem::take(&mut self.inline);

        if let Some(first) = runs.first_mut() {
            first.text.content = first.text.content.trim_start().to_string();
        }
        if let Some(last) = runs.last_mut() {
            last.text.content = last.text.content.trim_end().to_string();
        }

        runs.into_iter()
            .filter(|run| !run.content().is_empty())
            .flat_map(RichText::split_to_limit)
            .collect()
    }

    /// Places pending inline text: as the open container's own text when it
    /// has none yet, otherwise as a paragraph.
    fn flush_inline(&mut self) {
        let text = self.take_inline();
        if text.is_empty() {
            return;
        }

        if let Some(frame) = self.frames.last_mut() {
            let is_container = !matches!(frame.kind, FrameKind::Root);
            if is_container && frame.text.is_empty() && frame.children.is_empty() {
                frame.text = text;
                return;
            }
        }
        self.push_block(BlockNode::paragraph(text));
    }

    fn push_block(&mut self, block: BlockNode) {
        if let Some(frame) = self.frames.last_mut() {
            frame.children.push(block);
        }
    }

    fn close_frame(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        if let Some(block) = self.frames.pop().and_then(Frame::into_block) {
            self.push_block(block);
        }
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        _ => 3,
    }
}

/// Maps a fence info string to a language Notion accepts.
fn code_language(info: &str) -> String {
    let language = info
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let language = match language.as_str() {
        "js" => "javascript".to_string(),
        "ts" => "typescript".to_string(),
        "sh" => "shell".to_string(),
        "py" => "python".to_string(),
        "yml" => "yaml".to_string(),
        "cpp" => "c++".to_string(),
        _ => language,
    };

    if NOTION_CODE_LANGUAGES.contains(&language.as_str()) {
        language
    } else {
        NOTION_FALLBACK_CODE_LANGUAGE.to_string()
    }
}

/// Only absolute http(s) links are kept; relative and other schemes become plain text.
fn absolute_link(destination: &str) -> Option<String> {
    Url::parse(destination)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::{rehoster, FakeMediaSource, MemoryStore};
    use crate::model::{count_blocks, plain_text};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn texts(blocks: &[BlockNode]) -> Vec<(&'static str, String)> {
        blocks
            .iter()
            .map(|b| {
                let text = b
                    .text_content()
                    .map(|c| plain_text(&c.rich_text))
                    .unwrap_or_default();
                (b.block_type(), text)
            })
            .collect()
    }

    #[test]
    fn paragraphs_and_headings() {
        let blocks = to_blocks("# Title\n\nFirst paragraph.\n\n#### Deep\n\nSecond.");
        assert_eq!(
            texts(&blocks),
            vec![
                ("heading_1", "Title".to_string()),
                ("paragraph", "First paragraph.".to_string()),
                ("heading_3", "Deep".to_string()),
                ("paragraph", "Second.".to_string()),
            ]
        );
    }

    #[test]
    fn nested_lists_keep_structure() {
        let blocks = to_blocks("- one\n- two\n  1. inner\n  2. inner two\n");
        assert_eq!(
            texts(&blocks),
            vec![
                ("bulleted_list_item", "one".to_string()),
                ("bulleted_list_item", "two".to_string()),
            ]
        );
        assert_eq!(
            texts(blocks[1].children()),
            vec![
                ("numbered_list_item", "inner".to_string()),
                ("numbered_list_item", "inner two".to_string()),
            ]
        );
    }

    #[test]
    fn quotes_code_and_rules() {
        let blocks = to_blocks("> quoted\n\n---\n\n```js\nlet x = 1;\n```\n\n```klingon\nqapla\n```\n");
        assert_eq!(blocks[0].block_type(), "quote");
        assert_eq!(plain_text(&blocks[0].text_content().unwrap().rich_text), "quoted");
        assert_eq!(blocks[1], BlockNode::divider());
        match (&blocks[2], &blocks[3]) {
            (BlockNode::Code { code: known }, BlockNode::Code { code: unknown }) => {
                assert_eq!(known.language, "javascript");
                assert_eq!(plain_text(&known.rich_text), "let x = 1;");
                assert_eq!(unknown.language, NOTION_FALLBACK_CODE_LANGUAGE);
            }
            other => panic!("expected two code blocks, got {:?}", other),
        }
    }

    #[test]
    fn inline_annotations_and_links() {
        let blocks = to_blocks("Some **bold** and `code` with [a link](https://example.org/x) and [rel](/about).");
        let rich = &blocks[0].text_content().unwrap().rich_text;

        let bold = rich.iter().find(|r| r.content() == "bold").unwrap();
        assert!(bold.annotations.bold);
        let code = rich.iter().find(|r| r.content() == "code").unwrap();
        assert!(code.annotations.code);
        let link = rich.iter().find(|r| r.content() == "a link").unwrap();
        assert_eq!(link.text.link.as_ref().unwrap().url, "https://example.org/x");
        assert!(rich.iter().all(|r| r.content() != "rel" || r.text.link.is_none()));
        assert_eq!(
            plain_text(rich),
            "Some bold and code with a link and rel."
        );
    }

    #[test]
    fn images_split_paragraphs() {
        let blocks = to_blocks("Before ![alt](https://a.example/p.png) after");
        assert_eq!(
            texts(&blocks),
            vec![
                ("paragraph", "Before".to_string()),
                ("image", String::new()),
                ("paragraph", "after".to_string()),
            ]
        );
        assert_eq!(blocks[1].image_url(), Some("https://a.example/p.png"));
    }

    #[test]
    fn long_paragraphs_are_split_into_runs() {
        let long = "x".repeat(4500);
        let blocks = to_blocks(&long);
        let rich = &blocks[0].text_content().unwrap().rich_text;
        assert_eq!(rich.len(), 3);
        assert_eq!(plain_text(rich).len(), 4500);
    }

    #[tokio::test]
    async fn missing_media_drops_blocks_and_stored_media_is_rewritten() {
        let source = FakeMediaSource::default()
            .with("https://www.example.org/ok.png", 200, Some("image/png"), b"png")
            .with("https://www.example.org/gone.png", 404, None, b"")
            .with("https://www.example.org/note.png", 200, Some("text/plain"), b"moved");
        let rehoster = rehoster(source, Arc::new(MemoryStore::default()));
        let base = Url::parse("https://www.example.org/news/a").unwrap();

        let blocks = to_blocks(
            "Intro\n\n![](/ok.png)\n\n- item\n\n  ![](/gone.png)\n\n![](/note.png)\n",
        );
        let before = count_blocks(&blocks);

        let resolved = resolve_media(blocks, &rehoster, &base).await;
        assert_eq!(resolved.dropped, 2);
        assert_eq!(resolved.degraded, 0);
        assert_eq!(count_blocks(&resolved.blocks), before - 2);

        let image = resolved.blocks[1].image_url().unwrap();
        assert!(image.starts_with("https://cdn.example.org/articles/body."), "{}", image);
        assert!(image.ends_with(".png"));
    }

    #[tokio::test]
    async fn failed_media_is_kept_and_counted() {
        let rehoster = rehoster(FakeMediaSource::default(), Arc::new(MemoryStore::default()));
        let base = Url::parse("https://www.example.org/").unwrap();

        let blocks = vec![BlockNode::image("https://www.example.org/unreachable.jpg")];
        let resolved = resolve_media(blocks.clone(), &rehoster, &base).await;
        assert_eq!(resolved.blocks, blocks);
        assert_eq!(resolved.degraded, 1);

        let relative = vec![BlockNode::image("/unreachable.jpg")];
        let resolved = resolve_media(relative, &rehoster, &base).await;
        assert_eq!(
            resolved.blocks[0].image_url(),
            Some("https://www.example.org/unreachable.jpg")
        );
    }

    #[tokio::test]
    async fn embed_hosts_become_embed_blocks() {
        let rehoster = rehoster(FakeMediaSource::default(), Arc::new(MemoryStore::default()));
        let base = Url::parse("https://www.example.org/").unwrap();

        let blocks = vec![BlockNode::image("https://player.vimeo.com/video/1")];
        let resolved = resolve_media(blocks, &rehoster, &base).await;
        assert_eq!(resolved.blocks, vec![BlockNode::embed("https://player.vimeo.com/video/1")]);
    }

    fn depth(blocks: &[BlockNode]) -> usize {
        blocks
            .iter()
            .map(|b| 1 + depth(b.children()))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn images_without_a_source_are_not_emitted() {
        let blocks = to_blocks("x\n\n![]()\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].image_url(), None);
    }

    #[test]
    fn deep_lists_are_hoisted_to_the_deepest_accepted_level() {
        let blocks = to_blocks("- a\n  - b\n    - c\n      - d\n- e\n");
        assert_eq!(depth(&blocks), NOTION_MAX_BLOCK_DEPTH);
        assert_eq!(count_blocks(&blocks), 5);

        let b = &blocks[0].children()[0];
        let hoisted: Vec<String> = b
            .children()
            .iter()
            .map(|block| plain_text(&block.text_content().unwrap().rich_text))
            .collect();
        assert_eq!(hoisted, vec!["c", "d"]);
        assert_eq!(plain_text(&blocks[1].text_content().unwrap().rich_text), "e");
    }

    #[tokio::test]
    async fn failed_media_without_a_web_source_is_dropped() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });
        let rehoster = rehoster(FakeMediaSource::default(), store);
        let base = Url::parse("https://www.example.org/").unwrap();

        let blocks = vec![
            BlockNode::paragraph(vec![RichText::plain("x")]),
            BlockNode::image("data:image/png;base64,iVBORw0KGgo="),
            BlockNode::image(""),
        ];
        let resolved = resolve_media(blocks, &rehoster, &base).await;

        assert_eq!(resolved.blocks.len(), 1);
        assert_eq!(resolved.dropped, 2);
        assert_eq!(resolved.degraded, 0);
    }
}
