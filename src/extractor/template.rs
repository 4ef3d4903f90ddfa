// src/extractor/template.rs
//! DOM-position heuristics for the source site's article template.
//!
//! Everything that depends on where the template puts things lives here, so a
//! template change means a new `ArticleTemplate` and nothing else.

use crate::constants::{ARTICLE_NOT_FOUND_MARKER, NON_CONTENT_TAGS, PRESS_RELEASE_MARKER};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref ARTICLE: Selector = Selector::parse("article").expect("valid article selector");
    static ref TITLE: Selector = Selector::parse("title").expect("valid title selector");
    static ref HEADING: Selector = Selector::parse("h1").expect("valid h1 selector");
    static ref MAIN: Selector = Selector::parse("main").expect("valid main selector");
    static ref OG_IMAGE: Selector =
        Selector::parse(r#"meta[property="og:image"]"#).expect("valid og:image selector");
    static ref QUOTED_URL: Regex =
        Regex::new(r#"["'](https?://[^"'\s]+)["']"#).expect("valid quoted url pattern");
    static ref BARE_URL: Regex =
        Regex::new(r#"(?i)url=(https?://[^"'\s>]+)|(https?://[^"'\s<>)]+)"#).expect("valid bare url pattern");
}

/// Where the template keeps each piece of an article.
pub trait ArticleTemplate: Send + Sync {
    /// The subtree holding the article, if the page has one.
    fn article_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>>;

    /// Whether the root is the template's placeholder for a missing article.
    fn is_not_found(&self, root: ElementRef<'_>) -> bool;

    /// Outer markup of the root's content-bearing children, in document order.
    fn body_html(&self, root: ElementRef<'_>) -> String;

    /// Text of the element that carries the publication date.
    fn date_text(&self, root: ElementRef<'_>) -> Option<String>;

    fn title(&self, document: &Html, root: ElementRef<'_>) -> Option<String>;

    /// Raw thumbnail reference, not yet rehosted.
    fn thumbnail_reference(&self, document: &Html) -> Option<String>;

    fn is_press_release(&self, body_html: &str) -> bool;

    /// The URL a press-release stub redirects to.
    fn press_release_target(&self, document: &Html) -> Option<String>;
}

/// The layout used by the source site's article pages.
#[derive(Debug, Clone)]
pub struct DefaultTemplate {
    pub press_release_marker: String,
}

impl Default for DefaultTemplate {
    fn default() -> Self {
        Self {
            press_release_marker: PRESS_RELEASE_MARKER.to_string(),
        }
    }
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ArticleTemplate for DefaultTemplate {
    fn article_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&ARTICLE).next()
    }

    fn is_not_found(&self, root: ElementRef<'_>) -> bool {
        child_elements(root)
            .next()
            .map(|first| first.inner_html().trim() == ARTICLE_NOT_FOUND_MARKER)
            .unwrap_or(false)
    }

    fn body_html(&self, root: ElementRef<'_>) -> String {
        child_elements(root)
            .filter(|child| !NON_CONTENT_TAGS.contains(&child.value().name()))
            .map(|child| child.html())
            .collect()
    }

    fn date_text(&self, root: ElementRef<'_>) -> Option<String> {
        child_elements(root)
            .nth(1)
            .map(collapsed_text)
            .filter(|text| !text.is_empty())
    }

    fn title(&self, document: &Html, root: ElementRef<'_>) -> Option<String> {
        let from_title = document
            .select(&TITLE)
            .next()
            .map(collapsed_text)
            .filter(|t| !t.is_empty());

        from_title.or_else(|| {
            root.select(&HEADING)
                .next()
                .map(collapsed_text)
                .filter(|t| !t.is_empty())
        })
    }

    fn thumbnail_reference(&self, document: &Html) -> Option<String> {
        document
            .select(&OG_IMAGE)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
    }

    fn is_press_release(&self, body_html: &str) -> bool {
        !self.press_release_marker.is_empty() && body_html.contains(&self.press_release_marker)
    }

    fn press_release_target(&self, document: &Html) -> Option<String> {
        let main = document.select(&MAIN).next()?;
        let redirect = child_elements(main).next()?.html();

        if let Some(caps) = QUOTED_URL.captures(&redirect) {
            return Some(caps[1].to_string());
        }
        BARE_URL
            .captures(&redirect)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><title> Spring Festival </title>
        <meta property="og:image" content="https://www.example.org/og/card.png?v=2"></head>
        <body><article>
            <h1>Spring Festival</h1>
            <p class="date">12.04.2023</p>
            <script>track()</script>
            <div><p>Body text.</p></div>
            <nav>links</nav>
        </article></body></html>"#;

    #[test]
    fn reads_fields_from_the_default_layout() {
        let template = DefaultTemplate::default();
        let document = Html::parse_document(PAGE);
        let root = template.article_root(&document).unwrap();

        assert!(!template.is_not_found(root));
        assert_eq!(template.title(&document, root).as_deref(), Some("Spring Festival"));
        assert_eq!(template.date_text(root).as_deref(), Some("12.04.2023"));
        assert_eq!(
            template.thumbnail_reference(&document).as_deref(),
            Some("https://www.example.org/og/card.png?v=2")
        );

        let body = template.body_html(root);
        assert!(body.starts_with("<h1>Spring Festival</h1>"));
        assert!(body.contains("<div><p>Body text.</p></div>"));
        assert!(!body.contains("track()"));
        assert!(!body.contains("links"));
    }

    #[test]
    fn detects_the_not_found_placeholder() {
        let template = DefaultTemplate::default();
        let document = Html::parse_document("<article><div> NOT FOUND </div></article>");
        let root = template.article_root(&document).unwrap();
        assert!(template.is_not_found(root));
    }

    #[test]
    fn title_falls_back_to_the_article_heading() {
        let template = DefaultTemplate::default();
        let document = Html::parse_document("<article><h1>Heading</h1></article>");
        let root = template.article_root(&document).unwrap();
        assert_eq!(template.title(&document, root).as_deref(), Some("Heading"));
    }

    #[test]
    fn press_release_target_comes_from_the_redirect_script() {
        let template = DefaultTemplate::default();
        let document = Html::parse_document(
            r#"<main><script>location.href = "https://press.example.com/release/%E6%98%A5";</script></main>
               <article><p>プレスリリース</p></article>"#,
        );
        let root = template.article_root(&document).unwrap();

        assert!(template.is_press_release(&template.body_html(root)));
        assert_eq!(
            template.press_release_target(&document).as_deref(),
            Some("https://press.example.com/release/%E6%98%A5")
        );
    }

    #[test]
    fn press_release_target_accepts_meta_refresh() {
        let template = DefaultTemplate::default();
        let document = Html::parse_document(
            r#"<html><head></head><body><main><meta http-equiv="refresh" content="0;url=https://press.example.com/r/1"></main></body></html>"#,
        );
        assert_eq!(
            template.press_release_target(&document).as_deref(),
            Some("https://press.example.com/r/1")
        );
    }
}
