// src/markup/mod.rs
//! Markup normalization: article HTML to markdown.
//!
//! A regex pre-pass rewrites embedded frames into images that the block
//! converter can route through the media rehoster, then `htmd` does the
//! HTML to markdown conversion. Deterministic and free of side effects.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref IFRAME: Regex =
        Regex::new(r"(?is)<iframe\b([^>]*?)(?:/>|>(.*?)</iframe\s*>)").expect("valid iframe pattern");
    static ref SRC_ATTR: Regex =
        Regex::new(r#"(?is)\bsrc\s*=\s*["']([^"']*)["']"#).expect("valid src pattern");
    static ref DATA_URI_IMG: Regex =
        Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']\s*data:[^"']*["'][^>]*>"#)
            .expect("valid data-uri image pattern");
}

/// Tags whose content never reaches the markdown.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Placeholder for source-less frames kept verbatim; alphanumeric so markdown leaves it alone.
const FRAME_PLACEHOLDER: &str = "ARTICLETWONOTIONFRAME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Keep `<iframe>` elements that have no `src` as raw markup
    pub keep_empty_frames: bool,
    /// Keep inline `data:` images as image references
    pub keep_data_uri_images: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            keep_empty_frames: false,
            keep_data_uri_images: true,
        }
    }
}

/// Converts article HTML into markdown.
pub fn normalize(html: &str, options: &NormalizeOptions) -> String {
    let mut kept_frames = Vec::new();
    let prepared = rewrite_frames(html, options, &mut kept_frames);

    let prepared = if options.keep_data_uri_images {
        prepared
    } else {
        DATA_URI_IMG.replace_all(&prepared, "").into_owned()
    };

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let mut markdown = match converter.convert(&prepared) {
        Ok(markdown) => markdown,
        Err(e) => {
            log::warn!("Markdown conversion failed, falling back to text: {}", e);
            scraper::Html::parse_fragment(&prepared)
                .root_element()
                .text()
                .collect::<String>()
        }
    };

    for (index, frame) in kept_frames.iter().enumerate() {
        markdown = markdown.replace(&placeholder(index), frame);
    }

    markdown.trim().to_string()
}

fn rewrite_frames(html: &str, options: &NormalizeOptions, kept: &mut Vec<String>) -> String {
    IFRAME
        .replace_all(html, |caps: &Captures| {
            let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let source = SRC_ATTR
                .captures(attributes)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .filter(|src| !src.is_empty());

            match source {
                Some(src) => format!("<p><img src=\"{}\"></p>", absolutize(src)),
                None if options.keep_empty_frames => {
                    kept.push(caps[0].to_string());
                    format!("<p>{}</p>", placeholder(kept.len() - 1))
                }
                None => String::new(),
            }
        })
        .into_owned()
}

/// Protocol-relative sources (`//host/path`) become `https://host/path`.
fn absolutize(src: &str) -> String {
    match src.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => src.to_string(),
    }
}

fn placeholder(index: usize) -> String {
    format!("{}{}X", FRAME_PLACEHOLDER, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iframe_becomes_image_reference() {
        let html = r#"<p>Watch:</p><iframe src="//www.youtube.com/embed/abc" width="560"></iframe>"#;
        let markdown = normalize(html, &NormalizeOptions::default());
        assert!(markdown.contains("![](https://www.youtube.com/embed/abc)"), "{}", markdown);
        assert!(markdown.contains("Watch:"));
    }

    #[test]
    fn sourceless_frames_are_dropped_by_default() {
        let html = "<p>before</p><iframe></iframe><p>after</p>";
        let markdown = normalize(html, &NormalizeOptions::default());
        assert!(!markdown.contains("iframe"));
        assert!(markdown.contains("before"));
        assert!(markdown.contains("after"));
    }

    #[test]
    fn sourceless_frames_can_be_kept_verbatim() {
        let html = r#"<p>x</p><iframe name="widget"></iframe>"#;
        let options = NormalizeOptions {
            keep_empty_frames: true,
            ..NormalizeOptions::default()
        };
        let markdown = normalize(html, &options);
        assert!(markdown.contains(r#"<iframe name="widget"></iframe>"#), "{}", markdown);
    }

    #[test]
    fn data_uri_images_follow_the_option() {
        let html = r#"<p>pic</p><p><img src="data:image/png;base64,AAAA"></p>"#;

        let kept = normalize(html, &NormalizeOptions::default());
        assert!(kept.contains("data:image/png;base64,AAAA"), "{}", kept);

        let options = NormalizeOptions {
            keep_data_uri_images: false,
            ..NormalizeOptions::default()
        };
        let removed = normalize(html, &options);
        assert!(!removed.contains("data:"), "{}", removed);
        assert!(removed.contains("pic"));
    }

    #[test]
    fn scripts_and_styles_are_skipped() {
        let html = "<style>p{color:red}</style><p>body</p><script>alert(1)</script>";
        let markdown = normalize(html, &NormalizeOptions::default());
        assert_eq!(markdown, "body");
    }
}
