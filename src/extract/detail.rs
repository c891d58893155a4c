//! Detail page extraction.
//!
//! Turns one rendered post page into a [`PostDetail`]: body text, image
//! and video references, and the post's textual comments. Returns `None`
//! when the page carries no post element at all, which callers treat as
//! "skip this one item".

use scraper::{ElementRef, Html, Selector};

use crate::models::{Comment, Feed, PostDetail, PostKind};

fn selector(src: &str) -> Selector {
    Selector::parse(src).expect("static selector")
}

/// Paragraph text fragments of `root`, trimmed and newline-joined.
fn paragraph_text(root: ElementRef) -> String {
    let p = selector("p");
    root.select(&p)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Image source with lazy-load fallback; `None` when both are absent.
fn image_source(img: ElementRef) -> Option<String> {
    img.value()
        .attr("src")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            img.value()
                .attr("data-lazy-src")
                .filter(|s| !s.trim().is_empty())
        })
        .map(|s| s.trim().to_string())
}

/// Extract a structured detail record from one rendered detail page.
pub fn extract_detail(html: &str, kind: PostKind) -> Option<PostDetail> {
    let document = Html::parse_document(html);

    let post_sel = selector("shreddit-post");
    let post = document.select(&post_sel).next()?;

    // Body text: paragraph fragments inside the primary content container
    let content_sel = selector("div.text-neutral-content");
    let mut content = post
        .select(&content_sel)
        .next()
        .map(paragraph_text)
        .unwrap_or_default();

    // Inline lightbox images first, then images embedded as links inside
    // the content container; document order within each group
    let mut images = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let lightbox_sel = selector("img.media-lightbox-img");
    for img in post.select(&lightbox_sel) {
        if let Some(src) = image_source(img) {
            if seen.insert(src.clone()) {
                images.push(src);
            }
        }
    }
    let embedded_sel = selector("div.text-neutral-content a img");
    for img in post.select(&embedded_sel) {
        if let Some(src) = image_source(img) {
            if seen.insert(src.clone()) {
                images.push(src);
            }
        }
    }

    let video_sel = selector("shreddit-player-2");
    let video = post
        .select(&video_sel)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    // Crossposts and link posts reference an original external resource;
    // keep the extracted body and append the resolved reference
    if kind.references_external() {
        if let Some(href) = post
            .value()
            .attr("content-href")
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let resolved = Feed::resolve_url(href);
            let line = format!("Original link: {}", resolved);
            if content.is_empty() {
                content = line;
            } else {
                content = format!("{}\n{}", content, line);
            }
        }
    }

    let comments = extract_comments(&document);

    Some(PostDetail {
        content,
        images,
        video,
        comments,
    })
}

/// Extract textual comments from a detail page. Non-text comment types
/// are dropped here and never persisted.
fn extract_comments(document: &Html) -> Vec<Comment> {
    let comment_sel = selector("shreddit-comment");
    let text_sel = selector("div.py-0");

    let mut comments = Vec::new();
    for element in document.select(&comment_sel) {
        let content_type = element.value().attr("content-type").unwrap_or("");
        if content_type != "text" {
            continue;
        }

        let Some(text_div) = element.select(&text_sel).next() else {
            continue;
        };

        let attr = |name: &str| element.value().attr(name).unwrap_or("").trim().to_string();
        let parent_id = Some(attr("parentid")).filter(|s| !s.is_empty());

        comments.push(Comment {
            id: attr("thingid"),
            post_id: attr("postid"),
            author: attr("author"),
            parent_id,
            content_type: content_type.to_string(),
            content: paragraph_text(text_div),
        });
    }

    comments
}
