use std::fmt::{self, Write};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Below this many characters the rebuilt body is assumed to be an
/// extraction failure and the excerpt is used instead.
pub const MIN_CONTENT_CHARS: usize = 100;

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static CONTENT_BLOCKS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p, h1, h2, h3, h4, ul, ol, blockquote, pre, figure").unwrap()
});
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Rebuilds a minimal HTML body from the first `<article>` of the page.
///
/// Returns an empty string when the page has no article.
pub fn reconstruct_content(doc: &Html) -> Result<String, fmt::Error> {
    let Some(article) = doc.select(&ARTICLE).next() else {
        return Ok(String::new());
    };

    let mut content = String::new();
    for block in article.select(&CONTENT_BLOCKS) {
        render_block(&mut content, block)?;
    }
    Ok(content)
}

fn render_block(out: &mut String, el: ElementRef<'_>) -> fmt::Result {
    let tag = el.value().name();
    let text = element_text(el);

    if text.is_empty() && tag != "figure" {
        return Ok(());
    }

    match tag {
        "h1" | "h2" | "h3" | "h4" => writeln!(out, "<{tag}>{}</{tag}>", escape_html(&text)),
        "blockquote" => writeln!(out, "<blockquote>{}</blockquote>", escape_html(&text)),
        "pre" => writeln!(out, "<pre><code>{}</code></pre>", escape_html(&text)),
        "ul" | "ol" => render_list(out, el, tag),
        "figure" => render_figure(out, el, &text),
        _ => {
            if el.select(&ANCHOR).next().is_some() {
                writeln!(out, "<p>{}</p>", el.inner_html())
            } else {
                writeln!(out, "<p>{}</p>", escape_html(&text))
            }
        }
    }
}

/// Every `li` below the list is emitted, nested ones included.
fn render_list(out: &mut String, list: ElementRef<'_>, tag: &str) -> fmt::Result {
    writeln!(out, "<{tag}>")?;
    for item in list.select(&LIST_ITEM) {
        writeln!(out, "  <li>{}</li>", escape_html(&element_text(item)))?;
    }
    writeln!(out, "</{tag}>")
}

fn render_figure(out: &mut String, figure: ElementRef<'_>, text: &str) -> fmt::Result {
    let image = figure
        .select(&IMAGE)
        .next()
        .and_then(|img| img.value().attr("src").map(|src| (img, src)))
        .filter(|(_, src)| !src.is_empty());

    match image {
        Some((img, src)) => {
            let alt = img.value().attr("alt").unwrap_or_default();
            writeln!(
                out,
                r#"<figure><img src="{}" alt="{}" /></figure>"#,
                escape_html(src),
                escape_html(alt)
            )
        }
        None if !text.is_empty() => writeln!(out, "<p>{}</p>", escape_html(text)),
        None => Ok(()),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Chooses between the rebuilt body and a single excerpt paragraph.
pub fn finalize_content(content: &str, excerpt: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() < MIN_CONTENT_CHARS {
        return format!("<p>{}</p>", escape_html(excerpt));
    }
    trimmed.to_string()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
