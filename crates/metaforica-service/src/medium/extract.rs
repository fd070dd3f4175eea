//! Metadata read from the Open Graph / article meta tags of a Medium page.
//!
//! Every field has its own fallback chain, so a missing tag never prevents
//! the others from being read.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

pub const UNTITLED_POST: &str = "Untitled Post";
pub const DEFAULT_AUTHOR: &str = "Alexandra";
pub const MAX_EXCERPT_CHARS: usize = 300;

static OG_TITLE: Lazy<Selector> = Lazy::new(|| meta_selector("property", "og:title"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| meta_selector("property", "og:description"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| meta_selector("name", "description"));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| meta_selector("property", "og:image"));
static ARTICLE_AUTHOR: Lazy<Selector> = Lazy::new(|| meta_selector("property", "article:author"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| meta_selector("name", "author"));
static PUBLISHED_TIME: Lazy<Selector> =
    Lazy::new(|| meta_selector("property", "article:published_time"));
static ARTICLE_TAG: Lazy<Selector> = Lazy::new(|| meta_selector("property", "article:tag"));
static READ_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="storyReadTime"]"#).unwrap());

static READ_TIME_MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*min").unwrap());

fn meta_selector(attribute: &str, value: &str) -> Selector {
    Selector::parse(&format!(r#"meta[{attribute}="{value}"]"#)).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostMetadata {
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub publish_date: NaiveDate,
    pub tags: Vec<String>,
    pub featured_image_url: Option<String>,
    pub read_time: Option<i32>,
}

/// Reads all metadata fields. `today` is used when the page has no usable
/// publication time.
pub fn extract_metadata(doc: &Html, today: NaiveDate) -> PostMetadata {
    PostMetadata {
        title: title(doc),
        excerpt: excerpt(doc),
        author: author(doc),
        publish_date: publish_date(doc).unwrap_or(today),
        tags: tags(doc),
        featured_image_url: meta_content(doc, &OG_IMAGE),
        read_time: read_time(doc),
    }
}

/// `content` of the first element matching `selector`, if non-blank.
fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn title(doc: &Html) -> String {
    meta_content(doc, &OG_TITLE)
        .or_else(|| {
            doc.select(&TITLE)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
        })
        .unwrap_or_else(|| UNTITLED_POST.to_string())
}

fn excerpt(doc: &Html) -> String {
    meta_content(doc, &OG_DESCRIPTION)
        .or_else(|| meta_content(doc, &DESCRIPTION))
        .map(|text| text.chars().take(MAX_EXCERPT_CHARS).collect())
        .unwrap_or_default()
}

fn author(doc: &Html) -> String {
    meta_content(doc, &ARTICLE_AUTHOR)
        .or_else(|| meta_content(doc, &AUTHOR))
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string())
}

fn publish_date(doc: &Html) -> Option<NaiveDate> {
    let raw = meta_content(doc, &PUBLISHED_TIME)?;
    parse_publish_date(&raw)
}

/// Accepts RFC 3339 timestamps (normalised to UTC) and bare `YYYY-MM-DD` dates.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn tags(doc: &Html) -> Vec<String> {
    doc.select(&ARTICLE_TAG)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_time(doc: &Html) -> Option<i32> {
    let text: String = doc.select(&READ_TIME).next()?.text().collect();
    READ_TIME_MINUTES
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|minutes| minutes.as_str().parse().ok())
}
