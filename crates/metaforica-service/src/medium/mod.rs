//! Medium import pipeline: fetch a public article, read its metadata and
//! store it as a published link-through blog post.

pub mod extract;
pub mod fetch;
pub mod reconstruct;

use chrono::{NaiveDate, Utc};
use scraper::Html;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::errors::ImportError;
use crate::models::{BlogPost, MEDIUM_CATEGORY, NewBlogPost, PostStatus};
use crate::repositories::BlogPostRepository;
use crate::slug::generate_slug;
use extract::extract_metadata;
use fetch::HtmlFetcher;
use reconstruct::{escape_html, finalize_content, reconstruct_content};

pub const MEDIUM_LINK_LABEL: &str = "Leer en Medium.com";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedPost {
    pub title: String,
    /// Rebuilt article body, or the excerpt paragraph when rebuilding failed.
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub publish_date: NaiveDate,
    pub tags: Vec<String>,
    pub featured_image_url: Option<String>,
    pub read_time: Option<i32>,
    pub canonical_url: String,
}

/// Turns a downloaded page into an [`ExtractedPost`] without touching the network.
pub fn parse_post(
    html: &str,
    canonical_url: &str,
    today: NaiveDate,
) -> Result<ExtractedPost, ImportError> {
    if html.trim().is_empty() {
        return Err(ImportError::Parse(format!(
            "empty document returned for {canonical_url}"
        )));
    }

    let doc = Html::parse_document(html);
    let meta = extract_metadata(&doc, today);
    let rebuilt = reconstruct_content(&doc).map_err(|err| ImportError::Parse(err.to_string()))?;
    let content = finalize_content(&rebuilt, &meta.excerpt);

    Ok(ExtractedPost {
        title: meta.title,
        content,
        excerpt: meta.excerpt,
        author: meta.author,
        publish_date: meta.publish_date,
        tags: meta.tags,
        featured_image_url: meta.featured_image_url,
        read_time: meta.read_time,
        canonical_url: canonical_url.to_string(),
    })
}

pub fn medium_link_html(canonical_url: &str) -> String {
    format!(
        r#"<p><a href="{}" target="_blank" rel="noopener noreferrer">{MEDIUM_LINK_LABEL}</a></p>"#,
        escape_html(canonical_url)
    )
}

/// Builds the stored record. The body is only a link to Medium; the
/// rebuilt content is not persisted.
pub fn to_new_blog_post(post: &ExtractedPost, slug: Option<String>) -> NewBlogPost {
    NewBlogPost {
        title: post.title.clone(),
        content: medium_link_html(&post.canonical_url),
        excerpt: post.excerpt.clone(),
        author: Some(post.author.clone()),
        tags: post.tags.clone(),
        category: MEDIUM_CATEGORY.to_string(),
        status: PostStatus::Published,
        publish_date: post.publish_date,
        read_time: post.read_time,
        slug,
        seo_title: None,
        seo_description: Some(post.canonical_url.clone()),
        featured_image_url: post.featured_image_url.clone(),
        featured_image_path: None,
    }
}

pub struct MediumImporter<'a, R> {
    fetcher: &'a dyn HtmlFetcher,
    posts: &'a R,
}

impl<'a, R: BlogPostRepository> MediumImporter<'a, R> {
    pub fn new(fetcher: &'a dyn HtmlFetcher, posts: &'a R) -> Self {
        Self { fetcher, posts }
    }

    /// Runs fetch, parse and insert in order. Each call inserts a new row,
    /// even for a URL that was imported before.
    #[instrument(skip(self))]
    pub async fn import(&self, url: &str) -> Result<BlogPost, ImportError> {
        info!("Importing Medium post");

        let html = self.fetcher.fetch_html(url).await?;
        let extracted = parse_post(&html, url, Utc::now().date_naive())?;
        info!(title = %extracted.title, tags = extracted.tags.len(), "Extracted post");
        debug!(
            content_chars = extracted.content.len(),
            "Rebuilt content is not stored for Medium posts"
        );

        let slug = Some(generate_slug(&extracted.title)).filter(|slug| !slug.is_empty());
        let record = to_new_blog_post(&extracted, slug);
        let post = self
            .posts
            .create(&record)
            .await
            .map_err(|err| ImportError::Persistence(err.to_string()))?;

        info!(id = post.id, "Successfully imported post");
        Ok(post)
    }
}
