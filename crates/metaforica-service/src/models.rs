use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category marking a post as a link-through to an article hosted on Medium.
pub const MEDIUM_CATEGORY: &str = "De Medium.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    /// Anything other than `published` is treated as a draft.
    pub fn from_db(value: &str) -> Self {
        match value {
            "published" => PostStatus::Published,
            _ => PostStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::blog_posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BlogPostRow {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: Option<String>,
    pub tags: String,
    pub category: String,
    pub status: String,
    pub publish_date: NaiveDate,
    pub read_time: Option<i32>,
    pub slug: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured_image_url: Option<String>,
    pub featured_image_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPost {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: String,
    pub status: PostStatus,
    pub publish_date: NaiveDate,
    pub read_time: Option<i32>,
    pub slug: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured_image_url: Option<String>,
    pub featured_image_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BlogPost {
    /// The Medium article this post points at, if it is an imported link-through.
    pub fn external_url(&self) -> Option<&str> {
        if self.category != MEDIUM_CATEGORY {
            return None;
        }
        self.seo_description
            .as_deref()
            .filter(|link| link.starts_with("http"))
    }
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        let tags = serde_json::from_str(&row.tags).unwrap_or_else(|err| {
            warn!(id = row.id, error = %err, "Stored tags are not a JSON array, ignoring them");
            Vec::new()
        });

        BlogPost {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            author: row.author,
            tags,
            category: row.category,
            status: PostStatus::from_db(&row.status),
            publish_date: row.publish_date,
            read_time: row.read_time,
            slug: row.slug,
            seo_title: row.seo_title,
            seo_description: row.seo_description,
            featured_image_url: row.featured_image_url,
            featured_image_path: row.featured_image_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: String,
    pub status: PostStatus,
    pub publish_date: NaiveDate,
    pub read_time: Option<i32>,
    pub slug: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured_image_url: Option<String>,
    pub featured_image_path: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::blog_posts)]
pub struct NewBlogPostRow<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub excerpt: &'a str,
    pub author: Option<&'a str>,
    pub tags: String,
    pub category: &'a str,
    pub status: &'static str,
    pub publish_date: NaiveDate,
    pub read_time: Option<i32>,
    pub slug: Option<&'a str>,
    pub seo_title: Option<&'a str>,
    pub seo_description: Option<&'a str>,
    pub featured_image_url: Option<&'a str>,
    pub featured_image_path: Option<&'a str>,
}

impl<'a> NewBlogPostRow<'a> {
    pub fn from_post(post: &'a NewBlogPost) -> Result<Self, serde_json::Error> {
        Ok(NewBlogPostRow {
            title: &post.title,
            content: &post.content,
            excerpt: &post.excerpt,
            author: post.author.as_deref(),
            tags: serde_json::to_string(&post.tags)?,
            category: &post.category,
            status: post.status.as_str(),
            publish_date: post.publish_date,
            read_time: post.read_time,
            slug: post.slug.as_deref(),
            seo_title: post.seo_title.as_deref(),
            seo_description: post.seo_description.as_deref(),
            featured_image_url: post.featured_image_url.as_deref(),
            featured_image_path: post.featured_image_path.as_deref(),
        })
    }
}

/// Partial update of a post. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogPostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub status: Option<PostStatus>,
    pub publish_date: Option<NaiveDate>,
    pub read_time: Option<i32>,
    pub slug: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured_image_url: Option<String>,
    pub featured_image_path: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::blog_posts)]
pub struct BlogPostChangesRow<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub excerpt: Option<&'a str>,
    pub author: Option<&'a str>,
    pub tags: Option<String>,
    pub category: Option<&'a str>,
    pub status: Option<&'static str>,
    pub publish_date: Option<NaiveDate>,
    pub read_time: Option<i32>,
    pub slug: Option<&'a str>,
    pub seo_title: Option<&'a str>,
    pub seo_description: Option<&'a str>,
    pub featured_image_url: Option<&'a str>,
    pub featured_image_path: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl<'a> BlogPostChangesRow<'a> {
    pub fn from_changes(
        changes: &'a BlogPostChanges,
        updated_at: NaiveDateTime,
    ) -> Result<Self, serde_json::Error> {
        let tags = changes
            .tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(BlogPostChangesRow {
            title: changes.title.as_deref(),
            content: changes.content.as_deref(),
            excerpt: changes.excerpt.as_deref(),
            author: changes.author.as_deref(),
            tags,
            category: changes.category.as_deref(),
            status: changes.status.map(|status| status.as_str()),
            publish_date: changes.publish_date,
            read_time: changes.read_time,
            slug: changes.slug.as_deref(),
            seo_title: changes.seo_title.as_deref(),
            seo_description: changes.seo_description.as_deref(),
            featured_image_url: changes.featured_image_url.as_deref(),
            featured_image_path: changes.featured_image_path.as_deref(),
            updated_at,
        })
    }
}
