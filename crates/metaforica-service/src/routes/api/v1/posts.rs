use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::ApiError;
use crate::models::{BlogPost, BlogPostChanges, NewBlogPost, PostStatus};
use crate::slug::{estimate_read_time, generate_slug};
use crate::validation::{validate_medium_link, validate_slug, validate_title};
use crate::{
    AppState,
    repositories::{BlogPostRepository, DEFAULT_LIST_LIMIT, ListPostsParams},
};

#[derive(Debug, Deserialize)]
pub(super) struct CreatePostRequest {
    title: String,
    content: Option<String>,
    excerpt: Option<String>,
    author: Option<String>,
    tags: Option<Vec<String>>,
    category: Option<String>,
    status: Option<PostStatus>,
    publish_date: Option<NaiveDate>,
    read_time: Option<i32>,
    slug: Option<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
    featured_image_url: Option<String>,
    featured_image_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
    excerpt: Option<String>,
    author: Option<String>,
    tags: Option<Vec<String>>,
    category: Option<String>,
    status: Option<PostStatus>,
    publish_date: Option<NaiveDate>,
    read_time: Option<i32>,
    slug: Option<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
    featured_image_url: Option<String>,
    featured_image_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListPostsQuery {
    status: Option<PostStatus>,
    category: Option<String>,
    tag: Option<String>,
    q: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

/// A stored post plus where readers should be sent instead of rendering it.
#[derive(Debug, Serialize)]
pub(super) struct PostView {
    #[serde(flatten)]
    post: BlogPost,
    external_url: Option<String>,
}

impl From<BlogPost> for PostView {
    fn from(post: BlogPost) -> Self {
        let external_url = post.external_url().map(str::to_string);
        PostView { post, external_url }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ListPostsResponse {
    items: Vec<PostView>,
    total: u64,
    limit: u32,
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Trimmed client slug, validated, or `None` when blank.
fn requested_slug(slug: Option<String>) -> Result<Option<String>, ApiError> {
    match slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(slug) => {
            validate_slug(&slug)?;
            Ok(Some(slug))
        }
        None => Ok(None),
    }
}

#[instrument(skip_all, fields(title = %payload.title, has_slug = payload.slug.is_some()))]
pub(super) async fn create_post<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, ResponseJson<PostView>), ApiError> {
    debug!("Processing create post request");

    validate_title(&payload.title)?;
    let category = payload.category.unwrap_or_default();
    validate_medium_link(&category, payload.seo_description.as_deref())?;

    let slug = match requested_slug(payload.slug)? {
        Some(slug) => slug,
        None => generate_slug(&payload.title),
    };

    let content = payload.content.unwrap_or_default();
    let read_time = payload
        .read_time
        .unwrap_or_else(|| estimate_read_time(&content));

    let new_post = NewBlogPost {
        title: payload.title.trim().to_string(),
        content,
        excerpt: payload.excerpt.unwrap_or_default(),
        author: payload.author,
        tags: normalize_tags(payload.tags.unwrap_or_default()),
        category,
        status: payload.status.unwrap_or_default(),
        publish_date: payload
            .publish_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        read_time: Some(read_time),
        slug: Some(slug),
        seo_title: payload.seo_title,
        seo_description: payload.seo_description,
        featured_image_url: payload.featured_image_url,
        featured_image_path: payload.featured_image_path,
    };

    let inserted = state.posts().create(&new_post).await?;
    info!(id = inserted.id, slug = ?inserted.slug, "Successfully created blog post");

    Ok((StatusCode::CREATED, ResponseJson(inserted.into())))
}

#[instrument(skip_all, fields(limit = query.limit, offset = query.offset, has_q = query.q.is_some()))]
pub(super) async fn list_posts<S: AppState>(
    State(state): State<S>,
    Query(query): Query<ListPostsQuery>,
) -> Result<ResponseJson<ListPostsResponse>, ApiError> {
    debug!("Processing list posts request");

    if query.limit == Some(0) {
        return Err(ApiError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }

    let params = ListPostsParams {
        status: query.status,
        category: query.category,
        tag: query.tag,
        query: query.q,
        limit: query.limit,
        offset: query.offset,
    };

    let result = state.posts().list(&params).await?;

    let response = ListPostsResponse {
        items: result.items.into_iter().map(PostView::from).collect(),
        total: result.total,
        limit: params.limit.unwrap_or(DEFAULT_LIST_LIMIT),
    };

    info!(
        returned_count = response.items.len(),
        total = response.total,
        "Successfully retrieved blog posts"
    );

    Ok(ResponseJson(response))
}

#[instrument(skip_all, fields(id = %id))]
pub(super) async fn get_post<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<PostView>, ApiError> {
    match state.posts().find_by_id(id).await? {
        Some(post) => Ok(ResponseJson(post.into())),
        None => {
            debug!("Blog post not found");
            Err(ApiError::NotFound)
        }
    }
}

/// Looks a post up by slug, falling back to the numeric id for links that
/// predate slugs.
#[instrument(skip_all, fields(slug = %slug))]
pub(super) async fn get_post_by_slug<S: AppState>(
    State(state): State<S>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<PostView>, ApiError> {
    let posts = state.posts();

    if let Some(post) = posts.find_by_slug(&slug).await? {
        return Ok(ResponseJson(post.into()));
    }

    if let Ok(id) = slug.parse::<i32>() {
        if let Some(post) = posts.find_by_id(id).await? {
            debug!(id, "Resolved slug as post id");
            return Ok(ResponseJson(post.into()));
        }
    }

    Err(ApiError::NotFound)
}

#[instrument(skip_all, fields(id = %id))]
pub(super) async fn update_post<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<ResponseJson<PostView>, ApiError> {
    debug!("Processing update post request");

    let posts = state.posts();
    let existing = posts.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    if let Some(title) = &payload.title {
        validate_title(title)?;
    }

    let category = payload.category.as_deref().unwrap_or(&existing.category);
    let seo_description = payload
        .seo_description
        .as_deref()
        .or(existing.seo_description.as_deref());
    validate_medium_link(category, seo_description)?;

    // The repository suffixes the slug if another post already owns it.
    let slug = match requested_slug(payload.slug)? {
        Some(slug) => Some(slug),
        None if existing.slug.is_none() => {
            let title = payload.title.as_deref().unwrap_or(&existing.title);
            Some(generate_slug(title))
        }
        None => None,
    };

    let read_time = payload
        .read_time
        .or_else(|| payload.content.as_deref().map(estimate_read_time));

    let changes = BlogPostChanges {
        title: payload.title.map(|title| title.trim().to_string()),
        content: payload.content,
        excerpt: payload.excerpt,
        author: payload.author,
        tags: payload.tags.map(normalize_tags),
        category: payload.category,
        status: payload.status,
        publish_date: payload.publish_date,
        read_time,
        slug,
        seo_title: payload.seo_title,
        seo_description: payload.seo_description,
        featured_image_url: payload.featured_image_url,
        featured_image_path: payload.featured_image_path,
    };

    let updated = posts.update(id, &changes).await?.ok_or(ApiError::NotFound)?;
    info!(id = updated.id, "Successfully updated blog post");

    Ok(ResponseJson(updated.into()))
}

#[instrument(skip_all, fields(id = %id))]
pub(super) async fn delete_post<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if !state.posts().delete(id).await? {
        debug!("Blog post not found");
        return Err(ApiError::NotFound);
    }

    info!(id, "Deleted blog post");
    Ok(StatusCode::NO_CONTENT)
}
