use crate::errors::ApiError;
use crate::models::{BlogPost, BlogPostChanges, NewBlogPost, PostStatus};
use async_trait::async_trait;

pub const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct ListPostsParams {
    pub status: Option<PostStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Case-insensitive text searched in title, content, excerpt, category and tags.
    pub query: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ListPostsResult {
    pub items: Vec<BlogPost>,
    pub total: u64,
}

#[async_trait]
pub trait BlogPostRepository: Clone + Send + Sync + 'static {
    /// Inserts `post`. A requested slug that is already taken is stored with
    /// the first free `-N` suffix; an empty one is stored as `NULL`.
    async fn create(&self, post: &NewBlogPost) -> Result<BlogPost, ApiError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<BlogPost>, ApiError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, ApiError>;
    async fn list(&self, params: &ListPostsParams) -> Result<ListPostsResult, ApiError>;
    /// Applies `changes`, suffixing a requested slug the same way as `create`.
    async fn update(&self, id: i32, changes: &BlogPostChanges)
    -> Result<Option<BlogPost>, ApiError>;
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}
