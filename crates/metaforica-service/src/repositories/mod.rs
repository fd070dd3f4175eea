mod blog_posts;
mod traits;

pub use blog_posts::SqliteBlogPostRepository;
pub use traits::{BlogPostRepository, DEFAULT_LIST_LIMIT, ListPostsParams, ListPostsResult};
