use axum::Router;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

pub mod config;
pub mod db;
pub mod errors;
pub mod medium;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod shutdown;
pub mod slug;
pub mod validation;

use medium::fetch::HtmlFetcher;
use repositories::{BlogPostRepository, SqliteBlogPostRepository};

/// Dependencies shared by all handlers, built once at start-up.
pub trait AppState: Clone + Send + Sync + 'static {
    type Posts: BlogPostRepository;

    fn posts(&self) -> Self::Posts;
    fn fetcher(&self) -> Arc<dyn HtmlFetcher>;
}

#[derive(Clone)]
pub struct DefaultAppState {
    posts: SqliteBlogPostRepository,
    fetcher: Arc<dyn HtmlFetcher>,
}

impl DefaultAppState {
    pub fn new(db: Arc<Mutex<SqliteConnection>>, fetcher: Arc<dyn HtmlFetcher>) -> Self {
        Self {
            posts: SqliteBlogPostRepository::new(db),
            fetcher,
        }
    }
}

impl AppState for DefaultAppState {
    type Posts = SqliteBlogPostRepository;

    fn posts(&self) -> Self::Posts {
        self.posts.clone()
    }

    fn fetcher(&self) -> Arc<dyn HtmlFetcher> {
        self.fetcher.clone()
    }
}

pub fn create_app(state: DefaultAppState) -> Router {
    routes::create_router().with_state(state)
}
