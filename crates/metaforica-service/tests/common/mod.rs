#![allow(dead_code)]

use async_trait::async_trait;
use diesel::sqlite::SqliteConnection;
use metaforica_service::db::establish_connection;
use metaforica_service::medium::fetch::{FetchError, HtmlFetcher};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MEDIUM_POST_HTML: &str = include_str!("../fixtures/medium_post.html");
pub const NO_ARTICLE_HTML: &str = include_str!("../fixtures/no_article.html");

pub const FIXTURE_URL: &str = "https://medium.com/@x/my-post-abc123";

pub fn establish_test_connection() -> SqliteConnection {
    establish_connection(":memory:").expect("Failed to create in-memory database")
}

/// Serves canned pages by URL; anything else is a 404.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
}

impl FixtureFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Waits before answering, like a slow upstream.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl HtmlFetcher for FixtureFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages.get(url).cloned().ok_or(FetchError::Status {
            status: 404,
            status_text: "Not Found".to_string(),
        })
    }
}

pub mod server_utils {
    use super::*;
    use axum_test::TestServer;
    use metaforica_service::{DefaultAppState, routes};

    pub fn create_test_server() -> (TestServer, Arc<Mutex<SqliteConnection>>) {
        create_test_server_with(FixtureFetcher::default().with_page(FIXTURE_URL, MEDIUM_POST_HTML))
    }

    pub fn create_test_server_with(
        fetcher: FixtureFetcher,
    ) -> (TestServer, Arc<Mutex<SqliteConnection>>) {
        let db = Arc::new(Mutex::new(establish_test_connection()));

        let state = DefaultAppState::new(db.clone(), Arc::new(fetcher));
        let app = routes::create_router().with_state(state);

        let server = TestServer::new(app).unwrap();
        (server, db)
    }
}

pub mod test_utils {
    use super::*;
    use diesel::prelude::*;
    use metaforica_service::schema::blog_posts;

    pub fn count_posts(conn: &mut SqliteConnection) -> i64 {
        blog_posts::table
            .count()
            .get_result(conn)
            .expect("Failed to count posts")
    }

    pub fn stored_content(conn: &mut SqliteConnection, post_id: i32) -> String {
        blog_posts::table
            .find(post_id)
            .select(blog_posts::content)
            .first(conn)
            .expect("Failed to load post content")
    }
}
