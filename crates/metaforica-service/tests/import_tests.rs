use anyhow::Result;
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use diesel::RunQueryDsl;
use metaforica_service::medium::MediumImporter;
use metaforica_service::repositories::SqliteBlogPostRepository;
use metaforica_service::{DefaultAppState, routes};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

mod common;

use common::server_utils::{create_test_server, create_test_server_with};
use common::{
    FIXTURE_URL, FixtureFetcher, MEDIUM_POST_HTML, NO_ARTICLE_HTML, establish_test_connection,
    test_utils,
};

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _db) = create_test_server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_import_stores_published_link_through_post() {
    let (server, db) = create_test_server();

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": FIXTURE_URL }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully imported: Hello");

    let post = &body["post"];
    assert_eq!(post["title"], "Hello");
    assert_eq!(post["excerpt"], "World");
    assert_eq!(post["tags"], json!(["writing"]));
    assert_eq!(post["category"], "De Medium.com");
    assert_eq!(post["status"], "published");
    assert_eq!(post["seo_description"], FIXTURE_URL);
    assert_eq!(post["author"], "https://medium.com/@x");
    assert_eq!(post["publish_date"], "2024-05-02");
    assert_eq!(post["read_time"], 4);
    assert_eq!(post["slug"], "hello");
    assert_eq!(
        post["featured_image_url"],
        "https://miro.medium.com/v2/resize:fit:1200/hello.jpeg"
    );

    let id = post["id"].as_i64().unwrap() as i32;
    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_posts(&mut conn), 1);
    assert_eq!(
        test_utils::stored_content(&mut conn, id),
        format!(
            r#"<p><a href="{FIXTURE_URL}" target="_blank" rel="noopener noreferrer">Leer en Medium.com</a></p>"#
        )
    );
}

#[tokio::test]
async fn test_import_rejects_non_medium_url() {
    let (server, db) = create_test_server();

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": "https://example.com/post" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Invalid Medium URL" }));

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_posts(&mut conn), 0);
}

#[tokio::test]
async fn test_import_rejects_missing_or_blank_url() {
    let (server, _db) = create_test_server();

    for payload in [json!({}), json!({ "url": null }), json!({ "url": "   " })] {
        let response = server.post("/api/v1/import/medium").json(&payload).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid Medium URL");
    }
}

#[tokio::test]
async fn test_import_rejects_unparseable_medium_url() {
    let (server, _db) = create_test_server();

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": "medium.com/@x/no-scheme" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_reports_upstream_failure() {
    let (server, db) = create_test_server();

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": "https://medium.com/@x/missing" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch Medium post: 404 Not Found");
    assert!(body["details"].as_str().unwrap().contains("Status"));

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_posts(&mut conn), 0);
}

#[tokio::test]
async fn test_import_reports_empty_page_as_parse_failure() {
    let url = "https://medium.com/@x/empty";
    let (server, _db) = create_test_server_with(FixtureFetcher::default().with_page(url, "  \n"));

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": url }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse HTML")
    );
}

#[tokio::test]
async fn test_import_falls_back_when_metadata_is_sparse() {
    let url = "https://alguien.medium.com/sin-articulo-42";
    let (server, _db) =
        create_test_server_with(FixtureFetcher::default().with_page(url, NO_ARTICLE_HTML));

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": url }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let post = &body["post"];
    assert_eq!(post["title"], "Sin artículo");
    assert_eq!(post["excerpt"], "Solo una descripción corta");
    assert_eq!(post["author"], "Alguien");
    assert_eq!(post["tags"], json!(["poesía", "ensayo"]));
    assert_eq!(post["slug"], "sin-articulo");
    assert_eq!(post["read_time"], Value::Null);
    assert_eq!(post["featured_image_url"], Value::Null);
}

#[tokio::test]
async fn test_repeated_import_creates_separate_posts() {
    let (server, db) = create_test_server();

    let first: Value = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": FIXTURE_URL }))
        .await
        .json();
    let second: Value = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": FIXTURE_URL }))
        .await
        .json();

    assert_ne!(first["post"]["id"], second["post"]["id"]);
    assert_eq!(first["post"]["slug"], "hello");
    assert_eq!(second["post"]["slug"], "hello-1");

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_posts(&mut conn), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_imports_all_get_distinct_slugs() {
    let db = Arc::new(Mutex::new(establish_test_connection()));
    let posts = SqliteBlogPostRepository::new(db.clone());
    let fetcher = Arc::new(
        FixtureFetcher::default()
            .with_page(FIXTURE_URL, MEDIUM_POST_HTML)
            .with_delay(Duration::from_millis(20)),
    );

    let imports: Vec<_> = (0..32)
        .map(|_| {
            let posts = posts.clone();
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                MediumImporter::new(fetcher.as_ref(), &posts)
                    .import(FIXTURE_URL)
                    .await
                    .map_err(|err| err.to_string())
            })
        })
        .collect();

    let mut slugs = HashSet::new();
    for import in imports {
        let post = import.await.unwrap().expect("every import should succeed");
        assert!(slugs.insert(post.slug.expect("imported posts have a slug")));
    }

    assert_eq!(slugs.len(), 32);
    assert!(slugs.contains("hello"));
    assert!(slugs.contains("hello-31"));

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_posts(&mut conn), 32);
}

#[tokio::test]
async fn test_import_reports_storage_failure() {
    let (server, db) = create_test_server();
    {
        let mut conn = db.lock().unwrap();
        diesel::sql_query("DROP TABLE blog_posts")
            .execute(&mut *conn)
            .unwrap();
    }

    let response = server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": FIXTURE_URL }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to store imported post"),
        "unexpected error: {body}"
    );
    assert!(body["details"].as_str().unwrap().contains("Persistence"));
}

#[tokio::test]
async fn test_import_available_on_functions_path() {
    let (server, _db) = create_test_server();

    let response = server
        .post("/functions/v1/import-medium-post")
        .json(&json!({ "url": FIXTURE_URL }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["post"]["category"], "De Medium.com");
}

#[tokio::test]
async fn test_imported_post_is_readable_through_posts_api() {
    let (server, _db) = create_test_server();

    server
        .post("/api/v1/import/medium")
        .json(&json!({ "url": FIXTURE_URL }))
        .await;

    let response = server.get("/api/v1/posts/slug/hello").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["external_url"], FIXTURE_URL);
}

mod raw_requests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_app() -> axum::Router {
        let db = Arc::new(Mutex::new(establish_test_connection()));
        let fetcher = FixtureFetcher::default().with_page(FIXTURE_URL, MEDIUM_POST_HTML);
        let state = DefaultAppState::new(db, Arc::new(fetcher));
        routes::create_router().with_state(state)
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered() -> Result<()> {
        let app = create_test_app();

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/import/medium")
            .header("origin", "https://metaforica.example")
            .header("access-control-request-method", "POST")
            .header(
                "access-control-request-headers",
                "authorization, content-type, apikey, x-client-info",
            )
            .body(Body::empty())?;

        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let allowed = headers["access-control-allow-headers"].to_str()?;
        for header in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(header), "missing {header} in {allowed}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_import_response_carries_cors_header() -> Result<()> {
        let app = create_test_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/import/medium")
            .header("origin", "https://metaforica.example")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "url": FIXTURE_URL }).to_string()))?;

        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["success"], true);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_bad_request() -> Result<()> {
        let app = create_test_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/import/medium")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))?;

        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        assert!(body["error"].is_string());
        Ok(())
    }
}
