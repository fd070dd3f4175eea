use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub(crate) mod import;
mod posts;

pub fn create_api_v1_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/import/medium", post(import::import_medium_post::<S>))
        .route(
            "/posts",
            post(posts::create_post::<S>).get(posts::list_posts::<S>),
        )
        .route(
            "/posts/{id}",
            get(posts::get_post::<S>)
                .put(posts::update_post::<S>)
                .delete(posts::delete_post::<S>),
        )
        .route("/posts/slug/{slug}", get(posts::get_post_by_slug::<S>))
}
