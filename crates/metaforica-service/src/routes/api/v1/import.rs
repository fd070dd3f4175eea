use axum::{
    extract::{Json, State, rejection::JsonRejection},
    response::Json as ResponseJson,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::AppState;
use crate::errors::ApiError;
use crate::medium::MediumImporter;
use crate::models::BlogPost;
use crate::validation::validate_medium_url;

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    success: bool,
    post: BlogPost,
    message: String,
}

pub(crate) async fn import_medium_post<S: AppState>(
    State(state): State<S>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<ResponseJson<ImportResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected import request body");
        ApiError::BadRequest(rejection.body_text())
    })?;

    let url = validate_medium_url(payload.url.as_deref()).inspect_err(|_| {
        warn!(url = ?payload.url, "Rejected import of non-Medium URL");
    })?;
    debug!(%url, "Import URL accepted");

    let posts = state.posts();
    let fetcher = state.fetcher();
    let post = MediumImporter::new(fetcher.as_ref(), &posts)
        .import(&url)
        .await?;

    Ok(ResponseJson(ImportResponse {
        success: true,
        message: format!("Successfully imported: {}", post.title),
        post,
    }))
}
