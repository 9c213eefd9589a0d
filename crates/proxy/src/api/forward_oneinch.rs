use {
    super::AppState,
    axum::{
        extract::{Path, RawQuery, State},
        http::header,
        response::{IntoResponse, Response},
    },
    std::sync::Arc,
};

/// Development passthrough to the 1inch API that attaches the configured API
/// key, so a browser UI can call any 1inch endpoint without knowing it.
pub async fn forward_oneinch_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    match state.oneinch.passthrough(&path, query.as_deref()).await {
        Ok(reply) => {
            let mut response = (reply.status, reply.body).into_response();
            if let Some(content_type) = reply.content_type {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
        Err(err) => err.into_response(),
    }
}
