use {
    super::AppState,
    crate::{metrics::Metrics, upstream::Aggregator},
    axum::{
        extract::{Query, State},
        http::{HeaderValue, header},
        response::{IntoResponse, Json, Response},
        routing::MethodRouter,
    },
    std::{collections::HashMap, sync::Arc, time::Instant},
};

/// Quote route for the given aggregator, or for the configured default one
/// when `None`.
pub fn route(aggregator: Option<Aggregator>) -> MethodRouter<Arc<AppState>> {
    axum::routing::get(
        move |State(state): State<Arc<AppState>>,
              Query(params): Query<HashMap<String, String>>| async move {
            get_quote(&state, aggregator.unwrap_or(state.default), &params).await
        },
    )
    .options(super::preflight)
}

async fn get_quote(
    state: &AppState,
    aggregator: Aggregator,
    params: &HashMap<String, String>,
) -> Response {
    let timer = Instant::now();
    let response = match state.forwarder(aggregator).forward(params).await {
        Ok(reply) => {
            let mut response = (reply.status, Json(reply.body)).into_response();
            if let Some(max_age) = reply.cache_max_age {
                let value = format!("public, max-age={}", max_age.as_secs());
                if let Ok(value) = HeaderValue::from_str(&value) {
                    response.headers_mut().insert(header::CACHE_CONTROL, value);
                }
            }
            response
        }
        Err(err) => err.into_response(),
    };

    Metrics::on_request_completed(aggregator.into(), response.status(), timer);
    response
}
