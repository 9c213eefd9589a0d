use {
    crate::upstream::{self, Aggregator, Forwarder},
    axum::{
        Router,
        http::{HeaderValue, StatusCode, header},
        response::{IntoResponse, Json, Response},
    },
    serde_json::json,
    std::sync::Arc,
    tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer},
};

mod forward_oneinch;
mod get_quote;

/// Application state shared across all API handlers.
pub struct AppState {
    pub oneinch: Forwarder,
    pub kyberswap: Forwarder,
    /// Aggregator serving requests to `/`.
    pub default: Aggregator,
}

impl AppState {
    fn forwarder(&self, aggregator: Aggregator) -> &Forwarder {
        match aggregator {
            Aggregator::OneInch => &self.oneinch,
            Aggregator::KyberSwap => &self.kyberswap,
        }
    }
}

pub fn handle_all_routes(state: AppState) -> Router {
    let state = Arc::new(state);

    let api_router = Router::new()
        .route("/", get_quote::route(None))
        .route("/oneinch", get_quote::route(Some(Aggregator::OneInch)))
        .route("/kyberswap", get_quote::route(Some(Aggregator::KyberSwap)))
        .route(
            "/api/1inch/{*path}",
            axum::routing::get(forward_oneinch::forward_oneinch_handler).options(preflight),
        )
        .route(
            "/metrics",
            axum::routing::get(|| async { observe::metrics::encode(observe::metrics::get_registry()) }),
        )
        .with_state(state);

    finalize_router(api_router)
}

/// Allows browsers on any origin to call the proxy and adds request tracing.
fn finalize_router(api_router: Router) -> Router {
    api_router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Answers CORS preflight requests.
async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Authorization",
            ),
        ],
    )
        .into_response()
}

impl IntoResponse for upstream::Error {
    fn into_response(self) -> Response {
        let error = self.to_string();
        match self {
            Self::MissingParameters {
                required,
                missing,
                received,
            } => {
                let received = received
                    .into_iter()
                    .map(|(name, value)| (name.to_owned(), json!(value)))
                    .collect::<serde_json::Map<_, _>>();
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": error,
                        "required": required,
                        "missing": missing,
                        "received": received,
                    })),
                )
                    .into_response()
            }
            Self::InvalidParameter { .. } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": error, "type": self.kind() })),
            )
                .into_response(),
            Self::MissingApiKey => {
                tracing::error!("1inch API key is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error })),
                )
                    .into_response()
            }
            Self::UnparsableResponse {
                status,
                preview,
                parse_error,
                ..
            } => {
                tracing::warn!(%status, %preview, %parse_error, "upstream replied with non-JSON body");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": error,
                        "status": status.as_u16(),
                        "preview": preview,
                        "parseError": parse_error,
                    })),
                )
                    .into_response()
            }
            Self::Api { message, code, .. } => {
                tracing::warn!(?message, ?code, "upstream API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": error,
                        "message": message,
                        "code": code,
                    })),
                )
                    .into_response()
            }
            Self::MalformedResponse(_) | Self::Url(_) | Self::Http(_) => {
                tracing::error!(err = ?self, "failed to forward request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error, "type": self.kind() })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::upstream::{Config, Upstream, kyberswap, oneinch},
        axum::{body::Body, http::Request},
        reqwest::header::HeaderMap,
        serde_json::Value,
        testlib::{
            mock::http::{Expectation, Path},
            tokens,
        },
        tower::ServiceExt,
    };

    fn router(oneinch_url: reqwest::Url, kyberswap_url: reqwest::Url, api_key: Option<&str>) -> Router {
        let client = reqwest::Client::new();
        handle_all_routes(AppState {
            oneinch: Forwarder::new(
                client.clone(),
                Config {
                    upstream: Upstream::OneInch(oneinch::Config {
                        api_key: api_key.map(str::to_owned),
                    }),
                    endpoint: oneinch_url,
                    headers: HeaderMap::new(),
                    cache_max_age: oneinch::CACHE_MAX_AGE,
                },
            ),
            kyberswap: Forwarder::new(
                client,
                Config {
                    upstream: Upstream::KyberSwap(kyberswap::Config {
                        chain: model::Chain::Linea,
                    }),
                    endpoint: kyberswap_url,
                    headers: kyberswap::default_headers(),
                    cache_max_age: kyberswap::CACHE_MAX_AGE,
                },
            ),
            default: Aggregator::KyberSwap,
        })
    }

    fn unused() -> reqwest::Url {
        "http://127.0.0.1:1/".parse().unwrap()
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, headers, body)
    }

    #[tokio::test]
    async fn forwards_default_route_to_kyberswap() {
        let usdc = format!("{:?}", tokens::USDC);
        let eth = format!("{:?}", tokens::ETH);
        let upstream = testlib::mock::http::setup(vec![
            Expectation::get(
                Path::exact(format!(
                    "linea/api/v1/routes?tokenIn={eth}&tokenOut={usdc}&amountIn=1000000000000000000000&gasInclude=true"
                )),
                json!({
                    "code": 0,
                    "data": {
                        "routeSummary": {
                            "amountIn": "1000000000000000000000",
                            "amountInUsd": "1000",
                            "amountOut": "1000000000",
                            "amountOutUsd": "995",
                            "gas": "253000",
                            "route": [[{ "exchange": "nile" }]],
                        },
                    },
                }),
            )
            .with_header("origin", "https://kyberswap.com")
            .with_header("accept", "application/json"),
        ])
        .await;

        let (status, headers, body) = get(
            router(unused(), upstream.url(), None),
            &format!("/?tokenIn={eth}&tokenOut={usdc}&amountIn=1000000000000000000000"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=30");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(body["toAmount"], "1000000000");
        assert_eq!(body["priceImpact"], 0.5);
        assert_eq!(body["_raw"]["route"], "nile");
        upstream.assert_all_met();
    }

    #[tokio::test]
    async fn passes_oneinch_reply_through() {
        let upstream = testlib::mock::http::setup(vec![
            Expectation::get(
                Path::exact("swap/v5.2/1/quote?src=0xa&dst=0xb&amount=1000&includeGas=true"),
                json!({ "toAmount": "998", "gas": 181416 }),
            )
            .with_header("authorization", "Bearer secret"),
            Expectation::get(
                Path::exact("swap/v5.2/1/quote?src=0xa&dst=0xb&amount=0"),
                json!({ "statusCode": 400, "description": "amount is not set" }),
            )
            .with_status(StatusCode::BAD_REQUEST),
        ])
        .await;
        let router = router(upstream.url(), unused(), Some("secret"));

        let (status, headers, body) = get(
            router.clone(),
            "/oneinch?src=0xa&dst=0xb&amount=1000&slippage=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");
        assert_eq!(body, json!({ "toAmount": "998", "gas": 181416 }));

        let (status, headers, body) = get(router, "/oneinch?src=0xa&dst=0xb&amount=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers.get(header::CACHE_CONTROL).is_none());
        assert_eq!(body["description"], "amount is not set");
        upstream.assert_all_met();
    }

    #[tokio::test]
    async fn lists_missing_parameters() {
        let (status, headers, body) = get(
            router(unused(), unused(), None),
            "/kyberswap?tokenIn=0xa&amountIn=",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body["required"], json!(["tokenIn", "tokenOut", "amountIn"]));
        assert_eq!(body["missing"], json!(["tokenOut", "amountIn"]));
        assert_eq!(
            body["received"],
            json!({ "tokenIn": "0xa", "tokenOut": null, "amountIn": "" }),
        );
    }

    #[tokio::test]
    async fn reports_missing_api_key() {
        let (status, _, body) = get(
            router(unused(), unused(), None),
            "/oneinch?src=0xa&dst=0xb&amount=1",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("API key not configured")
        );
    }

    #[tokio::test]
    async fn reports_unparsable_upstream_body() {
        let page = format!("<html>{}</html>", "x".repeat(600));
        let upstream = testlib::mock::http::setup(vec![Expectation::get_text(
            Path::Any,
            StatusCode::FORBIDDEN,
            page.clone(),
        )])
        .await;

        let (status, _, body) = get(
            router(unused(), upstream.url(), None),
            "/kyberswap?tokenIn=0xa&tokenOut=0xb&amountIn=1",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "unable to parse KyberSwap response");
        assert_eq!(body["status"], 403);
        assert_eq!(body["preview"], page[..500]);
        assert!(body["parseError"].is_string());
        upstream.assert_all_met();
    }

    #[tokio::test]
    async fn reports_kyberswap_api_error() {
        let upstream = testlib::mock::http::setup(vec![Expectation::get(
            Path::Any,
            json!({ "code": 4011, "message": "token not found" }),
        )])
        .await;

        let (status, _, body) = get(
            router(unused(), upstream.url(), None),
            "/kyberswap?tokenIn=0xa&tokenOut=0xb&amountIn=1",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "error": "KyberSwap API error",
                "message": "token not found",
                "code": 4011,
            }),
        );
        upstream.assert_all_met();
    }

    #[tokio::test]
    async fn reports_transport_failure_without_details() {
        let (status, _, body) = get(
            router(unused(), unused(), None),
            "/kyberswap?tokenIn=0xa&tokenOut=0xb&amountIn=1",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "HttpError");
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn answers_preflight() {
        for uri in ["/", "/oneinch", "/kyberswap", "/api/1inch/swap/v5.2/1/tokens"] {
            let response = router(unused(), unused(), None)
                .oneshot(
                    Request::options(uri)
                        .header(header::ORIGIN, "https://example.com")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let headers = response.headers();
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_METHODS],
                "GET, POST, OPTIONS"
            );
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
                "Content-Type, Authorization"
            );
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn passes_development_requests_through() {
        let upstream = testlib::mock::http::setup(vec![
            Expectation::get(
                Path::exact("swap/v5.2/1/tokens?limit=2"),
                json!({ "tokens": {} }),
            )
            .with_header("authorization", "Bearer secret"),
        ])
        .await;

        let (status, headers, body) = get(
            router(upstream.url(), unused(), Some("secret")),
            "/api/1inch/swap/v5.2/1/tokens?limit=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(body, json!({ "tokens": {} }));
        upstream.assert_all_met();
    }

    #[tokio::test]
    async fn development_requests_stay_on_the_oneinch_host() {
        let upstream = testlib::mock::http::setup(vec![]).await;
        let foreign = testlib::mock::http::setup(vec![]).await;
        let router = router(upstream.url(), unused(), Some("secret"));

        for uri in [
            format!("/api/1inch/http://{}/x", foreign.address),
            format!("/api/1inch/http:%2F%2F{}%2Fx", foreign.address),
        ] {
            let (status, _, body) = get(router.clone(), &uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["type"], "InvalidParameter", "{uri}");
        }

        foreign.assert_all_met();
        upstream.assert_all_met();
    }

    #[tokio::test]
    async fn serves_metrics() {
        observe::metrics::setup_registry_reentrant(None, None);
        let response = router(unused(), unused(), None)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
    }
}
