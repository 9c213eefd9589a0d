//! Forwarding of quote requests to the aggregator APIs.
//!
//! Every aggregator is served by the same [`Forwarder`]. It validates the
//! required query parameters, builds the upstream request, attaches the
//! configured headers, and maps the upstream reply into what the proxy hands
//! back to its clients. The aggregator specific parts live in the
//! [`oneinch`] and [`kyberswap`] modules.

use {
    crate::metrics::Metrics,
    reqwest::{
        StatusCode,
        header::{HeaderMap, HeaderValue},
    },
    std::{
        collections::HashMap,
        sync::atomic::{self, AtomicU64},
        time::{Duration, Instant},
    },
    tracing::Instrument,
    url::Url,
};

pub mod kyberswap;
pub mod oneinch;

/// Number of characters of an unparsable upstream body included in errors.
const PREVIEW_LEN: usize = 500;

/// The aggregators the proxy can forward to.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    clap::ValueEnum,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Aggregator {
    #[value(name = "oneinch")]
    OneInch,
    #[value(name = "kyberswap")]
    KyberSwap,
}

impl Aggregator {
    fn display_name(&self) -> &'static str {
        match self {
            Self::OneInch => "1inch",
            Self::KyberSwap => "KyberSwap",
        }
    }
}

/// Aggregator specific settings.
#[derive(Clone, Debug)]
pub enum Upstream {
    OneInch(oneinch::Config),
    KyberSwap(kyberswap::Config),
}

impl Upstream {
    pub fn aggregator(&self) -> Aggregator {
        match self {
            Self::OneInch(_) => Aggregator::OneInch,
            Self::KyberSwap(_) => Aggregator::KyberSwap,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub upstream: Upstream,
    /// Base URL of the aggregator API.
    pub endpoint: Url,
    /// Headers sent along with every upstream request.
    pub headers: HeaderMap,
    /// How long clients may cache a successful reply.
    pub cache_max_age: Duration,
}

/// A reply ready to be handed back to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: serde_json::Value,
    /// Set for successful replies only.
    pub cache_max_age: Option<Duration>,
}

/// An upstream reply that is passed through byte for byte.
#[derive(Clone, Debug)]
pub struct RawReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: bytes::Bytes,
}

pub struct Forwarder {
    client: reqwest::Client,
    config: Config,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    pub fn aggregator(&self) -> Aggregator {
        self.config.upstream.aggregator()
    }

    /// Forwards a quote request with the client's query parameters.
    pub async fn forward(&self, params: &HashMap<String, String>) -> Result<Reply, Error> {
        let aggregator = self.aggregator();
        let request = match &self.config.upstream {
            Upstream::OneInch(config) => {
                let required = required_parameters(&oneinch::REQUIRED_PARAMETERS, params)?;
                oneinch::request(&self.client, &self.config.endpoint, config, required, params)?
            }
            Upstream::KyberSwap(config) => {
                let required = required_parameters(&kyberswap::REQUIRED_PARAMETERS, params)?;
                kyberswap::request(&self.client, &self.config.endpoint, config, required)?
            }
        }
        .headers(self.config.headers.clone());

        let (status, body) = self.roundtrip(request).await?;
        let body = serde_json::from_str::<serde_json::Value>(&body).map_err(|err| {
            Error::UnparsableResponse {
                aggregator,
                status,
                preview: body.chars().take(PREVIEW_LEN).collect(),
                parse_error: err.to_string(),
            }
        })?;

        let (status, body) = match &self.config.upstream {
            // The 1inch reply is handed to the client as is, including
            // error replies and their status code.
            Upstream::OneInch(_) => (status, body),
            Upstream::KyberSwap(_) => (StatusCode::OK, kyberswap::reshape(body)?),
        };

        Ok(Reply {
            status,
            body,
            cache_max_age: status
                .is_success()
                .then_some(self.config.cache_max_age),
        })
    }

    /// Forwards an arbitrary path and query of the upstream API with the
    /// configured headers, passing the reply through unchanged. Only URLs below
    /// the configured endpoint are reachable, so the API key never leaves it.
    pub async fn passthrough(&self, path: &str, query: Option<&str>) -> Result<RawReply, Error> {
        let endpoint = &self.config.endpoint;
        let mut url = endpoint.join(path.trim_start_matches('/'))?;
        if url.origin() != endpoint.origin() || !url.path().starts_with(endpoint.path()) {
            return Err(Error::InvalidParameter {
                name: "path",
                value: path.to_owned(),
            });
        }
        url.set_query(query);

        let mut request = self.client.get(url).headers(self.config.headers.clone());
        if let Upstream::OneInch(config) = &self.config.upstream {
            request = request.bearer_auth(config.api_key()?);
        }

        let start = Instant::now();
        let response = request.send().await?;
        self.observe_duration(start);
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .cloned();
        let body = response.bytes().await?;
        tracing::trace!(%status, len = body.len(), "passed through upstream reply");

        Ok(RawReply {
            status,
            content_type,
            body,
        })
    }

    /// Sends the request and reads the body as text. Request and reply are
    /// logged at `TRACE` level inside a span with a unique ID, so exchanges
    /// with the external API can be followed in the logs.
    async fn roundtrip(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, String), Error> {
        static ID: AtomicU64 = AtomicU64::new(0);
        let id = ID.fetch_add(1, atomic::Ordering::Relaxed);
        let aggregator = self.aggregator();

        async move {
            let request = request.build()?;
            tracing::trace!(method = %request.method(), url = %request.url(), "sending HTTP request");

            let start = Instant::now();
            let response = self.client.execute(request).await?;
            let status = response.status();
            let body = response.text().await?;
            self.observe_duration(start);
            tracing::trace!(%status, %body, "received HTTP response");

            Ok::<_, Error>((status, body))
        }
        .instrument(tracing::trace_span!("upstream", %aggregator, id = %id))
        .await
    }

    fn observe_duration(&self, start: Instant) {
        let aggregator: &'static str = self.aggregator().into();
        Metrics::get()
            .upstream_duration_seconds
            .with_label_values(&[aggregator])
            .observe(start.elapsed().as_secs_f64());
    }
}

/// Looks up the required parameters in order. Parameters that are present
/// but empty count as missing.
fn required_parameters<'a, const N: usize>(
    names: &'static [&'static str; N],
    params: &'a HashMap<String, String>,
) -> Result<[&'a str; N], Error> {
    let values = names.map(|name| {
        params
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    });

    if values.iter().any(Option::is_none) {
        return Err(Error::MissingParameters {
            required: names,
            missing: names
                .iter()
                .zip(&values)
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| *name)
                .collect(),
            received: names
                .iter()
                .map(|name| (*name, params.get(*name).cloned()))
                .collect(),
        });
    }

    Ok(values.map(|value| value.unwrap_or_default()))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing required parameters {missing:?}")]
    MissingParameters {
        required: &'static [&'static str],
        missing: Vec<&'static str>,
        received: Vec<(&'static str, Option<String>)>,
    },
    #[error("invalid value {value:?} for parameter {name}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("API key not configured. Please set ONEINCH_API_KEY in the proxy environment.")]
    MissingApiKey,
    #[error("unable to parse {} response", .aggregator.display_name())]
    UnparsableResponse {
        aggregator: Aggregator,
        status: StatusCode,
        preview: String,
        parse_error: String,
    },
    #[error("{} API error", .aggregator.display_name())]
    Api {
        aggregator: Aggregator,
        message: Option<serde_json::Value>,
        code: Option<serde_json::Value>,
    },
    #[error("malformed upstream response: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// A short name of the error variant for error replies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameters { .. } => "MissingParameters",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::MissingApiKey => "MissingApiKey",
            Self::UnparsableResponse { .. } => "UnparsableResponse",
            Self::Api { .. } => "ApiError",
            Self::MalformedResponse(_) => "MalformedResponse",
            Self::Url(_) => "UrlError",
            Self::Http(_) => "HttpError",
        }
    }
}
