//! The KyberSwap aggregator routes API.
//!
//! KyberSwap doesn't report a price impact, so the proxy derives one from the
//! USD value of both sides of the route and reshapes the reply into a
//! [`Quote`].

use {
    super::{Aggregator, Error},
    alloy_primitives::U256,
    model::{
        Chain,
        quote::{Numeric, Quote, Raw, usd_price_impact},
    },
    number::serialization::DecimalU256,
    reqwest::header::{self, HeaderMap, HeaderValue},
    serde::Deserialize,
    serde_with::serde_as,
    std::time::Duration,
    url::Url,
};

pub const REQUIRED_PARAMETERS: [&str; 3] = ["tokenIn", "tokenOut", "amountIn"];

pub const CACHE_MAX_AGE: Duration = Duration::from_secs(30);

/// Route name reported when the reply doesn't name an exchange.
const FALLBACK_ROUTE: &str = "kyberswap";

#[derive(Clone, Debug)]
pub struct Config {
    pub chain: Chain,
}

/// Headers of a desktop browser visiting the KyberSwap UI. Requests without
/// them are rejected by the bot protection in front of the API.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like \
             Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static("https://kyberswap.com"));
    headers.insert(header::REFERER, HeaderValue::from_static("https://kyberswap.com/"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers
}

/// Builds the routes request from the values of [`REQUIRED_PARAMETERS`].
pub(super) fn request(
    client: &reqwest::Client,
    endpoint: &Url,
    config: &Config,
    [token_in, token_out, amount_in]: [&str; 3],
) -> Result<reqwest::RequestBuilder, Error> {

    let mut url = endpoint.join(&format!("{}/api/v1/routes", config.chain.kyberswap_slug()))?;
    url.query_pairs_mut()
        .append_pair("tokenIn", token_in)
        .append_pair("tokenOut", token_out)
        .append_pair("amountIn", amount_in)
        .append_pair("gasInclude", "true");

    Ok(client.get(url))
}

/// Turns the routes reply into the quote handed to clients.
pub(super) fn reshape(body: serde_json::Value) -> Result<serde_json::Value, Error> {
    let envelope: Envelope = serde_json::from_value(body).map_err(Error::MalformedResponse)?;
    let data = match envelope.data {
        Some(data) if envelope.code.as_ref().and_then(|code| code.as_i64()) == Some(0) => data,
        _ => {
            return Err(Error::Api {
                aggregator: Aggregator::KyberSwap,
                message: envelope.message,
                code: envelope.code,
            });
        }
    };
    let Data { route_summary } =
        serde_json::from_value(data).map_err(Error::MalformedResponse)?;

    let quote = route_summary.into_quote();
    tracing::debug!(
        price_impact = ?quote.price_impact,
        route = ?quote.raw.as_ref().map(|raw| &raw.route),
        "reshaped KyberSwap route",
    );
    serde_json::to_value(quote).map_err(Error::MalformedResponse)
}

/// The outer reply object. `code` is zero on success and `data` is `null` or
/// missing otherwise.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    route_summary: RouteSummary,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteSummary {
    #[serde_as(as = "Option<DecimalU256>")]
    #[serde(default)]
    amount_in: Option<U256>,
    #[serde_as(as = "Option<DecimalU256>")]
    #[serde(default)]
    amount_out: Option<U256>,
    #[serde(default)]
    amount_in_usd: Option<Numeric>,
    #[serde(default)]
    amount_out_usd: Option<Numeric>,
    #[serde(default)]
    gas: Option<Numeric>,
    #[serde(default)]
    gas_price: Option<Numeric>,
    #[serde(default)]
    gas_usd: Option<Numeric>,
    /// Split routes, each a sequence of hops.
    #[serde(default)]
    route: Vec<Vec<Hop>>,
}

#[derive(Deserialize)]
struct Hop {
    #[serde(default)]
    exchange: Option<String>,
}

impl RouteSummary {
    fn into_quote(self) -> Quote {
        let usd = |value: &Option<Numeric>| value.as_ref().and_then(Numeric::to_f64).unwrap_or(0.);
        let price_impact = usd_price_impact(usd(&self.amount_in_usd), usd(&self.amount_out_usd));
        let route = self
            .route
            .into_iter()
            .next()
            .and_then(|hops| hops.into_iter().next())
            .and_then(|hop| hop.exchange)
            .filter(|exchange| !exchange.is_empty())
            .unwrap_or_else(|| FALLBACK_ROUTE.to_owned());

        Quote {
            to_amount: self.amount_out,
            from_amount: self.amount_in,
            price_impact: Some(price_impact),
            estimated_price_impact: Some(price_impact),
            gas: self.gas,
            estimated_gas: None,
            gas_price: self.gas_price,
            gas_usd: self.gas_usd,
            raw: Some(Raw {
                amount_in_usd: self.amount_in_usd,
                amount_out_usd: self.amount_out_usd,
                route,
            }),
        }
    }
}
