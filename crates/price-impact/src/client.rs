//! Client for the quote proxy.

use {
    alloy_primitives::U256,
    model::{Token, quote::Quote},
    reqwest::{StatusCode, Url},
    std::sync::atomic::{self, AtomicU64},
    tracing::Instrument,
};

/// The proxy flavour, which decides the names of the query parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Api {
    #[value(name = "oneinch")]
    OneInch,
    #[value(name = "kyberswap")]
    KyberSwap,
}

/// Slippage in percent sent along with 1inch quote requests.
const ONEINCH_SLIPPAGE: &str = "1";

pub struct ProxyClient {
    client: reqwest::Client,
    url: Url,
    api: Api,
    chain_id: u64,
}

impl ProxyClient {
    /// `chain_id` is only sent to 1inch proxies.
    pub fn new(client: reqwest::Client, url: Url, api: Api, chain_id: u64) -> Self {
        Self {
            client,
            url,
            api,
            chain_id,
        }
    }

    /// Requests a quote for selling `amount` base units of `from` for `to`.
    pub async fn quote(&self, from: &Token, to: &Token, amount: U256) -> Result<Quote, Error> {
        let (src, dst, amount) = (
            format!("{:?}", from.address),
            format!("{:?}", to.address),
            amount.to_string(),
        );
        let query: Vec<(&str, String)> = match self.api {
            Api::OneInch => vec![
                ("src", src),
                ("dst", dst),
                ("amount", amount),
                ("chainId", self.chain_id.to_string()),
                ("slippage", ONEINCH_SLIPPAGE.to_owned()),
            ],
            Api::KyberSwap => vec![("tokenIn", src), ("tokenOut", dst), ("amountIn", amount)],
        };

        static ID: AtomicU64 = AtomicU64::new(0);
        let id = ID.fetch_add(1, atomic::Ordering::Relaxed);
        self.roundtrip(self.client.get(self.url.clone()).query(&query))
            .instrument(tracing::trace_span!("quote", id = %id))
            .await
    }

    async fn roundtrip(&self, request: reqwest::RequestBuilder) -> Result<Quote, Error> {
        let request = request.build()?;
        tracing::trace!(method = %request.method(), url = %request.url(), "sending HTTP request");
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::trace!(%status, %body, "received HTTP response");

        if !status.is_success() {
            return Err(Error::Status(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}: {1}")]
    Status(StatusCode, String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
