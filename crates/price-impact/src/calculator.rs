//! Price impact calculation across a list of trading pairs.

use {
    crate::client::{self, ProxyClient},
    alloy_primitives::U256,
    futures::{StreamExt as _, stream},
    model::{Token, TradingPair},
    number::{
        serialization::DecimalU256,
        units::{to_base_units, to_human_units},
    },
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
    std::num::NonZeroUsize,
};

/// How the price impact is determined when the proxy doesn't report one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Trust the proxy. A missing figure counts as no impact.
    Reported,
    /// Compare the price against the price of a small reference trade.
    Baseline { amount: f64 },
}

/// The price impact of selling a notional amount on one pair.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceImpactResult {
    #[serde_as(as = "DisplayFromStr")]
    pub pair: TradingPair,
    pub from_token: Token,
    pub to_token: Token,
    /// Notional amount in units of the sell token.
    pub amount: f64,
    /// In percent. Negative values mean a better price than the reference.
    pub price_impact: f64,
    /// Units of the buy token received per unit of the sell token.
    pub price: f64,
    #[serde_as(as = "DecimalU256")]
    pub to_amount: U256,
    #[serde_as(as = "DecimalU256")]
    pub from_amount: U256,
    pub estimated_gas: Option<String>,
}

pub struct Calculator {
    client: ProxyClient,
    strategy: Strategy,
    concurrency: NonZeroUsize,
}

impl Calculator {
    pub fn new(client: ProxyClient, strategy: Strategy, concurrency: NonZeroUsize) -> Self {
        Self {
            client,
            strategy,
            concurrency,
        }
    }

    /// Computes the price impact of every pair, sorted from the most
    /// favorable to the most severe. Pairs that can't be quoted are skipped.
    pub async fn calculate(
        &self,
        pairs: &[(Token, Token)],
        amount: f64,
    ) -> Result<Vec<PriceImpactResult>, Error> {
        let mut results = stream::iter(pairs.iter().enumerate())
            .map(|(index, (from, to))| async move {
                let result = self.evaluate(from, to, amount).await;
                (index, from, to, result)
            })
            .buffer_unordered(self.concurrency.get())
            .filter_map(|(index, from, to, result)| async move {
                match result {
                    Ok(result) => Some((index, result)),
                    Err(err) => {
                        tracing::warn!(
                            pair = %TradingPair::new(&from.symbol, &to.symbol),
                            ?err,
                            "skipping pair"
                        );
                        None
                    }
                }
            })
            .collect::<Vec<_>>()
            .await;

        if results.is_empty() {
            return Err(Error::NoData);
        }
        // Completion order depends on the upstream, so ties are broken by the
        // configured pair order.
        results.sort_by(|(a_index, a), (b_index, b)| {
            a.price_impact
                .total_cmp(&b.price_impact)
                .then(a_index.cmp(b_index))
        });
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }

    async fn evaluate(
        &self,
        from: &Token,
        to: &Token,
        amount: f64,
    ) -> Result<PriceImpactResult, PairError> {
        let (from_amount, to_amount, price, quote) = self.quote_price(from, to, amount).await?;

        let price_impact = match (quote.reported_price_impact(), self.strategy) {
            (Some(reported), _) => reported,
            (None, Strategy::Reported) => 0.,
            (None, Strategy::Baseline { amount: base_amount }) => {
                match self.quote_price(from, to, base_amount).await {
                    Ok((.., base_price, _)) => relative_price_change(price, base_price),
                    Err(err) => {
                        tracing::warn!(?err, "baseline quote failed, assuming no impact");
                        0.
                    }
                }
            }
        };

        Ok(PriceImpactResult {
            pair: TradingPair::new(&from.symbol, &to.symbol),
            from_token: from.clone(),
            to_token: to.clone(),
            amount,
            price_impact,
            price,
            to_amount,
            from_amount,
            estimated_gas: quote.estimated_gas().map(ToString::to_string),
        })
    }

    /// Quotes `amount` and returns the amounts in base units, the price in
    /// buy token per sell token and the raw quote.
    async fn quote_price(
        &self,
        from: &Token,
        to: &Token,
        amount: f64,
    ) -> Result<(U256, U256, f64, model::quote::Quote), PairError> {
        let from_amount = to_base_units(amount, from.decimals).map_err(PairError::Amount)?;
        let quote = self.client.quote(from, to, from_amount).await?;
        let to_amount = quote.to_amount.ok_or(PairError::MissingToAmount)?;
        let price = price(to_amount, to.decimals, amount).map_err(PairError::Amount)?;
        Ok((from_amount, to_amount, price, quote))
    }
}

/// Human-scaled buy amount per unit of the notional sell amount.
pub fn price(to_amount: U256, to_decimals: u8, amount: f64) -> anyhow::Result<f64> {
    anyhow::ensure!(amount > 0., "notional amount must be positive");
    Ok(to_human_units(to_amount, to_decimals)? / amount)
}

/// `(target - base) / base` in percent, zero when there is no base price.
pub fn relative_price_change(target: f64, base: f64) -> f64 {
    if base > 0. {
        (target - base) / base * 100.
    } else {
        0.
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to fetch any trading pair data, check the network or try again later")]
    NoData,
}

#[derive(Debug, thiserror::Error)]
enum PairError {
    #[error(transparent)]
    Client(#[from] client::Error),
    #[error("quote has no buy amount")]
    MissingToAmount,
    #[error(transparent)]
    Amount(anyhow::Error),
}
