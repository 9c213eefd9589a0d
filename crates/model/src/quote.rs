//! The quote reply the proxy hands to its clients.
//!
//! For the KyberSwap upstream the proxy builds this reply itself. For the
//! 1inch upstream it passes the upstream body through untouched, so every
//! field is optional and numeric fields accept both JSON numbers and numeric
//! strings. Only `toAmount` is decoded strictly; the informational fields
//! fall back to `None` when an upstream sends something unexpected.

use {
    alloy_primitives::U256,
    number::serialization::DecimalU256,
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as},
    std::fmt::{self, Display, Formatter},
};

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Amount of the buy token, in base units.
    #[serde_as(as = "Option<DecimalU256>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_amount: Option<U256>,

    /// Amount of the sell token, in base units.
    #[serde_as(as = "Option<DecimalU256>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_amount: Option<U256>,

    /// Price impact in percent, positive when the trade loses value.
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_impact: Option<f64>,

    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price_impact: Option<f64>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<Numeric>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_gas: Option<Numeric>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<Numeric>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_usd: Option<Numeric>,

    /// Upstream figures the price impact was derived from, for debugging.
    #[serde(rename = "_raw", default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Raw>,
}

impl Quote {
    /// The price impact the proxy reported, preferring the estimated one.
    pub fn reported_price_impact(&self) -> Option<f64> {
        self.estimated_price_impact.or(self.price_impact)
    }

    /// The gas estimate to display, whichever field the upstream filled.
    pub fn estimated_gas(&self) -> Option<&Numeric> {
        self.gas.as_ref().or(self.estimated_gas.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_in_usd: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_out_usd: Option<Numeric>,
    pub route: String,
}

/// A number that upstreams encode either as a JSON number or as a string.
///
/// The textual representation is kept verbatim so that large integers (gas
/// prices in wei) and decimal USD figures survive the round trip unchanged.
/// It always serializes as a string.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Numeric(String);

impl Numeric {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the value as a float, following the usual lenient rules of
    /// aggregator UIs: surrounding whitespace is ignored and anything that is
    /// not a finite number yields `None`.
    pub fn to_f64(&self) -> Option<f64> {
        self.0
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

impl Display for Numeric {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Numeric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            String(String),
            Number(serde_json::Number),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::String(value) => Self(value),
            Repr::Number(value) => Self(value.to_string()),
        })
    }
}

/// Computes the price impact in percent from the USD value of both sides of a
/// swap: `(in - out) / in * 100`.
///
/// A zero or negative input value yields zero instead of dividing by it.
pub fn usd_price_impact(amount_in_usd: f64, amount_out_usd: f64) -> f64 {
    if amount_in_usd > 0. {
        (amount_in_usd - amount_out_usd) / amount_in_usd * 100.
    } else {
        0.
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn usd_price_impact_matches_formula() {
        assert!((usd_price_impact(1000., 995.) - 0.5).abs() < 1e-9);
        assert!((usd_price_impact(2000., 2010.) + 0.5).abs() < 1e-9);
        assert_eq!(usd_price_impact(0., 995.), 0.);
        assert_eq!(usd_price_impact(-3., 1.), 0.);
    }

    #[test]
    fn deserializes_passed_through_oneinch_body() {
        let quote: Quote = serde_json::from_value(json!({
            "toAmount": "1000000000",
            "gas": 181416,
            "protocols": [],
        }))
        .unwrap();

        assert_eq!(quote.to_amount, Some(U256::from(1_000_000_000u64)));
        assert_eq!(quote.reported_price_impact(), None);
        assert_eq!(quote.estimated_gas().unwrap().as_str(), "181416");
    }

    #[test]
    fn tolerates_odd_informational_fields() {
        for body in [
            json!({ "toAmount": "1000000000", "priceImpact": "" }),
            json!({ "toAmount": "1000000000", "gas": { "limit": 1 } }),
            json!({ "toAmount": "1000000000", "estimatedGas": true, "gasUsd": [] }),
        ] {
            let quote: Quote = serde_json::from_value(body).unwrap();
            assert_eq!(quote.to_amount, Some(U256::from(1_000_000_000u64)));
            assert_eq!(quote.reported_price_impact(), None);
            assert_eq!(quote.estimated_gas(), None);
            assert_eq!(quote.gas_usd, None);
        }

        assert!(serde_json::from_value::<Quote>(json!({ "toAmount": {} })).is_err());
    }

    #[test]
    fn prefers_estimated_price_impact() {
        let quote: Quote = serde_json::from_value(json!({
            "toAmount": "1",
            "priceImpact": 1.25,
            "estimatedPriceImpact": "0.75",
        }))
        .unwrap();
        assert_eq!(quote.reported_price_impact(), Some(0.75));

        let quote: Quote = serde_json::from_value(json!({ "priceImpact": "2" })).unwrap();
        assert_eq!(quote.reported_price_impact(), Some(2.));
    }

    #[test]
    fn serializes_reshaped_reply() {
        let quote = Quote {
            to_amount: Some(U256::from(995_000_000u64)),
            from_amount: Some(U256::from(1_000_000_000u64)),
            price_impact: Some(0.5),
            estimated_price_impact: Some(0.5),
            gas: Some(Numeric::new("253000")),
            gas_price: Some(Numeric::new("1000000000")),
            gas_usd: Some(Numeric::new("0.12")),
            raw: Some(Raw {
                amount_in_usd: Some(Numeric::new("1000")),
                amount_out_usd: Some(Numeric::new("995")),
                route: "uniswapv3".to_owned(),
            }),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&quote).unwrap(),
            json!({
                "toAmount": "995000000",
                "fromAmount": "1000000000",
                "priceImpact": 0.5,
                "estimatedPriceImpact": 0.5,
                "gas": "253000",
                "gasPrice": "1000000000",
                "gasUsd": "0.12",
                "_raw": {
                    "amountInUsd": "1000",
                    "amountOutUsd": "995",
                    "route": "uniswapv3",
                },
            }),
        );
    }

    #[test]
    fn numeric_parsing_is_lenient() {
        assert_eq!(Numeric::new(" 12.5 ").to_f64(), Some(12.5));
        assert_eq!(Numeric::new("").to_f64(), None);
        assert_eq!(Numeric::new("NaN").to_f64(), None);
        assert_eq!(Numeric::new("abc").to_f64(), None);
    }
}
