use {
    alloy_primitives::U256,
    serde::{
        Deserializer,
        Serializer,
        de::{self, Visitor},
    },
    serde_with::{DeserializeAs, SerializeAs},
    std::fmt,
};

/// Serializes a [`U256`] as a decimal string and deserializes it from either
/// a decimal string, a 0x prefixed hex string or a JSON integer.
///
/// Aggregator APIs are not consistent about how they encode amounts, so this
/// is lenient on the way in and strict on the way out.
pub struct DecimalU256;

impl SerializeAs<U256> for DecimalU256 {
    fn serialize_as<S: Serializer>(source: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&source.to_string())
    }
}

impl<'de> DeserializeAs<'de, U256> for DecimalU256 {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        struct U256Visitor;

        impl Visitor<'_> for U256Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "a u256 encoded as a decimal string, 0x prefixed hex string or integer"
                )
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                s.trim()
                    .parse::<U256>()
                    .map_err(|err| E::custom(format!("failed to decode {s:?} as u256: {err}")))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(U256::from(v))
            }
        }

        deserializer.deserialize_any(U256Visitor)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        serde::{Deserialize, Serialize},
        serde_json::json,
        serde_with::serde_as,
    };

    #[serde_as]
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Amount(#[serde_as(as = "DecimalU256")] U256);

    #[test]
    fn deserializes_every_encoding() {
        for value in [json!("1000"), json!(" 1000 "), json!("0x3e8"), json!(1000)] {
            let amount: Amount = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(amount, Amount(U256::from(1000)), "{value}");
        }
    }

    #[test]
    fn serializes_as_decimal_string() {
        assert_eq!(
            serde_json::to_value(Amount(U256::from(1_000_000_000u64))).unwrap(),
            json!("1000000000"),
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_value::<Amount>(json!("1e18")).is_err());
        assert!(serde_json::from_value::<Amount>(json!(-5)).is_err());
        assert!(serde_json::from_value::<Amount>(json!(null)).is_err());
    }
}
