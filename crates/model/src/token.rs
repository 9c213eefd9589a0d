use {
    alloy_primitives::Address,
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
};

/// Address aggregators use to denote the chain's native token.
pub const NATIVE_TOKEN: Address = alloy_primitives::address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// An ERC20 (or the native) token on a specific chain.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Token {
    /// Ticker symbol, used as the key when referring to a token.
    pub symbol: String,
    /// Contract address on the chain the token list is for.
    pub address: Address,
    /// Number of decimals of the token's base unit.
    pub decimals: u8,
}

impl Token {
    pub fn new(symbol: &str, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_owned(),
            address,
            decimals,
        }
    }
}

/// A directed trading pair, referring to tokens by symbol.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TradingPair {
    pub from: String,
    pub to: String,
}

impl TradingPair {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_owned(),
            to: to.to_owned(),
        }
    }
}

impl Display for TradingPair {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Chains with a built-in token table.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Linea,
}

impl Chain {
    /// The EIP-155 chain ID.
    pub fn id(&self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Linea => 59144,
        }
    }

    /// The path segment KyberSwap uses to identify the chain.
    pub fn kyberswap_slug(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Linea => "linea",
        }
    }
}
