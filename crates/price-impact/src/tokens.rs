//! Token tables and the trading pairs the calculator quotes.

use {
    alloy_primitives::address,
    anyhow::{Context, Result},
    model::{Chain, Token, TradingPair, token::NATIVE_TOKEN},
};

/// Notional amounts offered by default, in units of the sell token.
pub const AMOUNTS: [f64; 3] = [300., 1000., 5000.];

pub const DEFAULT_AMOUNT: f64 = 1000.;

/// Tokens that can be referred to by symbol, together with the pairs to
/// quote.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenList {
    pub tokens: Vec<Token>,
    pub pairs: Vec<TradingPair>,
}

impl TokenList {
    /// The built-in token table of a chain with the default pairs.
    pub fn for_chain(chain: Chain) -> Self {
        let tokens = match chain {
            Chain::Ethereum => vec![
                Token::new("ETH", NATIVE_TOKEN, 18),
                Token::new("USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6),
                Token::new("USDT", address!("dAC17F958D2ee523a2206206994597C13D831ec7"), 6),
                Token::new("DAI", address!("6B175474E89094C44Da98b954EedeAC495271d0F"), 18),
                Token::new("WBTC", address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"), 8),
            ],
            Chain::Linea => vec![
                Token::new("ETH", NATIVE_TOKEN, 18),
                Token::new("USDC", address!("176211869cA2b568f2A7D4EE941E073a821EE1ff"), 6),
                Token::new("USDT", address!("A219439258ca9da29E9Cc4cE5596924745e12B93"), 6),
                Token::new("DAI", address!("4AF15ec2A0BD43Db75dd04E62FAA3B8EF36b00d5"), 18),
                Token::new("WBTC", address!("3aAB2285ddcDdaD8edf438C1bAB47e1a9D05a9b4"), 8),
            ],
        };

        Self {
            tokens,
            pairs: default_pairs(),
        }
    }

    pub fn token(&self, symbol: &str) -> Option<&Token> {
        self.tokens.iter().find(|token| token.symbol == symbol)
    }

    /// Looks up the tokens of every pair.
    pub fn resolve_pairs(&self) -> Result<Vec<(Token, Token)>> {
        self.pairs
            .iter()
            .map(|pair| {
                let lookup = |symbol: &str| {
                    self.token(symbol)
                        .cloned()
                        .with_context(|| format!("pair {pair} refers to unknown token {symbol}"))
                };
                Ok((lookup(&pair.from)?, lookup(&pair.to)?))
            })
            .collect()
    }
}

pub fn default_pairs() -> Vec<TradingPair> {
    [
        ("ETH", "USDC"),
        ("ETH", "USDT"),
        ("WBTC", "ETH"),
        ("WBTC", "USDC"),
        ("WBTC", "USDT"),
        ("USDC", "USDT"),
        ("USDT", "USDC"),
        ("ETH", "DAI"),
        ("DAI", "USDC"),
        ("DAI", "USDT"),
    ]
    .into_iter()
    .map(|(from, to)| TradingPair::new(from, to))
    .collect()
}
