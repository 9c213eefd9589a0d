//! Token lists loaded from TOML files.

use {
    crate::tokens::{TokenList, default_pairs},
    anyhow::{Context, Result},
    model::{Token, TradingPair},
    serde::Deserialize,
    std::path::Path,
    tokio::fs,
};

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// Replaces the built-in token table.
    tokens: Vec<Token>,

    /// Pairs to quote. The default pairs are used when omitted.
    #[serde(default)]
    pairs: Option<Vec<TradingPair>>,
}

/// Load a token list from a TOML file.
pub async fn load(path: &Path) -> Result<TokenList> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    load_string(&data).with_context(|| format!("invalid token list {path:?}"))
}

/// Load a token list from a TOML string.
pub fn load_string(data: &str) -> Result<TokenList> {
    let config = toml::de::from_str::<Config>(data).context("TOML syntax error")?;
    let list = TokenList {
        tokens: config.tokens,
        pairs: config.pairs.unwrap_or_else(default_pairs),
    };
    // Surface unknown symbols at load time rather than when quoting.
    list.resolve_pairs()?;
    Ok(list)
}
