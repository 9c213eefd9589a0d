//! The 1inch swap quote API.

use {
    super::Error,
    std::collections::HashMap,
    url::Url,
};

pub const REQUIRED_PARAMETERS: [&str; 3] = ["src", "dst", "amount"];

/// Chain the quote is requested for when the client doesn't say.
const DEFAULT_CHAIN_ID: &str = "1";

/// How long clients may cache a successful quote.
pub const CACHE_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
}

impl Config {
    pub fn api_key(&self) -> Result<&str, Error> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingApiKey)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "SECRET"))
            .finish()
    }
}

/// Builds the quote request from the values of [`REQUIRED_PARAMETERS`].
pub(super) fn request(
    client: &reqwest::Client,
    endpoint: &Url,
    config: &Config,
    [src, dst, amount]: [&str; 3],
    params: &HashMap<String, String>,
) -> Result<reqwest::RequestBuilder, Error> {
    let api_key = config.api_key()?;

    let chain_id = params
        .get("chainId")
        .map(String::as_str)
        .filter(|chain_id| !chain_id.is_empty())
        .unwrap_or(DEFAULT_CHAIN_ID);
    if chain_id.parse::<u64>().is_err() {
        return Err(Error::InvalidParameter {
            name: "chainId",
            value: chain_id.to_owned(),
        });
    }

    let mut url = endpoint.join(&format!("swap/v5.2/{chain_id}/quote"))?;
    url.query_pairs_mut()
        .append_pair("src", src)
        .append_pair("dst", dst)
        .append_pair("amount", amount);
    if params.get("slippage").is_some_and(|slippage| !slippage.is_empty()) {
        url.query_pairs_mut().append_pair("includeGas", "true");
    }

    Ok(client.get(url).bearer_auth(api_key))
}

#[cfg(test)]
mod tests {
    use {super::*, maplit::hashmap};

    fn config() -> Config {
        Config {
            api_key: Some("key".to_owned()),
        }
    }

    fn build(params: HashMap<String, String>) -> Result<reqwest::Request, Error> {
        let client = reqwest::Client::new();
        let endpoint = "https://api.1inch.dev/".parse().unwrap();
        request(
            &client,
            &endpoint,
            &config(),
            ["0xa", "0xb", "1000"],
            &params,
        )
        .map(|request| request.build().unwrap())
    }

    #[test]
    fn builds_quote_url_with_default_chain() {
        let request = build(HashMap::new()).unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.1inch.dev/swap/v5.2/1/quote?src=0xa&dst=0xb&amount=1000",
        );
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer key",
        );
    }

    #[test]
    fn slippage_requests_gas_estimate() {
        let request = build(hashmap! {
            "chainId".to_owned() => "59144".to_owned(),
            "slippage".to_owned() => "1".to_owned(),
        })
        .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.1inch.dev/swap/v5.2/59144/quote?src=0xa&dst=0xb&amount=1000&includeGas=true",
        );
    }

    #[test]
    fn rejects_non_numeric_chain_id() {
        let err = build(hashmap! { "chainId".to_owned() => "../../admin".to_owned() }).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "chainId", .. }));
    }

    #[test]
    fn requires_api_key() {
        assert!(matches!(
            Config::default().api_key(),
            Err(Error::MissingApiKey)
        ));
        let empty = Config {
            api_key: Some(String::new()),
        };
        assert!(matches!(empty.api_key(), Err(Error::MissingApiKey)));
        assert!(format!("{:?}", config()).contains("SECRET"));
    }
}
