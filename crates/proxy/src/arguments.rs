use {
    crate::upstream::Aggregator,
    model::Chain,
    observe::arguments::display_secret_option,
    std::{
        fmt::{self, Display, Formatter},
        net::SocketAddr,
        time::Duration,
    },
    url::Url,
};

observe::logging_args_with_default_filter!(LoggingArguments, "info,proxy=debug");

/// Serve a CORS-friendly proxy in front of DEX aggregator quote APIs.
#[derive(clap::Parser)]
#[command(version)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,

    /// The aggregator that requests to `/` are forwarded to.
    #[clap(long, env, value_enum, default_value = "kyberswap")]
    pub upstream: Aggregator,

    /// Base URL of the 1inch API.
    #[clap(long, env, default_value = "https://api.1inch.dev/")]
    pub oneinch_url: Url,

    /// API key for the 1inch API. Requests to 1inch fail with an error
    /// response when it is not configured.
    #[clap(long, env = "ONEINCH_API_KEY")]
    pub oneinch_api_key: Option<String>,

    /// Base URL of the KyberSwap aggregator API.
    #[clap(long, env, default_value = "https://aggregator-api.kyberswap.com/")]
    pub kyberswap_url: Url,

    /// The chain KyberSwap routes are requested for.
    #[clap(long, env, value_enum, default_value = "linea")]
    pub kyberswap_chain: Chain,

    /// Timeout for requests to the upstream aggregators.
    #[clap(
        long,
        env,
        default_value = "10s",
        value_parser = humantime::parse_duration,
    )]
    pub http_timeout: Duration,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            logging,
            bind_address,
            upstream,
            oneinch_url,
            oneinch_api_key,
            kyberswap_url,
            kyberswap_chain,
            http_timeout,
        } = self;

        write!(f, "{}", logging)?;
        writeln!(f, "bind_address: {}", bind_address)?;
        writeln!(f, "upstream: {}", upstream)?;
        writeln!(f, "oneinch_url: {}", oneinch_url)?;
        display_secret_option(f, "oneinch_api_key", oneinch_api_key)?;
        writeln!(f, "kyberswap_url: {}", kyberswap_url)?;
        writeln!(f, "kyberswap_chain: {}", kyberswap_chain)?;
        writeln!(f, "http_timeout: {:?}", http_timeout)?;
        Ok(())
    }
}
