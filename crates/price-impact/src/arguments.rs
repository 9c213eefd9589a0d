use {
    crate::{
        calculator::Strategy,
        client::Api,
        render::Format,
        tokens::{AMOUNTS, DEFAULT_AMOUNT},
    },
    model::Chain,
    observe::arguments::display_option,
    std::{
        fmt::{self, Display, Formatter},
        num::NonZeroUsize,
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

observe::logging_args_with_default_filter!(LoggingArguments, "warn,price_impact=info");

/// Rank trading pairs by the price impact of a notional trade, using quotes
/// from the aggregator proxy.
#[derive(clap::Parser)]
#[command(version)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// URL of the quote proxy.
    #[clap(long, env, default_value = "http://127.0.0.1:8080/")]
    pub proxy_url: Url,

    /// The flavour of the proxy, which decides the query parameter names.
    #[clap(long, env, value_enum, default_value = "kyberswap")]
    pub api: Api,

    /// The chain whose built-in token table is used.
    #[clap(long, env, value_enum, default_value = "linea")]
    pub chain: Chain,

    /// Chain ID sent to 1inch proxies. Defaults to the ID of `--chain`.
    #[clap(long, env)]
    pub chain_id: Option<u64>,

    /// Notional amount to sell, in units of the sell token.
    #[clap(long, env, default_value_t = DEFAULT_AMOUNT)]
    pub amount: f64,

    /// Accept amounts other than 300, 1000 and 5000.
    #[clap(long, env)]
    pub allow_any_amount: bool,

    /// How to determine the price impact when the proxy doesn't report one.
    #[clap(long, env, value_enum, default_value = "reported")]
    pub strategy: StrategyKind,

    /// Notional amount of the reference trade of the baseline strategy.
    #[clap(long, env, default_value_t = 100.)]
    pub baseline_amount: f64,

    /// Number of quotes requested at the same time.
    #[clap(long, env, default_value = "1")]
    pub concurrency: NonZeroUsize,

    /// TOML file with a token list replacing the built-in table.
    #[clap(long, env)]
    pub tokens_config: Option<PathBuf>,

    #[clap(long, env, value_enum, default_value = "table")]
    pub format: Format,

    /// Timeout for requests to the proxy.
    #[clap(
        long,
        env,
        default_value = "30s",
        value_parser = humantime::parse_duration,
    )]
    pub http_timeout: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StrategyKind {
    Reported,
    Baseline,
}

impl Arguments {
    /// Checks constraints between arguments that clap can't express.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.amount.is_finite() && self.amount >= 1.,
            "amount must be at least 1"
        );
        anyhow::ensure!(
            self.allow_any_amount || AMOUNTS.contains(&self.amount),
            "amount must be one of {AMOUNTS:?}, pass --allow-any-amount to use {}",
            self.amount
        );
        anyhow::ensure!(
            self.baseline_amount.is_finite() && self.baseline_amount >= 1.,
            "baseline amount must be at least 1"
        );
        Ok(())
    }

    pub fn strategy(&self) -> Strategy {
        match self.strategy {
            StrategyKind::Reported => Strategy::Reported,
            StrategyKind::Baseline => Strategy::Baseline {
                amount: self.baseline_amount,
            },
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id.unwrap_or_else(|| self.chain.id())
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            logging,
            proxy_url,
            api,
            chain,
            chain_id,
            amount,
            allow_any_amount,
            strategy,
            baseline_amount,
            concurrency,
            tokens_config,
            format,
            http_timeout,
        } = self;

        write!(f, "{}", logging)?;
        writeln!(f, "proxy_url: {}", proxy_url)?;
        writeln!(f, "api: {}", api)?;
        writeln!(f, "chain: {}", chain)?;
        display_option(f, "chain_id", chain_id)?;
        writeln!(f, "amount: {}", amount)?;
        writeln!(f, "allow_any_amount: {}", allow_any_amount)?;
        writeln!(f, "strategy: {}", strategy)?;
        writeln!(f, "baseline_amount: {}", baseline_amount)?;
        writeln!(f, "concurrency: {}", concurrency)?;
        display_option(
            f,
            "tokens_config",
            &tokens_config.as_ref().map(|path| path.display()),
        )?;
        writeln!(f, "format: {}", format)?;
        writeln!(f, "http_timeout: {:?}", http_timeout)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    #[test]
    fn defaults() {
        let args = Arguments::parse_from(["price-impact"]);
        assert_eq!(args.proxy_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(args.api, Api::KyberSwap);
        assert_eq!(args.amount, 1000.);
        assert_eq!(args.strategy(), Strategy::Reported);
        assert_eq!(args.concurrency.get(), 1);
        assert_eq!(args.chain_id(), 59144);
        assert_eq!(args.format, Format::Table);
        args.validate().unwrap();
    }

    #[test]
    fn restricts_amounts() {
        let args = Arguments::parse_from(["price-impact", "--amount", "250"]);
        assert!(args.validate().is_err());

        let args = Arguments::parse_from(["price-impact", "--amount", "250", "--allow-any-amount"]);
        args.validate().unwrap();

        let args = Arguments::parse_from(["price-impact", "--amount", "0", "--allow-any-amount"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn baseline_strategy_uses_baseline_amount() {
        let args = Arguments::parse_from([
            "price-impact",
            "--strategy",
            "baseline",
            "--baseline-amount",
            "50",
            "--api",
            "oneinch",
            "--chain",
            "ethereum",
        ]);
        assert_eq!(args.strategy(), Strategy::Baseline { amount: 50. });
        assert_eq!(args.chain_id(), 1);
        assert!(args.to_string().contains("api: oneinch"));
    }
}
