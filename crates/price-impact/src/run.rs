use {
    crate::{
        arguments::Arguments,
        calculator::Calculator,
        client::ProxyClient,
        config,
        render::{self, Format},
        tokens::TokenList,
    },
    anyhow::{Context, Result},
    clap::Parser,
    std::io::IsTerminal,
    tracing::level_filters::LevelFilter,
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = Arguments::parse_from(args);
    // Logs go to stderr so they never mix with the results on stdout.
    observe::tracing::initialize(
        &args
            .logging
            .to_config()
            .with_stderr_threshold(LevelFilter::TRACE),
    );
    tracing::debug!("running price impact calculator with arguments:\n{}", args);

    match run(args).await {
        Ok(output) => print!("{output}"),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Fetches quotes for all configured pairs and returns the rendered output.
pub async fn run(args: Arguments) -> Result<String> {
    args.validate()?;

    let tokens = match &args.tokens_config {
        Some(path) => config::load(path).await?,
        None => TokenList::for_chain(args.chain),
    };
    run_with_tokens(&args, tokens).await
}

async fn run_with_tokens(args: &Arguments, tokens: TokenList) -> Result<String> {
    let pairs = tokens.resolve_pairs()?;

    let client = reqwest::Client::builder()
        .timeout(args.http_timeout)
        .build()
        .context("failed to build HTTP client")?;
    let calculator = Calculator::new(
        ProxyClient::new(client, args.proxy_url.clone(), args.api, args.chain_id()),
        args.strategy(),
        args.concurrency,
    );

    tracing::info!(pairs = pairs.len(), amount = args.amount, "fetching quotes");
    let results = calculator.calculate(&pairs, args.amount).await?;

    Ok(match args.format {
        Format::Table => render::table(&results, args.amount, std::io::stdout().is_terminal()),
        Format::Json => render::json(&results)? + "\n",
    })
}
