#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};
use {
    crate::{
        api::{self, AppState},
        arguments::Arguments,
        upstream::{self, Forwarder, Upstream, kyberswap, oneinch},
    },
    anyhow::Context,
    clap::Parser,
    reqwest::header::HeaderMap,
    std::net::SocketAddr,
    tokio::sync::oneshot,
};

const USER_AGENT: &str = concat!("aggregator-proxy/", env!("CARGO_PKG_VERSION"));

pub async fn start(args: impl Iterator<Item = String>) {
    let args = Arguments::parse_from(args);
    observe::tracing::initialize(&args.logging.to_config());
    observe::metrics::setup_registry(None, None);
    tracing::info!("running proxy with validated arguments:\n{}", args);

    if let Err(err) = run(args, None).await {
        tracing::error!(?err, "proxy exited with an error");
        std::process::exit(1);
    }
}

/// Serves the proxy until a shutdown signal arrives. The bound address is
/// sent to `bind` if given, which allows binding to port 0 in tests.
pub async fn run(args: Arguments, bind: Option<oneshot::Sender<SocketAddr>>) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(args.http_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;

    if args.oneinch_api_key.is_none() {
        tracing::warn!("ONEINCH_API_KEY is not set, 1inch requests will fail");
    }

    let state = AppState {
        oneinch: Forwarder::new(
            client.clone(),
            upstream::Config {
                upstream: Upstream::OneInch(oneinch::Config {
                    api_key: args.oneinch_api_key,
                }),
                endpoint: args.oneinch_url,
                headers: HeaderMap::new(),
                cache_max_age: oneinch::CACHE_MAX_AGE,
            },
        ),
        kyberswap: Forwarder::new(
            client,
            upstream::Config {
                upstream: Upstream::KyberSwap(kyberswap::Config {
                    chain: args.kyberswap_chain,
                }),
                endpoint: args.kyberswap_url,
                headers: kyberswap::default_headers(),
                cache_max_age: kyberswap::CACHE_MAX_AGE,
            },
        ),
        default: args.upstream,
    };
    let app = api::handle_all_routes(state);

    let listener = tokio::net::TcpListener::bind(args.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", args.bind_address))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, upstream = %args.upstream, "serving proxy");
    if let Some(bind) = bind {
        let _ = bind.send(local_addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("proxy server failed")
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Kubernetes sends sigterm, whereas locally sigint (ctrl-c) is most common.
    let (Ok(mut interrupt), Ok(mut terminate)) = (
        unix::signal(SignalKind::interrupt()),
        unix::signal(SignalKind::terminate()),
    ) else {
        tracing::warn!("unable to install signal handlers, graceful shutdown is disabled");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
    tracing::info!("shutting down proxy");
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}
