//! Send one request through the elementary bridge.
//!
//! Run with: cargo run -p bridge-cli -- --verb GET /items
//!
//! Without host flags the request goes to the remote server configured
//! through `ELEMENTARY_*` environment variables. `--store DIR` starts an
//! in-process desktop host instead, which saves files out of `DIR` and
//! forwards every other name to that same API server; `--legacy` prints what
//! a legacy host hook would receive.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use elementary_bridge::{Bridge, BridgeConfig};
use elementary_core::{Reply, Request, Verb, link};
use elementary_host::{ApiForwardHandler, HandlerRegistry, HostEndpoint, SaveHandler};
use elementary_transport::Capabilities;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "elementary-bridge", version)]
struct Args {
    /// HTTP verb
    #[arg(long, short = 'X', default_value = "GET")]
    verb: Verb,

    /// JSON payload
    #[arg(long, short)]
    payload: Option<String>,

    /// Serve requests from an in-process desktop host rooted at this store
    #[arg(long, conflicts_with = "legacy")]
    store: Option<PathBuf>,

    /// Send through a legacy host hook that prints to stdout
    #[arg(long)]
    legacy: bool,

    /// Operation name, or `/path` for the remote server
    operation: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = BridgeConfig::from_env().context("reading configuration")?;

    let mut capabilities = Capabilities::new();
    if let Some(root) = &args.store {
        let (ui, host) = link(16);
        let registry = HandlerRegistry::new()
            .with("save", SaveHandler::new(root))
            .with_fallback(ApiForwardHandler::for_target(config.remote_target()?)?);
        let (_host_loop, _emitter) = HostEndpoint::new(registry).spawn(host);
        capabilities = capabilities.with_desktop(ui.messenger);
    }
    if args.legacy {
        capabilities = capabilities.with_legacy(Arc::new(|message: &str| {
            println!("legacy hook <- {message}");
        }));
    }

    let bridge = Bridge::from_config(&config, capabilities)?;
    tracing::info!(transport = %bridge.kind(), "bridge ready");

    let mut request = Request::new(args.verb, &args.operation);
    if let Some(payload) = &args.payload {
        let payload: Value = serde_json::from_str(payload).context("parsing --payload")?;
        request = request.with_payload(payload);
    }

    match bridge.invoke(request).await? {
        Reply::Payload(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Reply::Empty => println!("(no payload)"),
        Reply::Detached => println!("(sent, no reply expected)"),
    }

    Ok(())
}
