//! FBCash client application library

pub mod facade;
pub mod session;
pub mod status;

use std::env;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use evm_node_client::{connect_http, connect_http_with_wallet, NodeClient, Signer};
use fbcash_core::ClientConfig;

pub use facade::DomainFacade;
pub use session::{Session, SessionState, Snapshot};

const DEFAULT_CONFIG_PATH: &str = "fbcash.json";
const WATCH_FLAG: &str = "--watch";

/// Command line: an optional config path and `--watch`
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<String>,
    watch: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Self::default();
        for arg in args {
            if arg == WATCH_FLAG {
                parsed.watch = true;
            } else if parsed.config.is_none() && !arg.starts_with("--") {
                parsed.config = Some(arg);
            } else {
                tracing::warn!("Ignoring argument {}", arg);
            }
        }
        parsed
    }
}

/// Load the configuration, connect, and print a status report, once or
/// every refresh interval with `--watch`
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fbcash=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let args = Args::parse(env::args().skip(1));
    let path = args
        .config
        .or_else(|| env::var("FBCASH_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config =
        ClientConfig::load(&path).with_context(|| format!("Failed to load config {}", path))?;
    tracing::info!("Starting FBCash client against {}", config.node.url);

    match env::var("FBCASH_PRIVATE_KEY") {
        Ok(key) => {
            let signer: PrivateKeySigner = key.trim().parse().context("Invalid FBCASH_PRIVATE_KEY")?;
            let account = signer.address();
            let client = connect_http_with_wallet(config.node.clone(), EthereumWallet::from(signer))?;
            report(config, client, Some(account), args.watch).await
        }
        Err(_) => {
            let client = connect_http(config.node.clone())?;
            report(config, client, None, args.watch).await
        }
    }
}

async fn report<P>(
    config: ClientConfig,
    client: NodeClient<P>,
    account: Option<Address>,
    watch: bool,
) -> anyhow::Result<()>
where
    P: Provider + 'static,
{
    client.verify_chain().await?;
    let transport = Arc::new(client);
    let facade = DomainFacade::new(config, transport.clone())?;

    if let Some(account) = account {
        let resolution = facade.unlock(Signer::new(account, transport)).await;
        tracing::info!("Boardroom for {}: {:?}", account, resolution);
    }

    if !watch {
        let report = status::collect(&facade).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(facade.config().refresh_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match status::collect(&facade).await {
            Ok(report) => println!("{}", serde_json::to_string(&report)?),
            Err(e) => tracing::warn!("Status refresh failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_args() {
        assert_eq!(args(&[]), Args::default());
        assert_eq!(
            args(&["prod.json", "--watch"]),
            Args {
                config: Some("prod.json".to_string()),
                watch: true,
            }
        );
        assert_eq!(
            args(&["--watch", "prod.json"]),
            Args {
                config: Some("prod.json".to_string()),
                watch: true,
            }
        );
        assert!(!args(&["prod.json", "--verbose"]).watch);
    }
}
