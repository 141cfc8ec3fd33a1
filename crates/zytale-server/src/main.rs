mod config;
mod connection;
mod join;
mod network;
mod send;
mod state;
mod tls;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use config::ServerConfig;
use state::ServerState;
use zytale_assets::{AssetRegistry, AssetStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Zytale server...");

    let config = ServerConfig::load(Path::new("config/server.toml"))?;
    info!(
        "Config loaded: bind={}:{}, max_players={}, view_radius={}",
        config.bind, config.port, config.max_players, config.view_radius
    );
    if config.no_compress {
        warn!("Outbound compression disabled (ZYTALE_NO_COMPRESS)");
    }

    let store = match AssetStore::open(&config.assets_path) {
        Ok(store) => {
            info!("Assets archive indexed: {} entries", store.len());
            verify_asset_index(&store, &config.assets_path);
            Some(store)
        }
        Err(e) => {
            warn!(
                "Assets archive {} unavailable ({e}); serving built-in content only",
                config.assets_path
            );
            None
        }
    };

    let mut registry = AssetRegistry::new();
    registry.set_minimal_blocks(config.minimal_blocks);
    if let Some(store) = &store {
        registry.load_from_store(store);
    }

    let state = Arc::new(ServerState::new(config, registry, store));

    tokio::select! {
        result = network::run(state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}

/// If a `<archive>.index` sidecar exists, cross-check it against the
/// archive. Mismatches are logged, never fatal.
fn verify_asset_index(store: &AssetStore, assets_path: &str) {
    let index_path = format!("{assets_path}.index");
    let Ok(file) = std::fs::File::open(&index_path) else {
        return;
    };
    match zytale_assets::store::parse_asset_index(std::io::BufReader::new(file)) {
        Ok(lines) => {
            let mismatches = store.verify_index(&lines);
            if mismatches == 0 {
                info!("Asset index {index_path} verified: {} entries", lines.len());
            } else {
                warn!("Asset index {index_path}: {mismatches} mismatches");
            }
        }
        Err(e) => warn!("Asset index {index_path} unreadable: {e}"),
    }
}
