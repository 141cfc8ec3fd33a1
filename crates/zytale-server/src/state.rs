//! Shared server state.
//!
//! The world and the asset registry are shared across connection tasks:
//! reads are concurrent, chunk materialization and registry mutation
//! take the write side. Per-connection state lives in the connection
//! task and needs no locking.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, RwLock};

use zytale_assets::{AssetRegistry, AssetStore};
use zytale_world::World;

use crate::config::ServerConfig;

pub struct ServerState {
    pub config: ServerConfig,
    pub world: RwLock<World>,
    pub registry: RwLock<AssetRegistry>,
    pub store: Option<AssetStore>,
    connections: Mutex<HashMap<u32, ConnectionEntry>>,
    next_client_id: AtomicU32,
}

#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub peer: SocketAddr,
    pub username: Option<String>,
}

impl ServerState {
    pub fn new(config: ServerConfig, registry: AssetRegistry, store: Option<AssetStore>) -> Self {
        Self {
            config,
            world: RwLock::new(World::new()),
            registry: RwLock::new(registry),
            store,
            connections: Mutex::new(HashMap::new()),
            next_client_id: AtomicU32::new(1),
        }
    }

    pub fn next_client_id(&self) -> u32 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register_connection(&self, client_id: u32, peer: SocketAddr) {
        let mut connections = self.connections.lock().unwrap();
        connections.insert(
            client_id,
            ConnectionEntry {
                peer,
                username: None,
            },
        );
    }

    pub fn set_username(&self, client_id: u32, username: &str) {
        let mut connections = self.connections.lock().unwrap();
        if let Some(entry) = connections.get_mut(&client_id) {
            entry.username = Some(username.to_owned());
        }
    }

    /// Removed on shutdown-complete only, after the stream is released.
    pub fn remove_connection(&self, client_id: u32) {
        let mut connections = self.connections.lock().unwrap();
        connections.remove(&client_id);
    }

    pub fn player_count(&self) -> usize {
        let connections = self.connections.lock().unwrap();
        connections
            .values()
            .filter(|entry| entry.username.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ServerState {
        ServerState::new(ServerConfig::default(), AssetRegistry::new(), None)
    }

    #[test]
    fn client_ids_are_monotonic() {
        let state = state();
        let a = state.next_client_id();
        let b = state.next_client_id();
        assert!(b > a);
        assert_eq!(a, 1);
    }

    #[test]
    fn player_count_tracks_named_connections() {
        let state = state();
        let peer: SocketAddr = "127.0.0.1:5520".parse().unwrap();
        state.register_connection(1, peer);
        state.register_connection(2, peer);
        assert_eq!(state.player_count(), 0);
        state.set_username(1, "Test");
        assert_eq!(state.player_count(), 1);
        state.remove_connection(1);
        assert_eq!(state.player_count(), 0);
        state.remove_connection(2);
    }
}
