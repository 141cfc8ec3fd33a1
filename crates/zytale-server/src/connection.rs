//! The per-connection state machine.
//!
//! A connection advances through the phased handshake as packets arrive
//! on its primary bidirectional stream. Handlers never touch the
//! transport: responses go into an outbox the stream driver drains after
//! every frame, so the machine is exercised end to end without sockets.
//! Packets received in the wrong phase are logged and dropped; protocol
//! violations queue a Disconnect and tear the stream down.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use zytale_protocol::codec::CodecError;
use zytale_protocol::ids;
use zytale_protocol::packets::{
    AssetInitialize, AssetPart, AuthGrant, ClientMovement, Connect, ConnectAccept, Disconnect,
    DisconnectType, Ping, PlayerOptions, RequestAssets, ServerAuthToken, ServerInfo, Status,
    WorldLoadProgress, WorldSettings,
};
use zytale_protocol::{PROTOCOL_BUILD, PROTOCOL_CRC};

use crate::state::ServerState;

/// Handshake phases, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    AwaitingAuth,
    Password,
    Setup,
    Loading,
    WaitingForReady,
    Playing,
    Disconnecting,
}

/// One queued outbound packet: id plus uncompressed payload. The send
/// pipeline compresses and frames it.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub id: u32,
    pub payload: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl From<CodecError> for ConnectionError {
    fn from(e: CodecError) -> Self {
        ConnectionError::Protocol(e.to_string())
    }
}

pub struct Connection {
    state: Arc<ServerState>,
    pub client_id: u32,
    peer: SocketAddr,
    phase: Phase,
    pub player_uuid: Option<Uuid>,
    pub username: Option<String>,
    outbox: Vec<Outbound>,
}

impl Connection {
    pub fn new(state: Arc<ServerState>, client_id: u32, peer: SocketAddr) -> Self {
        Self {
            state,
            client_id,
            peer,
            phase: Phase::Initial,
            player_uuid: None,
            username: None,
            outbox: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Drain queued outbound packets for the stream driver.
    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn push<F: FnOnce(&mut BytesMut)>(&mut self, id: u32, encode: F) {
        let mut buf = BytesMut::new();
        encode(&mut buf);
        self.outbox.push(Outbound {
            id,
            payload: buf.to_vec(),
        });
    }

    fn push_empty(&mut self, id: u32) {
        self.outbox.push(Outbound {
            id,
            payload: Vec::new(),
        });
    }

    /// Handle one received frame. On a protocol violation a Disconnect
    /// is queued for the driver to flush before closing the stream.
    pub fn handle_frame(&mut self, id: u32, payload: &[u8]) -> Result<(), ConnectionError> {
        let result = self.dispatch(id, payload);
        if let Err(ConnectionError::Protocol(reason)) = &result {
            // fail() queues its own Disconnect; bare decode errors have
            // not told the client anything yet.
            if self.phase != Phase::Disconnecting {
                self.push(ids::DISCONNECT, |buf| {
                    Disconnect {
                        kind: DisconnectType::Disconnect,
                        reason: Some(reason.clone()),
                    }
                    .encode(buf)
                });
                self.phase = Phase::Disconnecting;
            }
        }
        result
    }

    /// Route one frame through the phase gate.
    fn dispatch(&mut self, id: u32, payload: &[u8]) -> Result<(), ConnectionError> {
        // A Disconnect is honored in any phase.
        if id == ids::DISCONNECT {
            return self.on_peer_disconnect(payload);
        }

        // The descriptor table bounds every known packet.
        if let Some(desc) = zytale_protocol::descriptor(id) {
            if payload.len() < desc.min_size || payload.len() > desc.max_size {
                return Err(ConnectionError::Protocol(format!(
                    "{} payload is {} bytes, expected {}..={}",
                    desc.name,
                    payload.len(),
                    desc.min_size,
                    desc.max_size
                )));
            }
        }

        match (self.phase, id) {
            (Phase::Initial, ids::CONNECT) => self.on_connect(payload),
            (Phase::Initial | Phase::Setup, ids::STATUS) => {
                self.send_status();
                Ok(())
            }
            (Phase::AwaitingAuth, ids::AUTH_TOKEN) => self.on_auth_token(payload),
            (Phase::Setup, ids::REQUEST_ASSETS) => self.on_request_assets(payload),
            (Phase::Loading, ids::PLAYER_OPTIONS) => self.on_player_options(payload),
            (Phase::WaitingForReady, ids::CLIENT_READY) => {
                info!(client_id = self.client_id, "client ready, entering play");
                self.phase = Phase::Playing;
                Ok(())
            }
            (Phase::Setup | Phase::Loading | Phase::WaitingForReady | Phase::Playing, ids::PING) => {
                let ping = Ping::decode(payload)?;
                self.push(ids::PONG, |buf| ping.encode(buf));
                Ok(())
            }
            (Phase::Playing, ids::CLIENT_MOVEMENT) => {
                // Input is forwarded without gameplay semantics.
                let movement = ClientMovement::decode(payload)?;
                debug!(
                    client_id = self.client_id,
                    x = movement.position.x,
                    y = movement.position.y,
                    z = movement.position.z,
                    "movement"
                );
                Ok(())
            }
            (Phase::Playing, _) => {
                debug!(client_id = self.client_id, id, "unhandled play packet");
                Ok(())
            }
            _ => {
                warn!(
                    client_id = self.client_id,
                    id,
                    phase = ?self.phase,
                    "packet dropped: wrong phase"
                );
                Ok(())
            }
        }
    }

    fn on_peer_disconnect(&mut self, payload: &[u8]) -> Result<(), ConnectionError> {
        let reason = Disconnect::decode(payload)
            .ok()
            .and_then(|d| d.reason)
            .unwrap_or_default();
        info!(client_id = self.client_id, phase = ?self.phase, reason = %reason, "client disconnected");
        self.phase = Phase::Disconnecting;
        Ok(())
    }

    fn on_connect(&mut self, payload: &[u8]) -> Result<(), ConnectionError> {
        let connect = Connect::decode(payload)?;
        if connect.protocol_crc != PROTOCOL_CRC || connect.protocol_build != PROTOCOL_BUILD {
            let reason = if connect.protocol_build < PROTOCOL_BUILD {
                format!(
                    "Your client is outdated (build {}, server speaks build {})",
                    connect.protocol_build, PROTOCOL_BUILD
                )
            } else {
                format!(
                    "This server is outdated (build {}, client speaks build {})",
                    PROTOCOL_BUILD, connect.protocol_build
                )
            };
            return self.fail(DisconnectType::Disconnect, reason);
        }

        info!(
            client_id = self.client_id,
            username = %connect.username,
            uuid = %connect.uuid,
            peer = %self.peer,
            "client connecting"
        );
        self.player_uuid = Some(connect.uuid);
        self.username = Some(connect.username.clone());
        self.state.set_username(self.client_id, &connect.username);

        if connect.identity_token.is_some() && self.state.config.auth_enabled {
            // Hand the client an authorization grant to exchange with
            // the Session Service; its AuthToken reply completes setup.
            let grant = Uuid::new_v4().simple().to_string();
            let identity = self.state.config.server_name.clone();
            self.push(ids::AUTH_GRANT, |buf| {
                AuthGrant {
                    first: Some(grant),
                    second: Some(identity),
                }
                .encode(buf)
            });
            self.phase = Phase::AwaitingAuth;
        } else {
            self.push(ids::CONNECT_ACCEPT, |buf| {
                ConnectAccept::default().encode(buf)
            });
            self.enter_setup();
        }
        Ok(())
    }

    fn on_auth_token(&mut self, payload: &[u8]) -> Result<(), ConnectionError> {
        let token = zytale_protocol::packets::AuthToken::decode(payload)?;
        if token.second.is_none() {
            return self.fail(
                DisconnectType::Disconnect,
                "Authentication failed: missing server authorization grant".to_owned(),
            );
        }
        let access_token = Uuid::new_v4().simple().to_string();
        self.push(ids::SERVER_AUTH_TOKEN, |buf| {
            ServerAuthToken {
                first: Some(access_token),
                second: None,
            }
            .encode(buf)
        });
        self.enter_setup();
        Ok(())
    }

    fn enter_setup(&mut self) {
        self.phase = Phase::Setup;
        let world_height = zytale_world::CHUNK_HEIGHT as i32;
        self.push(ids::WORLD_SETTINGS, |buf| {
            WorldSettings {
                world_height,
                required_assets: None,
            }
            .encode(buf)
        });
        let max_players = self.state.config.max_players as i32;
        let server_name = self.state.config.server_name.clone();
        let motd = self.state.config.motd.clone();
        self.push(ids::SERVER_INFO, |buf| {
            ServerInfo {
                max_players,
                server_name: Some(server_name),
                motd: Some(motd),
            }
            .encode(buf)
        });
    }

    fn send_status(&mut self) {
        let player_count = self.state.player_count() as i32;
        let max_players = self.state.config.max_players as i32;
        let server_name = self.state.config.server_name.clone();
        let motd = self.state.config.motd.clone();
        self.push(ids::STATUS, |buf| {
            Status {
                player_count,
                max_players,
                server_name: Some(server_name),
                motd: Some(motd),
            }
            .encode(buf)
        });
    }

    fn on_request_assets(&mut self, payload: &[u8]) -> Result<(), ConnectionError> {
        let request = RequestAssets::decode(payload)?;
        if let Some(assets) = &request.assets {
            self.stream_assets(assets);
        }

        let payloads = {
            let registry = self.state.registry.read().unwrap();
            registry.generate_update_payloads()
        };
        debug!(
            client_id = self.client_id,
            families = payloads.len(),
            "emitting asset updates"
        );
        for update in payloads {
            self.outbox.push(Outbound {
                id: update.id as u32,
                payload: update.payload,
            });
        }

        self.push(ids::WORLD_LOAD_PROGRESS, |buf| {
            WorldLoadProgress {
                percent_complete: 100,
                percent_complete_subitem: 100,
                status: None,
            }
            .encode(buf)
        });
        self.push_empty(ids::WORLD_LOAD_FINISHED);
        self.phase = Phase::Loading;
        Ok(())
    }

    /// Stream each requested asset from the archive as Initialize /
    /// Part* / Finalize. Unresolvable assets are skipped.
    fn stream_assets(&mut self, assets: &[zytale_protocol::packets::AssetRef]) {
        let state = self.state.clone();
        let Some(store) = &state.store else {
            if !assets.is_empty() {
                warn!(
                    client_id = self.client_id,
                    count = assets.len(),
                    "client requested assets but no archive is configured"
                );
            }
            return;
        };
        for asset in assets {
            let entry = store
                .entry_by_hash(&asset.hash)
                .or_else(|| store.entry(&asset.name))
                .cloned();
            let Some(entry) = entry else {
                warn!(client_id = self.client_id, name = %asset.name, "requested asset not in archive");
                continue;
            };
            let mut reader = match store.open_entry(&entry) {
                Ok(reader) => reader,
                Err(e) => {
                    warn!(client_id = self.client_id, path = %entry.path, error = %e, "asset read failed");
                    continue;
                }
            };
            let size = entry.uncompressed_size as i32;
            let asset = asset.clone();
            self.push(ids::ASSET_INITIALIZE, |buf| {
                AssetInitialize { size, asset }.encode(buf)
            });
            loop {
                match reader.next_chunk() {
                    Ok(Some(chunk)) => self.push(ids::ASSET_PART, |buf| {
                        AssetPart { part: Some(chunk) }.encode(buf)
                    }),
                    Ok(None) => break,
                    Err(e) => {
                        warn!(client_id = self.client_id, path = %entry.path, error = %e, "asset stream failed");
                        break;
                    }
                }
            }
            self.push_empty(ids::ASSET_FINALIZE);
        }
    }

    fn on_player_options(&mut self, payload: &[u8]) -> Result<(), ConnectionError> {
        let options = PlayerOptions::decode(payload)?;
        debug!(
            client_id = self.client_id,
            has_skin = options.player_skin.is_some(),
            "player options received, starting join"
        );
        self.run_join_sequence();
        self.phase = Phase::WaitingForReady;
        Ok(())
    }

    /// Queue a Disconnect with a reason, then tear down.
    pub(crate) fn fail(
        &mut self,
        kind: DisconnectType,
        reason: String,
    ) -> Result<(), ConnectionError> {
        warn!(client_id = self.client_id, phase = ?self.phase, reason = %reason, "disconnecting client");
        self.push(ids::DISCONNECT, |buf| {
            Disconnect {
                kind,
                reason: Some(reason.clone()),
            }
            .encode(buf)
        });
        self.phase = Phase::Disconnecting;
        Err(ConnectionError::Protocol(reason))
    }
}
