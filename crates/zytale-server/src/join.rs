//! The join sequence: everything a client receives between PlayerOptions
//! and its own spawn.
//!
//! Order is load-bearing. The preamble (ConnectAccept, SetClientId,
//! ViewRadius, JoinWorld, SetGameMode, SetEntitySeed) is followed by the
//! terrain block — per chunk: heightmap, tintmap, environments, then all
//! ten sections — and finally the player's entity add. Every packet goes
//! out on the primary stream so the client sees them in this order.

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use zytale_protocol::ids;
use zytale_protocol::packets::{
    ChunkColumnData, ConnectAccept, EntityUpdate, EntityUpdateKind, EntityUpdates, JoinWorld,
    SetChunk, SetClientId, SetEntitySeed, SetGameMode, ViewRadius,
};
use zytale_types::{GameMode, Quaternion, Velocity};
use zytale_world::{CHUNK_DIM, SECTIONS_PER_CHUNK};

use crate::connection::Connection;

impl Connection {
    /// Stream the spawn area and spawn the player. The caller moves the
    /// connection to the waiting-for-ready phase when this returns.
    pub(crate) fn run_join_sequence(&mut self) {
        let state = self.state().clone();
        let radius = state.config.view_radius;

        let (world_uuid, spawn) = {
            let world = state.world.read().unwrap();
            (world.uuid(), world.spawn())
        };
        let center_x = (spawn.x.floor() as i32).div_euclid(CHUNK_DIM as i32);
        let center_z = (spawn.z.floor() as i32).div_euclid(CHUNK_DIM as i32);

        // Preamble.
        let client_id = self.client_id as i32;
        self.push(ids::CONNECT_ACCEPT, |buf| {
            ConnectAccept::default().encode(buf)
        });
        self.push(ids::SET_CLIENT_ID, |buf| {
            SetClientId { client_id }.encode(buf)
        });
        self.push(ids::VIEW_RADIUS, |buf| ViewRadius { value: radius }.encode(buf));
        self.push(ids::JOIN_WORLD, |buf| {
            JoinWorld {
                clear: true,
                fade: false,
                world_uuid,
            }
            .encode(buf)
        });
        self.push(ids::SET_GAME_MODE, |buf| {
            SetGameMode {
                game_mode: GameMode::Creative,
            }
            .encode(buf)
        });
        let seed: u32 = rand::thread_rng().gen();
        self.push(ids::SET_ENTITY_SEED, |buf| SetEntitySeed { seed }.encode(buf));

        // Terrain. Materialize the whole view square, then serialize
        // chunk by chunk under the read lock.
        let coords = {
            let mut world = state.world.write().unwrap();
            world.chunks_in_radius(center_x, center_z, radius)
        };
        let total_chunks = coords.len();
        let mut chunks_sent = 0usize;
        for (chunk_x, chunk_z) in coords {
            {
                let world = state.world.read().unwrap();
                let chunk = world
                    .chunk_at(chunk_x, chunk_z)
                    .expect("chunk materialized above");
                self.push(ids::SET_CHUNK_HEIGHTMAP, |buf| {
                    ChunkColumnData {
                        chunk_x,
                        chunk_z,
                        data: Some(chunk.heightmap_bytes()),
                    }
                    .encode(buf)
                });
                self.push(ids::SET_CHUNK_TINTMAP, |buf| {
                    ChunkColumnData {
                        chunk_x,
                        chunk_z,
                        data: Some(chunk.tintmap_bytes()),
                    }
                    .encode(buf)
                });
                self.push(ids::SET_CHUNK_ENVIRONMENTS, |buf| {
                    ChunkColumnData {
                        chunk_x,
                        chunk_z,
                        data: Some(chunk.environment_bytes()),
                    }
                    .encode(buf)
                });
                for section_y in 0..SECTIONS_PER_CHUNK {
                    let data = chunk.section(section_y).serialized();
                    self.push(ids::SET_CHUNK, |buf| {
                        SetChunk {
                            chunk_x,
                            section_y: section_y as i32,
                            chunk_z,
                            local_light: None,
                            global_light: None,
                            data: Some(data),
                        }
                        .encode(buf)
                    });
                }
            }
            chunks_sent += 1;
            if chunks_sent % 32 == 0 || chunks_sent == total_chunks {
                debug!(
                    client_id = self.client_id,
                    chunks_sent, total_chunks, "terrain progress"
                );
            }
        }

        // Spawn the player entity.
        let uuid = self.player_uuid.unwrap_or_else(Uuid::nil);
        self.push(ids::ENTITY_UPDATES, |buf| {
            EntityUpdates {
                updates: vec![EntityUpdate {
                    entity_id: client_id,
                    kind: EntityUpdateKind::Add,
                    uuid,
                    position: spawn,
                    rotation: Quaternion::IDENTITY,
                    velocity: Velocity::default(),
                }],
            }
            .encode(buf)
        });

        info!(
            client_id = self.client_id,
            chunks = total_chunks,
            "join sequence complete, waiting for client ready"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::connection::Phase;
    use crate::state::ServerState;
    use bytes::BytesMut;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use zytale_assets::AssetRegistry;
    use zytale_protocol::packets::{Connect, RequestAssets};
    use zytale_protocol::{PROTOCOL_BUILD, PROTOCOL_CRC};

    fn joined_connection(view_radius: i32) -> (Connection, Vec<crate::connection::Outbound>) {
        let mut config = ServerConfig::default();
        config.view_radius = view_radius;
        let state = Arc::new(ServerState::new(config, AssetRegistry::new(), None));
        let peer: SocketAddr = "127.0.0.1:40002".parse().unwrap();
        let mut conn = Connection::new(state, 1, peer);

        let mut connect = BytesMut::new();
        Connect {
            protocol_crc: PROTOCOL_CRC,
            protocol_build: PROTOCOL_BUILD,
            client_type: 0,
            uuid: Uuid::new_v4(),
            language: None,
            identity_token: None,
            username: "Test".into(),
            referral_data: None,
            referral_source: None,
        }
        .encode(&mut connect);
        conn.handle_frame(ids::CONNECT, &connect).unwrap();
        conn.take_outbox();

        let mut request = BytesMut::new();
        RequestAssets::default().encode(&mut request);
        conn.handle_frame(ids::REQUEST_ASSETS, &request).unwrap();
        conn.take_outbox();

        // PlayerOptions with no skin: a lone null-bits byte.
        conn.handle_frame(ids::PLAYER_OPTIONS, &[0x00]).unwrap();
        let outbox = conn.take_outbox();
        (conn, outbox)
    }

    #[test]
    fn join_packet_count_radius_one() {
        // (2r+1)^2 chunks, 13 packets each, 6 preamble, 1 entity spawn.
        let (conn, outbox) = joined_connection(1);
        assert_eq!(conn.phase(), Phase::WaitingForReady);
        assert_eq!(outbox.len(), 6 + 9 * 13 + 1);
    }

    #[test]
    fn join_packet_count_radius_six() {
        let (_, outbox) = joined_connection(6);
        assert_eq!(outbox.len(), 2204);
    }

    #[test]
    fn join_preamble_order() {
        let (_, outbox) = joined_connection(1);
        let preamble: Vec<u32> = outbox[..6].iter().map(|p| p.id).collect();
        assert_eq!(
            preamble,
            vec![
                ids::CONNECT_ACCEPT,
                ids::SET_CLIENT_ID,
                ids::VIEW_RADIUS,
                ids::JOIN_WORLD,
                ids::SET_GAME_MODE,
                ids::SET_ENTITY_SEED,
            ]
        );
        assert_eq!(outbox[1].payload, 1i32.to_le_bytes());
        assert_eq!(outbox[2].payload, 1i32.to_le_bytes());
    }

    #[test]
    fn per_chunk_block_layout() {
        let (_, outbox) = joined_connection(1);
        // First chunk block right after the preamble.
        let chunk = &outbox[6..19];
        assert_eq!(chunk[0].id, ids::SET_CHUNK_HEIGHTMAP);
        assert_eq!(chunk[0].payload.len(), 9 + 2048);
        assert_eq!(chunk[1].id, ids::SET_CHUNK_TINTMAP);
        assert_eq!(chunk[1].payload.len(), 9 + 4096);
        assert_eq!(chunk[2].id, ids::SET_CHUNK_ENVIRONMENTS);
        assert_eq!(chunk[2].payload.len(), 9 + 1024);
        for (section_y, packet) in chunk[3..].iter().enumerate() {
            assert_eq!(packet.id, ids::SET_CHUNK, "section {section_y}");
        }
    }

    #[test]
    fn heightmap_blob_is_flat_surface() {
        let (_, outbox) = joined_connection(1);
        let heightmap = &outbox[6].payload[9..];
        // Every column of a generated chunk tops out at the grass layer.
        for column in heightmap.chunks(2) {
            assert_eq!(i16::from_le_bytes([column[0], column[1]]), 63);
        }
    }

    #[test]
    fn last_packet_spawns_player() {
        let (_, outbox) = joined_connection(1);
        let last = outbox.last().unwrap();
        assert_eq!(last.id, ids::ENTITY_UPDATES);
        assert_eq!(last.payload[0], 0x01);
        assert_eq!(last.payload[1], 1);
        assert_eq!(
            &last.payload[2..6],
            &1i32.to_le_bytes(),
            "entity id is the client id"
        );
        assert_eq!(last.payload[6], EntityUpdateKind::Add as u8);
    }

    #[test]
    fn client_ready_completes_join() {
        let (mut conn, _) = joined_connection(1);
        conn.handle_frame(ids::CLIENT_READY, &[]).unwrap();
        assert_eq!(conn.phase(), Phase::Playing);
    }

    #[test]
    fn full_handshake_emits_updates_then_join() {
        let (conn, outbox) = joined_connection(2);
        assert_eq!(conn.phase(), Phase::WaitingForReady);
        assert_eq!(outbox.len(), 6 + 25 * 13 + 1);
    }
}
