//! The QUIC endpoint and per-connection stream drivers.
//!
//! The transport serializes callbacks per stream, so the state machine
//! runs lock-free inside its connection task: read bytes, feed the
//! frame parser, dispatch, flush the outbox through the send pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info, warn};

use zytale_protocol::{compress, registry, FrameReader};

use crate::connection::{Connection, Phase};
use crate::send::{prepare_frame, PendingSends};
use crate::state::ServerState;
use crate::tls;

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Cap on the decompressed size of one inbound packet.
const MAX_INBOUND_DECOMPRESSED: usize = 16 * 1024 * 1024;

/// Bind the endpoint and accept connections until shutdown.
pub async fn run(state: Arc<ServerState>) -> anyhow::Result<()> {
    let crypto = tls::build_server_crypto(&state.config)?;
    let quic_crypto = quinn::crypto::rustls::QuicServerConfig::try_from(crypto)
        .context("rustls config not usable for QUIC")?;
    let mut server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_crypto));

    let mut transport = quinn::TransportConfig::default();
    transport.max_idle_timeout(Some(
        Duration::from_millis(state.config.idle_timeout_ms)
            .try_into()
            .context("idle timeout out of range")?,
    ));
    server_config.transport_config(Arc::new(transport));

    let addr: SocketAddr = format!("{}:{}", state.config.bind, state.config.port)
        .parse()
        .context("invalid bind address")?;
    let endpoint = quinn::Endpoint::server(server_config, addr)?;
    info!("Listening on {addr} (alpn hytale/1)");

    while let Some(incoming) = endpoint.accept().await {
        let state = state.clone();
        tokio::spawn(async move {
            match incoming.await {
                Ok(connection) => handle_connection(state, connection).await,
                Err(e) => debug!("connection attempt failed: {e}"),
            }
        });
    }
    Ok(())
}

async fn handle_connection(state: Arc<ServerState>, connection: quinn::Connection) {
    let peer = connection.remote_address();
    let client_id = state.next_client_id();
    state.register_connection(client_id, peer);
    info!(client_id, peer = %peer, "connection established");

    // The primary game stream is the first bidirectional stream the
    // client opens; the whole handshake runs on it.
    let result = match connection.accept_bi().await {
        Ok((send, recv)) => drive_stream(&state, client_id, peer, send, recv).await,
        Err(e) => Err(anyhow::anyhow!("primary stream never opened: {e}")),
    };
    match result {
        Ok(()) => info!(client_id, "connection closed"),
        Err(e) => debug!(client_id, "connection ended: {e}"),
    }
    // Per-connection resources are released here, at shutdown-complete.
    state.remove_connection(client_id);
}

async fn drive_stream(
    state: &Arc<ServerState>,
    client_id: u32,
    peer: SocketAddr,
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
) -> anyhow::Result<()> {
    let mut machine = Connection::new(state.clone(), client_id, peer);
    let mut frames = FrameReader::new();
    let mut pending = PendingSends::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    let result = 'outer: loop {
        let n = match recv.read(&mut buf).await {
            Ok(Some(n)) => n,
            Ok(None) => break Ok(()),
            Err(e) => break Err(anyhow::anyhow!("stream read: {e}")),
        };
        frames.feed(&buf[..n]);

        loop {
            match frames.next_frame() {
                Ok(Some(frame)) => {
                    // Packets flagged in the descriptor table travel
                    // compressed in both directions.
                    let payload = if registry::is_compressed(frame.id) {
                        match compress::decompress(&frame.payload, MAX_INBOUND_DECOMPRESSED) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(client_id, id = frame.id, "bad compressed payload: {e}");
                                break 'outer Err(e.into());
                            }
                        }
                    } else {
                        frame.payload.to_vec()
                    };
                    let handled = machine.handle_frame(frame.id, &payload);
                    flush_outbox(state, &mut machine, &mut send, &mut pending).await?;
                    if let Err(e) = handled {
                        break 'outer Err(e.into());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // Malformed framing is fatal for the stream.
                    warn!(client_id, "framing error: {e}");
                    break 'outer Err(e.into());
                }
            }
        }

        if machine.phase() == Phase::Disconnecting {
            break Ok(());
        }
    };

    // Anything still unconfirmed is released synchronously with the
    // stream.
    let dropped = pending.drain_all();
    if dropped > 0 {
        debug!(client_id, dropped, "released unconfirmed sends at close");
    }
    let _ = send.finish();
    result
}

/// Push every queued packet through compression, framing, and the
/// pending-send ledger, then onto the wire.
async fn flush_outbox(
    state: &Arc<ServerState>,
    machine: &mut Connection,
    send: &mut quinn::SendStream,
    pending: &mut PendingSends,
) -> anyhow::Result<()> {
    for outbound in machine.take_outbox() {
        let frame = prepare_frame(
            outbound.id,
            &outbound.payload,
            state.config.no_compress,
            state.config.hex_dump,
        )?;
        let ticket = pending.track(frame.clone());
        send.write_all(&frame)
            .await
            .with_context(|| format!("sending packet {}", outbound.id))?;
        pending.complete(ticket);
    }
    Ok(())
}
