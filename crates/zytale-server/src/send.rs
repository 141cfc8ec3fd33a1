//! The outbound send pipeline and pending-send ledger.
//!
//! Every outbound packet is compressed when its descriptor says so,
//! framed, then tracked in the stream's pending list until the transport
//! reports the send complete. Entries are removed by ticket identity,
//! not position: completions arrive in any order.

use bytes::Bytes;
use tracing::warn;

use zytale_protocol::{compress, encode_frame};

/// Identifies one tracked send. Tickets are never reused within a
/// stream's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTicket(u64);

struct PendingSend {
    ticket: SendTicket,
    buf: Bytes,
}

/// Per-stream ledger of frames handed to the transport and not yet
/// confirmed. Keeps each buffer alive until its completion fires.
#[derive(Default)]
pub struct PendingSends {
    entries: Vec<PendingSend>,
    next_ticket: u64,
}

impl PendingSends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a frame buffer for the duration of its send.
    pub fn track(&mut self, buf: Bytes) -> SendTicket {
        let ticket = SendTicket(self.next_ticket);
        self.next_ticket += 1;
        self.entries.push(PendingSend { ticket, buf });
        ticket
    }

    /// Release the entry for `ticket`, returning its buffer. Completion
    /// order is meaningless, so the entry is swap-removed. Completing
    /// the same ticket twice is a programming error.
    pub fn complete(&mut self, ticket: SendTicket) -> Option<Bytes> {
        match self.entries.iter().position(|entry| entry.ticket == ticket) {
            Some(index) => Some(self.entries.swap_remove(index).buf),
            None => {
                warn!(ticket = ticket.0, "completion for unknown send ticket");
                None
            }
        }
    }

    /// Synchronously release everything still in flight. Called at
    /// stream close; returns how many entries were dropped.
    pub fn drain_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run one outbound packet through compression and framing. Returns the
/// owned frame buffer to hand to the transport.
pub fn prepare_frame(
    id: u32,
    payload: &[u8],
    no_compress: bool,
    hex_dump: bool,
) -> std::io::Result<Bytes> {
    if hex_dump {
        let n = payload.len().min(128);
        warn!(id, len = payload.len(), head = %hex_prefix(&payload[..n]), "outbound payload");
    }
    let body = compress::maybe_compress(id, payload, no_compress)?;
    Ok(encode_frame(id, &body))
}

fn hex_prefix(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: u8) -> Bytes {
        Bytes::from(vec![n; 16])
    }

    #[test]
    fn completions_in_reverse_order() {
        let mut pending = PendingSends::new();
        let tickets: Vec<_> = (0..10).map(|n| pending.track(frame(n))).collect();
        assert_eq!(pending.len(), 10);
        for ticket in tickets.into_iter().rev() {
            assert!(pending.complete(ticket).is_some());
        }
        assert!(pending.is_empty());
    }

    #[test]
    fn completions_in_shuffled_order() {
        let mut pending = PendingSends::new();
        let tickets: Vec<_> = (0..8).map(|n| pending.track(frame(n))).collect();
        // A fixed permutation; completion order is not meaningful.
        for &index in &[3usize, 0, 7, 5, 1, 6, 2, 4] {
            assert!(pending.complete(tickets[index]).is_some());
        }
        assert!(pending.is_empty());
    }

    #[test]
    fn buffers_live_until_completion() {
        let mut pending = PendingSends::new();
        let payload = Bytes::from_static(b"keep me alive");
        let ticket = pending.track(payload.clone());
        assert_eq!(pending.len(), 1);
        let released = pending.complete(ticket).unwrap();
        assert_eq!(released, payload);
    }

    #[test]
    fn double_completion_is_rejected() {
        let mut pending = PendingSends::new();
        let ticket = pending.track(frame(1));
        assert!(pending.complete(ticket).is_some());
        assert!(pending.complete(ticket).is_none());
    }

    #[test]
    fn drain_releases_stragglers() {
        let mut pending = PendingSends::new();
        for n in 0..5 {
            pending.track(frame(n));
        }
        assert_eq!(pending.drain_all(), 5);
        assert!(pending.is_empty());
        assert_eq!(pending.drain_all(), 0);
    }

    #[test]
    fn prepare_frame_skips_compression_for_unflagged() {
        let frame = prepare_frame(223, &[1, 2, 3], false, false).unwrap();
        // Two-byte VarInt id, one-byte length, then the payload verbatim.
        assert_eq!(&frame[..], &[0xDF, 0x01, 0x03, 1, 2, 3]);
    }

    #[test]
    fn prepare_frame_compresses_flagged() {
        let payload = vec![0u8; 8192];
        let frame = prepare_frame(131, &payload, false, false).unwrap();
        assert!(frame.len() < payload.len());
        let disabled = prepare_frame(131, &payload, true, false).unwrap();
        assert!(disabled.len() > payload.len());
    }
}
