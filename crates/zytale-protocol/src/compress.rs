//! Outbound payload compression.
//!
//! Compression is a stateless block operation applied to the payloads of
//! packets whose descriptor sets the `compressed` flag, before framing.
//! A debug override passes the original bytes through verbatim.

use std::io;

use crate::registry;

const LEVEL: i32 = 3;

/// Compress `payload` if packet `id` is flagged for it. Returns the
/// bytes to frame: compressed, or the original when the packet is not
/// flagged or compression is disabled.
pub fn maybe_compress(id: u32, payload: &[u8], disabled: bool) -> io::Result<Vec<u8>> {
    if disabled || !registry::is_compressed(id) {
        return Ok(payload.to_vec());
    }
    zstd::bulk::compress(payload, LEVEL)
}

/// Decompress the payload of a packet flagged for compression.
pub fn decompress(payload: &[u8], max_size: usize) -> io::Result<Vec<u8>> {
    zstd::bulk::decompress(payload, max_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagged_packet_roundtrips() {
        let payload = vec![7u8; 4096];
        // id 131 (SetChunk) is flagged.
        let compressed = maybe_compress(131, &payload, false).unwrap();
        assert!(compressed.len() < payload.len());
        let restored = decompress(&compressed, payload.len()).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn unflagged_packet_passes_through() {
        let payload = vec![1u8, 2, 3];
        // id 223 (ServerInfo) is not flagged.
        let out = maybe_compress(223, &payload, false).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn override_disables_compression() {
        let payload = vec![7u8; 4096];
        let out = maybe_compress(131, &payload, true).unwrap();
        assert_eq!(out, payload);
    }
}
