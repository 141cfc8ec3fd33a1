use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::codec::{read_varint, varint_len, write_varint, CodecError};

/// Largest payload a peer may legally send. Anything above this is a
/// protocol error, not a request for more buffer.
pub const MAX_PAYLOAD_SIZE: usize = 1_677_721_600;

/// One decoded wire frame: a packet id and its payload bytes, with the
/// id/length prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: u32,
    pub payload: Bytes,
}

/// Incremental frame parser over a rolling receive buffer.
///
/// Bytes may arrive split at arbitrary boundaries; `next_frame` returns
/// `Ok(None)` until a complete frame is buffered and the caller keeps
/// feeding. Malformed VarInts and oversized lengths are fatal for the
/// stream.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: BytesMut,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes currently buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        let mut peek = &self.buf[..];
        let id = match read_varint(&mut peek) {
            Ok(id) => id,
            Err(CodecError::EndOfStream) => return Ok(None),
            Err(e) => return Err(e),
        };
        let len = match read_varint(&mut peek) {
            Ok(len) => len as usize,
            Err(CodecError::EndOfStream) => return Ok(None),
            Err(e) => return Err(e),
        };
        if len > MAX_PAYLOAD_SIZE {
            return Err(CodecError::Overflow);
        }
        if peek.remaining() < len {
            return Ok(None);
        }
        let header = self.buf.len() - peek.remaining();
        self.buf.advance(header);
        let payload = self.buf.split_to(len).freeze();
        trace!("frame id={id} len={len}");
        Ok(Some(Frame { id, payload }))
    }
}

/// Encode one frame as `VarInt(id) || VarInt(len) || payload`, returning
/// an owned buffer suitable for handing to the transport.
pub fn encode_frame(id: u32, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(varint_len(id) + varint_len(payload.len() as u32) + payload.len());
    write_varint(&mut buf, id);
    write_varint(&mut buf, payload.len() as u32);
    buf.extend_from_slice(payload);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_frames(reader: &mut FrameReader) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn frame_roundtrip() {
        let encoded = encode_frame(14, &[0x00]);
        let mut reader = FrameReader::new();
        reader.feed(&encoded);
        let frames = collect_frames(&mut reader);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, 14);
        assert_eq!(&frames[0].payload[..], &[0x00]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn split_at_every_boundary() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&encode_frame(0, b"hello"));
        stream.extend_from_slice(&encode_frame(223, &[1, 2, 3, 4, 5, 6, 7, 8]));
        stream.extend_from_slice(&encode_frame(22, &[]));

        let mut whole = FrameReader::new();
        whole.feed(&stream);
        let expected = collect_frames(&mut whole);
        assert_eq!(expected.len(), 3);

        for split in 0..=stream.len() {
            let mut reader = FrameReader::new();
            reader.feed(&stream[..split]);
            let mut frames = collect_frames(&mut reader);
            reader.feed(&stream[split..]);
            frames.extend(collect_frames(&mut reader));
            assert_eq!(frames, expected, "split at byte {split}");
        }
    }

    #[test]
    fn incomplete_frame_returns_none() {
        let encoded = encode_frame(131, &[0u8; 100]);
        let mut reader = FrameReader::new();
        reader.feed(&encoded[..encoded.len() - 1]);
        assert!(reader.next_frame().unwrap().is_none());
        reader.feed(&encoded[encoded.len() - 1..]);
        assert!(reader.next_frame().unwrap().is_some());
    }

    #[test]
    fn oversized_length_is_fatal() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 1);
        write_varint(&mut buf, u32::MAX);
        let mut reader = FrameReader::new();
        reader.feed(&buf);
        assert!(reader.next_frame().is_err());
    }

    #[test]
    fn malformed_varint_is_fatal() {
        let mut reader = FrameReader::new();
        reader.feed(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(reader.next_frame().is_err());
    }
}
