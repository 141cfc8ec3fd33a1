use bytes::{Buf, BufMut};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("VarInt overflows u32")]
    Overflow,
    #[error("unexpected end of stream")]
    EndOfStream,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("offset {0} is outside the variable block")]
    BadOffset(i32),
    #[error("invalid enum value {0}")]
    InvalidEnum(u8),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Read a VarInt from the buffer.
///
/// At most five bytes are consumed. The fifth byte may only carry the top
/// four bits of the value; anything above that, or a fifth continuation
/// flag, is an overflow.
pub fn read_varint(buf: &mut impl Buf) -> CodecResult<u32> {
    let mut result: u32 = 0;
    for i in 0..5 {
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let byte = buf.get_u8();
        let segment = (byte & 0x7F) as u32;
        if i == 4 && segment > 0x0F {
            return Err(CodecError::Overflow);
        }
        result |= segment << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(CodecError::Overflow)
}

/// Write a VarInt to the buffer.
pub fn write_varint(buf: &mut impl BufMut, mut value: u32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the encoded byte length of a VarInt.
pub fn varint_len(value: u32) -> usize {
    let mut val = value;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Read a VarInt-prefixed UTF-8 string.
pub fn read_varstring(buf: &mut impl Buf) -> CodecResult<String> {
    let len = read_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(CodecError::EndOfStream);
    }
    let bytes = buf.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

/// Write a VarInt-prefixed UTF-8 string.
pub fn write_varstring(buf: &mut impl BufMut, s: &str) {
    write_varint(buf, s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Read a VarInt-prefixed byte blob.
pub fn read_varbytes(buf: &mut impl Buf) -> CodecResult<Vec<u8>> {
    let len = read_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(CodecError::EndOfStream);
    }
    Ok(buf.copy_to_bytes(len).to_vec())
}

/// Write a VarInt-prefixed byte blob.
pub fn write_varbytes(buf: &mut impl BufMut, data: &[u8]) {
    write_varint(buf, data.len() as u32);
    buf.put_slice(data);
}

/// Read a UUID as 16 raw bytes in wire order.
pub fn read_uuid(buf: &mut impl Buf) -> CodecResult<Uuid> {
    if buf.remaining() < 16 {
        return Err(CodecError::EndOfStream);
    }
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(Uuid::from_bytes(bytes))
}

/// Write a UUID as 16 raw bytes.
pub fn write_uuid(buf: &mut impl BufMut, uuid: &Uuid) {
    buf.put_slice(uuid.as_bytes());
}

pub fn read_bool(buf: &mut impl Buf) -> CodecResult<bool> {
    if !buf.has_remaining() {
        return Err(CodecError::EndOfStream);
    }
    Ok(buf.get_u8() != 0)
}

pub fn read_i32_le(buf: &mut impl Buf) -> CodecResult<i32> {
    if buf.remaining() < 4 {
        return Err(CodecError::EndOfStream);
    }
    Ok(buf.get_i32_le())
}

pub fn read_f32_le(buf: &mut impl Buf) -> CodecResult<f32> {
    if buf.remaining() < 4 {
        return Err(CodecError::EndOfStream);
    }
    Ok(buf.get_f32_le())
}

pub fn read_f64_le(buf: &mut impl Buf) -> CodecResult<f64> {
    if buf.remaining() < 8 {
        return Err(CodecError::EndOfStream);
    }
    Ok(buf.get_f64_le())
}
