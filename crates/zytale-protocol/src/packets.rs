//! Typed control packets.
//!
//! Non-trivial packets share one layout: a null-bits byte flagging the
//! optional fields, a fixed block of little-endian scalars ending in a
//! table of signed 32-bit offsets (one per variable-length field, -1 when
//! absent), then the variable block. Offsets are measured from the first
//! byte of the variable block. Packets whose single variable field is
//! always last write it inline with no offset word.

use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

use zytale_types::{Direction, GameMode, HostAddress, Position, Quaternion, Velocity};

use crate::codec::{
    read_f32_le, read_f64_le, read_i32_le, read_uuid, read_varbytes, read_varint, read_varstring,
    write_uuid, write_varbytes, write_varstring, CodecError, CodecResult,
};

/// Accumulates presence bits for the leading null-bits byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBits(pub u8);

impl NullBits {
    pub fn set(&mut self, bit: u8, present: bool) {
        if present {
            self.0 |= 1 << bit;
        }
    }

    pub fn get(self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }
}

/// Reserves an offset table in the fixed block and patches entries as the
/// variable fields are written. Unmarked slots stay -1.
pub struct OffsetTable {
    base: usize,
    slots: usize,
}

impl OffsetTable {
    pub fn reserve(buf: &mut BytesMut, slots: usize) -> Self {
        let base = buf.len();
        for _ in 0..slots {
            buf.put_i32_le(-1);
        }
        OffsetTable { base, slots }
    }

    /// Byte position where the variable block begins.
    pub fn origin(&self) -> usize {
        self.base + self.slots * 4
    }

    /// Record that field `slot` starts at the current end of `buf`.
    pub fn mark(&self, buf: &mut BytesMut, slot: usize) {
        self.mark_from(buf, slot, self.origin());
    }

    /// Like [`OffsetTable::mark`], but measured from an explicit
    /// variable-block origin. Nested packets write their offsets
    /// relative to the outermost variable block, not their own.
    pub fn mark_from(&self, buf: &mut BytesMut, slot: usize, origin: usize) {
        debug_assert!(slot < self.slots);
        let offset = (buf.len() - origin) as i32;
        let pos = self.base + slot * 4;
        buf[pos..pos + 4].copy_from_slice(&offset.to_le_bytes());
    }
}

/// Reads the offset table of a received packet and positions a cursor at
/// each present variable field.
pub struct VarBlock<'a> {
    payload: &'a [u8],
    origin: usize,
    offsets: Vec<i32>,
}

impl<'a> VarBlock<'a> {
    /// `fixed` is a cursor that has consumed everything up to the offset
    /// table; `slots` offsets are read from it and the variable block is
    /// taken to start immediately after them.
    pub fn read(payload: &'a [u8], fixed: &mut &'a [u8], slots: usize) -> CodecResult<Self> {
        let mut offsets = Vec::with_capacity(slots);
        for _ in 0..slots {
            offsets.push(read_i32_le(fixed)?);
        }
        let origin = payload.len() - fixed.remaining();
        Ok(VarBlock {
            payload,
            origin,
            offsets,
        })
    }

    /// Cursor at variable field `slot`, or None when its offset is -1.
    pub fn field(&self, slot: usize) -> CodecResult<Option<&'a [u8]>> {
        let offset = self.offsets[slot];
        if offset < 0 {
            return Ok(None);
        }
        let start = self.origin + offset as usize;
        if start > self.payload.len() {
            return Err(CodecError::BadOffset(offset));
        }
        Ok(Some(&self.payload[start..]))
    }
}

pub fn write_position(buf: &mut BytesMut, p: &Position) {
    buf.put_f64_le(p.x);
    buf.put_f64_le(p.y);
    buf.put_f64_le(p.z);
}

pub fn read_position(buf: &mut impl Buf) -> CodecResult<Position> {
    Ok(Position {
        x: read_f64_le(buf)?,
        y: read_f64_le(buf)?,
        z: read_f64_le(buf)?,
    })
}

pub fn write_direction(buf: &mut BytesMut, d: &Direction) {
    buf.put_f32_le(d.yaw);
    buf.put_f32_le(d.pitch);
    buf.put_f32_le(d.roll);
}

pub fn read_direction(buf: &mut impl Buf) -> CodecResult<Direction> {
    Ok(Direction {
        yaw: read_f32_le(buf)?,
        pitch: read_f32_le(buf)?,
        roll: read_f32_le(buf)?,
    })
}

pub fn write_quaternion(buf: &mut BytesMut, q: &Quaternion) {
    buf.put_f32_le(q.x);
    buf.put_f32_le(q.y);
    buf.put_f32_le(q.z);
    buf.put_f32_le(q.w);
}

pub fn write_velocity(buf: &mut BytesMut, v: &Velocity) {
    buf.put_f32_le(v.x);
    buf.put_f32_le(v.y);
    buf.put_f32_le(v.z);
}

/// Host/port pair. The port is the one big-endian integer in the protocol.
pub fn write_host_address(buf: &mut BytesMut, addr: &HostAddress) {
    buf.put_u16(addr.port);
    write_varstring(buf, &addr.host);
}

pub fn read_host_address(buf: &mut impl Buf) -> CodecResult<HostAddress> {
    if buf.remaining() < 2 {
        return Err(CodecError::EndOfStream);
    }
    let port = buf.get_u16();
    let host = read_varstring(buf)?;
    Ok(HostAddress { port, host })
}

// === Connection ===

/// Inbound Connect (id 0), CRC+build form.
#[derive(Debug, Clone)]
pub struct Connect {
    pub protocol_crc: i32,
    pub protocol_build: i32,
    pub client_type: u8,
    pub uuid: Uuid,
    pub language: Option<String>,
    pub identity_token: Option<String>,
    pub username: String,
    pub referral_data: Option<Vec<u8>>,
    pub referral_source: Option<HostAddress>,
}

impl Connect {
    /// Fixed block: null-bits, crc, build, client type, uuid, then five
    /// offsets (language, identity token, username, referral data,
    /// referral source). Username is required.
    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut fixed = payload;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(fixed.get_u8());
        let protocol_crc = read_i32_le(&mut fixed)?;
        let protocol_build = read_i32_le(&mut fixed)?;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let client_type = fixed.get_u8();
        let uuid = read_uuid(&mut fixed)?;
        let vars = VarBlock::read(payload, &mut fixed, 5)?;

        let language = match vars.field(0)? {
            Some(mut f) if bits.get(0) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        let identity_token = match vars.field(1)? {
            Some(mut f) if bits.get(1) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        let mut username_field = vars.field(2)?.ok_or(CodecError::BadOffset(-1))?;
        let username = read_varstring(&mut username_field)?;
        let referral_data = match vars.field(3)? {
            Some(mut f) if bits.get(2) => Some(read_varbytes(&mut f)?),
            _ => None,
        };
        let referral_source = match vars.field(4)? {
            Some(mut f) if bits.get(3) => Some(read_host_address(&mut f)?),
            _ => None,
        };

        Ok(Connect {
            protocol_crc,
            protocol_build,
            client_type,
            uuid,
            language,
            identity_token,
            username,
            referral_data,
            referral_source,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.language.is_some());
        bits.set(1, self.identity_token.is_some());
        bits.set(2, self.referral_data.is_some());
        bits.set(3, self.referral_source.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.protocol_crc);
        buf.put_i32_le(self.protocol_build);
        buf.put_u8(self.client_type);
        write_uuid(buf, &self.uuid);
        let table = OffsetTable::reserve(buf, 5);
        if let Some(lang) = &self.language {
            table.mark(buf, 0);
            write_varstring(buf, lang);
        }
        if let Some(token) = &self.identity_token {
            table.mark(buf, 1);
            write_varstring(buf, token);
        }
        table.mark(buf, 2);
        write_varstring(buf, &self.username);
        if let Some(data) = &self.referral_data {
            table.mark(buf, 3);
            write_varbytes(buf, data);
        }
        if let Some(source) = &self.referral_source {
            table.mark(buf, 4);
            write_host_address(buf, source);
        }
    }
}

/// Disconnect reason codes (id 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisconnectType {
    Disconnect = 0,
    Kick = 1,
    Ban = 2,
    Leave = 3,
    Crash = 4,
    Timeout = 5,
    ServerShutdown = 6,
}

impl DisconnectType {
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        Ok(match value {
            0 => DisconnectType::Disconnect,
            1 => DisconnectType::Kick,
            2 => DisconnectType::Ban,
            3 => DisconnectType::Leave,
            4 => DisconnectType::Crash,
            5 => DisconnectType::Timeout,
            6 => DisconnectType::ServerShutdown,
            other => return Err(CodecError::InvalidEnum(other)),
        })
    }
}

/// Disconnect (id 1). The reason is the single trailing variable field
/// and is written inline.
#[derive(Debug, Clone)]
pub struct Disconnect {
    pub kind: DisconnectType,
    pub reason: Option<String>,
}

impl Disconnect {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.reason.is_some());
        buf.put_u8(bits.0);
        buf.put_u8(self.kind as u8);
        if let Some(reason) = &self.reason {
            write_varstring(buf, reason);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if buf.remaining() < 2 {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let kind = DisconnectType::from_u8(buf.get_u8())?;
        let reason = if bits.get(0) {
            Some(read_varstring(&mut buf)?)
        } else {
            None
        };
        Ok(Disconnect { kind, reason })
    }
}

/// Ping (id 2) and Pong (id 3) carry the sender's millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub timestamp: i64,
}

impl Ping {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i64_le(self.timestamp);
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if buf.remaining() < 8 {
            return Err(CodecError::EndOfStream);
        }
        Ok(Ping {
            timestamp: buf.get_i64_le(),
        })
    }
}

// === Auth ===

/// Status (id 10): live player counts plus optional name/motd.
#[derive(Debug, Clone)]
pub struct Status {
    pub player_count: i32,
    pub max_players: i32,
    pub server_name: Option<String>,
    pub motd: Option<String>,
}

impl Status {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.server_name.is_some());
        bits.set(1, self.motd.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.player_count);
        buf.put_i32_le(self.max_players);
        let table = OffsetTable::reserve(buf, 2);
        if let Some(name) = &self.server_name {
            table.mark(buf, 0);
            write_varstring(buf, name);
        }
        if let Some(motd) = &self.motd {
            table.mark(buf, 1);
            write_varstring(buf, motd);
        }
    }
}

/// The three token-exchange packets (ids 11, 12, 13) share one shape: two
/// optional VarStrings behind a two-entry offset table.
#[derive(Debug, Clone, Default)]
pub struct TokenPair {
    pub first: Option<String>,
    pub second: Option<String>,
}

impl TokenPair {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.first.is_some());
        bits.set(1, self.second.is_some());
        buf.put_u8(bits.0);
        let table = OffsetTable::reserve(buf, 2);
        if let Some(first) = &self.first {
            table.mark(buf, 0);
            write_varstring(buf, first);
        }
        if let Some(second) = &self.second {
            table.mark(buf, 1);
            write_varstring(buf, second);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut fixed = payload;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(fixed.get_u8());
        let vars = VarBlock::read(payload, &mut fixed, 2)?;
        let first = match vars.field(0)? {
            Some(mut f) if bits.get(0) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        let second = match vars.field(1)? {
            Some(mut f) if bits.get(1) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        Ok(TokenPair { first, second })
    }
}

/// AuthGrant (id 11): auth grant + server identity.
pub type AuthGrant = TokenPair;
/// AuthToken (id 12, inbound): access token + server authorization grant.
pub type AuthToken = TokenPair;
/// ServerAuthToken (id 13): server access token + password challenge.
pub type ServerAuthToken = TokenPair;

/// ConnectAccept (id 14): optional password-challenge bytes, inline.
#[derive(Debug, Clone, Default)]
pub struct ConnectAccept {
    pub password_challenge: Option<Vec<u8>>,
}

impl ConnectAccept {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.password_challenge.is_some());
        buf.put_u8(bits.0);
        if let Some(challenge) = &self.password_challenge {
            write_varbytes(buf, challenge);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let password_challenge = if bits.get(0) {
            Some(read_varbytes(&mut buf)?)
        } else {
            None
        };
        Ok(ConnectAccept { password_challenge })
    }
}

// === Setup ===

/// A content-addressed asset reference: 64 hex chars + a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub hash: String,
    pub name: String,
}

impl AssetRef {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut fixed = [0u8; 64];
        let bytes = self.hash.as_bytes();
        let n = bytes.len().min(64);
        fixed[..n].copy_from_slice(&bytes[..n]);
        buf.put_slice(&fixed);
        write_varstring(buf, &self.name);
    }

    pub fn decode(buf: &mut impl Buf) -> CodecResult<Self> {
        if buf.remaining() < 64 {
            return Err(CodecError::EndOfStream);
        }
        let mut fixed = [0u8; 64];
        buf.copy_to_slice(&mut fixed);
        let end = fixed.iter().position(|&b| b == 0).unwrap_or(64);
        let hash = std::str::from_utf8(&fixed[..end])
            .map_err(|_| CodecError::InvalidUtf8)?
            .to_owned();
        let name = read_varstring(buf)?;
        Ok(AssetRef { hash, name })
    }
}

/// WorldSettings (id 20): world height plus an optional required-assets
/// list, inline.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    pub world_height: i32,
    pub required_assets: Option<Vec<AssetRef>>,
}

impl WorldSettings {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.required_assets.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.world_height);
        if let Some(assets) = &self.required_assets {
            crate::codec::write_varint(buf, assets.len() as u32);
            for asset in assets {
                asset.encode(buf);
            }
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let world_height = read_i32_le(&mut buf)?;
        let required_assets = if bits.get(0) {
            let count = read_varint(&mut buf)?;
            let mut assets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                assets.push(AssetRef::decode(&mut buf)?);
            }
            Some(assets)
        } else {
            None
        };
        Ok(WorldSettings {
            world_height,
            required_assets,
        })
    }
}

/// WorldLoadProgress (id 21): two percentages plus an optional status
/// line, inline.
#[derive(Debug, Clone)]
pub struct WorldLoadProgress {
    pub percent_complete: i32,
    pub percent_complete_subitem: i32,
    pub status: Option<String>,
}

impl WorldLoadProgress {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.status.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.percent_complete);
        buf.put_i32_le(self.percent_complete_subitem);
        if let Some(status) = &self.status {
            write_varstring(buf, status);
        }
    }
}

/// RequestAssets (id 23, inbound): assets the client wants streamed.
#[derive(Debug, Clone, Default)]
pub struct RequestAssets {
    pub assets: Option<Vec<AssetRef>>,
}

impl RequestAssets {
    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let assets = if bits.get(0) {
            let count = read_varint(&mut buf)?;
            let mut assets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                assets.push(AssetRef::decode(&mut buf)?);
            }
            Some(assets)
        } else {
            None
        };
        Ok(RequestAssets { assets })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.assets.is_some());
        buf.put_u8(bits.0);
        if let Some(assets) = &self.assets {
            crate::codec::write_varint(buf, assets.len() as u32);
            for asset in assets {
                asset.encode(buf);
            }
        }
    }
}

/// AssetInitialize (id 24): total byte size plus the asset reference.
#[derive(Debug, Clone)]
pub struct AssetInitialize {
    pub size: i32,
    pub asset: AssetRef,
}

impl AssetInitialize {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        buf.put_i32_le(self.size);
        self.asset.encode(buf);
    }
}

/// AssetPart (id 25): one optional blob of file bytes, inline.
#[derive(Debug, Clone)]
pub struct AssetPart {
    pub part: Option<Vec<u8>>,
}

impl AssetPart {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.part.is_some());
        buf.put_u8(bits.0);
        if let Some(part) = &self.part {
            write_varbytes(buf, part);
        }
    }
}

/// ViewRadius (id 32): trivial fixed packet, radius in chunks.
#[derive(Debug, Clone, Copy)]
pub struct ViewRadius {
    pub value: i32,
}

impl ViewRadius {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.value);
    }
}

/// PlayerOptions (id 33, inbound): optional skin payload. The skin is an
/// opaque nested packet to this server; receipt is what matters.
#[derive(Debug, Clone, Default)]
pub struct PlayerOptions {
    pub player_skin: Option<Vec<u8>>,
}

impl PlayerOptions {
    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let player_skin = if bits.get(0) {
            Some(buf.copy_to_bytes(buf.remaining()).to_vec())
        } else {
            None
        };
        Ok(PlayerOptions { player_skin })
    }
}

/// SetClientId (id 35): the integer assigned at accept.
#[derive(Debug, Clone, Copy)]
pub struct SetClientId {
    pub client_id: i32,
}

impl SetClientId {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.client_id);
    }
}

// === World ===

/// JoinWorld (id 120): clear/fade flags plus the world UUID.
#[derive(Debug, Clone)]
pub struct JoinWorld {
    pub clear: bool,
    pub fade: bool,
    pub world_uuid: Uuid,
}

impl JoinWorld {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, true);
        buf.put_u8(bits.0);
        buf.put_u8(self.clear as u8);
        buf.put_u8(self.fade as u8);
        write_uuid(buf, &self.world_uuid);
    }
}

/// SetGameMode (id 122).
#[derive(Debug, Clone, Copy)]
pub struct SetGameMode {
    pub game_mode: GameMode,
}

impl SetGameMode {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.game_mode as u8);
    }
}

/// SetEntitySeed (id 123): random seed for client-side entity cosmetics.
#[derive(Debug, Clone, Copy)]
pub struct SetEntitySeed {
    pub seed: u32,
}

impl SetEntitySeed {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.seed);
    }
}

/// SetChunk (id 131): one 32-cubed section. Null-bits: bit 0 local
/// light, bit 1 global light, bit 2 section data; each present field is a
/// VarInt-prefixed blob behind a three-entry offset table.
#[derive(Debug, Clone, Default)]
pub struct SetChunk {
    pub chunk_x: i32,
    pub section_y: i32,
    pub chunk_z: i32,
    pub local_light: Option<Vec<u8>>,
    pub global_light: Option<Vec<u8>>,
    pub data: Option<Vec<u8>>,
}

impl SetChunk {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.local_light.is_some());
        bits.set(1, self.global_light.is_some());
        bits.set(2, self.data.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.chunk_x);
        buf.put_i32_le(self.section_y);
        buf.put_i32_le(self.chunk_z);
        let table = OffsetTable::reserve(buf, 3);
        if let Some(light) = &self.local_light {
            table.mark(buf, 0);
            write_varbytes(buf, light);
        }
        if let Some(light) = &self.global_light {
            table.mark(buf, 1);
            write_varbytes(buf, light);
        }
        if let Some(data) = &self.data {
            table.mark(buf, 2);
            write_varbytes(buf, data);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut fixed = payload;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(fixed.get_u8());
        let chunk_x = read_i32_le(&mut fixed)?;
        let section_y = read_i32_le(&mut fixed)?;
        let chunk_z = read_i32_le(&mut fixed)?;
        let vars = VarBlock::read(payload, &mut fixed, 3)?;
        let mut blob = |slot: usize, bit: u8| -> CodecResult<Option<Vec<u8>>> {
            match vars.field(slot)? {
                Some(mut f) if bits.get(bit) => Ok(Some(read_varbytes(&mut f)?)),
                _ => Ok(None),
            }
        };
        Ok(SetChunk {
            chunk_x,
            section_y,
            chunk_z,
            local_light: blob(0, 0)?,
            global_light: blob(1, 1)?,
            data: blob(2, 2)?,
        })
    }
}

/// The three per-column packets (ids 132-134) share one shape: chunk
/// coordinates plus one optional fixed-size raw blob, inline.
#[derive(Debug, Clone)]
pub struct ChunkColumnData {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub data: Option<Vec<u8>>,
}

impl ChunkColumnData {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.data.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.chunk_x);
        buf.put_i32_le(self.chunk_z);
        if let Some(data) = &self.data {
            buf.put_slice(data);
        }
    }
}

/// SetChunkHeightmap (id 132): 2048-byte raw blob of i16 column heights.
pub type SetChunkHeightmap = ChunkColumnData;
/// SetChunkTintmap (id 133): 4096-byte raw blob of ARGB column tints.
pub type SetChunkTintmap = ChunkColumnData;
/// SetChunkEnvironments (id 134): 1024-byte raw blob of environment tags.
pub type SetChunkEnvironments = ChunkColumnData;

// === Player / entity ===

/// ClientMovement (id 150, inbound): position, look, input flags.
#[derive(Debug, Clone)]
pub struct ClientMovement {
    pub position: Position,
    pub direction: Direction,
    pub input_flags: u8,
}

impl ClientMovement {
    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let _bits = NullBits(buf.get_u8());
        let position = read_position(&mut buf)?;
        let direction = read_direction(&mut buf)?;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let input_flags = buf.get_u8();
        Ok(ClientMovement {
            position,
            direction,
            input_flags,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        write_position(buf, &self.position);
        write_direction(buf, &self.direction);
        buf.put_u8(self.input_flags);
    }
}

/// One entry in an EntityUpdates packet.
#[derive(Debug, Clone)]
pub struct EntityUpdate {
    pub entity_id: i32,
    pub kind: EntityUpdateKind,
    pub uuid: Uuid,
    pub position: Position,
    pub rotation: Quaternion,
    pub velocity: Velocity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityUpdateKind {
    Add = 0,
    Update = 1,
    Remove = 2,
}

/// EntityUpdates (id 156): a batch of entity add/update/remove entries.
#[derive(Debug, Clone, Default)]
pub struct EntityUpdates {
    pub updates: Vec<EntityUpdate>,
}

impl EntityUpdates {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, true);
        buf.put_u8(bits.0);
        crate::codec::write_varint(buf, self.updates.len() as u32);
        for update in &self.updates {
            buf.put_i32_le(update.entity_id);
            buf.put_u8(update.kind as u8);
            write_uuid(buf, &update.uuid);
            write_position(buf, &update.position);
            write_quaternion(buf, &update.rotation);
            write_velocity(buf, &update.velocity);
        }
    }
}

// === Auth (password / referral) ===

/// PasswordResponse (id 15, inbound): the client's answer to a password
/// challenge, inline.
#[derive(Debug, Clone, Default)]
pub struct PasswordResponse {
    pub response: Option<Vec<u8>>,
}

impl PasswordResponse {
    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let response = if bits.get(0) {
            Some(read_varbytes(&mut buf)?)
        } else {
            None
        };
        Ok(PasswordResponse { response })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.response.is_some());
        buf.put_u8(bits.0);
        if let Some(response) = &self.response {
            write_varbytes(buf, response);
        }
    }
}

/// PasswordRejected (id 17): attempts left plus an optional reason,
/// inline.
#[derive(Debug, Clone)]
pub struct PasswordRejected {
    pub attempts_remaining: i32,
    pub reason: Option<String>,
}

impl PasswordRejected {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.reason.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.attempts_remaining);
        if let Some(reason) = &self.reason {
            write_varstring(buf, reason);
        }
    }
}

/// ClientReferral (id 18): where to reconnect, with an optional
/// carry-over token, behind a two-entry offset table.
#[derive(Debug, Clone, Default)]
pub struct ClientReferral {
    pub target: Option<HostAddress>,
    pub referral_token: Option<String>,
}

impl ClientReferral {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.target.is_some());
        bits.set(1, self.referral_token.is_some());
        buf.put_u8(bits.0);
        let table = OffsetTable::reserve(buf, 2);
        if let Some(target) = &self.target {
            table.mark(buf, 0);
            write_host_address(buf, target);
        }
        if let Some(token) = &self.referral_token {
            table.mark(buf, 1);
            write_varstring(buf, token);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut fixed = payload;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(fixed.get_u8());
        let vars = VarBlock::read(payload, &mut fixed, 2)?;
        let target = match vars.field(0)? {
            Some(mut f) if bits.get(0) => Some(read_host_address(&mut f)?),
            _ => None,
        };
        let referral_token = match vars.field(1)? {
            Some(mut f) if bits.get(1) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        Ok(ClientReferral {
            target,
            referral_token,
        })
    }
}

// === Setup (misc) ===

/// RemoveAssets (id 27): assets the client should discard. Same shape
/// as RequestAssets.
#[derive(Debug, Clone, Default)]
pub struct RemoveAssets {
    pub assets: Option<Vec<AssetRef>>,
}

impl RemoveAssets {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.assets.is_some());
        buf.put_u8(bits.0);
        if let Some(assets) = &self.assets {
            crate::codec::write_varint(buf, assets.len() as u32);
            for asset in assets {
                asset.encode(buf);
            }
        }
    }
}

/// SetUpdateRate (id 29): server tick rate the client should simulate.
#[derive(Debug, Clone, Copy)]
pub struct SetUpdateRate {
    pub updates_per_second: i32,
}

impl SetUpdateRate {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.updates_per_second);
    }
}

/// SetTimeDilation (id 30).
#[derive(Debug, Clone, Copy)]
pub struct SetTimeDilation {
    pub time_dilation: f32,
}

impl SetTimeDilation {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_f32_le(self.time_dilation);
    }
}

/// UpdateFeatures (id 31): feature toggles keyed by feature ordinal.
#[derive(Debug, Clone, Default)]
pub struct UpdateFeatures {
    pub features: Option<Vec<(i32, bool)>>,
}

impl UpdateFeatures {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.features.is_some());
        buf.put_u8(bits.0);
        if let Some(features) = &self.features {
            crate::codec::write_varint(buf, features.len() as u32);
            for (feature, enabled) in features {
                buf.put_i32_le(*feature);
                buf.put_u8(*enabled as u8);
            }
        }
    }
}

/// ServerTags (id 34): the tag-name to tag-index table the client uses
/// to resolve TagPattern indices.
#[derive(Debug, Clone, Default)]
pub struct ServerTags {
    pub tags: Option<Vec<(String, i32)>>,
}

impl ServerTags {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.tags.is_some());
        buf.put_u8(bits.0);
        if let Some(tags) = &self.tags {
            crate::codec::write_varint(buf, tags.len() as u32);
            for (tag, index) in tags {
                write_varstring(buf, tag);
                buf.put_i32_le(*index);
            }
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut buf = payload;
        if !buf.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(buf.get_u8());
        let tags = if bits.get(0) {
            let count = read_varint(&mut buf)?;
            let mut tags = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let tag = read_varstring(&mut buf)?;
                let index = read_i32_le(&mut buf)?;
                tags.push((tag, index));
            }
            Some(tags)
        } else {
            None
        };
        Ok(ServerTags { tags })
    }
}

// === World (misc) ===

/// UnloadChunk (id 135).
#[derive(Debug, Clone, Copy)]
pub struct UnloadChunk {
    pub chunk_x: i32,
    pub chunk_z: i32,
}

impl UnloadChunk {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.chunk_x);
        buf.put_i32_le(self.chunk_z);
    }
}

/// SetTime (id 125): world time in ticks.
#[derive(Debug, Clone, Copy)]
pub struct SetTime {
    pub time: i64,
}

impl SetTime {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i64_le(self.time);
    }
}

/// SetWeather (id 126): weather ordinal plus intensity.
#[derive(Debug, Clone, Copy)]
pub struct SetWeather {
    pub weather: u8,
    pub intensity: f32,
}

impl SetWeather {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.weather);
        buf.put_f32_le(self.intensity);
    }
}

// === Entity (singles) ===

/// SpawnEntity (id 163): one entity with full pose, plus an optional
/// display name inline.
#[derive(Debug, Clone)]
pub struct SpawnEntity {
    pub entity_id: i32,
    pub entity_type: i32,
    pub uuid: Uuid,
    pub position: Position,
    pub rotation: Quaternion,
    pub velocity: Velocity,
    pub display_name: Option<String>,
}

impl SpawnEntity {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.display_name.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.entity_id);
        buf.put_i32_le(self.entity_type);
        write_uuid(buf, &self.uuid);
        write_position(buf, &self.position);
        write_quaternion(buf, &self.rotation);
        write_velocity(buf, &self.velocity);
        if let Some(name) = &self.display_name {
            write_varstring(buf, name);
        }
    }
}

/// DespawnEntity (id 164).
#[derive(Debug, Clone, Copy)]
pub struct DespawnEntity {
    pub entity_id: i32,
    pub silent: bool,
}

impl DespawnEntity {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.entity_id);
        buf.put_u8(self.silent as u8);
    }
}

/// EntityPosition (id 157): absolute position correction for one entity.
#[derive(Debug, Clone)]
pub struct EntityPosition {
    pub entity_id: i32,
    pub position: Position,
}

impl EntityPosition {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        buf.put_i32_le(self.entity_id);
        write_position(buf, &self.position);
    }
}

/// SetHealth (id 166).
#[derive(Debug, Clone, Copy)]
pub struct SetHealth {
    pub current: f32,
    pub max: f32,
}

impl SetHealth {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        buf.put_f32_le(self.current);
        buf.put_f32_le(self.max);
    }
}

// === Interface ===

/// ServerMessage (id 210): untargeted text from the server, inline.
#[derive(Debug, Clone, Default)]
pub struct ServerMessage {
    pub message: Option<String>,
}

impl ServerMessage {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.message.is_some());
        buf.put_u8(bits.0);
        if let Some(message) = &self.message {
            write_varstring(buf, message);
        }
    }
}

/// ChatMessage (id 211): sender plus body behind a two-entry offset
/// table.
#[derive(Debug, Clone, Default)]
pub struct ChatMessage {
    pub sender: Option<String>,
    pub message: Option<String>,
}

impl ChatMessage {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.sender.is_some());
        bits.set(1, self.message.is_some());
        buf.put_u8(bits.0);
        let table = OffsetTable::reserve(buf, 2);
        if let Some(sender) = &self.sender {
            table.mark(buf, 0);
            write_varstring(buf, sender);
        }
        if let Some(message) = &self.message {
            table.mark(buf, 1);
            write_varstring(buf, message);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut fixed = payload;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(fixed.get_u8());
        let vars = VarBlock::read(payload, &mut fixed, 2)?;
        let sender = match vars.field(0)? {
            Some(mut f) if bits.get(0) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        let message = match vars.field(1)? {
            Some(mut f) if bits.get(1) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        Ok(ChatMessage { sender, message })
    }
}

/// ServerInfo (id 223): max player count plus name/motd behind a
/// two-entry offset table.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub max_players: i32,
    pub server_name: Option<String>,
    pub motd: Option<String>,
}

impl ServerInfo {
    pub fn encode(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.server_name.is_some());
        bits.set(1, self.motd.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.max_players);
        let table = OffsetTable::reserve(buf, 2);
        if let Some(name) = &self.server_name {
            table.mark(buf, 0);
            write_varstring(buf, name);
        }
        if let Some(motd) = &self.motd {
            table.mark(buf, 1);
            write_varstring(buf, motd);
        }
    }

    pub fn decode(payload: &[u8]) -> CodecResult<Self> {
        let mut fixed = payload;
        if !fixed.has_remaining() {
            return Err(CodecError::EndOfStream);
        }
        let bits = NullBits(fixed.get_u8());
        let max_players = read_i32_le(&mut fixed)?;
        let vars = VarBlock::read(payload, &mut fixed, 2)?;
        let server_name = match vars.field(0)? {
            Some(mut f) if bits.get(0) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        let motd = match vars.field(1)? {
            Some(mut f) if bits.get(1) => Some(read_varstring(&mut f)?),
            _ => None,
        };
        Ok(ServerInfo {
            max_players,
            server_name,
            motd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_to_vec(f: impl FnOnce(&mut BytesMut)) -> Vec<u8> {
        let mut buf = BytesMut::new();
        f(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn connect_roundtrip() {
        let packet = Connect {
            protocol_crc: crate::PROTOCOL_CRC,
            protocol_build: crate::PROTOCOL_BUILD,
            client_type: 0,
            uuid: Uuid::new_v4(),
            language: Some("en_US".into()),
            identity_token: None,
            username: "Test".into(),
            referral_data: None,
            referral_source: Some(HostAddress {
                port: 5520,
                host: "play.example".into(),
            }),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        let decoded = Connect::decode(&bytes).unwrap();
        assert_eq!(decoded.protocol_crc, packet.protocol_crc);
        assert_eq!(decoded.protocol_build, packet.protocol_build);
        assert_eq!(decoded.uuid, packet.uuid);
        assert_eq!(decoded.language.as_deref(), Some("en_US"));
        assert_eq!(decoded.identity_token, None);
        assert_eq!(decoded.username, "Test");
        assert_eq!(decoded.referral_source, packet.referral_source);
    }

    #[test]
    fn connect_fixed_block_is_46_bytes() {
        let packet = Connect {
            protocol_crc: 0,
            protocol_build: 0,
            client_type: 0,
            uuid: Uuid::nil(),
            language: None,
            identity_token: None,
            username: String::new(),
            referral_data: None,
            referral_source: None,
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        // null-bits + crc + build + type + uuid + 5 offsets, then the
        // empty username VarString.
        assert_eq!(bytes.len(), 46 + 1);
        // username offset is the third table entry, pointing at 0.
        assert_eq!(&bytes[34..38], &0i32.to_le_bytes());
        // absent fields keep -1.
        assert_eq!(&bytes[26..30], &(-1i32).to_le_bytes());
    }

    #[test]
    fn connect_accept_empty_is_one_byte() {
        let bytes = encode_to_vec(|buf| ConnectAccept::default().encode(buf));
        assert_eq!(bytes, vec![0x00]);
    }

    #[test]
    fn disconnect_reason_inline() {
        let packet = Disconnect {
            kind: DisconnectType::Kick,
            reason: Some("bye".into()),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 1);
        let decoded = Disconnect::decode(&bytes).unwrap();
        assert_eq!(decoded.kind, DisconnectType::Kick);
        assert_eq!(decoded.reason.as_deref(), Some("bye"));
    }

    #[test]
    fn world_settings_without_assets_is_five_bytes() {
        let packet = WorldSettings {
            world_height: 320,
            required_assets: None,
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(&bytes[1..5], &320i32.to_le_bytes());
    }

    #[test]
    fn server_info_layout() {
        let packet = ServerInfo {
            max_players: 100,
            server_name: Some("zytale".into()),
            motd: Some("hello".into()),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes[0], 0x03);
        // fixed block: bits + max_players + two offsets = 13 bytes.
        assert_eq!(&bytes[5..9], &0i32.to_le_bytes());
        let name_len = "zytale".len() + 1;
        assert_eq!(&bytes[9..13], &(name_len as i32).to_le_bytes());
        assert_eq!(bytes.len(), 13 + name_len + "hello".len() + 1);
        let decoded = ServerInfo::decode(&bytes).unwrap();
        assert_eq!(decoded.server_name.as_deref(), Some("zytale"));
        assert_eq!(decoded.motd.as_deref(), Some("hello"));
    }

    #[test]
    fn token_pair_absent_fields() {
        let packet = TokenPair::default();
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(&bytes[1..5], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[5..9], &(-1i32).to_le_bytes());
        let decoded = TokenPair::decode(&bytes).unwrap();
        assert!(decoded.first.is_none() && decoded.second.is_none());
    }

    #[test]
    fn set_chunk_roundtrip() {
        let packet = SetChunk {
            chunk_x: -3,
            section_y: 7,
            chunk_z: 12,
            local_light: None,
            global_light: None,
            data: Some(vec![0, 0, 0]),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes[0], 0x04);
        let decoded = SetChunk::decode(&bytes).unwrap();
        assert_eq!(decoded.chunk_x, -3);
        assert_eq!(decoded.section_y, 7);
        assert_eq!(decoded.chunk_z, 12);
        assert!(decoded.local_light.is_none());
        assert_eq!(decoded.data.as_deref(), Some(&[0u8, 0, 0][..]));
    }

    #[test]
    fn client_movement_roundtrip() {
        let packet = ClientMovement {
            position: Position::new(1.5, 64.0, -2.5),
            direction: Direction {
                yaw: 90.0,
                pitch: -10.0,
                roll: 0.0,
            },
            input_flags: 0b101,
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes.len(), 38);
        let decoded = ClientMovement::decode(&bytes).unwrap();
        assert_eq!(decoded.position, packet.position);
        assert_eq!(decoded.input_flags, 0b101);
    }

    #[test]
    fn client_referral_roundtrip() {
        let packet = ClientReferral {
            target: Some(HostAddress {
                port: 5521,
                host: "lobby.example".into(),
            }),
            referral_token: None,
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes[0], 0x01);
        let decoded = ClientReferral::decode(&bytes).unwrap();
        assert_eq!(decoded.target, packet.target);
        assert!(decoded.referral_token.is_none());
    }

    #[test]
    fn host_address_port_is_big_endian() {
        let mut buf = BytesMut::new();
        write_host_address(
            &mut buf,
            &HostAddress {
                port: 5520,
                host: "h".into(),
            },
        );
        assert_eq!(&buf[..2], &5520u16.to_be_bytes());
    }

    #[test]
    fn password_response_roundtrip() {
        let packet = PasswordResponse {
            response: Some(vec![9, 8, 7]),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        let decoded = PasswordResponse::decode(&bytes).unwrap();
        assert_eq!(decoded.response.as_deref(), Some(&[9u8, 8, 7][..]));

        let empty = PasswordResponse::decode(&[0x00]).unwrap();
        assert!(empty.response.is_none());
    }

    #[test]
    fn server_tags_roundtrip() {
        let packet = ServerTags {
            tags: Some(vec![("solid".into(), 0), ("flammable".into(), 1)]),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        let decoded = ServerTags::decode(&bytes).unwrap();
        assert_eq!(decoded.tags, packet.tags);
    }

    #[test]
    fn chat_message_roundtrip() {
        let packet = ChatMessage {
            sender: Some("Test".into()),
            message: Some("hello world".into()),
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes[0], 0x03);
        let decoded = ChatMessage::decode(&bytes).unwrap();
        assert_eq!(decoded.sender.as_deref(), Some("Test"));
        assert_eq!(decoded.message.as_deref(), Some("hello world"));
    }

    #[test]
    fn spawn_entity_fixed_size() {
        let packet = SpawnEntity {
            entity_id: 7,
            entity_type: 1,
            uuid: Uuid::nil(),
            position: Position::default(),
            rotation: Quaternion::IDENTITY,
            velocity: Velocity::default(),
            display_name: None,
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        // bits + id + type + uuid + position + quaternion + velocity.
        assert_eq!(bytes.len(), 1 + 4 + 4 + 16 + 24 + 16 + 12);
    }

    #[test]
    fn entity_updates_single_add() {
        let packet = EntityUpdates {
            updates: vec![EntityUpdate {
                entity_id: 1,
                kind: EntityUpdateKind::Add,
                uuid: Uuid::nil(),
                position: Position::new(0.5, 64.0, 0.5),
                rotation: Quaternion::IDENTITY,
                velocity: Velocity::default(),
            }],
        };
        let bytes = encode_to_vec(|buf| packet.encode(buf));
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 1);
        // entry: id + kind + uuid + position + quaternion + velocity.
        assert_eq!(bytes.len(), 2 + 4 + 1 + 16 + 24 + 16 + 12);
    }
}
