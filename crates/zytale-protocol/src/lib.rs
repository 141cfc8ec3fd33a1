pub mod codec;
pub mod compress;
pub mod frame;
pub mod ids;
pub mod packets;
pub mod registry;
pub mod update;

pub use codec::*;
pub use frame::{encode_frame, Frame, FrameReader, MAX_PAYLOAD_SIZE};
pub use registry::{descriptor, Category, PacketDescriptor};

/// CRC of the packet schema this server speaks.
pub const PROTOCOL_CRC: i32 = 1789265863;
/// Client build number this server speaks.
pub const PROTOCOL_BUILD: i32 = 2;
