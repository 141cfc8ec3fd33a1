use serde::{Deserialize, Serialize};

/// A double-precision position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A look direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Orientation as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Single-precision velocity vector, blocks per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Game mode assigned to a joining player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    Adventure = 0,
    Creative = 1,
}

impl GameMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GameMode::Adventure),
            1 => Some(GameMode::Creative),
            _ => None,
        }
    }
}

/// A host/port pair carried in referral packets. The port travels in
/// network byte order on the wire, unlike every other integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAddress {
    pub port: u16,
    pub host: String,
}
