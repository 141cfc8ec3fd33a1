//! Well-known packet ids used by the server's handlers. The full table
//! lives in [`crate::registry`].

pub const CONNECT: u32 = 0;
pub const DISCONNECT: u32 = 1;
pub const PING: u32 = 2;
pub const PONG: u32 = 3;

pub const STATUS: u32 = 10;
pub const AUTH_GRANT: u32 = 11;
pub const AUTH_TOKEN: u32 = 12;
pub const SERVER_AUTH_TOKEN: u32 = 13;
pub const CONNECT_ACCEPT: u32 = 14;
pub const PASSWORD_ACCEPTED: u32 = 16;

pub const WORLD_SETTINGS: u32 = 20;
pub const WORLD_LOAD_PROGRESS: u32 = 21;
pub const WORLD_LOAD_FINISHED: u32 = 22;
pub const REQUEST_ASSETS: u32 = 23;
pub const ASSET_INITIALIZE: u32 = 24;
pub const ASSET_PART: u32 = 25;
pub const ASSET_FINALIZE: u32 = 26;
pub const VIEW_RADIUS: u32 = 32;
pub const PLAYER_OPTIONS: u32 = 33;
pub const SET_CLIENT_ID: u32 = 35;

pub const JOIN_WORLD: u32 = 120;
pub const SET_GAME_MODE: u32 = 122;
pub const SET_ENTITY_SEED: u32 = 123;
pub const SET_CHUNK: u32 = 131;
pub const SET_CHUNK_HEIGHTMAP: u32 = 132;
pub const SET_CHUNK_TINTMAP: u32 = 133;
pub const SET_CHUNK_ENVIRONMENTS: u32 = 134;

pub const CLIENT_MOVEMENT: u32 = 150;
pub const CLIENT_READY: u32 = 151;
pub const ENTITY_UPDATES: u32 = 156;

pub const SERVER_INFO: u32 = 223;
