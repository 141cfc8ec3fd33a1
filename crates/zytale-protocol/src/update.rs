//! The Update-packet family, expressed as data.
//!
//! Every UpdateXxx packet shares one dictionary shape: null-bits, an
//! UpdateType byte, the family's fixed scalars, then a VarInt entry count
//! and the entries. Integer-keyed families carry a 4-byte `maxId` right
//! after the type byte; families with extra booleans place them between
//! `maxId` and the count; the items family additionally carries a
//! two-entry offset prologue for its auxiliary payloads. Encoders are
//! generated from [`UPDATE_FAMILIES`], so every family's baseline shape
//! comes from one table rather than sixty hand-written writers.

use bytes::{BufMut, BytesMut};

use crate::codec::{write_varint, write_varstring};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateType {
    Init = 0,
    AddOrUpdate = 1,
    Remove = 2,
}

/// How dictionary entries are keyed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// `[i32 index][body]` entries, with a `maxId` word in the header.
    Int,
    /// `[VarString key][body]` entries, no `maxId`.
    Str,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateFamily {
    pub id: u16,
    pub name: &'static str,
    pub key: KeyKind,
    /// Family-specific fixed booleans between `maxId` and the count
    /// (block_types carries four rebuild flags, environments one).
    pub bool_scalars: u8,
    /// Offset words reserved ahead of the count for auxiliary variable
    /// fields (items only).
    pub offset_slots: u8,
    pub compressed: bool,
}

macro_rules! update_families {
    ( $( $id:literal => $name:literal, $key:ident $(, bools = $bools:literal )? $(, offsets = $offsets:literal )? ; )* ) => {
        pub const UPDATE_FAMILIES: &[UpdateFamily] = &[
            $( UpdateFamily {
                id: $id,
                name: $name,
                key: KeyKind::$key,
                bool_scalars: 0 $( + $bools )?,
                offset_slots: 0 $( + $offsets )?,
                compressed: true,
            }, )*
        ];
    };
}

update_families! {
    40 => "block_types", Int, bools = 4;
    41 => "block_sets", Int;
    42 => "block_sounds", Int;
    43 => "block_particles", Int;
    44 => "fluid_types", Int;
    45 => "items", Int, offsets = 2;
    46 => "item_categories", Int;
    47 => "item_sounds", Int;
    48 => "recipes", Int;
    49 => "entity_types", Int;
    50 => "entity_stats", Int;
    51 => "entity_sounds", Int;
    52 => "entity_effects", Int;
    53 => "projectiles", Int;
    54 => "audio_categories", Int;
    55 => "sound_events", Int;
    56 => "music_tracks", Int;
    57 => "ambience_beds", Int;
    58 => "reverb_effects", Int;
    59 => "equalizer_effects", Int;
    60 => "particle_systems", Int;
    61 => "particle_emitters", Int;
    62 => "environments", Int, bools = 1;
    63 => "weather_types", Int;
    64 => "biome_tints", Int;
    65 => "tag_patterns", Int;
    66 => "tags", Int;
    67 => "damage_types", Int;
    68 => "status_effects", Int;
    69 => "animations", Int;
    70 => "model_skeletons", Int;
    71 => "model_attachments", Int;
    72 => "interface_pages", Int;
    73 => "hud_components", Int;
    74 => "fonts", Int;
    75 => "languages", Int;
    76 => "input_bindings", Int;
    77 => "camera_profiles", Int;
    78 => "light_profiles", Int;
    79 => "fog_profiles", Int;
    80 => "trails", Str;
    81 => "player_skins", Str;
    82 => "skin_parts", Str;
    83 => "emotes", Str;
    84 => "gestures", Str;
    85 => "portraits", Str;
    86 => "icons", Str;
    87 => "cursors", Str;
    88 => "crosshairs", Str;
    89 => "loading_tips", Str;
    90 => "credits_entries", Str;
    91 => "chat_channels", Str;
    92 => "command_aliases", Str;
    93 => "help_topics", Str;
    94 => "tutorial_steps", Str;
    95 => "objective_markers", Str;
    96 => "map_markers", Str;
    97 => "waypoint_styles", Str;
    98 => "nameplate_styles", Str;
    99 => "killfeed_styles", Str;
}

pub fn family_by_name(name: &str) -> Option<&'static UpdateFamily> {
    UPDATE_FAMILIES.iter().find(|f| f.name == name)
}

pub fn family_by_id(id: u16) -> Option<&'static UpdateFamily> {
    UPDATE_FAMILIES.iter().find(|f| f.id == id)
}

/// A dictionary entry ready to be written: its key and pre-encoded body.
#[derive(Debug, Clone)]
pub enum UpdateEntry {
    Int(i32, Vec<u8>),
    Str(String, Vec<u8>),
}

/// Encode one complete UpdateXxx payload.
///
/// The dictionary is always present (null-bits bit 0 set, count >= 0),
/// even when empty: the client tells "unknown family" from "known-empty
/// family" by the presence bit. `bools` must match the family's
/// `bool_scalars` count; missing values are written as false.
pub fn encode_update(
    family: &UpdateFamily,
    update_type: UpdateType,
    max_id: u32,
    bools: &[bool],
    entries: &[UpdateEntry],
) -> BytesMut {
    debug_assert!(bools.len() <= family.bool_scalars as usize);
    let mut buf = BytesMut::new();
    buf.put_u8(0x01);
    buf.put_u8(update_type as u8);
    if family.key == KeyKind::Int {
        buf.put_u32_le(max_id);
    }
    for i in 0..family.bool_scalars as usize {
        buf.put_u8(bools.get(i).copied().unwrap_or(false) as u8);
    }
    for _ in 0..family.offset_slots {
        buf.put_i32_le(-1);
    }
    write_varint(&mut buf, entries.len() as u32);
    for entry in entries {
        match entry {
            UpdateEntry::Int(index, body) => {
                debug_assert_eq!(family.key, KeyKind::Int);
                buf.put_i32_le(*index);
                buf.put_slice(body);
            }
            UpdateEntry::Str(key, body) => {
                debug_assert_eq!(family.key, KeyKind::Str);
                write_varstring(&mut buf, key);
                buf.put_slice(body);
            }
        }
    }
    buf
}

/// Byte length of a family's well-formed empty Init payload.
pub fn empty_baseline_len(family: &UpdateFamily) -> usize {
    let max_id = if family.key == KeyKind::Int { 4 } else { 0 };
    1 + 1 + max_id + family.bool_scalars as usize + family.offset_slots as usize * 4 + 1
}
