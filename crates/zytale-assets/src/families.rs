//! Decoded asset records and their wire bodies.
//!
//! JSON comes from the archive one file per asset; the asset id is the
//! filename stem. Gain-like fields arrive in decibels and are converted
//! to linear at decode time. Wire bodies follow the packet layout rules:
//! a trailing single variable field is written inline, multiple variable
//! fields go behind an offset table.

use bytes::{BufMut, BytesMut};
use serde::Deserialize;

use zytale_protocol::codec::{write_varint, write_varstring};
use zytale_protocol::packets::{NullBits, OffsetTable};

/// dB to linear amplitude.
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

// === Audio categories ===

#[derive(Debug, Clone, PartialEq)]
pub struct AudioCategory {
    pub id: String,
    /// Linear volume.
    pub volume: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AudioCategoryJson {
    id: Option<String>,
    volume: Option<f32>,
    volume_db: Option<f32>,
}

impl AudioCategory {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: AudioCategoryJson = serde_json::from_slice(data)?;
        let volume = json
            .volume
            .or_else(|| json.volume_db.map(db_to_linear))
            .unwrap_or(1.0);
        Ok(AudioCategory {
            id: json.id.unwrap_or_else(|| id.to_owned()),
            volume,
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, true);
        buf.put_u8(bits.0);
        buf.put_f32_le(self.volume);
        write_varstring(buf, &self.id);
    }
}

// === Reverb effects ===

/// Thirteen floats, one flag, optional id. The five gain fields arrive
/// in dB and are stored linear.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverbEffect {
    pub density: f32,
    pub diffusion: f32,
    pub gain: f32,
    pub high_frequency_gain: f32,
    pub decay_time: f32,
    pub decay_high_frequency_ratio: f32,
    pub reflection_gain: f32,
    pub reflection_delay: f32,
    pub late_reverb_gain: f32,
    pub late_reverb_delay: f32,
    pub room_rolloff_factor: f32,
    pub air_absorption_high_frequency_gain: f32,
    pub echo_depth: f32,
    pub decay_high_frequency_limit: bool,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReverbEffectJson {
    id: Option<String>,
    density: Option<f32>,
    diffusion: Option<f32>,
    gain: Option<f32>,
    high_frequency_gain: Option<f32>,
    decay_time: Option<f32>,
    decay_high_frequency_ratio: Option<f32>,
    reflection_gain: Option<f32>,
    reflection_delay: Option<f32>,
    late_reverb_gain: Option<f32>,
    late_reverb_delay: Option<f32>,
    room_rolloff_factor: Option<f32>,
    // The first spelling is a typo present in assets on disk.
    #[serde(
        alias = "AirAbsorbptionHighFrequencyGain",
        alias = "AirAbsorptionHFGain"
    )]
    air_absorption_high_frequency_gain: Option<f32>,
    echo_depth: Option<f32>,
    decay_high_frequency_limit: Option<bool>,
}

impl ReverbEffect {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: ReverbEffectJson = serde_json::from_slice(data)?;
        Ok(ReverbEffect {
            density: json.density.unwrap_or(1.0),
            diffusion: json.diffusion.unwrap_or(1.0),
            gain: db_to_linear(json.gain.unwrap_or(0.0)),
            high_frequency_gain: db_to_linear(json.high_frequency_gain.unwrap_or(0.0)),
            decay_time: json.decay_time.unwrap_or(1.49),
            decay_high_frequency_ratio: json.decay_high_frequency_ratio.unwrap_or(0.83),
            reflection_gain: db_to_linear(json.reflection_gain.unwrap_or(0.0)),
            reflection_delay: json.reflection_delay.unwrap_or(0.007),
            late_reverb_gain: db_to_linear(json.late_reverb_gain.unwrap_or(0.0)),
            late_reverb_delay: json.late_reverb_delay.unwrap_or(0.011),
            room_rolloff_factor: json.room_rolloff_factor.unwrap_or(0.0),
            air_absorption_high_frequency_gain: db_to_linear(
                json.air_absorption_high_frequency_gain.unwrap_or(0.0),
            ),
            echo_depth: json.echo_depth.unwrap_or(0.0),
            decay_high_frequency_limit: json.decay_high_frequency_limit.unwrap_or(true),
            id: json.id.or_else(|| Some(id.to_owned())),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.id.is_some());
        buf.put_u8(bits.0);
        for value in [
            self.density,
            self.diffusion,
            self.gain,
            self.high_frequency_gain,
            self.decay_time,
            self.decay_high_frequency_ratio,
            self.reflection_gain,
            self.reflection_delay,
            self.late_reverb_gain,
            self.late_reverb_delay,
            self.room_rolloff_factor,
            self.air_absorption_high_frequency_gain,
            self.echo_depth,
        ] {
            buf.put_f32_le(value);
        }
        buf.put_u8(self.decay_high_frequency_limit as u8);
        // The id is the single trailing variable field: inline, no
        // offset word.
        if let Some(id) = &self.id {
            write_varstring(buf, id);
        }
    }
}

// === Equalizer effects ===

#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerEffect {
    pub low_gain: f32,
    pub low_cutoff: f32,
    pub mid1_gain: f32,
    pub mid1_center: f32,
    pub mid1_width: f32,
    pub mid2_gain: f32,
    pub mid2_center: f32,
    pub mid2_width: f32,
    pub high_gain: f32,
    pub high_cutoff: f32,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EqualizerEffectJson {
    id: Option<String>,
    low_gain: Option<f32>,
    low_cutoff: Option<f32>,
    mid1_gain: Option<f32>,
    mid1_center: Option<f32>,
    mid1_width: Option<f32>,
    mid2_gain: Option<f32>,
    mid2_center: Option<f32>,
    mid2_width: Option<f32>,
    high_gain: Option<f32>,
    high_cutoff: Option<f32>,
}

impl EqualizerEffect {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: EqualizerEffectJson = serde_json::from_slice(data)?;
        Ok(EqualizerEffect {
            low_gain: json.low_gain.unwrap_or(1.0),
            low_cutoff: json.low_cutoff.unwrap_or(200.0),
            mid1_gain: json.mid1_gain.unwrap_or(1.0),
            mid1_center: json.mid1_center.unwrap_or(500.0),
            mid1_width: json.mid1_width.unwrap_or(1.0),
            mid2_gain: json.mid2_gain.unwrap_or(1.0),
            mid2_center: json.mid2_center.unwrap_or(3000.0),
            mid2_width: json.mid2_width.unwrap_or(1.0),
            high_gain: json.high_gain.unwrap_or(1.0),
            high_cutoff: json.high_cutoff.unwrap_or(6000.0),
            id: json.id.or_else(|| Some(id.to_owned())),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.id.is_some());
        buf.put_u8(bits.0);
        for value in [
            self.low_gain,
            self.low_cutoff,
            self.mid1_gain,
            self.mid1_center,
            self.mid1_width,
            self.mid2_gain,
            self.mid2_center,
            self.mid2_width,
            self.high_gain,
            self.high_cutoff,
        ] {
            buf.put_f32_le(value);
        }
        if let Some(id) = &self.id {
            write_varstring(buf, id);
        }
    }
}

// === Tag patterns ===

/// A recursive match expression over tags: a node type, a tag index,
/// an optional operand list, and an optional negated child.
#[derive(Debug, Clone, PartialEq)]
pub struct TagPattern {
    pub pattern_type: u8,
    pub tag_index: i32,
    pub operands: Option<Vec<TagPattern>>,
    pub negated: Option<Box<TagPattern>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TagPatternJson {
    #[serde(rename = "Type")]
    pattern_type: Option<u8>,
    tag: Option<i32>,
    operands: Option<Vec<TagPatternJson>>,
    negated: Option<Box<TagPatternJson>>,
}

impl From<TagPatternJson> for TagPattern {
    fn from(json: TagPatternJson) -> Self {
        TagPattern {
            pattern_type: json.pattern_type.unwrap_or(0),
            tag_index: json.tag.unwrap_or(-1),
            operands: json
                .operands
                .map(|list| list.into_iter().map(TagPattern::from).collect()),
            negated: json.negated.map(|child| Box::new(TagPattern::from(*child))),
        }
    }
}

impl TagPattern {
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: TagPatternJson = serde_json::from_slice(data)?;
        Ok(TagPattern::from(json))
    }

    /// Encode a whole pattern tree. Every nested node's offset words are
    /// relative to the root node's variable block, so the root origin is
    /// threaded through the recursion.
    pub fn encode_entry(&self, buf: &mut BytesMut) {
        self.encode_node(buf, None);
    }

    fn encode_node(&self, buf: &mut BytesMut, outer_origin: Option<usize>) {
        let mut bits = NullBits::default();
        bits.set(0, self.operands.is_some());
        bits.set(1, self.negated.is_some());
        buf.put_u8(bits.0);
        buf.put_u8(self.pattern_type);
        buf.put_i32_le(self.tag_index);
        let table = OffsetTable::reserve(buf, 2);
        let origin = outer_origin.unwrap_or_else(|| table.origin());
        if let Some(operands) = &self.operands {
            table.mark_from(buf, 0, origin);
            write_varint(buf, operands.len() as u32);
            for operand in operands {
                operand.encode_node(buf, Some(origin));
            }
        }
        if let Some(negated) = &self.negated {
            table.mark_from(buf, 1, origin);
            negated.encode_node(buf, Some(origin));
        }
    }
}

// === Trails ===

/// One rendered edge of a trail ribbon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailEdge {
    /// RGBA color.
    pub color: u32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    pub lifetime_seconds: f32,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    pub segment_length: f32,
    pub max_segments: i32,
    pub width_start: f32,
    pub width_end: f32,
    pub alpha_start: f32,
    pub alpha_end: f32,
    pub tile_rate: f32,
    pub emission_rate: f32,
    pub gravity: f32,
    pub drag: f32,
    pub billboarded: bool,
    pub additive: bool,
    pub head_edge: Option<TrailEdge>,
    pub tail_edge: Option<TrailEdge>,
    pub texture: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrailEdgeJson {
    color: Option<u32>,
    width: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrailJson {
    id: Option<String>,
    lifetime_seconds: Option<f32>,
    fade_in_seconds: Option<f32>,
    fade_out_seconds: Option<f32>,
    segment_length: Option<f32>,
    max_segments: Option<i32>,
    width_start: Option<f32>,
    width_end: Option<f32>,
    alpha_start: Option<f32>,
    alpha_end: Option<f32>,
    tile_rate: Option<f32>,
    emission_rate: Option<f32>,
    gravity: Option<f32>,
    drag: Option<f32>,
    billboarded: Option<bool>,
    additive: Option<bool>,
    head_edge: Option<TrailEdgeJson>,
    tail_edge: Option<TrailEdgeJson>,
    texture: Option<String>,
}

impl Trail {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: TrailJson = serde_json::from_slice(data)?;
        let edge = |e: TrailEdgeJson| TrailEdge {
            color: e.color.unwrap_or(0xFFFF_FFFF),
            width: e.width.unwrap_or(1.0),
        };
        Ok(Trail {
            lifetime_seconds: json.lifetime_seconds.unwrap_or(1.0),
            fade_in_seconds: json.fade_in_seconds.unwrap_or(0.0),
            fade_out_seconds: json.fade_out_seconds.unwrap_or(0.25),
            segment_length: json.segment_length.unwrap_or(0.1),
            max_segments: json.max_segments.unwrap_or(64),
            width_start: json.width_start.unwrap_or(1.0),
            width_end: json.width_end.unwrap_or(1.0),
            alpha_start: json.alpha_start.unwrap_or(1.0),
            alpha_end: json.alpha_end.unwrap_or(0.0),
            tile_rate: json.tile_rate.unwrap_or(1.0),
            emission_rate: json.emission_rate.unwrap_or(30.0),
            gravity: json.gravity.unwrap_or(0.0),
            drag: json.drag.unwrap_or(0.0),
            billboarded: json.billboarded.unwrap_or(true),
            additive: json.additive.unwrap_or(false),
            head_edge: json.head_edge.map(edge),
            tail_edge: json.tail_edge.map(edge),
            texture: json.texture,
            id: json.id.or_else(|| Some(id.to_owned())),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.head_edge.is_some());
        bits.set(1, self.tail_edge.is_some());
        bits.set(2, self.texture.is_some());
        bits.set(3, self.id.is_some());
        buf.put_u8(bits.0);
        for value in [
            self.lifetime_seconds,
            self.fade_in_seconds,
            self.fade_out_seconds,
            self.segment_length,
        ] {
            buf.put_f32_le(value);
        }
        buf.put_i32_le(self.max_segments);
        for value in [
            self.width_start,
            self.width_end,
            self.alpha_start,
            self.alpha_end,
            self.tile_rate,
            self.emission_rate,
            self.gravity,
            self.drag,
        ] {
            buf.put_f32_le(value);
        }
        buf.put_u8(self.billboarded as u8);
        buf.put_u8(self.additive as u8);
        let table = OffsetTable::reserve(buf, 4);
        let write_edge = |buf: &mut BytesMut, edge: &TrailEdge| {
            buf.put_u32_le(edge.color);
            buf.put_f32_le(edge.width);
        };
        if let Some(edge) = &self.head_edge {
            table.mark(buf, 0);
            write_edge(buf, edge);
        }
        if let Some(edge) = &self.tail_edge {
            table.mark(buf, 1);
            write_edge(buf, edge);
        }
        if let Some(texture) = &self.texture {
            table.mark(buf, 2);
            write_varstring(buf, texture);
        }
        if let Some(id) = &self.id {
            table.mark(buf, 3);
            write_varstring(buf, id);
        }
    }
}

// === Sound events ===

/// A playable sound: one or more clip paths with gain and pitch spread,
/// tied to an audio category by index.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub category_index: i32,
    /// Linear gain.
    pub gain: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub clips: Vec<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SoundEventJson {
    id: Option<String>,
    category_index: Option<i32>,
    gain: Option<f32>,
    gain_db: Option<f32>,
    pitch_min: Option<f32>,
    pitch_max: Option<f32>,
    clips: Option<Vec<String>>,
}

impl SoundEvent {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: SoundEventJson = serde_json::from_slice(data)?;
        let gain = json
            .gain
            .or_else(|| json.gain_db.map(db_to_linear))
            .unwrap_or(1.0);
        Ok(SoundEvent {
            category_index: json.category_index.unwrap_or(-1),
            gain,
            pitch_min: json.pitch_min.unwrap_or(1.0),
            pitch_max: json.pitch_max.unwrap_or(1.0),
            clips: json.clips.unwrap_or_default(),
            id: json.id.or_else(|| Some(id.to_owned())),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, true);
        bits.set(1, self.id.is_some());
        buf.put_u8(bits.0);
        buf.put_i32_le(self.category_index);
        buf.put_f32_le(self.gain);
        buf.put_f32_le(self.pitch_min);
        buf.put_f32_le(self.pitch_max);
        let table = OffsetTable::reserve(buf, 2);
        table.mark(buf, 0);
        write_varint(buf, self.clips.len() as u32);
        for clip in &self.clips {
            write_varstring(buf, clip);
        }
        if let Some(id) = &self.id {
            table.mark(buf, 1);
            write_varstring(buf, id);
        }
    }
}

// === Music tracks ===

#[derive(Debug, Clone, PartialEq)]
pub struct MusicTrack {
    /// Linear gain.
    pub gain: f32,
    pub looping: bool,
    pub crossfade_seconds: f32,
    pub file: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MusicTrackJson {
    id: Option<String>,
    gain: Option<f32>,
    gain_db: Option<f32>,
    looping: Option<bool>,
    crossfade_seconds: Option<f32>,
    file: Option<String>,
}

impl MusicTrack {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: MusicTrackJson = serde_json::from_slice(data)?;
        let gain = json
            .gain
            .or_else(|| json.gain_db.map(db_to_linear))
            .unwrap_or(1.0);
        Ok(MusicTrack {
            gain,
            looping: json.looping.unwrap_or(true),
            crossfade_seconds: json.crossfade_seconds.unwrap_or(2.0),
            file: json.file,
            id: json.id.or_else(|| Some(id.to_owned())),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.file.is_some());
        bits.set(1, self.id.is_some());
        buf.put_u8(bits.0);
        buf.put_f32_le(self.gain);
        buf.put_u8(self.looping as u8);
        buf.put_f32_le(self.crossfade_seconds);
        let table = OffsetTable::reserve(buf, 2);
        if let Some(file) = &self.file {
            table.mark(buf, 0);
            write_varstring(buf, file);
        }
        if let Some(id) = &self.id {
            table.mark(buf, 1);
            write_varstring(buf, id);
        }
    }
}

// === Weather types ===

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherType {
    /// ARGB sky tint.
    pub sky_tint: u32,
    pub fog_density: f32,
    pub wind_strength: f32,
    pub precipitation: u8,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WeatherTypeJson {
    id: Option<String>,
    sky_tint: Option<u32>,
    fog_density: Option<f32>,
    wind_strength: Option<f32>,
    precipitation: Option<u8>,
}

impl WeatherType {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: WeatherTypeJson = serde_json::from_slice(data)?;
        Ok(WeatherType {
            sky_tint: json.sky_tint.unwrap_or(0xFF87_CEEB),
            fog_density: json.fog_density.unwrap_or(0.0),
            wind_strength: json.wind_strength.unwrap_or(0.0),
            precipitation: json.precipitation.unwrap_or(0),
            id: json.id.or_else(|| Some(id.to_owned())),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.id.is_some());
        buf.put_u8(bits.0);
        buf.put_u32_le(self.sky_tint);
        buf.put_f32_le(self.fog_density);
        buf.put_f32_le(self.wind_strength);
        buf.put_u8(self.precipitation);
        if let Some(id) = &self.id {
            write_varstring(buf, id);
        }
    }
}

// === Environments ===

/// Per-environment visual settings. Only the water tint survives the
/// wire; everything else is treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDef {
    pub id: String,
    pub water_tint: Option<(u8, u8, u8)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnvironmentJson {
    id: Option<String>,
    water_tint: Option<[u8; 3]>,
}

impl EnvironmentDef {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: EnvironmentJson = serde_json::from_slice(data)?;
        Ok(EnvironmentDef {
            id: json.id.unwrap_or_else(|| id.to_owned()),
            water_tint: json.water_tint.map(|[r, g, b]| (r, g, b)),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, self.water_tint.is_some());
        buf.put_u8(bits.0);
        if let Some((r, g, b)) = self.water_tint {
            buf.put_u8(r);
            buf.put_u8(g);
            buf.put_u8(b);
        }
    }
}

// === Block types ===

#[derive(Debug, Clone, PartialEq)]
pub struct BlockType {
    pub name: String,
    pub solid: bool,
    pub opaque: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlockTypeJson {
    name: Option<String>,
    solid: Option<bool>,
    opaque: Option<bool>,
}

impl BlockType {
    pub fn from_json(id: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let json: BlockTypeJson = serde_json::from_slice(data)?;
        Ok(BlockType {
            name: json.name.unwrap_or_else(|| id.to_owned()),
            solid: json.solid.unwrap_or(true),
            opaque: json.opaque.unwrap_or(true),
        })
    }

    pub fn encode_entry(&self, buf: &mut BytesMut) {
        let mut bits = NullBits::default();
        bits.set(0, true);
        buf.put_u8(bits.0);
        buf.put_u8(self.solid as u8);
        buf.put_u8(self.opaque as u8);
        write_varstring(buf, &self.name);
    }
}
