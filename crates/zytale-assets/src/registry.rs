//! The indexed asset registry and Update-packet generation.
//!
//! Each implemented family loads its archive directory at startup (one
//! JSON file per asset, id = filename stem). A malformed file is logged
//! and skipped; it never aborts the family. During the loading phase the
//! registry emits exactly one Init-mode UpdateXxx payload for every
//! family in the table — loaded families with their entries, everything
//! else as a well-formed empty dictionary.

use bytes::BytesMut;
use tracing::{debug, warn};

use zytale_protocol::update::{
    encode_update, UpdateEntry, UpdateFamily, UpdateType, UPDATE_FAMILIES,
};

use crate::families::{
    AudioCategory, BlockType, EnvironmentDef, EqualizerEffect, MusicTrack, ReverbEffect,
    SoundEvent, TagPattern, Trail, WeatherType,
};
use crate::indexed::IndexedAssetMap;
use crate::store::AssetStore;

const AUDIO_CATEGORY_PREFIX: &str = "Server/Audio/AudioCategories/";
const SOUND_EVENT_PREFIX: &str = "Server/Audio/SoundEvents/";
const MUSIC_TRACK_PREFIX: &str = "Server/Audio/MusicTracks/";
const REVERB_PREFIX: &str = "Server/Audio/ReverbEffects/";
const EQUALIZER_PREFIX: &str = "Server/Audio/EqualizerEffects/";
const TAG_PATTERN_PREFIX: &str = "Server/TagPatterns/";
const TRAIL_PREFIX: &str = "Server/Trails/";
const WEATHER_PREFIX: &str = "Server/WeatherTypes/";
const ENVIRONMENT_PREFIX: &str = "Server/Environments/";
const BLOCK_TYPE_PREFIX: &str = "Server/BlockTypes/";

/// One generated UpdateXxx payload, ready for the send pipeline.
#[derive(Debug, Clone)]
pub struct UpdatePayload {
    pub id: u16,
    pub name: &'static str,
    pub payload: Vec<u8>,
}

pub struct AssetRegistry {
    pub audio_categories: IndexedAssetMap<AudioCategory>,
    pub sound_events: IndexedAssetMap<SoundEvent>,
    pub music_tracks: IndexedAssetMap<MusicTrack>,
    pub reverb_effects: IndexedAssetMap<ReverbEffect>,
    pub equalizer_effects: IndexedAssetMap<EqualizerEffect>,
    pub tag_patterns: IndexedAssetMap<TagPattern>,
    pub trails: IndexedAssetMap<Trail>,
    pub weather_types: IndexedAssetMap<WeatherType>,
    pub environments: IndexedAssetMap<EnvironmentDef>,
    pub block_types: IndexedAssetMap<BlockType>,
    /// Debug override: ship only the air entry in the block_types Update.
    minimal_blocks: bool,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            audio_categories: IndexedAssetMap::new(),
            sound_events: IndexedAssetMap::new(),
            music_tracks: IndexedAssetMap::new(),
            reverb_effects: IndexedAssetMap::new(),
            equalizer_effects: IndexedAssetMap::new(),
            tag_patterns: IndexedAssetMap::new(),
            trails: IndexedAssetMap::new(),
            weather_types: IndexedAssetMap::new(),
            environments: IndexedAssetMap::new(),
            block_types: IndexedAssetMap::new(),
            minimal_blocks: false,
        };
        registry.seed_builtin_blocks();
        registry
    }

    pub fn set_minimal_blocks(&mut self, minimal: bool) {
        self.minimal_blocks = minimal;
    }

    /// The flat generator writes these ids; their registry indices must
    /// match, so they are seeded before anything loads from the archive.
    fn seed_builtin_blocks(&mut self) {
        for (name, solid, opaque) in [
            ("air", false, false),
            ("bedrock", true, true),
            ("stone", true, true),
            ("dirt", true, true),
            ("grass", true, true),
        ] {
            self.block_types.put(
                name,
                BlockType {
                    name: name.to_owned(),
                    solid,
                    opaque,
                },
            );
        }
    }

    /// Walk every family directory in the archive. One bad file is
    /// logged and skipped, never fatal.
    pub fn load_from_store(&mut self, store: &AssetStore) {
        load_family(store, AUDIO_CATEGORY_PREFIX, |id, data| {
            AudioCategory::from_json(id, data).map(|v| self.audio_categories.put(id, v))
        });
        load_family(store, SOUND_EVENT_PREFIX, |id, data| {
            SoundEvent::from_json(id, data).map(|v| self.sound_events.put(id, v))
        });
        load_family(store, MUSIC_TRACK_PREFIX, |id, data| {
            MusicTrack::from_json(id, data).map(|v| self.music_tracks.put(id, v))
        });
        load_family(store, REVERB_PREFIX, |id, data| {
            ReverbEffect::from_json(id, data).map(|v| self.reverb_effects.put(id, v))
        });
        load_family(store, EQUALIZER_PREFIX, |id, data| {
            EqualizerEffect::from_json(id, data).map(|v| self.equalizer_effects.put(id, v))
        });
        load_family(store, TAG_PATTERN_PREFIX, |id, data| {
            TagPattern::from_json(data).map(|v| self.tag_patterns.put(id, v))
        });
        load_family(store, TRAIL_PREFIX, |id, data| {
            Trail::from_json(id, data).map(|v| self.trails.put(id, v))
        });
        load_family(store, WEATHER_PREFIX, |id, data| {
            WeatherType::from_json(id, data).map(|v| self.weather_types.put(id, v))
        });
        load_family(store, ENVIRONMENT_PREFIX, |id, data| {
            EnvironmentDef::from_json(id, data).map(|v| self.environments.put(id, v))
        });
        load_family(store, BLOCK_TYPE_PREFIX, |id, data| {
            BlockType::from_json(id, data).map(|v| self.block_types.put(id, v))
        });
        debug!(
            audio_categories = self.audio_categories.len(),
            sound_events = self.sound_events.len(),
            music_tracks = self.music_tracks.len(),
            weather_types = self.weather_types.len(),
            reverb_effects = self.reverb_effects.len(),
            equalizer_effects = self.equalizer_effects.len(),
            tag_patterns = self.tag_patterns.len(),
            trails = self.trails.len(),
            environments = self.environments.len(),
            block_types = self.block_types.len(),
            "asset registry loaded"
        );
    }

    /// One Init-mode payload per family in the table, exhaustively.
    pub fn generate_update_payloads(&self) -> Vec<UpdatePayload> {
        UPDATE_FAMILIES
            .iter()
            .map(|family| UpdatePayload {
                id: family.id,
                name: family.name,
                payload: self.encode_family(family).to_vec(),
            })
            .collect()
    }

    fn encode_family(&self, family: &'static UpdateFamily) -> BytesMut {
        match family.name {
            "audio_categories" => {
                let entries = int_entries(&self.audio_categories, AudioCategory::encode_entry);
                encode_update(family, UpdateType::Init, self.audio_categories.max_id(), &[], &entries)
            }
            "sound_events" => {
                let entries = int_entries(&self.sound_events, SoundEvent::encode_entry);
                encode_update(family, UpdateType::Init, self.sound_events.max_id(), &[], &entries)
            }
            "music_tracks" => {
                let entries = int_entries(&self.music_tracks, MusicTrack::encode_entry);
                encode_update(family, UpdateType::Init, self.music_tracks.max_id(), &[], &entries)
            }
            "weather_types" => {
                let entries = int_entries(&self.weather_types, WeatherType::encode_entry);
                encode_update(family, UpdateType::Init, self.weather_types.max_id(), &[], &entries)
            }
            "reverb_effects" => {
                let entries = int_entries(&self.reverb_effects, ReverbEffect::encode_entry);
                encode_update(family, UpdateType::Init, self.reverb_effects.max_id(), &[], &entries)
            }
            "equalizer_effects" => {
                let entries = int_entries(&self.equalizer_effects, EqualizerEffect::encode_entry);
                encode_update(family, UpdateType::Init, self.equalizer_effects.max_id(), &[], &entries)
            }
            "tag_patterns" => {
                let entries = int_entries(&self.tag_patterns, TagPattern::encode_entry);
                encode_update(family, UpdateType::Init, self.tag_patterns.max_id(), &[], &entries)
            }
            "trails" => {
                let entries = str_entries(&self.trails, Trail::encode_entry);
                encode_update(family, UpdateType::Init, 0, &[], &entries)
            }
            "environments" => {
                let entries = int_entries(&self.environments, EnvironmentDef::encode_entry);
                encode_update(
                    family,
                    UpdateType::Init,
                    self.environments.max_id(),
                    &[false],
                    &entries,
                )
            }
            "block_types" => {
                let mut entries = int_entries(&self.block_types, BlockType::encode_entry);
                if self.minimal_blocks {
                    entries.truncate(1);
                }
                encode_update(
                    family,
                    UpdateType::Init,
                    if self.minimal_blocks { 1 } else { self.block_types.max_id() },
                    &[false, false, false, false],
                    &entries,
                )
            }
            // Families with no implementation ship the well-formed
            // empty dictionary of their shape.
            _ => encode_update(family, UpdateType::Init, 0, &[], &[]),
        }
    }
}

fn load_family<F>(store: &AssetStore, prefix: &str, mut insert: F)
where
    F: FnMut(&str, &[u8]) -> Result<u32, serde_json::Error>,
{
    let paths: Vec<String> = {
        let mut paths: Vec<String> = store
            .entries_with_prefix(prefix)
            .filter(|entry| entry.path.ends_with(".json"))
            .map(|entry| entry.path.clone())
            .collect();
        // Directory iteration order is not stable; index assignment is.
        paths.sort();
        paths
    };
    for path in paths {
        let id = match asset_id(&path) {
            Some(id) => id.to_owned(),
            None => continue,
        };
        let data = match store.read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path, error = %e, "failed to read asset");
                continue;
            }
        };
        if let Err(e) = insert(&id, &data) {
            warn!(path = %path, error = %e, "skipping malformed asset");
        }
    }
}

/// Asset id: the filename stem, minus `.json`.
fn asset_id(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next()?;
    file.strip_suffix(".json")
}

fn int_entries<V>(
    map: &IndexedAssetMap<V>,
    encode: impl Fn(&V, &mut BytesMut),
) -> Vec<UpdateEntry> {
    map.iter_indexed()
        .map(|(index, _, value)| {
            let mut body = BytesMut::new();
            encode(value, &mut body);
            UpdateEntry::Int(index as i32, body.to_vec())
        })
        .collect()
}

fn str_entries<V>(
    map: &IndexedAssetMap<V>,
    encode: impl Fn(&V, &mut BytesMut),
) -> Vec<UpdateEntry> {
    map.iter_indexed()
        .map(|(_, key, value)| {
            let mut body = BytesMut::new();
            encode(value, &mut body);
            UpdateEntry::Str(key.to_owned(), body.to_vec())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zytale_protocol::update::{empty_baseline_len, family_by_name};

    #[test]
    fn every_family_gets_a_payload() {
        let registry = AssetRegistry::new();
        let payloads = registry.generate_update_payloads();
        assert_eq!(payloads.len(), UPDATE_FAMILIES.len());
        for payload in &payloads {
            assert_eq!(payload.payload[0], 0x01, "{}", payload.name);
            assert_eq!(payload.payload[1], UpdateType::Init as u8, "{}", payload.name);
        }
    }

    #[test]
    fn empty_audio_categories_baseline() {
        let mut registry = AssetRegistry::new();
        // A fresh registry has only the builtin blocks; audio is empty.
        registry.audio_categories = IndexedAssetMap::new();
        let payloads = registry.generate_update_payloads();
        let audio = payloads.iter().find(|p| p.name == "audio_categories").unwrap();
        assert_eq!(audio.payload, vec![0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn empty_trails_baseline() {
        let registry = AssetRegistry::new();
        let payloads = registry.generate_update_payloads();
        let trails = payloads.iter().find(|p| p.name == "trails").unwrap();
        assert_eq!(trails.payload, vec![0x01, 0x00, 0x00]);
    }

    #[test]
    fn unimplemented_families_are_well_formed_empties() {
        let registry = AssetRegistry::new();
        let payloads = registry.generate_update_payloads();
        for name in ["items", "recipes", "player_skins", "fonts"] {
            let payload = payloads.iter().find(|p| p.name == name).unwrap();
            let family = family_by_name(name).unwrap();
            assert_eq!(payload.payload.len(), empty_baseline_len(family), "{name}");
        }
    }

    #[test]
    fn builtin_blocks_are_seeded_in_id_order() {
        let registry = AssetRegistry::new();
        assert_eq!(registry.block_types.index_of("air"), Some(0));
        assert_eq!(registry.block_types.index_of("stone"), Some(2));
        assert_eq!(registry.block_types.index_of("grass"), Some(4));
        assert_eq!(registry.block_types.max_id(), 5);
    }

    #[test]
    fn block_types_payload_has_entries_and_flags() {
        let registry = AssetRegistry::new();
        let payloads = registry.generate_update_payloads();
        let blocks = payloads.iter().find(|p| p.name == "block_types").unwrap();
        // null-bits, type, maxId=5, four flags, count=5, then entries.
        assert_eq!(&blocks.payload[2..6], &5u32.to_le_bytes());
        assert_eq!(&blocks.payload[6..10], &[0, 0, 0, 0]);
        assert_eq!(blocks.payload[10], 5);
    }

    #[test]
    fn minimal_blocks_ships_only_air() {
        let mut registry = AssetRegistry::new();
        registry.set_minimal_blocks(true);
        let payloads = registry.generate_update_payloads();
        let blocks = payloads.iter().find(|p| p.name == "block_types").unwrap();
        assert_eq!(&blocks.payload[2..6], &1u32.to_le_bytes());
        assert_eq!(blocks.payload[10], 1);
        // The one entry is index 0 (air).
        assert_eq!(&blocks.payload[11..15], &0i32.to_le_bytes());
    }

    #[test]
    fn asset_id_strips_path_and_extension() {
        assert_eq!(asset_id("Server/Trails/spark.json"), Some("spark"));
        assert_eq!(asset_id("spark.json"), Some("spark"));
        assert_eq!(asset_id("Server/Trails/readme.txt"), None);
    }

    #[test]
    fn archive_load_skips_malformed_entries() {
        let file = crate::store::fixtures::write_zip(&[
            (
                "Server/Audio/AudioCategories/music.json",
                br#"{"VolumeDb": -6.0}"#.as_slice(),
            ),
            (
                "Server/Audio/AudioCategories/broken.json",
                b"{not json".as_slice(),
            ),
            (
                "Server/Environments/forest.json",
                br#"{"WaterTint": [10, 20, 30]}"#.as_slice(),
            ),
            ("Server/Trails/notes.txt", b"ignored".as_slice()),
        ]);
        let store = AssetStore::open(file.path()).unwrap();

        let mut registry = AssetRegistry::new();
        registry.load_from_store(&store);

        // broken.json is skipped, music survives it.
        assert_eq!(registry.audio_categories.len(), 1);
        let music = registry.audio_categories.get("music").unwrap();
        assert!((music.volume - 0.5012).abs() < 1e-3);
        assert_eq!(registry.environments.len(), 1);
        assert!(registry.trails.is_empty());

        let payloads = registry.generate_update_payloads();
        let audio = payloads.iter().find(|p| p.name == "audio_categories").unwrap();
        // One entry: count 1, index 0.
        assert_eq!(&audio.payload[2..6], &1u32.to_le_bytes());
        assert_eq!(audio.payload[6], 1);
        assert_eq!(&audio.payload[7..11], &0i32.to_le_bytes());
    }

    #[test]
    fn loaded_ids_are_stable_across_reload() {
        let file = crate::store::fixtures::write_zip(&[
            ("Server/Environments/alpine.json", b"{}".as_slice()),
            ("Server/Environments/bog.json", b"{}".as_slice()),
        ]);
        let store = AssetStore::open(file.path()).unwrap();

        let mut registry = AssetRegistry::new();
        registry.load_from_store(&store);
        assert_eq!(registry.environments.index_of("alpine"), Some(0));
        assert_eq!(registry.environments.index_of("bog"), Some(1));

        // A second load replaces values but never moves indices.
        registry.load_from_store(&store);
        assert_eq!(registry.environments.index_of("alpine"), Some(0));
        assert_eq!(registry.environments.max_id(), 2);
    }
}
