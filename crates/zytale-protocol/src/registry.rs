//! The packet descriptor table: the single source of truth for wire
//! compatibility. Every packet id the protocol knows is listed here with
//! its name, encoded-size bounds, compression flag, and serializer
//! category.

use crate::frame::MAX_PAYLOAD_SIZE;

/// How a packet's payload is laid out, for dispatch purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Empty payload used purely as a signal.
    Signal,
    /// Null-bits / fixed / offset-table / variable layout.
    Control,
    /// One of the UpdateXxx asset-dictionary packets.
    Update,
    /// Chunk and column payloads.
    Chunk,
    /// Entity add/update/remove payloads.
    Entity,
}

#[derive(Debug, Clone, Copy)]
pub struct PacketDescriptor {
    pub id: u16,
    pub name: &'static str,
    pub min_size: usize,
    pub max_size: usize,
    pub compressed: bool,
    pub category: Category,
}

const MAX: usize = MAX_PAYLOAD_SIZE;

macro_rules! packet_table {
    ( $( $id:literal => $name:literal, $min:expr, $max:expr, $cat:ident $(, $compressed:tt )? ; )* ) => {
        /// All known packets, sorted by id.
        pub const PACKETS: &[PacketDescriptor] = &[
            $( PacketDescriptor {
                id: $id,
                name: $name,
                min_size: $min,
                max_size: $max,
                compressed: false $( || compressed_flag!($compressed) )?,
                category: Category::$cat,
            }, )*
        ];
    };
}

macro_rules! compressed_flag {
    (compressed) => {
        true
    };
}

packet_table! {
    // Connection
    0 => "Connect", 46, 4096, Control;
    1 => "Disconnect", 2, 4096, Control;
    2 => "Ping", 8, 8, Control;
    3 => "Pong", 8, 8, Control;

    // Auth
    10 => "Status", 17, 4096, Control;
    11 => "AuthGrant", 9, 16384, Control;
    12 => "AuthToken", 9, 16384, Control;
    13 => "ServerAuthToken", 9, 16384, Control;
    14 => "ConnectAccept", 1, 4096, Control;
    15 => "PasswordResponse", 1, 4096, Control;
    16 => "PasswordAccepted", 0, 0, Signal;
    17 => "PasswordRejected", 5, 4096, Control;
    18 => "ClientReferral", 9, 4096, Control;

    // Setup
    20 => "WorldSettings", 5, MAX, Control, compressed;
    21 => "WorldLoadProgress", 9, 4096, Control;
    22 => "WorldLoadFinished", 0, 0, Signal;
    23 => "RequestAssets", 1, MAX, Control, compressed;
    24 => "AssetInitialize", 5, 4096, Control;
    25 => "AssetPart", 1, MAX, Control;
    26 => "AssetFinalize", 0, 0, Signal;
    27 => "RemoveAssets", 1, MAX, Control;
    28 => "RequestCommonAssetsRebuild", 0, 0, Signal;
    29 => "SetUpdateRate", 4, 4, Control;
    30 => "SetTimeDilation", 4, 4, Control;
    31 => "UpdateFeatures", 1, 4096, Control;
    32 => "ViewRadius", 4, 4, Control;
    33 => "PlayerOptions", 1, 8192, Control;
    34 => "ServerTags", 1, MAX, Control;
    35 => "SetClientId", 4, 4, Control;

    // Update-asset families (generated from the table in update.rs)
    40 => "UpdateBlockTypes", 11, MAX, Update, compressed;
    41 => "UpdateBlockSets", 7, MAX, Update, compressed;
    42 => "UpdateBlockSounds", 7, MAX, Update, compressed;
    43 => "UpdateBlockParticles", 7, MAX, Update, compressed;
    44 => "UpdateFluidTypes", 7, MAX, Update, compressed;
    45 => "UpdateItems", 15, MAX, Update, compressed;
    46 => "UpdateItemCategories", 7, MAX, Update, compressed;
    47 => "UpdateItemSounds", 7, MAX, Update, compressed;
    48 => "UpdateRecipes", 7, MAX, Update, compressed;
    49 => "UpdateEntityTypes", 7, MAX, Update, compressed;
    50 => "UpdateEntityStats", 7, MAX, Update, compressed;
    51 => "UpdateEntitySounds", 7, MAX, Update, compressed;
    52 => "UpdateEntityEffects", 7, MAX, Update, compressed;
    53 => "UpdateProjectiles", 7, MAX, Update, compressed;
    54 => "UpdateAudioCategories", 7, MAX, Update, compressed;
    55 => "UpdateSoundEvents", 7, MAX, Update, compressed;
    56 => "UpdateMusicTracks", 7, MAX, Update, compressed;
    57 => "UpdateAmbienceBeds", 7, MAX, Update, compressed;
    58 => "UpdateReverbEffects", 7, MAX, Update, compressed;
    59 => "UpdateEqualizerEffects", 7, MAX, Update, compressed;
    60 => "UpdateParticleSystems", 7, MAX, Update, compressed;
    61 => "UpdateParticleEmitters", 7, MAX, Update, compressed;
    62 => "UpdateEnvironments", 8, MAX, Update, compressed;
    63 => "UpdateWeatherTypes", 7, MAX, Update, compressed;
    64 => "UpdateBiomeTints", 7, MAX, Update, compressed;
    65 => "UpdateTagPatterns", 7, MAX, Update, compressed;
    66 => "UpdateTags", 7, MAX, Update, compressed;
    67 => "UpdateDamageTypes", 7, MAX, Update, compressed;
    68 => "UpdateStatusEffects", 7, MAX, Update, compressed;
    69 => "UpdateAnimations", 7, MAX, Update, compressed;
    70 => "UpdateModelSkeletons", 7, MAX, Update, compressed;
    71 => "UpdateModelAttachments", 7, MAX, Update, compressed;
    72 => "UpdateInterfacePages", 7, MAX, Update, compressed;
    73 => "UpdateHudComponents", 7, MAX, Update, compressed;
    74 => "UpdateFonts", 7, MAX, Update, compressed;
    75 => "UpdateLanguages", 7, MAX, Update, compressed;
    76 => "UpdateInputBindings", 7, MAX, Update, compressed;
    77 => "UpdateCameraProfiles", 7, MAX, Update, compressed;
    78 => "UpdateLightProfiles", 7, MAX, Update, compressed;
    79 => "UpdateFogProfiles", 7, MAX, Update, compressed;
    80 => "UpdateTrails", 3, MAX, Update, compressed;
    81 => "UpdatePlayerSkins", 3, MAX, Update, compressed;
    82 => "UpdateSkinParts", 3, MAX, Update, compressed;
    83 => "UpdateEmotes", 3, MAX, Update, compressed;
    84 => "UpdateGestures", 3, MAX, Update, compressed;
    85 => "UpdatePortraits", 3, MAX, Update, compressed;
    86 => "UpdateIcons", 3, MAX, Update, compressed;
    87 => "UpdateCursors", 3, MAX, Update, compressed;
    88 => "UpdateCrosshairs", 3, MAX, Update, compressed;
    89 => "UpdateLoadingTips", 3, MAX, Update, compressed;
    90 => "UpdateCreditsEntries", 3, MAX, Update, compressed;
    91 => "UpdateChatChannels", 3, MAX, Update, compressed;
    92 => "UpdateCommandAliases", 3, MAX, Update, compressed;
    93 => "UpdateHelpTopics", 3, MAX, Update, compressed;
    94 => "UpdateTutorialSteps", 3, MAX, Update, compressed;
    95 => "UpdateObjectiveMarkers", 3, MAX, Update, compressed;
    96 => "UpdateMapMarkers", 3, MAX, Update, compressed;
    97 => "UpdateWaypointStyles", 3, MAX, Update, compressed;
    98 => "UpdateNameplateStyles", 3, MAX, Update, compressed;
    99 => "UpdateKillfeedStyles", 3, MAX, Update, compressed;

    // Audio / ambience / visual environment
    100 => "PlaySound", 13, 4096, Control;
    101 => "StopSound", 5, 4096, Control;
    102 => "SetMusicTrack", 5, 4096, Control;
    103 => "FadeMusic", 8, 8, Control;
    104 => "PlayAmbience", 5, 4096, Control;
    105 => "StopAmbience", 5, 4096, Control;
    106 => "AttachSound", 9, 4096, Control;
    107 => "DetachSound", 8, 8, Control;
    108 => "SetReverbZone", 5, 4096, Control;
    109 => "ClearReverbZone", 4, 4, Control;
    110 => "ParticleBurst", 17, 4096, Control;
    111 => "AttachParticle", 9, 4096, Control;
    112 => "DetachParticle", 8, 8, Control;
    113 => "SetParticleRate", 8, 8, Control;
    114 => "ScreenFlash", 9, 9, Control;
    115 => "ScreenFade", 9, 9, Control;
    116 => "SetSkybox", 5, 4096, Control;
    117 => "SetFog", 13, 13, Control;
    118 => "SetAmbientLight", 5, 5, Control;
    119 => "SetWindState", 13, 13, Control;

    // World
    120 => "JoinWorld", 19, 19, Control;
    121 => "LeaveWorld", 1, 4096, Control;
    122 => "SetGameMode", 1, 1, Control;
    123 => "SetEntitySeed", 4, 4, Control;
    124 => "SetSpawnPoint", 25, 25, Control;
    125 => "SetTime", 8, 8, Control;
    126 => "SetWeather", 5, 5, Control;
    127 => "WorldEvent", 5, 4096, Control;
    128 => "SetBlock", 17, 17, Control;
    129 => "BreakBlock", 13, 13, Control;
    130 => "PlaceBlock", 18, 18, Control;
    131 => "SetChunk", 25, MAX, Chunk, compressed;
    132 => "SetChunkHeightmap", 9, 2057, Chunk, compressed;
    133 => "SetChunkTintmap", 9, 4105, Chunk, compressed;
    134 => "SetChunkEnvironments", 9, 1033, Chunk, compressed;
    135 => "UnloadChunk", 8, 8, Control;
    136 => "InvalidateChunk", 8, 8, Control;
    137 => "SetBlockHealth", 17, 17, Control;
    138 => "SetFluidLevel", 17, 17, Control;
    139 => "BlockEvent", 17, 4096, Control;
    140 => "ChunkEvent", 13, 4096, Control;

    // Player / entity
    150 => "ClientMovement", 38, 38, Control;
    151 => "ClientReady", 0, 0, Signal;
    152 => "ClientTeleportConfirm", 4, 4, Control;
    153 => "PlayerInput", 9, 9, Control;
    154 => "PlayerAction", 5, 4096, Control;
    155 => "Interact", 21, 4096, Control;
    156 => "EntityUpdates", 2, MAX, Entity, compressed;
    157 => "EntityPosition", 29, 29, Entity;
    158 => "EntityVelocity", 17, 17, Entity;
    159 => "EntityAnimation", 9, 4096, Entity;
    160 => "EntityEquipment", 9, 4096, Entity;
    161 => "EntityEffect", 13, 13, Entity;
    162 => "RemoveEntityEffect", 9, 9, Entity;
    163 => "SpawnEntity", 77, 4096, Entity;
    164 => "DespawnEntity", 5, 5, Entity;
    165 => "EntityTeleport", 45, 45, Entity;
    166 => "SetHealth", 9, 9, Control;
    167 => "SetStamina", 9, 9, Control;
    168 => "SetMana", 9, 9, Control;
    169 => "Respawn", 25, 25, Control;
    170 => "DamageEvent", 13, 4096, Control;
    171 => "KnockbackEvent", 17, 17, Control;
    172 => "MountEntity", 9, 9, Control;
    173 => "DismountEntity", 5, 5, Control;

    // Inventory
    180 => "InventoryContent", 2, MAX, Control, compressed;
    181 => "InventorySlot", 7, 4096, Control;
    182 => "HeldItemChange", 1, 1, Control;
    183 => "DropItem", 3, 3, Control;
    184 => "SwapHands", 0, 0, Signal;
    185 => "UseItem", 2, 4096, Control;
    186 => "StartCrafting", 5, 4096, Control;
    187 => "CancelCrafting", 4, 4, Control;
    188 => "CraftResult", 6, 4096, Control;
    189 => "OpenContainer", 6, 4096, Control;
    190 => "CloseContainer", 1, 1, Control;
    191 => "ContainerContent", 2, MAX, Control, compressed;
    192 => "ContainerSlot", 8, 4096, Control;
    193 => "MoveItem", 7, 7, Control;
    194 => "SplitStack", 7, 7, Control;
    195 => "MergeStack", 7, 7, Control;
    196 => "PickupItem", 9, 9, Control;
    197 => "EquipArmor", 3, 4096, Control;
    198 => "UnequipArmor", 2, 2, Control;
    199 => "SetHotbarSlot", 2, 2, Control;
    200 => "UpdateToolbelt", 2, 4096, Control;
    201 => "SetCursorItem", 1, 4096, Control;
    202 => "RequestSort", 1, 1, Control;
    203 => "SortResult", 2, MAX, Control;
    204 => "UpdateItemState", 7, 4096, Control;
    205 => "ConsumeItem", 3, 3, Control;

    // Interface
    210 => "ServerMessage", 1, 16384, Control;
    211 => "ChatMessage", 9, 16384, Control;
    212 => "Notification", 1, 16384, Control;
    213 => "KillFeedMessage", 1, 16384, Control;
    214 => "ShowEventTitle", 1, 16384, Control;
    215 => "HideEventTitle", 0, 0, Signal;
    216 => "SetPage", 1, 4096, Control;
    217 => "CustomHud", 1, MAX, Control, compressed;
    218 => "CustomPage", 1, MAX, Control, compressed;
    219 => "CustomPageEvent", 1, 16384, Control;
    222 => "EditorBlocksChange", 1, MAX, Control, compressed;
    223 => "ServerInfo", 13, 4096, Control;
    224 => "AddToServerPlayerList", 21, 4096, Control;
    225 => "RemoveFromServerPlayerList", 16, 16, Control;
    226 => "UpdateServerPlayerList", 1, MAX, Control;
    227 => "UpdateServerPlayerListPing", 20, 20, Control;
    228 => "UpdateKnownRecipes", 1, MAX, Control;
    229 => "UpdatePortal", 1, 4096, Control;
    230 => "UpdateVisibleHudComponents", 1, 4096, Control;
    231 => "ResetUserInterfaceState", 0, 0, Signal;
    232 => "UpdateLanguage", 1, 4096, Control;
    233 => "WorldSavingStatus", 1, 1, Control;
    234 => "OpenChatWithCommand", 1, 4096, Control;

    // Server access
    250 => "RequestServerAccess", 1, 4096, Control;
    251 => "UpdateServerAccess", 1, 4096, Control;
    252 => "SetServerAccess", 1, 4096, Control;

    // Editor / build mode
    260 => "EditorModeEnter", 0, 0, Signal;
    261 => "EditorModeExit", 0, 0, Signal;
    262 => "EditorSelection", 25, 25, Control;
    263 => "EditorClearSelection", 0, 0, Signal;
    264 => "EditorFill", 29, 29, Control;
    265 => "EditorCopy", 25, 25, Control;
    266 => "EditorPaste", 13, 13, Control;
    267 => "EditorUndo", 0, 0, Signal;
    268 => "EditorRedo", 0, 0, Signal;
    269 => "EditorBrushSettings", 9, 4096, Control;
    270 => "EditorPrefabList", 1, MAX, Control, compressed;
    271 => "EditorPrefabPlace", 29, 4096, Control;
    272 => "EditorPrefabSave", 25, 4096, Control;
    273 => "EditorHistoryStatus", 8, 8, Control;
    274 => "EditorGridSettings", 9, 9, Control;
    275 => "EditorMirrorSettings", 3, 3, Control;

    // Camera
    280 => "SetServerCamera", 1, 4096, Control;
    281 => "CameraShakeEffect", 12, 12, Control;
    282 => "RequestFlyCameraMode", 1, 1, Control;
    283 => "SetFlyCameraMode", 1, 1, Control;
}

/// Look up a packet descriptor by id.
pub fn descriptor(id: u32) -> Option<&'static PacketDescriptor> {
    let id = u16::try_from(id).ok()?;
    PACKETS
        .binary_search_by_key(&id, |d| d.id)
        .ok()
        .map(|i| &PACKETS[i])
}

/// Whether the payload for `id` travels compressed.
pub fn is_compressed(id: u32) -> bool {
    descriptor(id).map(|d| d.compressed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in PACKETS.windows(2) {
            assert!(pair[0].id < pair[1].id, "{} >= {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn lookup_known_ids() {
        assert_eq!(descriptor(0).unwrap().name, "Connect");
        assert_eq!(descriptor(131).unwrap().name, "SetChunk");
        assert!(descriptor(131).unwrap().compressed);
        assert_eq!(descriptor(223).unwrap().name, "ServerInfo");
        assert!(!descriptor(223).unwrap().compressed);
        assert!(descriptor(999).is_none());
    }

    #[test]
    fn size_bounds_are_sane() {
        for d in PACKETS {
            assert!(d.min_size <= d.max_size, "{}", d.name);
        }
    }

    #[test]
    fn table_has_full_coverage() {
        assert!(PACKETS.len() >= 220, "only {} descriptors", PACKETS.len());
        let updates = PACKETS.iter().filter(|d| d.category == Category::Update).count();
        assert_eq!(updates, 60);
    }
}
