//! Deterministic flat terrain.

use crate::chunk::Chunk;

/// Block ids for the flat world.
pub const AIR: u32 = 0;
pub const BEDROCK: u32 = 1;
pub const STONE: u32 = 2;
pub const DIRT: u32 = 3;
pub const GRASS: u32 = 4;

/// Surface y level (grass). Players spawn one block above this.
pub const SURFACE_Y: usize = 63;

/// Layer layout:
///   y = 0:        bedrock
///   y = 1..60:    stone
///   y = 60..63:   dirt
///   y = 63:       grass
///   y = 64..320:  air
///
/// Every chunk is identical; coordinates only matter for placement.
pub fn generate_chunk(_chunk_x: i32, _chunk_z: i32) -> Chunk {
    let mut chunk = Chunk::new();
    chunk.fill_layer(0, BEDROCK);
    for y in 1..60 {
        chunk.fill_layer(y, STONE);
    }
    for y in 60..63 {
        chunk.fill_layer(y, DIRT);
    }
    chunk.fill_layer(SURFACE_Y, GRASS);
    chunk.recompute_heightmap();
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_DIM;

    #[test]
    fn flat_chunk_layers() {
        let chunk = generate_chunk(0, 0);
        assert_eq!(chunk.get_block(0, 0, 0), BEDROCK);
        assert_eq!(chunk.get_block(15, 1, 15), STONE);
        assert_eq!(chunk.get_block(31, 59, 31), STONE);
        assert_eq!(chunk.get_block(0, 60, 0), DIRT);
        assert_eq!(chunk.get_block(0, 62, 0), DIRT);
        assert_eq!(chunk.get_block(0, 63, 0), GRASS);
        assert_eq!(chunk.get_block(0, 64, 0), AIR);
    }

    #[test]
    fn flat_chunk_heightmap_is_surface() {
        let chunk = generate_chunk(3, -7);
        for z in 0..CHUNK_DIM {
            for x in 0..CHUNK_DIM {
                assert_eq!(chunk.height_at(x, z), SURFACE_Y as i16, "column ({x},{z})");
            }
        }
    }

    #[test]
    fn only_lower_sections_populated() {
        let chunk = generate_chunk(0, 0);
        assert!(!chunk.section(0).is_empty());
        assert!(!chunk.section(1).is_empty());
        for index in 2..10 {
            assert!(chunk.section(index).is_empty(), "section {index}");
        }
    }

    /// Walk one serialized palette/data pair, returning the external ids
    /// listed in its palette body and the bytes consumed.
    fn walk_pair(bytes: &[u8]) -> (Vec<u32>, usize) {
        use crate::section::SECTION_VOLUME;
        let kind = bytes[0];
        match kind {
            0 => (Vec::new(), 1),
            1 | 2 => {
                let count = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
                let mut ids = Vec::with_capacity(count);
                let mut pos = 3;
                for _ in 0..count {
                    assert_eq!(bytes[pos] as usize, ids.len(), "internal index order");
                    ids.push(u32::from_le_bytes(
                        bytes[pos + 1..pos + 5].try_into().unwrap(),
                    ));
                    assert_eq!(&bytes[pos + 5..pos + 7], &[0, 0], "reference count");
                    pos += 7;
                }
                let data_len = if kind == 1 { SECTION_VOLUME / 2 } else { SECTION_VOLUME };
                (ids, pos + data_len)
            }
            3 => {
                let count = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
                assert_eq!(count, 0, "short palettes carry no entry list");
                (Vec::new(), 3 + SECTION_VOLUME * 2)
            }
            other => panic!("unknown palette type {other}"),
        }
    }

    #[test]
    fn generated_sections_parse_structurally() {
        let chunk = generate_chunk(0, 0);

        // Section 0: air, bedrock, stone in palette order.
        let bytes = chunk.section(0).serialized();
        let (blocks, consumed) = walk_pair(&bytes);
        assert_eq!(blocks, vec![AIR, BEDROCK, STONE]);
        // Filler and rotation untouched.
        assert_eq!(&bytes[consumed..], &[0x00, 0x00]);

        // Section 1: stone arrives first, then dirt and grass.
        let bytes = chunk.section(1).serialized();
        let (blocks, _) = walk_pair(&bytes);
        assert_eq!(blocks, vec![AIR, STONE, DIRT, GRASS]);

        // Everything above is the three-byte empty form.
        for index in 2..10 {
            assert_eq!(chunk.section(index).serialized(), vec![0, 0, 0]);
        }
    }
}
