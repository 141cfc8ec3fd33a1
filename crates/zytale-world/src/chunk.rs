//! A 32x320x32 vertical column of blocks: ten stacked sections plus the
//! per-column heightmap, tintmap, and environment arrays.

use crate::palette::AIR_ID;
use crate::section::{Section, SECTION_DIM};

pub const CHUNK_DIM: usize = SECTION_DIM;
pub const SECTIONS_PER_CHUNK: usize = 10;
pub const CHUNK_HEIGHT: usize = SECTIONS_PER_CHUNK * SECTION_DIM;
const COLUMNS: usize = CHUNK_DIM * CHUNK_DIM;

/// Default surface tint, ARGB.
pub const DEFAULT_TINT: u32 = 0xFF5B9E28;

#[inline]
fn column_index(x: usize, z: usize) -> usize {
    (z & 31) * CHUNK_DIM + (x & 31)
}

pub struct Chunk {
    sections: Vec<Section>,
    /// Highest non-air y per column, 0 when the column is all air.
    heightmap: Box<[i16; COLUMNS]>,
    /// Per-column surface tint, ARGB.
    tintmap: Box<[u32; COLUMNS]>,
    /// Per-column environment tag.
    environments: Box<[u8; COLUMNS]>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            sections: (0..SECTIONS_PER_CHUNK).map(|_| Section::new()).collect(),
            heightmap: Box::new([0; COLUMNS]),
            tintmap: Box::new([DEFAULT_TINT; COLUMNS]),
            environments: Box::new([0; COLUMNS]),
        }
    }

    pub fn section(&self, index: usize) -> &Section {
        &self.sections[index]
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> u32 {
        debug_assert!(y < CHUNK_HEIGHT);
        self.sections[y / SECTION_DIM].get_block(x, y % SECTION_DIM, z)
    }

    /// Set one block and keep the column's heightmap entry current:
    /// a non-air block at or above the recorded height raises it, and
    /// removing the top block rescans the column downward.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u32) {
        debug_assert!(y < CHUNK_HEIGHT);
        self.sections[y / SECTION_DIM].set_block(x, y % SECTION_DIM, z, id);

        let column = column_index(x, z);
        let height = self.heightmap[column];
        if id != AIR_ID {
            if y as i16 >= height {
                self.heightmap[column] = y as i16;
            }
        } else if y as i16 == height {
            self.heightmap[column] = self.scan_column_height(x, z);
        }
    }

    /// Fill a whole y-plane. Bulk callers are expected to finish with
    /// [`Chunk::recompute_heightmap`] instead of paying the per-mutation
    /// bookkeeping.
    pub fn fill_layer(&mut self, y: usize, id: u32) {
        debug_assert!(y < CHUNK_HEIGHT);
        self.sections[y / SECTION_DIM].fill_block_layer(y % SECTION_DIM, id);
    }

    fn scan_column_height(&self, x: usize, z: usize) -> i16 {
        for y in (0..CHUNK_HEIGHT).rev() {
            if self.get_block(x, y, z) != AIR_ID {
                return y as i16;
            }
        }
        0
    }

    pub fn recompute_heightmap(&mut self) {
        for z in 0..CHUNK_DIM {
            for x in 0..CHUNK_DIM {
                self.heightmap[column_index(x, z)] = self.scan_column_height(x, z);
            }
        }
    }

    pub fn height_at(&self, x: usize, z: usize) -> i16 {
        self.heightmap[column_index(x, z)]
    }

    pub fn set_tint(&mut self, x: usize, z: usize, tint: u32) {
        self.tintmap[column_index(x, z)] = tint;
    }

    pub fn set_environment(&mut self, x: usize, z: usize, tag: u8) {
        self.environments[column_index(x, z)] = tag;
    }

    pub fn environment_at(&self, x: usize, z: usize) -> u8 {
        self.environments[column_index(x, z)]
    }

    /// 2048-byte wire blob: 1024 little-endian i16 heights.
    pub fn heightmap_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COLUMNS * 2);
        for &height in self.heightmap.iter() {
            out.extend_from_slice(&height.to_le_bytes());
        }
        out
    }

    /// 4096-byte wire blob: 1024 little-endian ARGB tints.
    pub fn tintmap_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COLUMNS * 4);
        for &tint in self.tintmap.iter() {
            out.extend_from_slice(&tint.to_le_bytes());
        }
        out
    }

    /// 1024-byte wire blob of environment tags.
    pub fn environment_bytes(&self) -> Vec<u8> {
        self.environments.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placing_raises_height() {
        let mut chunk = Chunk::new();
        chunk.set_block(4, 70, 9, 2);
        assert_eq!(chunk.height_at(4, 9), 70);
        chunk.set_block(4, 100, 9, 2);
        assert_eq!(chunk.height_at(4, 9), 100);
    }

    #[test]
    fn placing_below_height_is_ignored() {
        let mut chunk = Chunk::new();
        chunk.set_block(0, 100, 0, 2);
        chunk.set_block(0, 50, 0, 3);
        assert_eq!(chunk.height_at(0, 0), 100);
    }

    #[test]
    fn removing_top_block_rescans() {
        let mut chunk = Chunk::new();
        chunk.set_block(0, 50, 0, 2);
        chunk.set_block(0, 100, 0, 2);
        chunk.set_block(0, 100, 0, 0);
        assert_eq!(chunk.height_at(0, 0), 50);
    }

    #[test]
    fn removing_air_below_height_keeps_height() {
        let mut chunk = Chunk::new();
        chunk.set_block(0, 100, 0, 2);
        chunk.set_block(0, 30, 0, 0);
        assert_eq!(chunk.height_at(0, 0), 100);
    }

    #[test]
    fn all_air_column_reads_zero() {
        let mut chunk = Chunk::new();
        chunk.set_block(7, 10, 7, 2);
        chunk.set_block(7, 10, 7, 0);
        assert_eq!(chunk.height_at(7, 7), 0);
    }

    #[test]
    fn blob_sizes() {
        let chunk = Chunk::new();
        assert_eq!(chunk.heightmap_bytes().len(), 2048);
        assert_eq!(chunk.tintmap_bytes().len(), 4096);
        assert_eq!(chunk.environment_bytes().len(), 1024);
    }

    #[test]
    fn default_tint_is_grass_green() {
        let chunk = Chunk::new();
        let bytes = chunk.tintmap_bytes();
        assert_eq!(&bytes[..4], &DEFAULT_TINT.to_le_bytes());
    }

    #[test]
    fn block_crosses_section_boundaries() {
        let mut chunk = Chunk::new();
        chunk.set_block(1, 319, 1, 9);
        assert_eq!(chunk.get_block(1, 319, 1), 9);
        assert_eq!(chunk.height_at(1, 1), 319);
        assert!(!chunk.section(9).is_empty());
        assert!(chunk.section(0).is_empty());
    }
}
