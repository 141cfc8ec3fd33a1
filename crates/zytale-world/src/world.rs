//! The world store: lazily materialized chunks keyed by packed
//! coordinates, plus the world identity and spawn point.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;
use zytale_types::Position;

use crate::chunk::Chunk;
use crate::generator;

/// Pack chunk coordinates into one 64-bit map key.
#[inline]
pub fn pack_chunk_key(x: i32, z: i32) -> u64 {
    ((x as u64) << 32) | (z as u32 as u64)
}

#[inline]
pub fn unpack_chunk_key(key: u64) -> (i32, i32) {
    ((key >> 32) as i32, key as u32 as i32)
}

pub struct World {
    chunks: HashMap<u64, Chunk>,
    uuid: Uuid,
    spawn: Position,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
            uuid: Uuid::new_v4(),
            spawn: Position::new(0.5, generator::SURFACE_Y as f64 + 1.0, 0.5),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn spawn(&self) -> Position {
        self.spawn
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Return the chunk at (x, z), materializing it through the
    /// generator on first access. Callers share the world behind a
    /// read-write lock; materialization happens under the write side.
    pub fn get_chunk(&mut self, x: i32, z: i32) -> &Chunk {
        let key = pack_chunk_key(x, z);
        self.chunks.entry(key).or_insert_with(|| {
            debug!(chunk_x = x, chunk_z = z, "generating chunk");
            generator::generate_chunk(x, z)
        })
    }

    /// Read access to an already-materialized chunk.
    pub fn chunk_at(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.chunks.get(&pack_chunk_key(x, z))
    }

    pub fn get_chunk_mut(&mut self, x: i32, z: i32) -> &mut Chunk {
        let key = pack_chunk_key(x, z);
        self.chunks
            .entry(key)
            .or_insert_with(|| generator::generate_chunk(x, z))
    }

    pub fn unload_chunk(&mut self, x: i32, z: i32) -> bool {
        self.chunks.remove(&pack_chunk_key(x, z)).is_some()
    }

    /// Read one block by world coordinates.
    pub fn get_block(&mut self, x: i32, y: i32, z: i32) -> u32 {
        let (chunk_x, chunk_z) = (x.div_euclid(32), z.div_euclid(32));
        let (local_x, local_z) = (x.rem_euclid(32) as usize, z.rem_euclid(32) as usize);
        self.get_chunk(chunk_x, chunk_z)
            .get_block(local_x, y as usize, local_z)
    }

    /// Write one block by world coordinates, maintaining the owning
    /// column's heightmap.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: u32) {
        let (chunk_x, chunk_z) = (x.div_euclid(32), z.div_euclid(32));
        let (local_x, local_z) = (x.rem_euclid(32) as usize, z.rem_euclid(32) as usize);
        self.get_chunk_mut(chunk_x, chunk_z)
            .set_block(local_x, y as usize, local_z, id);
    }

    /// Coordinates of every chunk within Chebyshev distance `radius` of
    /// (center_x, center_z), row-major, materializing missing ones.
    pub fn chunks_in_radius(&mut self, center_x: i32, center_z: i32, radius: i32) -> Vec<(i32, i32)> {
        let mut coords = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for x in center_x - radius..=center_x + radius {
            for z in center_z - radius..=center_z + radius {
                self.get_chunk(x, z);
                coords.push((x, z));
            }
        }
        coords
    }
}
