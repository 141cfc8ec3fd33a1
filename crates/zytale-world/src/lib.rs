pub mod chunk;
pub mod generator;
pub mod palette;
pub mod section;
pub mod world;

pub use chunk::{Chunk, CHUNK_DIM, CHUNK_HEIGHT, DEFAULT_TINT, SECTIONS_PER_CHUNK};
pub use generator::{AIR, BEDROCK, DIRT, GRASS, STONE};
pub use section::{block_index, Section, SECTION_DIM, SECTION_VOLUME};
pub use world::{pack_chunk_key, unpack_chunk_key, World};
