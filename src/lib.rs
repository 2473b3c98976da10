//! Painted world generation library
//!
//! Procedural island terrain around a table of landmarks: value noise
//! with domain warping, a distance bias that keeps landmarks and the
//! roads between them on dry land, and a chunked raster cache for
//! panning over the result.
//!
//! Re-exports modules for use by binaries and tools.

pub mod ascii;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod landmarks;
pub mod paths;
pub mod props;
pub mod scene;
pub mod terrain;
pub mod value_noise;
pub mod viewer;
pub mod world;

pub use cache::{CacheStats, ChunkCache, EvictionPolicy};
pub use chunk::{ChunkCoord, TerrainChunk};
pub use config::WorldConfig;
pub use error::WorldError;
pub use landmarks::{Connection, Landmark, LandmarkCategory, Point};
pub use paths::Path;
pub use props::{Prop, PropKind};
pub use scene::{render_frame, Avatar, Camera, Frame, Scene, Viewport};
pub use terrain::{TerrainKind, TerrainParams};
pub use world::{generate_world, GeneratedWorld, World};
