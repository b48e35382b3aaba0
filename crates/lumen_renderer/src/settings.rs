//! Render settings.

use serde::{Deserialize, Serialize};

/// Scheduler and acceleration options for a render.
///
/// Image resolution and sampling quality live on the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Rows per tile
    pub tile_height: usize,
    /// Dedicated worker count; `None` uses the global rayon pool
    pub threads: Option<usize>,
    /// Use BVH candidates instead of testing every entity
    pub use_bvh: bool,
    /// Master seed for BVH splits and tile seeds
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tile_height: 1,
            threads: None,
            use_bvh: true,
            seed: 3,
        }
    }
}

impl RenderSettings {
    pub fn with_tile_height(mut self, rows: usize) -> Self {
        self.tile_height = rows.max(1);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    pub fn with_bvh(mut self, use_bvh: bool) -> Self {
        self.use_bvh = use_bvh;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
