//! Lumen renderer - CPU path tracing over ECS sphere scenes.
//!
//! Geometry, materials and bounds are components in a [`lumen_ecs::World`].
//! A frame is rendered in three steps:
//!
//! 1. [`update_bounds`] recomputes [`Bounds`] from every [`Sphere`];
//! 2. [`Bvh::build`] builds the acceleration tree over those bounds;
//! 3. [`render_tiled`] traces the image in parallel row tiles.
//!
//! [`Scene`] bundles these steps for the common case.

mod bounds;
mod bvh;
mod camera;
mod hittable;
mod material;
pub mod random;
mod ray;
mod renderer;
mod scene;
mod settings;
mod sphere;
mod tile;

pub use bounds::{update_bounds, Bounds, BoundsView};
pub use bvh::{Bvh, BvhNode, BvhView, Traversal};
pub use camera::{Camera, CameraBuilder};
pub use hittable::{HitRecord, RenderView, SceneRef};
pub use material::{reflectance, Color, Material, MaterialError, ScatterKind, DIELECTRIC_OFFSET};
pub use ray::Ray;
pub use renderer::{
    color_to_rgba, linear_to_gamma, render_pixel, sky_color, trace_path, ImageBuffer, CHANNELS,
    HIT_EPSILON,
};
pub use scene::Scene;
pub use settings::RenderSettings;
pub use sphere::Sphere;
pub use tile::{generate_tiles, render_tile, render_tiled, RenderError, RenderStats, Tile};

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Vec3};
