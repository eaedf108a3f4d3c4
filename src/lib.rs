//! Klein bottle visualization: a parametric surface mesh with a handful of
//! emissive spheres looping along a path derived from the same shape.

pub mod config;
pub mod geometry;
pub mod rendering;
pub mod simulation;

pub use config::SceneConfig;
pub use geometry::{klein, orbit, AnimationState};
