//! Global constants for the visualization.
//!
//! Shape constants are baked into the surface and orbit formulas. Everything
//! else here is a default that `SceneConfig` can override.

// ---------------------------------------------------------------------------
// Mathematical Constants
// ---------------------------------------------------------------------------
pub const TAU: f64 = std::f64::consts::TAU;

// ---------------------------------------------------------------------------
// Tessellation
// ---------------------------------------------------------------------------
pub const DEFAULT_SLICES: u32 = 80; // samples along u
pub const DEFAULT_STACKS: u32 = 40; // samples along v
pub const NORMAL_EPSILON: f64 = 1e-5; // finite-difference step for normals

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------
pub const DEFAULT_ORBIT_STEP: f64 = 0.002; // accumulator increment per tick
pub const DEFAULT_ROTATION_SPEED: f32 = 0.001; // mesh yaw per frame (rad)
pub const DEFAULT_ORBITER_COUNT: u32 = 5;
pub const DEFAULT_PHASE_SPACING: f64 = 0.3;
pub const MAX_ORBITERS: u32 = 16; // must match the light array in the surface shader

// ---------------------------------------------------------------------------
// Orbiter Appearance
// ---------------------------------------------------------------------------
pub const ORBITER_RADIUS: f32 = 0.6;
pub const ORBITER_SPHERE_STACKS: u32 = 16;
pub const ORBITER_SPHERE_SLICES: u32 = 32;
