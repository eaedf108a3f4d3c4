//! Geometry module: the Klein bottle surface, the orbital path and the
//! meshes built from them.
//!
//! Everything here is pure math with no GPU or window dependencies, so it can
//! be exercised directly from tests.

pub mod constants;
pub mod klein;
pub mod orbit;
pub mod sphere;
pub mod tessellation;

pub use constants::*;
pub use orbit::AnimationState;
pub use sphere::{generate_uv_sphere, SphereOptions};
pub use tessellation::{tessellate, GridSize, SurfaceMesh};

/// Errors raised while building meshes.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("tessellation grid must be non-empty, got {slices}x{stacks}")]
    EmptyGrid { slices: u32, stacks: u32 },
}

/// Tessellate the Klein bottle on the given grid.
pub fn klein_mesh(grid: GridSize) -> SurfaceMesh {
    let mesh = tessellate(klein::evaluate, grid);
    log::debug!(
        "Tessellated Klein bottle: {}x{} grid, {} vertices, {} triangles",
        grid.slices,
        grid.stacks,
        mesh.vertex_count(),
        mesh.indices.len() / 3
    );
    mesh
}
