//! Grid sampling of parametric surfaces into indexed triangle meshes.

use glam::{DVec3, Vec3};
use rayon::prelude::*;

use super::constants::NORMAL_EPSILON;
use super::GeometryError;

/// Sampled grid dimensions. `slices` runs along `u`, `stacks` along `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub slices: u32,
    pub stacks: u32,
}

impl GridSize {
    pub fn new(slices: u32, stacks: u32) -> Result<Self, GeometryError> {
        if slices == 0 || stacks == 0 {
            return Err(GeometryError::EmptyGrid { slices, stacks });
        }
        Ok(Self { slices, stacks })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        ((self.slices + 1) * (self.stacks + 1)) as usize
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        (self.slices * self.stacks * 6) as usize
    }
}

/// CPU-side mesh produced by tessellation, ready for GPU upload.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Sample `surface` over `[0, 1] x [0, 1]` on a regular grid.
///
/// Rows along `v` are evaluated in parallel; `surface` must be pure.
pub fn tessellate<F>(surface: F, grid: GridSize) -> SurfaceMesh
where
    F: Fn(f64, f64) -> DVec3 + Sync,
{
    let GridSize { slices, stacks } = grid;

    let rows: Vec<Vec<([f32; 3], [f32; 3], [f32; 2])>> = (0..=stacks)
        .into_par_iter()
        .map(|j| {
            let v = j as f64 / stacks as f64;
            (0..=slices)
                .map(|i| {
                    let u = i as f64 / slices as f64;
                    let p = surface(u, v);
                    let n = finite_difference_normal(&surface, u, v, p);
                    (
                        p.as_vec3().to_array(),
                        n.to_array(),
                        [u as f32, v as f32],
                    )
                })
                .collect()
        })
        .collect();

    let mut mesh = SurfaceMesh {
        positions: Vec::with_capacity(grid.vertex_count()),
        normals: Vec::with_capacity(grid.vertex_count()),
        uvs: Vec::with_capacity(grid.vertex_count()),
        indices: Vec::with_capacity(grid.index_count()),
    };
    for (p, n, uv) in rows.into_iter().flatten() {
        mesh.positions.push(p);
        mesh.normals.push(n);
        mesh.uvs.push(uv);
    }

    let ring = slices + 1;
    for j in 0..stacks {
        for i in 0..slices {
            let a = j * ring + i;
            let b = (j + 1) * ring + i;
            let c = (j + 1) * ring + i + 1;
            let d = j * ring + i + 1;

            // a -> d steps along u, a -> b along v: CCW about du x dv
            mesh.indices.extend_from_slice(&[a, d, b]);
            mesh.indices.extend_from_slice(&[d, c, b]);
        }
    }

    mesh
}

fn finite_difference_normal<F>(surface: &F, u: f64, v: f64, p: DVec3) -> Vec3
where
    F: Fn(f64, f64) -> DVec3,
{
    let du = if u - NORMAL_EPSILON >= 0.0 {
        p - surface(u - NORMAL_EPSILON, v)
    } else {
        surface(u + NORMAL_EPSILON, v) - p
    };
    let dv = if v - NORMAL_EPSILON >= 0.0 {
        p - surface(u, v - NORMAL_EPSILON)
    } else {
        surface(u, v + NORMAL_EPSILON) - p
    };
    du.cross(dv).normalize_or_zero().as_vec3()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::klein;

    #[test]
    fn test_rejects_empty_grid() {
        assert!(GridSize::new(0, 40).is_err());
        assert!(GridSize::new(80, 0).is_err());
    }

    #[test]
    fn test_counts_match_grid() {
        let grid = GridSize::new(80, 40).unwrap();
        let mesh = tessellate(klein::evaluate, grid);
        assert_eq!(mesh.vertex_count(), 81 * 41);
        assert_eq!(mesh.normals.len(), 81 * 41);
        assert_eq!(mesh.uvs.len(), 81 * 41);
        assert_eq!(mesh.indices.len(), 80 * 40 * 6);
        let max = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn test_seams_coincide() {
        let grid = GridSize::new(16, 8).unwrap();
        let mesh = tessellate(klein::evaluate, grid);
        let ring = 17;
        for j in 0..=8usize {
            let first = Vec3::from(mesh.positions[j * ring]);
            let last = Vec3::from(mesh.positions[j * ring + 16]);
            assert!((first - last).length() < 1e-4, "u seam row {j}");
        }
        for i in 0..ring {
            let bottom = Vec3::from(mesh.positions[i]);
            let top = Vec3::from(mesh.positions[8 * ring + i]);
            assert!((bottom - top).length() < 1e-4, "v seam col {i}");
        }
    }

    #[test]
    fn test_normals_are_unit_or_zero() {
        let grid = GridSize::new(24, 12).unwrap();
        let mesh = tessellate(klein::evaluate, grid);
        for n in &mesh.normals {
            let len = Vec3::from(*n).length();
            assert!(len < 1e-6 || (len - 1.0).abs() < 1e-3, "len {len}");
        }
    }

    #[test]
    fn test_plane_normal_direction() {
        let plane = |u: f64, v: f64| DVec3::new(u, v, 0.0);
        let mesh = tessellate(plane, GridSize::new(4, 4).unwrap());
        for n in &mesh.normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-4);
        }
    }

    fn wound_with_normals(mesh: &SurfaceMesh) -> usize {
        mesh.indices
            .chunks_exact(3)
            .filter(|tri| {
                let p: Vec<Vec3> = tri
                    .iter()
                    .map(|&i| Vec3::from(mesh.positions[i as usize]))
                    .collect();
                let n: Vec3 = tri.iter().map(|&i| Vec3::from(mesh.normals[i as usize])).sum();
                (p[1] - p[0]).cross(p[2] - p[0]).dot(n) > 0.0
            })
            .count()
    }

    #[test]
    fn test_plane_winding_matches_normals() {
        let plane = |u: f64, v: f64| DVec3::new(u, v, 0.0);
        let mesh = tessellate(plane, GridSize::new(4, 4).unwrap());
        assert_eq!(wound_with_normals(&mesh), 4 * 4 * 2);
    }

    #[test]
    fn test_klein_winding_matches_normals() {
        let mesh = tessellate(klein::evaluate, GridSize::new(80, 40).unwrap());
        assert_eq!(wound_with_normals(&mesh), mesh.indices.len() / 3);
    }

    #[test]
    fn test_first_vertex_is_origin_sample() {
        let mesh = tessellate(klein::evaluate, GridSize::new(8, 4).unwrap());
        let p = Vec3::from(mesh.positions[0]);
        assert!((p - Vec3::new(8.0, 0.0, 0.0)).length() < 1e-5);
    }
}
