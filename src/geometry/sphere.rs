//! UV sphere used as the shared orbiter mesh.

#[derive(Clone, Copy, Debug)]
pub struct SphereOptions {
    pub radius: f32,
    pub stacks: u32,
    pub slices: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: super::constants::ORBITER_RADIUS,
            stacks: super::constants::ORBITER_SPHERE_STACKS,
            slices: super::constants::ORBITER_SPHERE_SLICES,
        }
    }
}

/// Generate a UV sphere centred on the origin.
///
/// Returns `(positions, normals, indices)`; indices form a CCW triangle list.
pub fn generate_uv_sphere(opts: SphereOptions) -> (Vec<[f32; 3]>, Vec<[f32; 3]>, Vec<u32>) {
    let stacks = opts.stacks.max(2);
    let slices = opts.slices.max(3);

    let count = ((stacks + 1) * (slices + 1)) as usize;
    let mut positions = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);

    for stack in 0..=stacks {
        let phi = stack as f32 / stacks as f32 * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for slice in 0..=slices {
            let theta = slice as f32 / slices as f32 * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let n = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            positions.push([n[0] * opts.radius, n[1] * opts.radius, n[2] * opts.radius]);
            normals.push(n);
        }
    }

    let ring = slices + 1;
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    for stack in 0..stacks {
        for slice in 0..slices {
            let i0 = stack * ring + slice;
            let i1 = i0 + 1;
            let i2 = (stack + 1) * ring + slice;
            let i3 = i2 + 1;

            indices.extend_from_slice(&[i0, i1, i2]);
            indices.extend_from_slice(&[i1, i3, i2]);
        }
    }

    (positions, normals, indices)
}
