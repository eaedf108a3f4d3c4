use glam::DVec3;

use super::constants::TAU;

/// Evaluate the Klein bottle surface at normalized parameters `(u, v)`.
///
/// Both parameters are scaled by 2π internally, so the surface repeats with
/// period 1 in each direction and a grid over `[0, 1] x [0, 1]` closes without
/// a seam. Any finite input is valid. NaN or infinite input yields an
/// unspecified (non-finite) point but never panics.
pub fn evaluate(u: f64, v: f64) -> DVec3 {
    let u = u * TAU;
    let v = v * TAU;
    let (sin_u, cos_u) = u.sin_cos();
    let (sin_v, cos_v) = v.sin_cos();

    // Tube radius, widened toward the bottom by the sin(u) term
    let r = 4.0 * (1.0 - cos_u / 2.0) * (1.0 + 0.2 * sin_u);

    DVec3::new(
        6.0 * cos_u * (1.0 + sin_u) + r * cos_v,
        r * sin_v,
        -16.0 * sin_u * (1.0 + 0.2 * cos_u),
    )
}
