//! Looping orbital path followed by the emissive spheres.
//!
//! The path is derived from the Klein bottle's centre line but does not call
//! `klein::evaluate`: `V` sweeps through a sine of the loop parameter, and the
//! z term uses `|sin(U)|`. Keep the two formulas separate.

use glam::DVec3;

use super::constants::{DEFAULT_ORBIT_STEP, TAU};

/// Animation clock shared by every orbiter of one scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    t: f64,
    step: f64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(DEFAULT_ORBIT_STEP)
    }
}

impl AnimationState {
    /// Create a clock at `t = 0` advancing by `step` per `tick`.
    pub fn new(step: f64) -> Self {
        Self {
            t: 0.0,
            step: sanitize(step),
        }
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.t
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn set_step(&mut self, step: f64) {
        self.step = sanitize(step);
    }

    /// Add `dt` to the accumulator. Negative or non-finite deltas are ignored
    /// so time never runs backwards.
    pub fn advance(&mut self, dt: f64) {
        self.t += sanitize(dt);
    }

    /// Advance by the configured per-frame step.
    pub fn tick(&mut self) {
        self.advance(self.step);
    }

    /// Loop parameter in `[0, 1)` for an orbiter with the given phase offset.
    pub fn loop_parameter(&self, phase_offset: f64) -> f64 {
        loop_parameter(self.t, phase_offset)
    }

    /// Current position of an orbiter with the given phase offset.
    pub fn position(&self, phase_offset: f64) -> DVec3 {
        path_point(self.loop_parameter(phase_offset))
    }
}

fn sanitize(dt: f64) -> f64 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// `(t + phase_offset) mod 1`, always in `[0, 1)`.
pub fn loop_parameter(t: f64, phase_offset: f64) -> f64 {
    let wrapped = (t + phase_offset).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Point on the orbital path for loop parameter `t_value`.
pub fn path_point(t_value: f64) -> DVec3 {
    let u = t_value * TAU;
    let v = (0.5 * (2.0 * t_value).sin() + 0.5) * TAU;
    let (sin_u, cos_u) = u.sin_cos();

    DVec3::new(
        6.0 * cos_u * (1.0 + sin_u),
        4.0 * (1.0 - cos_u / 2.0) * v.sin(),
        -16.0 * sin_u * (1.0 + 0.2 * sin_u.abs()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3, tol: f64) -> bool {
        (a - b).abs().max_element() < tol
    }

    #[test]
    fn test_start_position() {
        let anim = AnimationState::default();
        let p = anim.position(0.0);
        assert!(close(p, DVec3::new(6.0, 0.0, 0.0), 1e-9), "got {p:?}");
    }

    #[test]
    fn test_orbit_periodic_in_time() {
        for i in 0..40 {
            let t = -3.0 + i as f64 * 0.237;
            for offset in [0.0, 0.3, 0.6, 0.9, 1.2] {
                let a = path_point(loop_parameter(t, offset));
                let b = path_point(loop_parameter(t + 1.0, offset));
                assert!(close(a, b, 1e-9), "t={t} offset={offset}");
            }
        }
    }

    #[test]
    fn test_phase_separation() {
        let mut anim = AnimationState::default();
        for _ in 0..1000 {
            anim.tick();
            let a = anim.loop_parameter(0.0);
            let b = anim.loop_parameter(0.3);
            let diff = (b - a).rem_euclid(1.0);
            assert!((diff - 0.3).abs() < 1e-9, "diff {diff}");
            assert!((a - b).abs() > 1e-6);
        }
    }

    #[test]
    fn test_loop_parameter_range() {
        for t in [-2.5, -1e-18, 0.0, 0.999_999, 1.0, 17.25] {
            let w = loop_parameter(t, 0.0);
            assert!((0.0..1.0).contains(&w), "t={t} -> {w}");
        }
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut anim = AnimationState::new(0.01);
        anim.advance(0.5);
        assert_eq!(anim.time(), 0.5);
        anim.advance(-1.0);
        anim.advance(f64::NAN);
        assert_eq!(anim.time(), 0.5);
        anim.tick();
        assert!((anim.time() - 0.51).abs() < 1e-12);
    }

    #[test]
    fn test_orbiters_share_clock() {
        let mut anim = AnimationState::default();
        anim.advance(0.25);
        // offset 0.25 at t=0.25 is the same loop point as offset 0.5 at t=0
        let a = anim.position(0.25);
        let b = AnimationState::default().position(0.5);
        assert!(close(a, b, 1e-9));
    }

    #[test]
    fn test_path_differs_from_surface_formula() {
        let p = path_point(0.125);
        let s = crate::geometry::klein::evaluate(0.125, 0.5 * (0.25f64).sin() + 0.5);
        assert!((p - s).length() > 1e-3);
    }
}
