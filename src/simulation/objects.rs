use glam::Vec3;

use crate::geometry::AnimationState;
use crate::rendering::OrbiterInstance;

/// One emissive sphere travelling the orbital loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbiter {
    pub phase_offset: f64,
    pub radius: f32,
    pub color: [f32; 3],
}

impl Orbiter {
    pub fn new(phase_offset: f64, radius: f32, color: [f32; 3]) -> Self {
        Self {
            phase_offset,
            radius,
            color,
        }
    }

    /// World-space position for the shared animation clock.
    pub fn position(&self, anim: &AnimationState) -> Vec3 {
        anim.position(self.phase_offset).as_vec3()
    }

    pub fn instance(&self, anim: &AnimationState) -> OrbiterInstance {
        OrbiterInstance {
            center: self.position(anim).to_array(),
            radius: self.radius,
            color: self.color,
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_carries_position() {
        let anim = AnimationState::default();
        let orbiter = Orbiter::new(0.0, 0.6, [1.0, 0.0, 0.0]);
        let inst = orbiter.instance(&anim);
        assert!((Vec3::from(inst.center) - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(inst.radius, 0.6);
        assert_eq!(inst.color, [1.0, 0.0, 0.0]);
    }
}
