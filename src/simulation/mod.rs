//! Simulation module for scene state and animation
//!
//! Ties the geometry clock to the renderer: owns the orbiters, the mesh
//! rotation, timing and user input.

pub mod objects;
pub mod scene;

pub use objects::Orbiter;
pub use scene::Scene;

use winit::event::{ElementState, MouseButton};

/// Mouse state for the orbit controls.
#[derive(Debug, Default)]
pub struct InputState {
    pub dragging: bool,
    pub mouse_delta: (f32, f32),
    pub scroll: f32,
}

impl InputState {
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    pub fn add_motion(&mut self, dx: f32, dy: f32) {
        if self.dragging {
            self.mouse_delta.0 += dx;
            self.mouse_delta.1 += dy;
        }
    }

    pub fn reset_deltas(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.scroll = 0.0;
    }
}

/// Frame counting and FPS sampling
#[derive(Debug, Clone)]
pub struct TimeState {
    pub frame_count: u64,
    pub last_fps_instant: std::time::Instant,
}

impl Default for TimeState {
    fn default() -> Self {
        let now = std::time::Instant::now();
        Self {
            frame_count: 0,
            last_fps_instant: now,
        }
    }
}

impl TimeState {
    pub fn update(&mut self) {
        self.frame_count += 1;
    }

    /// Frames per second over the last window, at most once per second.
    pub fn fps_sample(&mut self) -> Option<f32> {
        let now = std::time::Instant::now();
        let elapsed = now.duration_since(self.last_fps_instant).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.last_fps_instant = now;
            Some(fps)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_only_while_dragging() {
        let mut input = InputState::default();
        input.add_motion(5.0, 5.0);
        assert_eq!(input.mouse_delta, (0.0, 0.0));

        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.add_motion(5.0, -2.0);
        input.add_motion(1.0, 1.0);
        assert_eq!(input.mouse_delta, (6.0, -1.0));

        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        input.reset_deltas();
        input.add_motion(3.0, 3.0);
        assert_eq!(input.mouse_delta, (0.0, 0.0));
    }

    #[test]
    fn test_fps_sample_waits_for_window() {
        let mut time = TimeState::default();
        time.update();
        assert!(time.fps_sample().is_none());

        time.last_fps_instant -= std::time::Duration::from_secs(2);
        time.frame_count = 120;
        let fps = time.fps_sample().unwrap();
        assert!(fps > 50.0 && fps <= 60.0, "fps {fps}");
        assert_eq!(time.frame_count, 0);
    }
}
