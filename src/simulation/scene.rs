use crate::config::SceneConfig;
use crate::geometry::{AnimationState, ORBITER_RADIUS};
use crate::rendering::camera::{Camera, OrbitControls};
use crate::rendering::{FrameData, OrbiterInstance};
use crate::simulation::objects::Orbiter;
use crate::simulation::{InputState, TimeState};
use glam::{Mat4, Vec3};
use parking_lot::RwLock;
use std::sync::Arc;
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const CAMERA_DISTANCE: f32 = 20.0;
const ORBIT_SPEED_FACTOR: f64 = 1.25;

pub struct Scene {
    pub camera: Arc<RwLock<Camera>>,
    pub controls: OrbitControls,
    pub animation: AnimationState,
    pub orbiters: Vec<Orbiter>,
    pub time: TimeState,
    pub input: InputState,
    pub last_fps: Option<f32>,
    pub paused: bool,
    pub mesh_rotation: f32,
    config: SceneConfig,
    instances: Vec<OrbiterInstance>,
    config_changed: bool,
    hud_changed: bool,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let camera = Arc::new(RwLock::new(Camera::new(
            Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            Vec3::ZERO,
            16.0 / 9.0,
        )));
        let mut scene = Self {
            camera,
            controls: OrbitControls::new(Vec3::ZERO, CAMERA_DISTANCE),
            animation: AnimationState::new(config.orbit_step),
            orbiters: Vec::new(),
            time: TimeState::default(),
            input: InputState::default(),
            last_fps: None,
            paused: false,
            mesh_rotation: 0.0,
            config,
            instances: Vec::new(),
            config_changed: false,
            hud_changed: true,
        };
        scene.spawn_orbiters();
        scene.refresh_instances();
        scene
    }

    fn spawn_orbiters(&mut self) {
        self.orbiters = self
            .config
            .phase_offsets()
            .into_iter()
            .enumerate()
            .map(|(i, offset)| Orbiter::new(offset, ORBITER_RADIUS, self.config.orbiter_color(i)))
            .collect();
    }

    fn refresh_instances(&mut self) {
        self.instances.clear();
        let anim = &self.animation;
        self.instances
            .extend(self.orbiters.iter().map(|o| o.instance(anim)));
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Replace the active config. The renderer picks it up through
    /// `take_config_change`.
    pub fn set_config(&mut self, config: SceneConfig) {
        if config == self.config {
            return;
        }
        let respawn = config.orbiter_count != self.config.orbiter_count
            || config.phase_spacing != self.config.phase_spacing
            || config.orbiter_palette != self.config.orbiter_palette;
        self.animation.set_step(config.orbit_step);
        self.config = config;
        if respawn {
            self.spawn_orbiters();
            self.refresh_instances();
        }
        self.config_changed = true;
        self.hud_changed = true;
    }

    pub fn take_config_change(&mut self) -> Option<SceneConfig> {
        if std::mem::take(&mut self.config_changed) {
            Some(self.config.clone())
        } else {
            None
        }
    }

    pub fn take_hud_change(&mut self) -> bool {
        std::mem::take(&mut self.hud_changed)
    }

    pub fn update(&mut self) {
        self.time.update();

        let (dx, dy) = self.input.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            self.controls.rotate(dx, dy);
        }
        if self.input.scroll != 0.0 {
            self.controls.zoom(self.input.scroll);
        }
        self.controls.update(&mut self.camera.write());
        self.input.reset_deltas();

        if !self.paused {
            self.step_animation();
        }

        if let Some(fps) = self.time.fps_sample() {
            log::info!("FPS: {:.1}", fps);
            self.last_fps = Some(fps);
            self.hud_changed = true;
        }
    }

    /// Advance the clock and mesh rotation by one frame.
    pub fn step_animation(&mut self) {
        self.animation.tick();
        self.mesh_rotation =
            (self.mesh_rotation + self.config.rotation_speed) % std::f32::consts::TAU;
        self.refresh_instances();
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.mesh_rotation)
    }

    pub fn instances(&self) -> &[OrbiterInstance] {
        &self.instances
    }

    pub fn frame_data(&self) -> FrameData<'_> {
        FrameData {
            model: self.model_matrix(),
            instances: &self.instances,
        }
    }

    /// Handle a pressed key. Returns true when the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut next = self.config.clone();
        match code {
            KeyCode::KeyM => next.material = next.material.next(),
            KeyCode::KeyT => next.tone_mapping = next.tone_mapping.next(),
            KeyCode::KeyL => next.orbiter_lights = !next.orbiter_lights,
            KeyCode::KeyC => next.double_sided = !next.double_sided,
            KeyCode::KeyH => next.show_hud = !next.show_hud,
            KeyCode::Equal | KeyCode::NumpadAdd => next.orbit_step *= ORBIT_SPEED_FACTOR,
            KeyCode::Minus | KeyCode::NumpadSubtract => next.orbit_step /= ORBIT_SPEED_FACTOR,
            KeyCode::KeyP => {
                self.paused = !self.paused;
                self.hud_changed = true;
                return true;
            }
            KeyCode::KeyR => {
                self.controls.reset();
                return true;
            }
            _ => return false,
        }
        self.set_config(next);
        true
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.handle_key(code);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.handle_mouse_button(*button, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
            }
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.add_motion(delta.0 as f32, delta.1 as f32);
        }
    }

    pub fn hud_text(&self) -> String {
        if !self.config.show_hud {
            return String::new();
        }
        let fps = self.last_fps.unwrap_or(0.0);
        format!(
            "FPS: {:.1}{} | Material[M]: {:?} | Tone[T]: {:?} | Lights[L]: {} | Orbiters: {} | Step[+/-]: {:.4}",
            fps,
            if self.paused { " (PAUSED)" } else { "" },
            self.config.material,
            self.config.tone_mapping,
            if self.config.orbiter_lights { "ON" } else { "OFF" },
            self.orbiters.len(),
            self.animation.step(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaterialKind, ToneMapping};

    #[test]
    fn test_default_scene_has_five_staggered_orbiters() {
        let scene = Scene::new(SceneConfig::default());
        assert_eq!(scene.orbiters.len(), 5);
        assert_eq!(scene.instances().len(), 5);
        let first = Vec3::from(scene.instances()[0].center);
        assert!((first - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);
        for pair in scene.orbiters.windows(2) {
            assert!((pair[1].phase_offset - pair[0].phase_offset - 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_step_animation_moves_orbiters_and_mesh() {
        let mut scene = Scene::new(SceneConfig::default());
        let before = scene.instances()[0];
        scene.step_animation();
        assert!((scene.animation.time() - 0.002).abs() < 1e-12);
        assert!((scene.mesh_rotation - 0.001).abs() < 1e-7);
        assert_ne!(scene.instances()[0].center, before.center);
    }

    #[test]
    fn test_toggles_produce_config_change() {
        let mut scene = Scene::new(SceneConfig::default());
        assert!(scene.take_config_change().is_none());

        assert!(scene.handle_key(KeyCode::KeyM));
        assert!(scene.handle_key(KeyCode::KeyT));
        let change = scene.take_config_change().unwrap();
        assert_eq!(change.material, MaterialKind::Lit);
        assert_eq!(change.tone_mapping, ToneMapping::None);
        assert!(scene.take_config_change().is_none());

        assert!(!scene.handle_key(KeyCode::KeyZ));
        assert!(scene.take_config_change().is_none());
    }

    #[test]
    fn test_orbit_speed_keys_update_clock_step() {
        let mut scene = Scene::new(SceneConfig::default());
        scene.handle_key(KeyCode::Equal);
        assert!((scene.animation.step() - 0.0025).abs() < 1e-12);
        scene.handle_key(KeyCode::Minus);
        assert!((scene.animation.step() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_pause_is_scene_state_not_config() {
        let mut scene = Scene::new(SceneConfig::default());
        scene.handle_key(KeyCode::KeyP);
        assert!(scene.paused);
        assert!(scene.take_config_change().is_none());
        assert!(scene.hud_text().contains("PAUSED"));
    }

    #[test]
    fn test_set_config_respawns_orbiters() {
        let mut scene = Scene::new(SceneConfig::default());
        let mut config = scene.config().clone();
        config.orbiter_count = 2;
        scene.set_config(config);
        assert_eq!(scene.orbiters.len(), 2);
        assert_eq!(scene.instances().len(), 2);
    }

    #[test]
    fn test_hidden_hud_is_empty() {
        let mut scene = Scene::new(SceneConfig::default());
        scene.handle_key(KeyCode::KeyH);
        assert!(scene.hud_text().is_empty());
    }
}
