use glam::{Mat4, Vec3};

/// Perspective camera. Right-handed system; looks down -Z by default.
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            fov_y: 75f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        };
        camera.look_at(position, target);
        camera
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }
    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect.max(1e-6), self.near, self.far)
    }
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Place the camera at `position` facing `target`.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        let forward = (target - position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        if forward == Vec3::ZERO || right == Vec3::ZERO {
            // degenerate: keep the previous basis, move only
            self.position = position;
            return;
        }
        self.position = position;
        self.forward = forward;
        self.right = right;
        self.up = right.cross(forward).normalize();
    }
}

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit controls with damping: input accumulates into pending deltas and a
/// fixed fraction of them is applied per frame.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
    home: (f32, f32, f32),
}

impl OrbitControls {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 2.0,
            max_distance: 200.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
            home: (0.0, 0.0, distance),
        }
    }

    /// Queue a rotation from a mouse drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * self.rotate_speed;
        self.pending_pitch += dy * self.rotate_speed;
    }

    /// Queue a zoom; positive `lines` moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.pending_zoom -= lines * self.zoom_speed;
    }

    pub fn reset(&mut self) {
        let (yaw, pitch, distance) = self.home;
        self.yaw = yaw;
        self.pitch = pitch;
        self.distance = distance;
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_zoom = 0.0;
    }

    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.target + self.distance * Vec3::new(cp * sy, sp, cp * cy)
    }

    /// Apply one frame of damped motion and update `cam`.
    pub fn update(&mut self, cam: &mut Camera) {
        let f = self.damping.clamp(0.0, 1.0);

        let dyaw = self.pending_yaw * f;
        let dpitch = self.pending_pitch * f;
        let dzoom = self.pending_zoom * f;
        self.pending_yaw -= dyaw;
        self.pending_pitch -= dpitch;
        self.pending_zoom -= dzoom;

        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.distance = (self.distance * dzoom.exp()).clamp(self.min_distance, self.max_distance);

        let eye = self.eye();
        if eye != cam.position {
            cam.look_at(eye, self.target);
        }
    }
}
