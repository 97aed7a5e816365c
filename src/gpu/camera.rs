//! Damped orbit camera.

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraSettings;

const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 60.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera for viewing the particles.
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of pending rotation applied (and removed) per update.
    damping: f32,
    /// Rotation still to be applied, (yaw, pitch).
    pending: Vec2,
}

impl Camera {
    /// Place the camera at `settings.position`, looking at `settings.target`.
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let offset = settings.position - settings.target;
        let distance = offset.length().max(MIN_DISTANCE);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target: settings.target,
            fov_y: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            damping: settings.damping.clamp(0.0, 1.0),
            pending: Vec2::ZERO,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(f32::EPSILON), self.near, self.far)
    }

    /// Queue a rotation from a mouse drag, in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending += Vec2::new(-dx, dy) * 0.005;
    }

    /// Move toward or away from the target.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - scroll * 0.1)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Apply a share of the pending rotation. Call once per frame.
    pub fn update(&mut self) {
        let applied = if self.damping > 0.0 {
            self.pending * self.damping
        } else {
            self.pending
        };
        self.pending -= applied;

        self.yaw += applied.x;
        self.pitch = (self.pitch + applied.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}
