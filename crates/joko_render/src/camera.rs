use egui::{pos2, Pos2};
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use joko_link::WorldLink;

/// The view of the host camera for a single frame.
/// Rebuilt from the link every tick. Never cached across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// normalized view direction
    pub front: Vec3,
    pub view_proj: Mat4,
    /// viewport size in pixels
    pub viewport: Vec2,
}

impl Camera {
    pub const Z_NEAR: f32 = 1.0;
    pub const Z_FAR: f32 = 1000.0;

    /// None if the inputs can't make a valid projection (zero sized viewport, zero view direction etc..)
    pub fn new(position: Vec3, front: Vec3, fov: f32, viewport: Vec2) -> Option<Self> {
        let front = front.normalize_or_zero();
        if front == Vec3::ZERO
            || !position.is_finite()
            || !(fov > 0.0 && fov < std::f32::consts::PI)
            || !(viewport.x >= 1.0 && viewport.y >= 1.0)
        {
            return None;
        }
        // looking straight up/down makes Y a useless up vector
        let up = if front.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_lh(position, position + front, up);
        let proj = Mat4::perspective_lh(fov, viewport.x / viewport.y, Self::Z_NEAR, Self::Z_FAR);
        Some(Self {
            position,
            front,
            view_proj: proj * view,
            viewport,
        })
    }
    pub fn from_link(link: &WorldLink) -> Option<Self> {
        Self::new(
            link.cam_pos,
            link.f_camera_front,
            link.fov,
            link.client_size.as_vec2(),
        )
    }
    /// Projects a world position to screen pixels.
    /// None if the point is behind the camera or outside the view frustum.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Pos2> {
        let ndc = self.to_ndc(world)?;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(self.ndc_to_screen(ndc))
    }
    /// Same as [Self::world_to_screen], but keeps points which are in front of the camera and outside the screen.
    /// Useful for measuring sizes of things near the screen edges.
    pub fn world_to_screen_unclipped(&self, world: Vec3) -> Option<Pos2> {
        self.to_ndc(world).map(|ndc| self.ndc_to_screen(ndc))
    }
    /// The ray from the camera through a screen pixel. (origin, normalized direction)
    pub fn screen_ray(&self, screen: Pos2) -> Option<(Vec3, Vec3)> {
        let ndc_x = (2.0 * screen.x / self.viewport.x) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / self.viewport.y);
        let inv = self.view_proj.inverse();
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let direction = (far - self.position).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }
        Some((self.position, direction))
    }
    /// Camera facing basis on the ground plane: (forward, right).
    /// Falls back to world Z when looking straight down.
    pub fn horizontal_basis(&self) -> (Vec3, Vec3) {
        let forward = Vec3::new(self.front.x, 0.0, self.front.z).normalize_or_zero();
        let forward = if forward == Vec3::ZERO { Vec3::Z } else { forward };
        let right = Vec3::Y.cross(forward);
        (forward, right)
    }
    fn to_ndc(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_proj * world.extend(1.0);
        if !clip.is_finite() || clip.w <= f32::EPSILON {
            return None;
        }
        Some(clip.xyz() / clip.w)
    }
    fn ndc_to_screen(&self, ndc: Vec3) -> Pos2 {
        pos2(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }
}
