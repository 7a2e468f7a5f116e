use glam::{Vec2, Vec3};

/// Result of a line of sight query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RaycastResult {
    /// nothing between origin and target
    Clear,
    /// geometry was hit `distance` units away from the origin
    Blocked { distance: f32 },
    /// we have no collision data for this ray. callers must treat this as visible
    Unavailable,
}

/// Queries against static world geometry.
pub trait WorldCollision {
    /// line of sight from `origin` to `target`
    fn raycast(&self, origin: Vec3, target: Vec3) -> RaycastResult;
    /// first point on the world geometry along the ray, within `max_distance`
    fn pick(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// For hosts without any collision data. Everything is visible, nothing can be picked.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCollision;

impl WorldCollision for NoCollision {
    fn raycast(&self, _origin: Vec3, _target: Vec3) -> RaycastResult {
        RaycastResult::Unavailable
    }
    fn pick(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<Vec3> {
        None
    }
}

/// A coarse approximation of the world: a regular grid of ground heights on the xz plane.
#[derive(Debug, Clone)]
pub struct HeightmapCollision {
    /// world xz of the first sample
    origin: Vec2,
    /// distance between two samples
    cell_size: f32,
    /// samples along x
    width: usize,
    /// samples along z
    depth: usize,
    /// row major (z rows of x samples)
    heights: Vec<f32>,
}

impl HeightmapCollision {
    /// the ray must dip this far below the ground before we call it blocked.
    /// markers sit on the ground, so rays graze it near the target.
    const HEIGHT_TOLERANCE: f32 = 0.1;
    /// refinement steps when picking
    const PICK_BISECTIONS: usize = 8;

    pub fn new(
        origin: Vec2,
        cell_size: f32,
        width: usize,
        depth: usize,
        heights: Vec<f32>,
    ) -> Option<Self> {
        if width < 2 || depth < 2 || !(cell_size > 0.0) || heights.len() != width * depth {
            return None;
        }
        Some(Self {
            origin,
            cell_size,
            width,
            depth,
            heights,
        })
    }
    pub fn flat(origin: Vec2, cell_size: f32, width: usize, depth: usize, height: f32) -> Option<Self> {
        Self::new(origin, cell_size, width, depth, vec![height; width * depth])
    }
    pub fn set_height(&mut self, x: usize, z: usize, height: f32) {
        if x < self.width && z < self.depth {
            self.heights[z * self.width + x] = height;
        }
    }
    /// bilinear sample of the ground height. None outside the grid
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let gx = (x - self.origin.x) / self.cell_size;
        let gz = (z - self.origin.y) / self.cell_size;
        let max_x = (self.width - 1) as f32;
        let max_z = (self.depth - 1) as f32;
        if !(0.0..=max_x).contains(&gx) || !(0.0..=max_z).contains(&gz) {
            return None;
        }
        let x0 = gx.floor() as usize;
        let z0 = gz.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let z1 = (z0 + 1).min(self.depth - 1);
        let wx = gx - x0 as f32;
        let wz = gz - z0 as f32;

        let h00 = self.heights[z0 * self.width + x0];
        let h10 = self.heights[z0 * self.width + x1];
        let h01 = self.heights[z1 * self.width + x0];
        let h11 = self.heights[z1 * self.width + x1];

        let h_top = h00 * (1.0 - wx) + h10 * wx;
        let h_bottom = h01 * (1.0 - wx) + h11 * wx;
        Some(h_top * (1.0 - wz) + h_bottom * wz)
    }
    fn step(&self) -> f32 {
        self.cell_size * 0.5
    }
}

impl WorldCollision for HeightmapCollision {
    fn raycast(&self, origin: Vec3, target: Vec3) -> RaycastResult {
        let ray = target - origin;
        let length = ray.length();
        if !length.is_finite() {
            return RaycastResult::Unavailable;
        }
        if length <= f32::EPSILON {
            return RaycastResult::Clear;
        }
        let steps = (length / self.step()).ceil().max(1.0) as usize;
        let mut sampled = false;
        // endpoints are skipped. the camera and the target are above ground by definition
        for i in 1..steps {
            let t = i as f32 / steps as f32;
            let point = origin + ray * t;
            if let Some(ground) = self.height_at(point.x, point.z) {
                sampled = true;
                if ground - point.y > Self::HEIGHT_TOLERANCE {
                    return RaycastResult::Blocked {
                        distance: length * t,
                    };
                }
            }
        }
        if sampled || steps == 1 {
            RaycastResult::Clear
        } else {
            RaycastResult::Unavailable
        }
    }

    fn pick(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || !(max_distance > 0.0) {
            return None;
        }
        let below = |p: Vec3| self.height_at(p.x, p.z).map(|h| p.y <= h);
        let step = self.step();
        let mut previous = 0.0;
        let mut travelled = step;
        while travelled <= max_distance {
            let point = origin + direction * travelled;
            if below(point) == Some(true) {
                // bisect between the last point above ground and this one
                let (mut low, mut high) = (previous, travelled);
                for _ in 0..Self::PICK_BISECTIONS {
                    let mid = (low + high) * 0.5;
                    if below(origin + direction * mid) == Some(true) {
                        high = mid;
                    } else {
                        low = mid;
                    }
                }
                let hit = origin + direction * high;
                return self
                    .height_at(hit.x, hit.z)
                    .map(|ground| Vec3::new(hit.x, ground, hit.z));
            }
            previous = travelled;
            travelled += step;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[fixture]
    fn ground() -> HeightmapCollision {
        // 100x100 units centered on the origin, flat at y = 0
        HeightmapCollision::flat(Vec2::new(-50.0, -50.0), 1.0, 101, 101, 0.0).unwrap()
    }

    #[rstest]
    fn clear_line_of_sight(ground: HeightmapCollision) {
        let result = ground.raycast(Vec3::new(0.0, 10.0, -20.0), Vec3::new(0.0, 1.5, 20.0));
        assert_eq!(result, RaycastResult::Clear);
    }

    #[rstest]
    fn hill_blocks_line_of_sight(mut ground: HeightmapCollision) {
        // a ridge across z = 0
        for x in 0..101 {
            ground.set_height(x, 50, 30.0);
        }
        let result = ground.raycast(Vec3::new(0.0, 5.0, -20.0), Vec3::new(0.0, 1.5, 20.0));
        match result {
            RaycastResult::Blocked { distance } => assert!(distance > 15.0 && distance < 25.0),
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[rstest]
    fn rays_outside_the_grid_fail_open(ground: HeightmapCollision) {
        let result = ground.raycast(
            Vec3::new(500.0, 5.0, 500.0),
            Vec3::new(600.0, 1.5, 600.0),
        );
        assert_eq!(result, RaycastResult::Unavailable);
        assert_eq!(
            NoCollision.raycast(Vec3::ZERO, Vec3::ONE),
            RaycastResult::Unavailable
        );
    }

    #[rstest]
    fn pick_finds_the_ground(ground: HeightmapCollision) {
        let hit = ground
            .pick(Vec3::new(3.0, 20.0, -4.0), Vec3::new(0.0, -1.0, 0.0), 100.0)
            .unwrap();
        assert!((hit - Vec3::new(3.0, 0.0, -4.0)).length() < 0.01);
        // looking at the sky
        assert!(ground
            .pick(Vec3::new(3.0, 20.0, -4.0), Vec3::Y, 100.0)
            .is_none());
    }

    #[test]
    fn rejects_malformed_grids() {
        assert!(HeightmapCollision::new(Vec2::ZERO, 1.0, 2, 2, vec![0.0; 3]).is_none());
        assert!(HeightmapCollision::new(Vec2::ZERO, 0.0, 2, 2, vec![0.0; 4]).is_none());
        assert!(HeightmapCollision::new(Vec2::ZERO, 1.0, 1, 4, vec![0.0; 4]).is_none());
    }

    #[test]
    fn bilinear_height() {
        let map = HeightmapCollision::new(Vec2::ZERO, 2.0, 2, 2, vec![0.0, 2.0, 0.0, 2.0]).unwrap();
        assert_eq!(map.height_at(1.0, 1.0), Some(1.0));
        assert_eq!(map.height_at(2.0, 0.0), Some(2.0));
        assert_eq!(map.height_at(2.5, 0.0), None);
    }
}
