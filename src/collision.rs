//! Axis-aligned collision between the viewer and solid scene objects.
//!
//! The viewer is treated as a point inflated by a radius. A move that would
//! overlap any solid box is retried one axis at a time (x, then y, then z) so
//! the viewer slides along walls instead of stopping on contact.

use cgmath::Vector3;

use crate::data_structures::instance::Instance;

/// Axis-aligned bounding box given by its minimum and maximum corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Cube of half-extent `radius` around `p`.
    pub fn around_point(p: Vector3<f32>, radius: f32) -> Self {
        let r = Vector3::new(radius, radius, radius);
        Self::new(p - r, p + r)
    }

    /// Bounds of a unit cube placed by `instance`. Rotation is ignored.
    pub fn of_unit_cube(instance: &Instance) -> Self {
        let half = instance.scale.map(|s| s.abs() * 0.5);
        Self::new(instance.position - half, instance.position + half)
    }

    /// Strict overlap; touching faces do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

pub fn collides(position: Vector3<f32>, radius: f32, solids: &[Aabb]) -> bool {
    let probe = Aabb::around_point(position, radius);
    solids.iter().any(|solid| probe.intersects(solid))
}

/// Returns the part of `displacement` that can be applied from `position`.
///
/// The full move is tried first. If it collides, each axis is tried on its own,
/// starting from the position reached by the axes accepted so far, and only the
/// non-colliding components are kept.
pub fn resolve_displacement(
    position: Vector3<f32>,
    displacement: Vector3<f32>,
    radius: f32,
    solids: &[Aabb],
) -> Vector3<f32> {
    if !collides(position + displacement, radius, solids) {
        return displacement;
    }

    let mut resolved = Vector3::new(0.0, 0.0, 0.0);
    for axis in 0..3 {
        if displacement[axis] == 0.0 {
            continue;
        }
        let mut step = Vector3::new(0.0, 0.0, 0.0);
        step[axis] = displacement[axis];
        if !collides(position + resolved + step, radius, solids) {
            resolved[axis] = displacement[axis];
        }
    }
    resolved
}

/// Keeps the eye at least `min_height` above the ground plane.
pub fn clamp_to_floor(mut position: Vector3<f32>, min_height: f32) -> Vector3<f32> {
    if position.y < min_height {
        position.y = min_height;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall_at(x: f32, z: f32) -> Aabb {
        Aabb::of_unit_cube(&Instance::at(Vector3::new(x, 1.0, z)))
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b));
        let c = Aabb::new(Vector3::new(0.9, 0.5, 0.5), Vector3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&c));
    }

    #[test]
    fn free_move_is_untouched() {
        let solids = [wall_at(5.0, 5.0)];
        let d = Vector3::new(0.1, 0.0, 0.2);
        assert_eq!(resolve_displacement(Vector3::new(1.0, 1.0, 1.0), d, 0.2, &solids), d);
    }

    #[test]
    fn diagonal_into_wall_slides_along_x() {
        // Wall directly in +z; moving diagonally keeps the x component.
        let solids = [wall_at(1.0, 2.0)];
        let pos = Vector3::new(1.0, 1.0, 1.2);
        let d = Vector3::new(0.3, 0.0, 0.3);
        assert!(collides(pos + d, 0.2, &solids));
        let resolved = resolve_displacement(pos, d, 0.2, &solids);
        assert_relative_eq!(resolved.x, 0.3);
        assert_relative_eq!(resolved.z, 0.0);
    }

    #[test]
    fn corner_blocks_both_axes() {
        let solids = [wall_at(2.0, 1.0), wall_at(1.0, 2.0), wall_at(2.0, 2.0)];
        let pos = Vector3::new(1.2, 1.0, 1.2);
        let resolved = resolve_displacement(pos, Vector3::new(0.3, 0.0, 0.3), 0.2, &solids);
        assert_eq!(resolved, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn floor_clamp_only_raises() {
        assert_eq!(clamp_to_floor(Vector3::new(0.0, 0.2, 0.0), 1.0).y, 1.0);
        assert_eq!(clamp_to_floor(Vector3::new(0.0, 3.0, 0.0), 1.0).y, 3.0);
    }
}
