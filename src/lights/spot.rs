use cgmath::{Deg, InnerSpace, Vector3};

use super::{LightSource, UniformTarget, UniformValue, normalize_or, spot_intensity};

/// Cone light. Cut-off angles are stored as cosines, converted once when set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    inner_cutoff: f32,
    outer_cutoff: f32,
    pub enabled: bool,
    /// Re-bind position and direction to the viewer every frame (flashlight).
    pub follow_viewer: bool,
}

impl Default for SpotLight {
    fn default() -> Self {
        let mut light = Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(1.0, 1.0, 1.0),
            specular: Vector3::new(1.0, 1.0, 1.0),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            inner_cutoff: 1.0,
            outer_cutoff: 1.0,
            enabled: true,
            follow_viewer: true,
        };
        light.set_cone_angles(Deg(12.5), Deg(15.0));
        light
    }
}

impl SpotLight {
    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Vector3<f32>) {
        self.direction = normalize_or(direction, self.direction);
    }

    pub fn set_cone_angles(&mut self, inner: Deg<f32>, outer: Deg<f32>) {
        if outer.0 < inner.0 {
            log::warn!("spot outer angle {outer:?} is inside inner angle {inner:?}, swapping");
        }
        let (inner, outer) = if outer.0 < inner.0 { (outer, inner) } else { (inner, outer) };
        self.inner_cutoff = inner.0.to_radians().cos();
        self.outer_cutoff = outer.0.to_radians().cos();
    }

    pub fn inner_cutoff(&self) -> f32 {
        self.inner_cutoff
    }

    pub fn outer_cutoff(&self) -> f32 {
        self.outer_cutoff
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        self.ambient = color * 0.1;
        self.diffuse = color * 0.8;
        self.specular = color;
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Cone factor for a point in world space, ignoring attenuation.
    pub fn intensity_towards(&self, point: Vector3<f32>) -> f32 {
        let to_point = normalize_or(point - self.position, self.direction);
        spot_intensity(to_point.dot(self.direction), self.inner_cutoff, self.outer_cutoff)
    }
}

impl LightSource for SpotLight {
    fn write_uniforms<T: UniformTarget + ?Sized>(&self, target: &mut T, _index: usize) {
        target.set_uniform("spot.position", UniformValue::Vec3(self.position));
        target.set_uniform("spot.direction", UniformValue::Vec3(self.direction));
        target.set_uniform("spot.ambient", UniformValue::Vec3(self.ambient));
        target.set_uniform("spot.diffuse", UniformValue::Vec3(self.diffuse));
        target.set_uniform("spot.specular", UniformValue::Vec3(self.specular));
        target.set_uniform("spot.constant", UniformValue::Float(self.constant));
        target.set_uniform("spot.linear", UniformValue::Float(self.linear));
        target.set_uniform("spot.quadratic", UniformValue::Float(self.quadratic));
        target.set_uniform("spot.inner_cutoff", UniformValue::Float(self.inner_cutoff));
        target.set_uniform("spot.outer_cutoff", UniformValue::Float(self.outer_cutoff));
        target.set_uniform("spot.enabled", UniformValue::Bool(self.enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cone_angles_are_stored_as_cosines() {
        let spot = SpotLight::default();
        assert_relative_eq!(spot.inner_cutoff(), 12.5f32.to_radians().cos());
        assert_relative_eq!(spot.outer_cutoff(), 15.0f32.to_radians().cos());
        assert!(spot.inner_cutoff() > spot.outer_cutoff());
    }

    #[test]
    fn swapped_angles_are_reordered() {
        let mut spot = SpotLight::default();
        spot.set_cone_angles(Deg(30.0), Deg(10.0));
        assert_relative_eq!(spot.inner_cutoff(), 10.0f32.to_radians().cos());
    }

    #[test]
    fn lights_along_axis_but_not_behind() {
        let spot = SpotLight::default();
        assert_eq!(spot.intensity_towards(Vector3::new(0.0, 0.0, -5.0)), 1.0);
        assert_eq!(spot.intensity_towards(Vector3::new(0.0, 0.0, 5.0)), 0.0);
        assert_eq!(spot.intensity_towards(Vector3::new(5.0, 0.0, -5.0)), 0.0);
    }

    #[test]
    fn toggle_flips_enabled() {
        let mut spot = SpotLight::default();
        assert!(!spot.toggle());
        assert!(spot.toggle());
    }
}
