use cgmath::{InnerSpace, Vector3};

use super::{LightSource, UniformTarget, UniformValue, normalize_or};

/// The sun. Direction points from the light into the scene and is always unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vector3::new(0.0, -1.0, 0.0),
            ambient: Vector3::new(0.2, 0.2, 0.2),
            diffuse: Vector3::new(0.8, 0.8, 0.7),
            specular: Vector3::new(1.0, 1.0, 0.9),
        }
    }
}

impl DirectionalLight {
    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Vector3<f32>) {
        self.direction = normalize_or(direction, self.direction);
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        self.ambient = color * 0.2;
        self.diffuse = color * 0.8;
        self.specular = color;
    }
}

impl LightSource for DirectionalLight {
    fn write_uniforms<T: UniformTarget + ?Sized>(&self, target: &mut T, _index: usize) {
        target.set_uniform("sun.direction", UniformValue::Vec3(self.direction));
        target.set_uniform("sun.ambient", UniformValue::Vec3(self.ambient));
        target.set_uniform("sun.diffuse", UniformValue::Vec3(self.diffuse));
        target.set_uniform("sun.specular", UniformValue::Vec3(self.specular));
    }
}

/// Slow circular sweep of the sun around the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunOrbit {
    /// Radians per second.
    pub angular_speed: f32,
    /// Horizontal share of the direction; the vertical part is always -1.
    pub spread: f32,
}

impl Default for SunOrbit {
    fn default() -> Self {
        Self {
            angular_speed: 0.1,
            spread: 0.6,
        }
    }
}

impl SunOrbit {
    pub fn direction_at(&self, elapsed: f32) -> Vector3<f32> {
        let angle = elapsed * self.angular_speed;
        Vector3::new(angle.cos() * self.spread, -1.0, angle.sin() * self.spread).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn direction_is_normalized_on_set() {
        let mut sun = DirectionalLight::default();
        sun.set_direction(Vector3::new(3.0, -4.0, 0.0));
        assert_relative_eq!(sun.direction(), Vector3::new(0.6, -0.8, 0.0));
        sun.set_direction(Vector3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(sun.direction(), Vector3::new(0.6, -0.8, 0.0));
    }

    #[test]
    fn orbit_stays_above_horizon_and_periodic() {
        let orbit = SunOrbit::default();
        let period = std::f32::consts::TAU / orbit.angular_speed;
        for i in 0..32 {
            let t = i as f32 * 1.7;
            let d = orbit.direction_at(t);
            assert_relative_eq!(d.magnitude(), 1.0, epsilon = 1e-6);
            assert!(d.y < 0.0);
            assert_relative_eq!(d, orbit.direction_at(t + period), epsilon = 1e-4);
        }
    }

    #[test]
    fn set_color_scales_components() {
        let mut sun = DirectionalLight::default();
        sun.set_color(Vector3::new(1.0, 0.5, 0.0));
        assert_relative_eq!(sun.ambient, Vector3::new(0.2, 0.1, 0.0));
        assert_relative_eq!(sun.diffuse, Vector3::new(0.8, 0.4, 0.0));
        assert_eq!(sun.specular, Vector3::new(1.0, 0.5, 0.0));
    }
}
