use cgmath::Vector3;

use super::{LightSource, UniformTarget, UniformValue, attenuation};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.8, 0.8, 0.8),
            specular: Vector3::new(1.0, 1.0, 1.0),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl PointLight {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn set_color(&mut self, color: Vector3<f32>) {
        self.ambient = color * 0.1;
        self.diffuse = color * 0.8;
        self.specular = color;
    }

    pub fn with_color(mut self, color: Vector3<f32>) -> Self {
        self.set_color(color);
        self
    }

    /// The colour the light was configured with (its specular term).
    pub fn color(&self) -> Vector3<f32> {
        self.specular
    }

    pub fn attenuation_at(&self, distance: f32) -> f32 {
        attenuation(self.constant, self.linear, self.quadratic, distance)
    }
}

impl LightSource for PointLight {
    fn write_uniforms<T: UniformTarget + ?Sized>(&self, target: &mut T, index: usize) {
        let name = |field: &str| format!("lights[{index}].{field}");
        target.set_uniform(&name("position"), UniformValue::Vec3(self.position));
        target.set_uniform(&name("ambient"), UniformValue::Vec3(self.ambient));
        target.set_uniform(&name("diffuse"), UniformValue::Vec3(self.diffuse));
        target.set_uniform(&name("specular"), UniformValue::Vec3(self.specular));
        target.set_uniform(&name("constant"), UniformValue::Float(self.constant));
        target.set_uniform(&name("linear"), UniformValue::Float(self.linear));
        target.set_uniform(&name("quadratic"), UniformValue::Float(self.quadratic));
    }
}

/// How a point light moves over time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightMotion {
    Fixed,
    /// Horizontal circle around `center`.
    Orbit {
        center: Vector3<f32>,
        radius: f32,
        angular_speed: f32,
        phase: f32,
    },
}

impl LightMotion {
    /// Position at `elapsed` seconds, `None` for lights that never move.
    pub fn position_at(&self, elapsed: f32) -> Option<Vector3<f32>> {
        match *self {
            LightMotion::Fixed => None,
            LightMotion::Orbit {
                center,
                radius,
                angular_speed,
                phase,
            } => {
                let angle = phase + elapsed * angular_speed;
                Some(center + Vector3::new(angle.cos() * radius, 0.0, angle.sin() * radius))
            }
        }
    }
}
