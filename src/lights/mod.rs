//! Light model: one directional sun, up to [`MAX_POINT_LIGHTS`] point lights and
//! one spotlight.
//!
//! Every light kind implements [`LightSource`] and writes its parameters into a
//! [`UniformTarget`] under a fixed naming scheme:
//!
//! - `sun.direction|ambient|diffuse|specular`
//! - `lights[i].position|ambient|diffuse|specular|constant|linear|quadratic` plus `num_lights`
//! - `spot.position|direction|ambient|diffuse|specular|constant|linear|quadratic|inner_cutoff|outer_cutoff|enabled`
//!
//! [`LightsUniform`] is the GPU-side block resolving those names. The attenuation
//! and cone falloff evaluated by the shader are mirrored by [`attenuation`] and
//! [`spot_intensity`].

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};

pub mod directional;
pub mod point;
pub mod spot;
pub mod uniform;

pub use directional::{DirectionalLight, SunOrbit};
pub use point::{LightMotion, PointLight};
pub use spot::SpotLight;
pub use uniform::LightsUniform;

pub const MAX_POINT_LIGHTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    pub fn kind(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Bool(_) => "bool",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

/// Anything that accepts named shader parameters.
///
/// Returns `false` when `name` does not resolve or the value has the wrong type.
/// The previous value is kept in that case; implementors log the failure.
pub trait UniformTarget {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool;
}

pub trait LightSource {
    /// Write this light's parameters. `index` selects the array slot for point lights
    /// and is ignored by singleton lights.
    fn write_uniforms<T: UniformTarget + ?Sized>(&self, target: &mut T, index: usize);
}

/// `1 / (constant + linear * d + quadratic * d^2)`
pub fn attenuation(constant: f32, linear: f32, quadratic: f32, distance: f32) -> f32 {
    1.0 / (constant + linear * distance + quadratic * distance * distance)
}

/// Smooth cone falloff.
///
/// `theta` is the cosine between the light-to-fragment direction and the spot
/// direction. Full intensity inside the inner cone, none outside the outer cone.
pub fn spot_intensity(theta: f32, inner_cos: f32, outer_cos: f32) -> f32 {
    let epsilon = inner_cos - outer_cos;
    if epsilon <= f32::EPSILON {
        return if theta >= inner_cos { 1.0 } else { 0.0 };
    }
    ((theta - outer_cos) / epsilon).clamp(0.0, 1.0)
}

pub(crate) fn normalize_or(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        fallback
    }
}

/// All lights of the scene and the rules that move them each frame.
#[derive(Clone, Debug)]
pub struct LightRig {
    pub sun: DirectionalLight,
    pub sun_orbit: SunOrbit,
    points: Vec<(PointLight, LightMotion)>,
    pub spot: SpotLight,
}

impl LightRig {
    pub fn new(sun: DirectionalLight, sun_orbit: SunOrbit, spot: SpotLight) -> Self {
        Self {
            sun,
            sun_orbit,
            points: Vec::new(),
            spot,
        }
    }

    /// Adds a point light and returns its index, or `None` once all slots are taken.
    pub fn add_point(&mut self, light: PointLight, motion: LightMotion) -> Option<usize> {
        if self.points.len() >= MAX_POINT_LIGHTS {
            log::warn!("point light ignored, all {MAX_POINT_LIGHTS} slots are in use");
            return None;
        }
        self.points.push((light, motion));
        Some(self.points.len() - 1)
    }

    pub fn points(&self) -> impl Iterator<Item = &PointLight> {
        self.points.iter().map(|(light, _)| light)
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Re-derive all moving light parameters for the given time and viewer.
    pub fn update(&mut self, elapsed: f32, eye: Vector3<f32>, front: Vector3<f32>) {
        self.sun.set_direction(self.sun_orbit.direction_at(elapsed));
        for (light, motion) in self.points.iter_mut() {
            if let Some(position) = motion.position_at(elapsed) {
                light.position = position;
            }
        }
        if self.spot.follow_viewer {
            self.spot.position = eye;
            self.spot.set_direction(front);
        }
    }

    pub fn write_uniforms<T: UniformTarget + ?Sized>(&self, target: &mut T) {
        self.sun.write_uniforms(target, 0);
        for (i, (light, _)) in self.points.iter().enumerate() {
            light.write_uniforms(target, i);
        }
        target.set_uniform("num_lights", UniformValue::Int(self.points.len() as i32));
        self.spot.write_uniforms(target, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn attenuation_is_one_over_constant_at_origin() {
        assert_relative_eq!(attenuation(1.0, 0.09, 0.032, 0.0), 1.0);
        assert_relative_eq!(attenuation(2.0, 0.09, 0.032, 0.0), 0.5);
    }

    #[test]
    fn attenuation_strictly_decreases_towards_zero() {
        let light = PointLight::default();
        let mut previous = light.attenuation_at(0.0);
        assert_relative_eq!(previous, 1.0 / light.constant);
        for step in 1..=500 {
            let a = light.attenuation_at(step as f32 * 0.25);
            assert!(a < previous);
            previous = a;
        }
        assert!(light.attenuation_at(1.0e4) < 1.0e-6);
        // still visibly lit well past twenty units
        assert!(light.attenuation_at(20.0) > 0.05);
    }

    #[test]
    fn cone_falloff_bounds_and_monotonicity() {
        let inner = 12.5f32.to_radians().cos();
        let outer = 15.0f32.to_radians().cos();
        assert_eq!(spot_intensity(1.0, inner, outer), 1.0);
        assert_eq!(spot_intensity(inner, inner, outer), 1.0);
        assert_eq!(spot_intensity(outer, inner, outer), 0.0);
        assert_eq!(spot_intensity(20.0f32.to_radians().cos(), inner, outer), 0.0);

        let mut previous = 1.0;
        for i in 0..=100 {
            let deg = 12.5 + 2.5 * i as f32 / 100.0;
            let intensity = spot_intensity(deg.to_radians().cos(), inner, outer);
            assert!(intensity <= previous + 1e-6);
            previous = intensity;
        }
    }

    #[test]
    fn rig_caps_point_lights() {
        let mut rig = LightRig::new(DirectionalLight::default(), SunOrbit::default(), SpotLight::default());
        for _ in 0..MAX_POINT_LIGHTS {
            assert!(rig.add_point(PointLight::default(), LightMotion::Fixed).is_some());
        }
        assert_eq!(rig.add_point(PointLight::default(), LightMotion::Fixed), None);
        assert_eq!(rig.point_count(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn attached_spot_follows_viewer() {
        let mut rig = LightRig::new(DirectionalLight::default(), SunOrbit::default(), SpotLight::default());
        rig.update(3.0, Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -4.0));
        assert_eq!(rig.spot.position, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(rig.spot.direction(), Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(rig.sun.direction().magnitude(), 1.0, epsilon = 1e-6);
    }
}
