use super::{MAX_POINT_LIGHTS, UniformTarget, UniformValue};

// Every member is a vec4 so the Rust layout matches WGSL uniform alignment without padding fields.

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SunRaw {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointRaw {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic, unused
    pub attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotRaw {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
    /// inner cosine, outer cosine, enabled (0 or 1), unused
    pub cutoff: [f32; 4],
}

/// The light block bound at group 2 of the lit shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub sun: SunRaw,
    pub points: [PointRaw; MAX_POINT_LIGHTS],
    pub spot: SpotRaw,
    /// number of active point lights, unused x3
    pub counts: [u32; 4],
}

enum Slot<'a> {
    Vec3(&'a mut [f32; 4]),
    Float(&'a mut f32),
    Flag(&'a mut f32),
    Count(&'a mut u32),
}

impl LightsUniform {
    pub fn num_lights(&self) -> usize {
        self.counts[0] as usize
    }

    pub fn spot_enabled(&self) -> bool {
        self.spot.cutoff[2] > 0.5
    }

    fn slot(&mut self, name: &str) -> Option<Slot<'_>> {
        if name == "num_lights" {
            return Some(Slot::Count(&mut self.counts[0]));
        }
        if let Some(field) = name.strip_prefix("sun.") {
            let sun = &mut self.sun;
            return match field {
                "direction" => Some(Slot::Vec3(&mut sun.direction)),
                "ambient" => Some(Slot::Vec3(&mut sun.ambient)),
                "diffuse" => Some(Slot::Vec3(&mut sun.diffuse)),
                "specular" => Some(Slot::Vec3(&mut sun.specular)),
                _ => None,
            };
        }
        if let Some(field) = name.strip_prefix("spot.") {
            let spot = &mut self.spot;
            return match field {
                "position" => Some(Slot::Vec3(&mut spot.position)),
                "direction" => Some(Slot::Vec3(&mut spot.direction)),
                "ambient" => Some(Slot::Vec3(&mut spot.ambient)),
                "diffuse" => Some(Slot::Vec3(&mut spot.diffuse)),
                "specular" => Some(Slot::Vec3(&mut spot.specular)),
                "constant" => Some(Slot::Float(&mut spot.attenuation[0])),
                "linear" => Some(Slot::Float(&mut spot.attenuation[1])),
                "quadratic" => Some(Slot::Float(&mut spot.attenuation[2])),
                "inner_cutoff" => Some(Slot::Float(&mut spot.cutoff[0])),
                "outer_cutoff" => Some(Slot::Float(&mut spot.cutoff[1])),
                "enabled" => Some(Slot::Flag(&mut spot.cutoff[2])),
                _ => None,
            };
        }
        let (index, field) = parse_indexed(name, "lights")?;
        let light = self.points.get_mut(index)?;
        match field {
            "position" => Some(Slot::Vec3(&mut light.position)),
            "ambient" => Some(Slot::Vec3(&mut light.ambient)),
            "diffuse" => Some(Slot::Vec3(&mut light.diffuse)),
            "specular" => Some(Slot::Vec3(&mut light.specular)),
            "constant" => Some(Slot::Float(&mut light.attenuation[0])),
            "linear" => Some(Slot::Float(&mut light.attenuation[1])),
            "quadratic" => Some(Slot::Float(&mut light.attenuation[2])),
            _ => None,
        }
    }
}

/// Splits `array[i].field` into `(i, field)`.
fn parse_indexed<'n>(name: &'n str, array: &str) -> Option<(usize, &'n str)> {
    let rest = name.strip_prefix(array)?.strip_prefix('[')?;
    let (index, field) = rest.split_once(']')?;
    Some((index.parse().ok()?, field.strip_prefix('.')?))
}

impl UniformTarget for LightsUniform {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        let Some(slot) = self.slot(name) else {
            log::warn!("uniform {name} does not resolve in the light block");
            return false;
        };
        match (slot, value) {
            (Slot::Vec3(dst), UniformValue::Vec3(v)) => {
                dst[..3].copy_from_slice(&[v.x, v.y, v.z]);
            }
            (Slot::Float(dst), UniformValue::Float(f)) => *dst = f,
            (Slot::Flag(dst), UniformValue::Bool(b)) => *dst = if b { 1.0 } else { 0.0 },
            (Slot::Count(dst), UniformValue::Int(n)) => {
                let clamped = n.clamp(0, MAX_POINT_LIGHTS as i32);
                if clamped != n {
                    log::warn!("{name} = {n} clamped to {clamped}");
                }
                *dst = clamped as u32;
            }
            (_, value) => {
                log::warn!("uniform {name} cannot take a {} value", value.kind());
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{
        DirectionalLight, LightMotion, LightRig, PointLight, SpotLight, SunOrbit,
    };
    use cgmath::Vector3;

    #[test]
    fn layout_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<SunRaw>(), 64);
        assert_eq!(std::mem::size_of::<PointRaw>(), 80);
        assert_eq!(std::mem::size_of::<SpotRaw>(), 112);
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
    }

    #[test]
    fn indexed_names_resolve() {
        let mut block = LightsUniform::default();
        assert!(block.set_uniform("lights[3].position", UniformValue::Vec3(Vector3::new(1.0, 2.0, 3.0))));
        assert_eq!(block.points[3].position, [1.0, 2.0, 3.0, 0.0]);
        assert!(block.set_uniform("lights[7].quadratic", UniformValue::Float(0.5)));
        assert_eq!(block.points[7].attenuation[2], 0.5);
    }

    #[test]
    fn unresolved_names_keep_previous_values() {
        let mut block = LightsUniform::default();
        block.set_uniform("sun.ambient", UniformValue::Vec3(Vector3::new(0.2, 0.2, 0.2)));
        let before = block;
        assert!(!block.set_uniform("lights[8].position", UniformValue::Vec3(Vector3::new(1.0, 1.0, 1.0))));
        assert!(!block.set_uniform("lights[x].position", UniformValue::Float(1.0)));
        assert!(!block.set_uniform("sun.colour", UniformValue::Vec3(Vector3::new(1.0, 1.0, 1.0))));
        assert!(!block.set_uniform("sun.ambient", UniformValue::Float(1.0)));
        assert!(!block.set_uniform("model", UniformValue::Mat4(cgmath::Matrix4::from_scale(1.0))));
        assert_eq!(block, before);
    }

    #[test]
    fn rig_fills_whole_block() {
        let mut rig = LightRig::new(DirectionalLight::default(), SunOrbit::default(), SpotLight::default());
        rig.add_point(PointLight::at(Vector3::new(1.0, 1.0, 1.0)), LightMotion::Fixed);
        rig.add_point(PointLight::at(Vector3::new(2.0, 1.0, 2.0)), LightMotion::Fixed);
        rig.spot.toggle();

        let mut block = LightsUniform::default();
        rig.write_uniforms(&mut block);
        assert_eq!(block.num_lights(), 2);
        assert_eq!(block.sun.direction[1], -1.0);
        assert_eq!(block.points[1].position[..3], [2.0, 1.0, 2.0]);
        assert_eq!(block.points[0].attenuation[..3], [1.0, 0.09, 0.032]);
        assert!(!block.spot_enabled());
        assert!(block.spot.cutoff[0] > block.spot.cutoff[1]);
    }

    #[test]
    fn light_count_is_clamped() {
        let mut block = LightsUniform::default();
        assert!(block.set_uniform("num_lights", UniformValue::Int(42)));
        assert_eq!(block.num_lights(), MAX_POINT_LIGHTS);
    }
}
