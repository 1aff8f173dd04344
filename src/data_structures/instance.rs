//! Instance transformation data for GPU rendering.
//!
//! Every placed object (maze tile, prop, light marker, particle) is described by
//! an [`Instance`]: origin, Euler orientation and non-uniform scale. The packed
//! [`InstanceRaw`] form is what the vertex shader reads per instance, together
//! with the object's diffuse colour.

use cgmath::{Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

use crate::data_structures::model;

/// Per-instance transformation: origin, Euler orientation (radians) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    /// Rotation about the x, y and z axes, applied in that order.
    pub orientation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            orientation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_angle_x(Rad(self.orientation.x))
            * Matrix3::from_angle_y(Rad(self.orientation.y))
            * Matrix3::from_angle_z(Rad(self.orientation.z))
    }

    /// translate, then rotate x/y/z, then scale.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation_matrix())
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse transpose of the upper 3x3 of [`to_matrix`](Self::to_matrix).
    ///
    /// The rotation is orthonormal, so this reduces to the rotation times the
    /// inverse scale. Normals stay perpendicular under non-uniform and mirrored
    /// scales; a zero scale axis contributes nothing.
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let inv = |s: f32| if s == 0.0 { 0.0 } else { s.recip() };
        self.rotation_matrix()
            * Matrix3::from_diagonal(Vector3::new(inv(self.scale.x), inv(self.scale.y), inv(self.scale.z)))
    }

    pub fn to_raw(&self, color: [f32; 4]) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: self.normal_matrix().into(),
            color,
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    color: [f32; 4],
}

impl InstanceRaw {
    pub fn color(&self) -> [f32; 4] {
        self.color
    }
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to:
 *
 * offset: zero as we want to use the full space.
 * stride: length of a vertex
 *
 * Stride layout here: model matrix (four vec4), normal matrix (three vec3), colour.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // The shader only advances to the next instance once a new instance starts
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 13,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{InnerSpace, Vector4, Zero};

    #[test]
    fn identity_instance_is_identity_matrix() {
        let m = Instance::new().to_matrix();
        assert_eq!(m, Matrix4::identity());
    }

    #[test]
    fn translation_is_applied_after_scale() {
        let instance = Instance::at(Vector3::new(1.0, 2.0, 3.0)).with_scale(Vector3::new(2.0, 2.0, 2.0));
        let p = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 3.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(p.z, 3.0);
    }

    #[test]
    fn rotation_about_y_turns_x_into_minus_z() {
        let mut instance = Instance::new();
        instance.orientation.y = std::f32::consts::FRAC_PI_2;
        let p = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn normals_stay_perpendicular_under_non_uniform_scale() {
        let mut instance = Instance::new().with_scale(Vector3::new(4.0, 1.0, 0.5));
        instance.orientation = Vector3::new(0.3, 1.1, -0.7);
        let model = instance.to_matrix();
        let linear = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());
        let normal_matrix = instance.normal_matrix();
        // the face x + y = 0 of a unit cube, spanned by the tangents below
        let normal = Vector3::new(1.0, 1.0, 0.0);
        for tangent in [Vector3::new(1.0, -1.0, 0.0), Vector3::new(0.0, 0.0, 1.0)] {
            assert_relative_eq!((normal_matrix * normal).dot(linear * tangent), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn uniform_scale_keeps_the_rotation_direction() {
        let mut instance = Instance::new().with_scale(Vector3::new(2.0, 2.0, 2.0));
        instance.orientation.y = 0.8;
        let n = Vector3::new(0.0, 0.0, 1.0);
        let scaled = (instance.normal_matrix() * n).normalize();
        assert_relative_eq!(scaled, instance.rotation_matrix() * n, epsilon = 1e-6);
    }

    #[test]
    fn raw_instance_carries_colour() {
        let raw = Instance::at(Vector3::zero()).to_raw([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(raw.color(), [0.1, 0.2, 0.3, 0.4]);
    }
}
