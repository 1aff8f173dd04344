//! First-person camera, projection and the controller driving them.
//!
//! Orientation is stored as yaw/pitch in degrees; the front/right/up basis is
//! recomputed whenever either changes. The projection caches its matrix and is
//! only rebuilt when the field of view or the aspect ratio changes.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::keyboard::KeyCode;

use crate::input::InputState;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const PITCH_LIMIT: f32 = 89.0;
pub const DEFAULT_FOV: f32 = 70.0;
pub const MIN_FOV: f32 = 20.0;
pub const MAX_FOV: f32 = 120.0;
/// Lowest allowed eye height in world units.
pub const FLOOR_EYE_HEIGHT: f32 = 1.0;

const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: f32,
    pitch: f32,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl Camera {
    /// `yaw` of -90 degrees looks down -z.
    pub fn new<V: Into<Point3<f32>>>(position: V, yaw: Deg<f32>, pitch: Deg<f32>) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.0,
            pitch: pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            front: Vector3::new(0.0, 0.0, -1.0),
            right: Vector3::new(1.0, 0.0, 0.0),
            up: WORLD_UP,
        };
        camera.update_vectors();
        camera
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn yaw(&self) -> Deg<f32> {
        Deg(self.yaw)
    }

    pub fn pitch(&self) -> Deg<f32> {
        Deg(self.pitch)
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Adds to yaw and pitch (degrees); pitch stays inside +-89.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw = (self.yaw + yaw_delta) % 360.0;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn eye(&self) -> Vector3<f32> {
        Vector3::new(self.position.x, self.position.y, self.position.z)
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front, self.up)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Deg<f32>,
    znear: f32,
    zfar: f32,
    matrix: Matrix4<f32>,
}

impl Projection {
    pub fn new<F: Into<Deg<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let mut projection = Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
            matrix: Matrix4::from_scale(1.0),
        };
        projection.rebuild();
        projection
    }

    fn rebuild(&mut self) {
        self.matrix = OPENGL_TO_WGPU_MATRIX * perspective(Rad::from(self.fovy), self.aspect, self.znear, self.zfar);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.rebuild();
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    /// Narrows the field of view for positive `delta` (degrees), clamped to [20, 120].
    pub fn zoom(&mut self, delta: f32) {
        let fov = (self.fovy.0 - delta).clamp(MIN_FOV, MAX_FOV);
        if fov != self.fovy.0 {
            self.fovy = Deg(fov);
            self.rebuild();
        }
    }

    pub fn reset_fov(&mut self) {
        self.fovy = Deg(DEFAULT_FOV);
        self.rebuild();
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        self.matrix
    }
}

/// Turns held keys and mouse deltas into camera motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    /// Units per second.
    pub speed: f32,
    pub sprint_multiplier: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(2.5, 0.1)
    }
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sprint_multiplier: 2.5,
            sensitivity,
        }
    }

    /// Sum of the held direction keys, normalized, scaled by speed and `dt`.
    pub fn desired_displacement(&self, camera: &Camera, input: &InputState, dt: f32) -> Vector3<f32> {
        let mut direction = Vector3::new(0.0, 0.0, 0.0);
        let bindings = [
            (KeyCode::KeyW, camera.front),
            (KeyCode::KeyS, -camera.front),
            (KeyCode::KeyD, camera.right),
            (KeyCode::KeyA, -camera.right),
            (KeyCode::Space, WORLD_UP),
            (KeyCode::ControlLeft, -WORLD_UP),
        ];
        for (key, dir) in bindings {
            if input.is_held(key) {
                direction += dir;
            }
        }
        if direction.magnitude2() <= f32::EPSILON {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        let mut speed = self.speed;
        if input.is_held(KeyCode::ShiftLeft) {
            speed *= self.sprint_multiplier;
        }
        direction.normalize() * speed * dt
    }

    /// Mouse deltas in pixels; moving the mouse up looks up.
    pub fn handle_mouse(&self, camera: &mut Camera, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        camera.rotate(dx as f32 * self.sensitivity, -dy as f32 * self.sensitivity);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, uniform: CameraUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera, projection: &Projection) {
        self.uniform.update_view_proj(camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(camera: &Camera) {
        assert_relative_eq!(camera.front().magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.right().magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.up().magnitude(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.front().dot(camera.right()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.front().dot(camera.up()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.right().dot(camera.up()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let camera = Camera::new((0.0, 1.0, 0.0), Deg(-90.0), Deg(0.0));
        assert_relative_eq!(camera.front(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(camera.right(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_orthonormal(&camera);
    }

    #[test]
    fn pitch_is_clamped_and_basis_stays_orthonormal() {
        let mut camera = Camera::new((0.0, 1.0, 0.0), Deg(-90.0), Deg(0.0));
        for _ in 0..50 {
            camera.rotate(13.0, 7.0);
            assert!(camera.pitch().0 <= PITCH_LIMIT);
            assert_orthonormal(&camera);
        }
        assert_eq!(camera.pitch(), Deg(PITCH_LIMIT));
        camera.rotate(0.0, -500.0);
        assert_eq!(camera.pitch(), Deg(-PITCH_LIMIT));
        assert_orthonormal(&camera);
    }

    #[test]
    fn mouse_up_looks_up() {
        let controller = CameraController::default();
        let mut camera = Camera::new((0.0, 1.0, 0.0), Deg(-90.0), Deg(0.0));
        controller.handle_mouse(&mut camera, 100.0, -50.0);
        assert_relative_eq!(camera.yaw().0, -80.0, epsilon = 1e-4);
        assert_relative_eq!(camera.pitch().0, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn fov_zoom_is_clamped_and_resettable() {
        let mut projection = Projection::new(800, 600, Deg(DEFAULT_FOV), 0.1, 100.0);
        let before = projection.calc_matrix();
        projection.zoom(30.0);
        assert_eq!(projection.fovy(), Deg(40.0));
        assert_ne!(projection.calc_matrix(), before);
        projection.zoom(100.0);
        assert_eq!(projection.fovy(), Deg(MIN_FOV));
        projection.zoom(-500.0);
        assert_eq!(projection.fovy(), Deg(MAX_FOV));
        projection.reset_fov();
        assert_eq!(projection.fovy(), Deg(DEFAULT_FOV));
        assert_eq!(projection.calc_matrix(), before);
    }

    #[test]
    fn diagonal_movement_is_normalized_and_sprint_scales() {
        let controller = CameraController::default();
        let camera = Camera::new((0.0, 1.0, 0.0), Deg(-90.0), Deg(0.0));
        let mut input = InputState::default();
        assert_eq!(
            controller.desired_displacement(&camera, &input, 1.0),
            Vector3::new(0.0, 0.0, 0.0)
        );

        input.press(KeyCode::KeyW);
        input.press(KeyCode::KeyD);
        let d = controller.desired_displacement(&camera, &input, 0.5);
        assert_relative_eq!(d.magnitude(), 2.5 * 0.5, epsilon = 1e-5);
        assert!(d.x > 0.0 && d.z < 0.0);

        input.press(KeyCode::ShiftLeft);
        let sprint = controller.desired_displacement(&camera, &input, 0.5);
        assert_relative_eq!(sprint.magnitude(), 2.5 * 2.5 * 0.5, epsilon = 1e-5);

        input.press(KeyCode::KeyS);
        input.press(KeyCode::KeyA);
        input.release(KeyCode::ShiftLeft);
        assert_eq!(
            controller.desired_displacement(&camera, &input, 0.5),
            Vector3::new(0.0, 0.0, 0.0)
        );
    }
}
