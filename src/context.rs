use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, CameraUniform, Projection},
    config::AppConfig,
    data_structures::{
        model::GpuMesh,
        object::{Material, TextureId},
        texture::{self, Texture},
    },
    lights::LightsUniform,
    particles::MAX_PARTICLES,
    particles::MAX_FRAGMENTS,
    pipelines::{Pipelines, light::LightResources},
    resources::{
        load_mesh_obj,
        mesh::MeshData,
        texture::{load_texture, material_bind_group, material_layout},
    },
};

/// Shared cube and instance storage for the particle pass.
#[derive(Debug)]
pub struct ParticleResources {
    pub mesh: GpuMesh,
    pub instances: wgpu::Buffer,
    pub capacity: usize,
}

impl ParticleResources {
    fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: (capacity.max(1) * std::mem::size_of::<crate::data_structures::instance::InstanceRaw>())
                as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            mesh: GpuMesh::new(device, &MeshData::cube(), "particle"),
            instances,
            capacity,
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub(crate) msaa_target: Option<Texture>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
    pub camera: CameraResources,
    pub lights: LightResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    /// Bound for materials without a texture.
    pub white: wgpu::BindGroup,
    /// Indexed by [`TextureId`].
    pub textures: Vec<wgpu::BindGroup>,
    pub particles: ParticleResources,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, app_config: &AppConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter can present to this window")?;
        log::info!("adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .context("cannot open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders output linear colour and rely on an sRGB surface for the conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no texture formats")?;
        log::info!("surface format: {surface_format:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(app_config.vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sample_count = supported_sample_count(
            &adapter,
            surface_format,
            app_config.antialiasing.sample_count(),
        );

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(
            &Camera::new((0.0, 1.0, 0.0), cgmath::Deg(-90.0), cgmath::Deg(0.0)),
            &Projection::new(config.width, config.height, cgmath::Deg(70.0), 0.1, 100.0),
        );
        let camera = CameraResources::new(&device, camera_uniform);
        let lights = LightResources::new(&device, LightsUniform::default());
        let material_layout = material_layout(&device);

        let pipelines = Pipelines::new(
            &device,
            config.format,
            sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &lights.bind_group_layout,
        );

        let white = material_bind_group(
            &device,
            &material_layout,
            &Texture::create_white(&device, &queue),
            "white_material",
        );

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], sample_count, "depth_texture");
        let msaa_target =
            (sample_count > 1).then(|| Texture::create_msaa_target(&device, &config, sample_count));

        let particles = ParticleResources::new(&device, MAX_PARTICLES * MAX_FRAGMENTS);

        Ok(Self {
            window,
            depth_texture,
            msaa_target,
            surface,
            device,
            queue,
            config,
            sample_count,
            camera,
            lights,
            pipelines,
            material_layout,
            white,
            textures: Vec::new(),
            particles,
            clear_colour: wgpu::Color {
                r: 0.05,
                g: 0.07,
                b: 0.12,
                a: 1.0,
            },
        })
    }

    /// Loads every texture of the table, in order. Any failure is fatal.
    pub async fn load_textures(&mut self, files: &[&str]) -> anyhow::Result<()> {
        for file in files {
            let texture = load_texture(file, &self.device, &self.queue)
                .await
                .with_context(|| format!("cannot load texture {file}"))?;
            self.textures
                .push(material_bind_group(&self.device, &self.material_layout, &texture, file));
        }
        Ok(())
    }

    pub async fn load_mesh(&self, file: &str) -> anyhow::Result<MeshData> {
        load_mesh_obj(file)
            .await
            .with_context(|| format!("cannot load mesh {file}"))
    }

    pub fn material_bind_group(&self, material: &Material) -> &wgpu::BindGroup {
        match material.texture {
            Some(TextureId(i)) => self.textures.get(i).unwrap_or_else(|| {
                log::warn!("texture {i} is not loaded, drawing untextured");
                &self.white
            }),
            None => &self.white,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], self.sample_count, "depth_texture");
        self.msaa_target = (self.sample_count > 1)
            .then(|| Texture::create_msaa_target(&self.device, &self.config, self.sample_count));
    }

    pub fn set_vsync(&mut self, vsync: bool) {
        self.config.present_mode = present_mode(vsync);
        self.surface.configure(&self.device, &self.config);
        log::info!("vsync {}", if vsync { "on" } else { "off" });
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Largest count up to `requested` that both the colour and depth formats support.
fn supported_sample_count(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, requested: u32) -> u32 {
    if requested <= 1 {
        return 1;
    }
    let color = adapter.get_texture_format_features(format).flags;
    let depth = adapter.get_texture_format_features(texture::Texture::DEPTH_FORMAT).flags;
    let count = [16, 8, 4, 2]
        .into_iter()
        .filter(|&n| n <= requested)
        .find(|&n| color.sample_count_supported(n) && depth.sample_count_supported(n))
        .unwrap_or(1);
    if count != requested {
        log::warn!("{requested}x MSAA is not supported for {format:?}, using {count}x");
    }
    count
}
