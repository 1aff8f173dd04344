//! Render pipelines of the scene renderer.
//!
//! All pipelines share one layout (material, camera, lights) and the same
//! vertex/instance buffer layout; they differ in shader, blending and depth
//! writes.

pub mod basic;
pub mod light;
pub mod transparent;

use crate::render::PipelineKind;

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub marker: wgpu::RenderPipeline,
    pub translucent_marker: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
        material_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = basic::mk_scene_layout(
            device,
            material_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        );
        Self {
            basic: basic::mk_basic_pipeline(device, &layout, color_format, sample_count),
            transparent: transparent::mk_transparent_pipeline(device, &layout, color_format, sample_count),
            marker: light::mk_marker_pipeline(device, &layout, color_format, sample_count, false),
            translucent_marker: light::mk_marker_pipeline(device, &layout, color_format, sample_count, true),
        }
    }

    pub fn get(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Opaque => &self.basic,
            PipelineKind::Transparent => &self.transparent,
            PipelineKind::Marker => &self.marker,
            PipelineKind::TranslucentMarker => &self.translucent_marker,
        }
    }
}
