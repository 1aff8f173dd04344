use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{lit_shader, mk_render_pipeline},
};

/**
 * Pipeline for the sorted transparent pass and the particle pass.
 *
 * Blends with `src_alpha, 1 - src_alpha` and keeps the depth test but not the
 * depth write, so translucent surfaces never hide what is drawn after them.
 * Objects must be submitted back to front.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(
        device,
        layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        false,
        sample_count,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        lit_shader(),
    )
}
