use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::{Texture, TextureHandle},
    },
    pipelines::ShaderBinding,
    resources::texture::diffuse_layout,
};

/// Bind group slot of the transform uniforms.
pub const TRANSFORM_GROUP: u32 = 1;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TransformUniform {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl TransformUniform {
    fn identity() -> Self {
        let identity: [[f32; 4]; 4] = cgmath::Matrix4::<f32>::identity().into();
        Self {
            model: identity,
            view: identity,
            projection: identity,
        }
    }

    /// Byte offset of the named matrix inside the uniform buffer.
    fn offset_of(name: &str) -> Option<wgpu::BufferAddress> {
        let offset = match name {
            "model" => std::mem::offset_of!(TransformUniform, model),
            "view" => std::mem::offset_of!(TransformUniform, view),
            "projection" => std::mem::offset_of!(TransformUniform, projection),
            _ => return None,
        };
        Some(offset as wgpu::BufferAddress)
    }
}

/**
 * Lit, textured pipeline for imported models.
 *
 * Group 0 is the diffuse texture (texture unit 0), group 1 holds the `model`, `view` and
 * `projection` matrices. The caller binds the shader, sets the matrices and then asks
 * meshes or models to draw themselves.
 */
#[derive(Debug)]
pub struct ModelShader {
    pipeline: wgpu::RenderPipeline,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    untextured: TextureHandle,
}

impl ModelShader {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model transform buffer"),
            contents: bytemuck::cast_slice(&[TransformUniform::identity()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("transform_bind_group_layout"),
            });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
            label: Some("transform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Model Pipeline Layout"),
                bind_group_layouts: &[
                    Some(&diffuse_layout(device)),
                    Some(&transform_bind_group_layout),
                ],
                immediate_size: 0,
            });

        let pipeline = create_pipeline(
            device,
            &render_pipeline_layout,
            color_format,
            depth_format,
        );

        // white keeps untextured meshes lit but uncoloured
        let white = Texture::create_solid([255, 255, 255, 255], 1, 1, device, queue);
        let untextured = TextureHandle::new(device, white, "untextured_bind_group");

        Self {
            pipeline,
            transform_buffer,
            transform_bind_group,
            untextured,
        }
    }

    /// Makes this shader the current one for subsequent draws in `render_pass`.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(TRANSFORM_GROUP, &self.transform_bind_group, &[]);
    }

    /// Writes one of the `model`, `view` or `projection` uniforms.
    ///
    /// The write lands with the next queue submission, so set all matrices before
    /// submitting the pass that draws with them.
    pub fn set_matrix4(
        &self,
        queue: &wgpu::Queue,
        name: &str,
        matrix: cgmath::Matrix4<f32>,
    ) -> anyhow::Result<()> {
        let Some(offset) = TransformUniform::offset_of(name) else {
            anyhow::bail!("shader has no 4x4 matrix uniform named {name:?}");
        };
        let raw: [[f32; 4]; 4] = matrix.into();
        queue.write_buffer(&self.transform_buffer, offset, bytemuck::cast_slice(&raw));
        Ok(())
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}

/// Opaque triangle list over [`ModelVertex`], no culling since imported assets are not
/// guaranteed to be closed or consistently wound.
fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Model Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("model.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Model Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ModelVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
    })
}

impl ShaderBinding for ModelShader {
    fn untextured(&self) -> &wgpu::BindGroup {
        &self.untextured.bind_group
    }
}
