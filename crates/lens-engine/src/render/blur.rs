use wgpu::util::DeviceExt;

use crate::coords::ColorRgba;
use crate::filter::{BlurParams, BlurParamsError, BlurUniform};

use super::ctx::RenderTarget;
use super::mesh::{QuadMesh, QuadVertex};
use super::resource::{Owned, ResourceKind};
use super::shader::{ShaderError, ShaderProgram, ShaderSources, ShaderStage};
use super::target::OffscreenTarget;

/// Composite pass: draws the quad to the screen target, sampling the
/// offscreen texture through the box-blur fragment stage.
pub struct BlurPass {
    target_format: wgpu::TextureFormat,
    params: BlurParams,

    _program: ShaderProgram,
    _bind_group_layout: Owned<wgpu::BindGroupLayout>,
    _pipeline_layout: Owned<wgpu::PipelineLayout>,
    pipeline: Owned<wgpu::RenderPipeline>,

    params_ubo: Owned<wgpu::Buffer>,
    bind_group: Owned<wgpu::BindGroup>,
}

impl BlurPass {
    /// Builds the pipeline for `target_format` and binds `source`.
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        source: &OffscreenTarget,
        params: BlurParams,
    ) -> Result<Self, ShaderError> {
        Self::with_sources(device, target_format, source, params, &ShaderSources::box_blur())
    }

    pub fn with_sources(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        source: &OffscreenTarget,
        params: BlurParams,
        sources: &ShaderSources<'_>,
    ) -> Result<Self, ShaderError> {
        let program = ShaderProgram::build(device, sources)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lens blur bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<BlurUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lens blur pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lens blur pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: program.vertex_module(),
                entry_point: Some(ShaderStage::Vertex.entry_point()),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: program.fragment_module(),
                entry_point: Some(ShaderStage::Fragment.entry_point()),
                compilation_options: Default::default(),
                // Replace, no blending: the blurred image overwrites the cleared screen.
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: QuadMesh::TOPOLOGY,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let params_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lens blur params ubo"),
            contents: bytemuck::bytes_of(&params.uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lens blur bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(source.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_ubo.as_entire_binding(),
                },
            ],
        });

        log::debug!(
            "blur pass ready: {} taps, step {}, target {target_format:?}",
            params.taps(),
            params.step
        );

        Ok(Self {
            target_format,
            params,
            _program: program,
            _bind_group_layout: Owned::new(ResourceKind::BindGroupLayout, "blur bgl", bind_group_layout),
            _pipeline_layout: Owned::new(ResourceKind::PipelineLayout, "blur layout", pipeline_layout),
            pipeline: Owned::new(ResourceKind::RenderPipeline, "blur pipeline", pipeline),
            params_ubo: Owned::new(ResourceKind::Buffer, "blur params", params_ubo),
            bind_group: Owned::new(ResourceKind::BindGroup, "blur bind group", bind_group),
        })
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    pub fn params(&self) -> BlurParams {
        self.params
    }

    /// Uploads new step/radius values.
    ///
    /// The address mode is fixed by the source target's sampler; a different
    /// `edge` is rejected, as are values `BlurParams::validate` refuses.
    pub fn set_params(
        &mut self,
        queue: &wgpu::Queue,
        params: BlurParams,
    ) -> Result<(), BlurParamsError> {
        params.validate()?;
        if params.edge != self.params.edge {
            return Err(BlurParamsError::EdgeModeChanged {
                current: self.params.edge,
                requested: params.edge,
            });
        }

        self.params = params;
        queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&params.uniform()));
        log::debug!("blur params: {} taps, step {}", params.taps(), params.step);
        Ok(())
    }

    /// Binds the screen target, clears it, and draws the blurred quad.
    pub fn draw(&self, target: &mut RenderTarget<'_>, quad: &QuadMesh, clear: ColorRgba) {
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lens composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &*self.bind_group, &[]);
        quad.draw(&mut rpass);
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, Rgba32FImage};

    use super::*;
    use crate::coords::Viewport;
    use crate::device::testing::try_gpu;
    use crate::device::HeadlessGpu;
    use crate::filter::{box_blur, EdgeMode};
    use crate::render::CaptureTarget;

    const SIZE: u32 = 64;

    /// Black field with one bright column and one bright row.
    fn cross(column: u32, row: u32) -> Rgba32FImage {
        Rgba32FImage::from_fn(SIZE, SIZE, |x, y| {
            if x == column || y == row {
                Rgba([1.0, 1.0, 1.0, 1.0])
            } else {
                Rgba([0.0, 0.0, 0.0, 1.0])
            }
        })
    }

    fn upload(queue: &wgpu::Queue, target: &OffscreenTarget, src: &Rgba32FImage) {
        let bytes: Vec<u8> = src
            .pixels()
            .flat_map(|p| p.0.map(|c| (c * 255.0).round() as u8))
            .collect();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: target.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SIZE * 4),
                rows_per_image: Some(SIZE),
            },
            target.size().extent(),
        );
    }

    fn composite(gpu: &HeadlessGpu, src: &Rgba32FImage, params: BlurParams) -> image::RgbaImage {
        let size = Viewport::new(SIZE, SIZE);
        let offscreen = OffscreenTarget::new(gpu.device(), size, params.edge).unwrap();
        upload(gpu.queue(), &offscreen, src);

        let pass = BlurPass::new(gpu.device(), CaptureTarget::FORMAT, &offscreen, params).unwrap();
        let quad = QuadMesh::new(gpu.device());
        let capture = CaptureTarget::new(gpu.device(), size).unwrap();

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        pass.draw(
            &mut RenderTarget::new(&mut encoder, capture.view()),
            &quad,
            ColorRgba::black(),
        );
        gpu.queue().submit(std::iter::once(encoder.finish()));

        capture.read(gpu.device(), gpu.queue()).unwrap()
    }

    #[test]
    fn gpu_blur_matches_cpu_reference() {
        let Some(gpu) = try_gpu() else { return };
        let params = BlurParams {
            radius: 4,
            step: 1.0 / SIZE as f32,
            edge: EdgeMode::Clamp,
        };
        // Asymmetric placement catches swapped axes and a missing V flip.
        let src = cross(20, 11);

        let gpu_img = composite(&gpu, &src, params);
        let cpu_img = box_blur(&src, SIZE, SIZE, &params);

        for (x, y, p) in gpu_img.enumerate_pixels() {
            let expected = cpu_img.get_pixel(x, y).0;
            for c in 0..4 {
                let want = expected[c] * 255.0;
                assert!(
                    (p.0[c] as f32 - want).abs() <= 1.0,
                    "pixel ({x},{y}) channel {c}: gpu {} cpu {want}",
                    p.0[c]
                );
            }
        }

        // One column of the 9x9 window overlaps the stripe.
        let far = gpu_img.get_pixel(20, 40).0[0] as f32;
        assert!((far - 255.0 * 9.0 / 81.0).abs() <= 1.0, "stripe center {far}");
    }

    #[test]
    fn set_params_validates_and_keeps_edge_mode() {
        let Some(gpu) = try_gpu() else { return };
        let offscreen =
            OffscreenTarget::new(gpu.device(), Viewport::new(8, 8), EdgeMode::Repeat).unwrap();
        let mut pass = BlurPass::new(
            gpu.device(),
            CaptureTarget::FORMAT,
            &offscreen,
            BlurParams::default(),
        )
        .unwrap();

        let huge = BlurParams { radius: 1000, ..BlurParams::default() };
        assert_eq!(
            pass.set_params(gpu.queue(), huge),
            Err(BlurParamsError::RadiusTooLarge { radius: 1000, max: BlurParams::MAX_RADIUS })
        );

        let clamp = BlurParams { edge: EdgeMode::Clamp, ..BlurParams::default() };
        assert_eq!(
            pass.set_params(gpu.queue(), clamp),
            Err(BlurParamsError::EdgeModeChanged {
                current: EdgeMode::Repeat,
                requested: EdgeMode::Clamp,
            })
        );
        assert_eq!(pass.params(), BlurParams::default());

        let wider = BlurParams { radius: 2, step: 0.01, ..BlurParams::default() };
        assert_eq!(pass.set_params(gpu.queue(), wider), Ok(()));
        assert_eq!(pass.params(), wider);
    }
}
