/// One acquired swapchain frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// one. Finalize with `Gpu::present`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
