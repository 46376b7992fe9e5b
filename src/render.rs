use crate::constants::{CLEAR_RGBA, MAX_POINT_SIZE_PX};
use burst_core::{BurstId, Camera, ParticleBurst, ParticleVertex};
use fnv::FnvHashMap;
use glam::Mat4;
use web_sys as web;

mod helpers;

static PARTICLES_WGSL: &str = include_str!("../shaders/particles.wgsl");

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BurstUniforms {
    view_proj: [[f32; 4]; 4],
    viewport: [f32; 2],
    point_size: f32,
    opacity: f32,
    max_point_px: f32,
    _pad: [f32; 3],
}

/// GPU side of one burst, dropped when the simulator releases it.
struct BurstResources {
    instances: wgpu::Buffer,
    count: u32,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    bursts: FnvHashMap<BurstId, BurstResources>,
    staging: Vec<ParticleVertex>,
    point_size: f32,
    pixel_ratio: f32,
}

impl GpuState {
    pub async fn new(canvas: &web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Rgba8Unorm
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        // Transparent canvas composited over the page
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particles_shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLES_WGSL.into()),
        });
        let uniform_layout = helpers::create_uniform_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particles_pl"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let pipeline =
            helpers::make_particle_pipeline(&device, &pipeline_layout, &shader, format);
        log::info!("[gpu] surface {}x{} {:?} {:?}", width, height, format, alpha_mode);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_layout,
            bursts: FnvHashMap::default(),
            staging: Vec::new(),
            point_size: 0.0,
            pixel_ratio: 1.0,
        })
    }

    /// World-space point size and the backing-store pixel ratio it scales by.
    pub fn set_point_size(&mut self, point_size: f32, pixel_ratio: f32) {
        self.point_size = point_size;
        self.pixel_ratio = pixel_ratio;
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.config.width || height != self.config.height {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Drop the buffers of a burst the simulator has released.
    pub fn release_burst(&mut self, id: BurstId) {
        if self.bursts.remove(&id).is_some() {
            log::debug!("[gpu] burst {} buffers released", id);
        }
    }

    fn upload(&mut self, burst: &ParticleBurst, view_proj: [[f32; 4]; 4]) {
        let id = burst.id();
        let count = burst.len() as u32;
        if !self.bursts.contains_key(&id) {
            let instances = helpers::create_buffer(
                &self.device,
                "burst_instances",
                (std::mem::size_of::<ParticleVertex>() * burst.len().max(1)) as u64,
                wgpu::BufferUsages::VERTEX,
            );
            let uniforms = helpers::create_buffer(
                &self.device,
                "burst_uniforms",
                std::mem::size_of::<BurstUniforms>() as u64,
                wgpu::BufferUsages::UNIFORM,
            );
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("burst_bg"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                }],
            });
            self.bursts.insert(
                id,
                BurstResources {
                    instances,
                    count,
                    uniforms,
                    bind_group,
                },
            );
        }
        let Some(res) = self.bursts.get(&id) else {
            return;
        };
        burst.write_vertices(&mut self.staging);
        self.queue
            .write_buffer(&res.instances, 0, bytemuck::cast_slice(&self.staging));
        let u = BurstUniforms {
            view_proj,
            viewport: [self.config.width as f32, self.config.height as f32],
            point_size: self.point_size,
            opacity: burst.opacity(),
            max_point_px: MAX_POINT_SIZE_PX * self.pixel_ratio,
            _pad: [0.0; 3],
        };
        self.queue
            .write_buffer(&res.uniforms, 0, bytemuck::bytes_of(&u));
    }

    /// Draw every active burst. A frame with no bursts just clears.
    pub fn render<'b>(
        &mut self,
        camera: &Camera,
        bursts: impl Iterator<Item = &'b ParticleBurst>,
    ) -> Result<(), wgpu::SurfaceError> {
        let view_proj: Mat4 = camera.projection_matrix() * camera.view_matrix();
        let view_proj = view_proj.to_cols_array_2d();
        for burst in bursts {
            self.upload(burst, view_proj);
        }

        let frame = match self.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let [r, g, b, a] = CLEAR_RGBA;
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("particles_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipeline);
            for res in self.bursts.values() {
                rpass.set_bind_group(0, &res.bind_group, &[]);
                rpass.set_vertex_buffer(0, res.instances.slice(..));
                rpass.draw(0..6, 0..res.count);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
