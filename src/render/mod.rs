pub mod instance;
pub mod pipeline;

use std::sync::Arc;
use winit::window::Window;

use self::instance::SpriteInstance;
use self::pipeline::{Globals, SpritePipeline};

/// Owns the device, the overlay surface and the one sprite pipeline cat mode draws with.
pub struct GpuState {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    sprites: SpritePipeline,
}

/// A swapchain image being recorded into.
pub struct Frame {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Windows composes the overlay through DirectComposition, which only DX12 can
/// feed with per-pixel alpha.
#[cfg(windows)]
fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::DX12,
        backend_options: wgpu::BackendOptions {
            dx12: wgpu::Dx12BackendOptions {
                presentation_system: wgpu_types::Dx12SwapchainKind::DxgiFromVisual,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    })
}

#[cfg(not(windows))]
fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

fn pick_format(caps: &wgpu::SurfaceCapabilities) -> wgpu::TextureFormat {
    caps.formats
        .iter()
        .copied()
        .find(|f| *f == wgpu::TextureFormat::Bgra8UnormSrgb)
        .unwrap_or(caps.formats[0])
}

/// The sprite shader writes premultiplied color; anything else shows a dark fringe.
fn pick_alpha_mode(caps: &wgpu::SurfaceCapabilities) -> wgpu::CompositeAlphaMode {
    [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ]
    .into_iter()
    .find(|mode| caps.alpha_modes.contains(mode))
    .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

fn pick_present_mode(caps: &wgpu::SurfaceCapabilities) -> wgpu::PresentMode {
    if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
        wgpu::PresentMode::Mailbox
    } else {
        wgpu::PresentMode::Fifo
    }
}

/// One color pass over `view`, either clearing to transparent or keeping what is there.
fn color_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    label: &str,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            depth_slice: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

impl GpuState {
    pub fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();
        let instance = create_instance();

        let surface = instance
            .create_surface(window)
            .expect("failed to create wgpu surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("no suitable GPU adapter found");
        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("catmode_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .expect("failed to create wgpu device");

        let caps = surface.get_capabilities(&adapter);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: pick_format(&caps),
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: pick_present_mode(&caps),
            alpha_mode: pick_alpha_mode(&caps),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!(
            "Surface {}x{}: {:?}, {:?}, {:?} (alpha modes offered: {:?})",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            surface_config.present_mode,
            surface_config.alpha_mode,
            caps.alpha_modes
        );

        let sprites = SpritePipeline::new(&device, surface_config.format);

        Self {
            device,
            queue,
            surface,
            surface_config,
            sprites,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn width(&self) -> u32 {
        self.surface_config.width
    }

    pub fn height(&self) -> u32 {
        self.surface_config.height
    }

    /// Push this frame's sprites and shader clock.
    pub fn update_sprites(&mut self, instances: &[SpriteInstance], time: f32) {
        let globals = Globals {
            screen_size: [self.width() as f32, self.height() as f32],
            time,
            _pad: 0.0,
        };
        self.sprites.upload(&self.queue, &globals, instances);
    }

    /// None means skip this frame: the surface was reconfigured or is unusable.
    pub fn begin_frame(&self) -> Option<Frame> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                return None;
            }
            Err(e) => {
                log::warn!("Dropping frame, surface error: {e:?}");
                return None;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("catmode_frame"),
            });
        Some(Frame {
            output,
            view,
            encoder,
        })
    }

    /// Clear to fully transparent, then draw cats, bursts and confetti.
    pub fn draw_sprites(&self, frame: &mut Frame) {
        let mut pass = color_pass(
            &mut frame.encoder,
            &frame.view,
            "sprites",
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
        );
        self.sprites.draw(&mut pass);
    }

    /// Pass for the HUD on top of the sprites. egui-wgpu wants it `'static`.
    pub fn begin_hud_pass(frame: &mut Frame) -> wgpu::RenderPass<'static> {
        color_pass(&mut frame.encoder, &frame.view, "hud", wgpu::LoadOp::Load).forget_lifetime()
    }

    /// Submit egui's command buffers before ours, then present.
    pub fn present(&self, frame: Frame, hud_cmds: Vec<wgpu::CommandBuffer>) {
        self.queue
            .submit(hud_cmds.into_iter().chain([frame.encoder.finish()]));
        frame.output.present();
    }
}
