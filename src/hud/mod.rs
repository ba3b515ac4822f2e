pub mod ring;
pub mod timer;

use glam::Vec2;
use winit::window::Window;

use self::ring::RingBuffer;
use self::timer::{FramePhase, PhaseTimers};

use crate::render::GpuState;

/// Number of frame times to keep in the histogram.
const FRAME_HISTORY_LEN: usize = 300;
/// Seconds between FPS log lines.
const FPS_LOG_INTERVAL: f64 = 5.0;

/// Text drawn in place of a sprite whose animation is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// Center in physical pixels.
    pub pos: Vec2,
    /// Height in physical pixels.
    pub size: f32,
    pub text: &'static str,
    pub alpha: f32,
}

/// Read-only snapshot of cat mode the HUD draws from.
#[derive(Debug, Clone, Default)]
pub struct HudView {
    pub active: bool,
    /// Where to put the "click the cat" prompt, if it is showing.
    pub prompt_at: Option<Vec2>,
    pub reset_available: bool,
    /// Explosion count and seconds left, while celebrating.
    pub celebration: Option<(u32, f64)>,
    /// Celebration glyph rain when the confetti clip is unavailable.
    pub confetti_glyph: Option<&'static str>,
    pub glyphs: Vec<Glyph>,

    // Debug panel
    pub population: usize,
    pub cap: usize,
    pub device_class: String,
    pub phase: &'static str,
    pub explosions: u32,
    pub live_explosions: usize,
    pub pending_collisions: usize,
    pub confetti: usize,
    pub tick_count: u64,
    pub assets: [(&'static str, &'static str); 3],
}

/// What the user did in the HUD this frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct HudActions {
    pub reset: bool,
    pub toggle: bool,
}

/// Everything drawn with egui: onboarding prompt, fallback glyphs, reset
/// button, celebration banner and the F12 debug panel.
pub struct Hud {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,

    pub debug_visible: bool,

    /// Rolling window of frame times (seconds).
    pub frame_times: RingBuffer<f64>,

    /// Computed stats.
    pub fps: f64,
    pub frame_time_avg: f64,
    pub frame_time_min: f64,
    pub frame_time_max: f64,

    pub timers: PhaseTimers,

    // Periodic log accumulator.
    frame_count: u64,
    log_timer: f64,
    log_frame_count: u32,
    log_frame_sum: f64,
    log_frame_min: f64,
    log_frame_max: f64,
}

impl Hud {
    pub fn new(window: &Window, gpu: &GpuState) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            debug_visible: false,
            frame_times: RingBuffer::new(FRAME_HISTORY_LEN),
            fps: 0.0,
            frame_time_avg: 0.0,
            frame_time_min: 0.0,
            frame_time_max: 0.0,
            timers: PhaseTimers::new(),
            frame_count: 0,
            log_timer: 0.0,
            log_frame_count: 0,
            log_frame_sum: 0.0,
            log_frame_min: f64::MAX,
            log_frame_max: 0.0,
        }
    }

    /// Record a frame time, update rolling stats, and periodically log.
    pub fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frame_times.push(dt);

        let len = self.frame_times.len();
        if len > 0 {
            let mut sum = 0.0;
            let mut min = f64::MAX;
            let mut max = 0.0f64;
            for &t in self.frame_times.iter() {
                sum += t;
                min = min.min(t);
                max = max.max(t);
            }
            self.frame_time_avg = sum / len as f64;
            self.frame_time_min = min;
            self.frame_time_max = max;
            self.fps = 1.0 / self.frame_time_avg.max(1e-6);
        }

        self.log_frame_count += 1;
        self.log_frame_sum += dt;
        self.log_frame_min = self.log_frame_min.min(dt);
        self.log_frame_max = self.log_frame_max.max(dt);
        self.log_timer += dt;

        if self.log_timer >= FPS_LOG_INTERVAL {
            let avg_ms = (self.log_frame_sum / self.log_frame_count as f64) * 1000.0;
            let fps = self.log_frame_count as f64 / self.log_timer;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.log_frame_min * 1000.0,
                self.log_frame_max * 1000.0,
                self.frame_count,
            );
            self.log_timer = 0.0;
            self.log_frame_count = 0;
            self.log_frame_sum = 0.0;
            self.log_frame_min = f64::MAX;
            self.log_frame_max = 0.0;
        }
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::debug!("debug panel {}", if self.debug_visible { "shown" } else { "hidden" });
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over an egui widget (the window must take clicks).
    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.is_pointer_over_area() || self.egui_ctx.wants_pointer_input()
    }

    /// Run the egui frame and produce paint output.
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
        view: &HudView,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
        HudActions,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let stats = DebugStats {
            visible: self.debug_visible,
            fps: self.fps,
            frame_time_avg: self.frame_time_avg,
            frame_time_min: self.frame_time_min,
            frame_time_max: self.frame_time_max,
            frame_times: self.frame_times.iter().copied().collect(),
            phase_durations: self.timers.durations_us,
        };

        let mut actions = HudActions::default();
        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            draw_cat_mode(ctx, view, &mut actions);
            draw_debug(ctx, &stats, view, &mut actions);
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (
            clipped_primitives,
            full_output.textures_delta,
            screen_descriptor,
            actions,
        )
    }

    /// Upload egui textures and buffers. Call before the egui render pass.
    pub fn prepare_egui(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    /// Render egui into the given render pass.
    pub fn render_egui(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing (free functions, so the egui closure doesn't borrow `Hud`)
// ---------------------------------------------------------------------------

struct DebugStats {
    visible: bool,
    fps: f64,
    frame_time_avg: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frame_times: Vec<f64>,
    phase_durations: [f64; 5],
}

fn to_points(ctx: &egui::Context, px: Vec2) -> egui::Pos2 {
    let ppp = ctx.pixels_per_point();
    egui::pos2(px.x / ppp, px.y / ppp)
}

fn draw_cat_mode(ctx: &egui::Context, view: &HudView, actions: &mut HudActions) {
    if !view.active {
        return;
    }
    let ppp = ctx.pixels_per_point();

    // --- Fallback glyphs ---
    if !view.glyphs.is_empty() {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("fallback_glyphs"),
        ));
        for glyph in &view.glyphs {
            let alpha = (glyph.alpha.clamp(0.0, 1.0) * 255.0) as u8;
            painter.text(
                to_points(ctx, glyph.pos),
                egui::Align2::CENTER_CENTER,
                glyph.text,
                egui::FontId::proportional((glyph.size / ppp).max(8.0)),
                egui::Color32::from_white_alpha(alpha),
            );
        }
    }

    let bubble = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 235))
        .corner_radius(12.0)
        .inner_margin(egui::Margin::symmetric(12, 6));

    // --- Onboarding prompt ---
    if let Some(at) = view.prompt_at {
        egui::Area::new(egui::Id::new("click_prompt"))
            .fixed_pos(to_points(ctx, at))
            .pivot(egui::Align2::CENTER_BOTTOM)
            .interactable(false)
            .show(ctx, |ui| {
                bubble.show(ui, |ui| {
                    ui.label(
                        egui::RichText::new("Click the cat!")
                            .strong()
                            .size(16.0)
                            .color(egui::Color32::from_gray(30)),
                    );
                });
            });
    }

    // --- Celebration banner ---
    if let Some((count, remaining)) = view.celebration {
        egui::Area::new(egui::Id::new("celebration"))
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .interactable(false)
            .show(ctx, |ui| {
                bubble.show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        let glyph = view.confetti_glyph.unwrap_or("");
                        ui.label(
                            egui::RichText::new(format!("{glyph} {count} explosions! {glyph}"))
                                .strong()
                                .size(36.0)
                                .color(egui::Color32::from_rgb(200, 60, 120)),
                        );
                        ui.label(
                            egui::RichText::new(format!("back to the cats in {remaining:.0}s"))
                                .size(14.0)
                                .color(egui::Color32::from_gray(60)),
                        );
                    });
                });
            });
    }

    // --- Reset ---
    if view.reset_available {
        egui::Area::new(egui::Id::new("reset_cats"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-24.0, -24.0))
            .show(ctx, |ui| {
                let button = egui::Button::new(egui::RichText::new("Reset cats").size(15.0))
                    .corner_radius(10.0);
                if ui.add(button).clicked() {
                    actions.reset = true;
                }
            });
    }
}

fn draw_debug(ctx: &egui::Context, s: &DebugStats, view: &HudView, actions: &mut HudActions) {
    if !s.visible {
        return;
    }

    let panel_frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220))
        .corner_radius(6.0)
        .inner_margin(10.0);

    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .default_width(320.0)
        .resizable(true)
        .frame(panel_frame)
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            // --- Performance ---
            ui.heading("Performance");
            ui.label(format!("FPS: {:.1}", s.fps));
            ui.label(format!(
                "Frame: {:.2}ms avg | {:.2} min | {:.2} max",
                s.frame_time_avg * 1000.0,
                s.frame_time_min * 1000.0,
                s.frame_time_max * 1000.0,
            ));
            ui.add_space(4.0);

            // --- Frame time histogram ---
            ui.heading("Frame Time History");
            if !s.frame_times.is_empty() {
                let max_time = s
                    .frame_times
                    .iter()
                    .copied()
                    .fold(0.0f64, f64::max)
                    .max(0.020);

                let (response, painter) =
                    ui.allocate_painter(egui::vec2(300.0, 60.0), egui::Sense::hover());
                let rect = response.rect;

                let bar_width = rect.width() / s.frame_times.len() as f32;
                let target_y = rect.bottom() - (0.01667 / max_time as f32) * rect.height();

                for (i, &t) in s.frame_times.iter().enumerate() {
                    let h = (t / max_time) as f32 * rect.height();
                    let x = rect.left() + i as f32 * bar_width;
                    let color = if t > 0.01667 {
                        egui::Color32::from_rgb(255, 100, 80)
                    } else {
                        egui::Color32::from_rgb(80, 200, 120)
                    };
                    painter.rect_filled(
                        egui::Rect::from_min_max(
                            egui::pos2(x, rect.bottom() - h),
                            egui::pos2(x + bar_width - 1.0, rect.bottom()),
                        ),
                        0.0,
                        color,
                    );
                }

                // 16.67ms target line
                painter.line_segment(
                    [
                        egui::pos2(rect.left(), target_y),
                        egui::pos2(rect.right(), target_y),
                    ],
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 255, 100)),
                );
            }
            ui.add_space(4.0);

            // --- Frame phases ---
            ui.heading("Frame Phases");
            let total: f64 = s.phase_durations.iter().sum::<f64>().max(1.0);
            let max_us = s
                .phase_durations
                .iter()
                .copied()
                .fold(0.0f64, f64::max)
                .max(1.0);

            for phase in FramePhase::ALL {
                let us = s.phase_durations[phase as usize];
                let pct = us / total * 100.0;
                let bar_frac = (us / max_us) as f32;

                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(format!("{:<12}", phase.label())).monospace());
                    ui.label(
                        egui::RichText::new(format!("{:>5.0}us ({:>2.0}%)", us, pct)).monospace(),
                    );

                    let (response, painter) =
                        ui.allocate_painter(egui::vec2(80.0, 12.0), egui::Sense::hover());
                    let r = response.rect;
                    painter.rect_filled(
                        egui::Rect::from_min_max(
                            r.left_top(),
                            egui::pos2(r.left() + r.width() * bar_frac, r.bottom()),
                        ),
                        2.0,
                        egui::Color32::from_rgb(100, 180, 255),
                    );
                });
            }
            ui.add_space(4.0);

            // --- Cat mode ---
            ui.heading("Cat Mode");
            if view.active {
                ui.label(format!(
                    "Cats: {} / {} ({})",
                    view.population, view.cap, view.device_class
                ));
                ui.label(format!(
                    "Phase: {} | Explosions: {} ({} live)",
                    view.phase, view.explosions, view.live_explosions
                ));
                ui.label(format!(
                    "Pending collisions: {} | Confetti: {}",
                    view.pending_collisions, view.confetti
                ));
                ui.label(format!("Ticks: {}", view.tick_count));
                for (name, state) in view.assets {
                    ui.label(egui::RichText::new(format!("{name:<15} {state}")).monospace());
                }
            } else {
                ui.label("off");
            }
            ui.horizontal(|ui| {
                let label = if view.active { "Turn off" } else { "Turn on" };
                if ui.button(label).clicked() {
                    actions.toggle = true;
                }
                if view.active && ui.button("Reset").clicked() {
                    actions.reset = true;
                }
            });
            ui.add_space(4.0);

            ui.heading("Info");
            ui.label("F9: Cat mode | F12: Debug | ESC: Quit");
        });
}
