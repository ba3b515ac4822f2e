use std::sync::Arc;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use catmode::assets::{AssetKind, AssetSlot};
use catmode::{Overlay, Viewport};

use crate::hud::timer::FramePhase;
use crate::hud::{Glyph, Hud, HudView};
use crate::input::{InputState, RawInput};
#[cfg(windows)]
use crate::platform;
use crate::render::instance::SpriteInstance;
use crate::render::GpuState;

/// Largest frame delta fed to the simulation (a dragged or stalled window
/// should not fast-forward the cats).
const MAX_FRAME_DT: f64 = 0.25;
/// Fallback explosion glyph size in pixels.
const EXPLOSION_GLYPH_SIZE: f32 = 120.0;

/// Top-level application state.
struct App {
    overlay: Overlay,
    start_active: bool,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    hud: Option<Hud>,

    input: InputState,
    /// Held state collected from window events (platforms without global polling).
    #[cfg_attr(windows, allow(dead_code))]
    raw: RawInput,
    /// Whether the window currently takes mouse clicks.
    #[cfg_attr(not(windows), allow(dead_code))]
    hittest: bool,

    last_frame_time: Option<Instant>,
    started: Instant,

    // Reusable instance buffer (avoid per-frame allocation)
    instance_buf: Vec<SpriteInstance>,
}

impl App {
    fn new(overlay: Overlay, start_active: bool) -> Self {
        Self {
            overlay,
            start_active,
            window: None,
            gpu: None,
            hud: None,
            input: InputState::new(),
            raw: RawInput::default(),
            hittest: false,
            last_frame_time: None,
            started: Instant::now(),
            instance_buf: Vec::with_capacity(256),
        }
    }

    fn viewport(&self) -> Viewport {
        match &self.gpu {
            Some(gpu) => Viewport::new(gpu.width() as f32, gpu.height() as f32),
            None => Viewport::new(1.0, 1.0),
        }
    }

    fn raw_input(&self) -> RawInput {
        #[cfg(windows)]
        {
            platform::win32::poll_input()
        }
        #[cfg(not(windows))]
        {
            self.raw
        }
    }

    /// Build sprite instances and the HUD snapshot from the current state.
    fn build_frame(&mut self) -> HudView {
        self.instance_buf.clear();
        let mut view = HudView::default();

        let alpha = self.overlay.motion_alpha();
        let (Some(sim), Some(assets)) = (self.overlay.sim(), self.overlay.assets()) else {
            return view;
        };
        let now = sim.now();
        let viewport = *sim.viewport();

        view.active = true;
        view.population = sim.population();
        view.cap = sim.cap();
        view.device_class = format!("{:?}", viewport.device_class(sim.config()));
        view.phase = sim.phase().label();
        view.explosions = sim.explosion_count();
        view.live_explosions = sim.explosions().len();
        view.pending_collisions = sim.pending_collisions().len();
        view.confetti = sim.confetti().count();
        view.tick_count = sim.tick_count();
        view.reset_available = sim.reset_available();
        for (i, kind) in AssetKind::ALL.into_iter().enumerate() {
            view.assets[i] = (kind.file_name(), assets.slot(kind).label());
        }

        // --- Cats (hidden while celebrating) ---
        let cats = sim.cats();
        if !sim.celebrating() {
            let dance = assets.clip(AssetKind::Dance);
            for cat in &cats {
                match dance {
                    Some(clip) => self
                        .instance_buf
                        .push(SpriteInstance::cat(cat, alpha, clip)),
                    None => view.glyphs.push(Glyph {
                        pos: cat.prev_pos.lerp(cat.pos, alpha),
                        size: cat.size * 0.8,
                        text: AssetKind::Dance.fallback_glyph(),
                        alpha: if cat.colliding { 0.4 } else { 1.0 },
                    }),
                }
            }
            if sim.prompt_showing() {
                view.prompt_at = cats
                    .first()
                    .map(|cat| cat.pos - Vec2::new(0.0, cat.size * 0.5 + 8.0));
            }
        }

        // --- Explosions ---
        let burst_ready = assets.clip(AssetKind::Explosion).is_some();
        for explosion in sim.explosions().iter() {
            if burst_ready {
                self.instance_buf
                    .push(SpriteInstance::explosion(explosion, now));
            } else {
                let t = explosion.progress(now);
                view.glyphs.push(Glyph {
                    pos: explosion.pos,
                    size: EXPLOSION_GLYPH_SIZE * (0.6 + 0.8 * t),
                    text: AssetKind::Explosion.fallback_glyph(),
                    alpha: 1.0 - t,
                });
            }
        }

        // --- Celebration ---
        if sim.celebrating() {
            view.celebration = Some((sim.explosion_count(), sim.celebration_remaining()));
            match assets.slot(AssetKind::Confetti) {
                AssetSlot::Ready(_) => {
                    self.instance_buf
                        .extend(sim.confetti().iter().map(SpriteInstance::confetti));
                }
                AssetSlot::Pending | AssetSlot::Failed => {
                    view.confetti_glyph = Some(AssetKind::Confetti.fallback_glyph());
                }
            }
        }

        view
    }

    /// Let clicks through to the desktop unless the cursor is over a cat or a widget.
    #[cfg(windows)]
    fn update_hittest(&mut self, cursor: Vec2) {
        let over_cat = self
            .overlay
            .sim()
            .is_some_and(|sim| !sim.celebrating() && sim.hit_test(cursor).is_some());
        let over_hud = self.hud.as_ref().is_some_and(|hud| hud.wants_pointer());
        let want = over_cat || over_hud;
        if want == self.hittest {
            return;
        }
        if let Some(window) = &self.window {
            match window.set_cursor_hittest(want) {
                Ok(()) => self.hittest = want,
                Err(e) => log::warn!("set_cursor_hittest failed: {e}"),
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        // --- Timing ---
        let now = Instant::now();
        let dt = match self.last_frame_time {
            Some(last) => now.duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last_frame_time = Some(now);
        if let Some(hud) = &mut self.hud {
            hud.record_frame(dt.max(1e-6));
        }

        // --- Input ---
        let raw = self.raw_input();
        let pressed = self.input.update(raw, dt);
        if pressed.quit {
            log::info!("ESC pressed, exiting");
            event_loop.exit();
            return;
        }
        if pressed.toggle {
            let viewport = self.viewport();
            let on = self.overlay.toggle(viewport);
            log::info!("F9: cat mode {}", if on { "on" } else { "off" });
        }
        if pressed.debug {
            if let Some(hud) = &mut self.hud {
                hud.toggle_debug();
            }
        }
        let over_hud = self.hud.as_ref().is_some_and(|hud| hud.wants_pointer());
        if let Some(point) = pressed.click.filter(|_| !over_hud) {
            self.overlay.click(point);
        }

        // --- Simulation ---
        if let Some(hud) = &mut self.hud {
            hud.timers.begin();
        }
        self.overlay.frame(dt.min(MAX_FRAME_DT));
        if let Some(hud) = &mut self.hud {
            hud.timers.end(FramePhase::Simulation);
            hud.timers.begin();
        }

        let view = self.build_frame();
        if let Some(hud) = &mut self.hud {
            hud.timers.end(FramePhase::BuildInstances);
        }
        // Elsewhere the window keeps its hit-testing so cursor events keep arriving.
        #[cfg(windows)]
        self.update_hittest(self.input.cursor);

        // --- Render ---
        let time = self.started.elapsed().as_secs_f32();
        let (Some(window), Some(gpu), Some(hud)) = (&self.window, &mut self.gpu, &mut self.hud)
        else {
            return;
        };

        hud.timers.begin();
        gpu.update_sprites(&self.instance_buf, time);
        hud.timers.end(FramePhase::GpuUpload);

        let Some(mut frame) = gpu.begin_frame() else {
            return;
        };

        hud.timers.begin();
        let (primitives, textures_delta, screen, actions) =
            hud.run_frame(window, gpu.width(), gpu.height(), &view);
        hud.timers.end(FramePhase::Hud);

        hud.timers.begin();
        gpu.draw_sprites(&mut frame);
        let extra = hud.prepare_egui(
            &gpu.device,
            &gpu.queue,
            &mut frame.encoder,
            &primitives,
            &textures_delta,
            &screen,
        );
        {
            let mut pass = GpuState::begin_hud_pass(&mut frame);
            hud.render_egui(&mut pass, &primitives, &screen);
        }
        gpu.present(frame, extra);
        hud.free_textures(&textures_delta);
        hud.timers.end(FramePhase::RenderSubmit);

        if actions.reset {
            self.overlay.reset();
        }
        if actions.toggle {
            let viewport = self.viewport();
            self.overlay.toggle(viewport);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        // Create fullscreen-sized borderless transparent window
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .expect("no monitor found");
        let screen_size = monitor.size();

        // No with_transparent(true): that sets WS_EX_LAYERED which creates
        // a GDI backing surface that conflicts with DirectComposition.
        // Transparency comes from wgpu's DxgiFromVisual + PreMultiplied alpha.
        // Start hidden so DWM doesn't cache stale frame state before our
        // overlay style changes take effect.
        let attrs = WindowAttributes::default()
            .with_title("Cat Mode")
            .with_decorations(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(screen_size)
            .with_position(winit::dpi::PhysicalPosition::new(0, 0));
        #[cfg(not(windows))]
        let attrs = attrs.with_transparent(true);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("failed to create window"),
        );

        #[cfg(windows)]
        platform::win32::setup_overlay(&window);

        let size = window.inner_size();
        log::info!(
            "Overlay window created: {}x{} on {:?}",
            size.width,
            size.height,
            monitor.name().unwrap_or_default()
        );

        let gpu = GpuState::new(window.clone());
        log::info!("wgpu + sprite pipeline initialized");
        self.hud = Some(Hud::new(&window, &gpu));
        self.gpu = Some(gpu);

        if self.start_active {
            let viewport = self.viewport();
            self.overlay.activate(viewport);
        }

        // Continuous game loop
        event_loop.set_control_flow(ControlFlow::Poll);

        // Show window now that all styles and GPU resources are ready.
        // This prevents DWM from caching stale frame state (the "white box").
        window.set_visible(true);

        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(hud)) = (&self.window, &mut self.hud) {
            hud.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                if new_size.width > 0 && new_size.height > 0 {
                    let viewport = self.viewport();
                    self.overlay.resize(viewport);
                }
            }
            #[cfg(not(windows))]
            WindowEvent::CursorMoved { position, .. } => {
                self.raw.cursor = Vec2::new(position.x as f32, position.y as f32);
            }
            #[cfg(not(windows))]
            WindowEvent::MouseInput { state, button, .. } => {
                if button == winit::event::MouseButton::Left {
                    self.raw.left_down = state.is_pressed();
                }
            }
            #[cfg(not(windows))]
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};
                let down = event.state.is_pressed();
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::F9) => self.raw.toggle_down = down,
                    PhysicalKey::Code(KeyCode::F12) => self.raw.debug_down = down,
                    PhysicalKey::Code(KeyCode::Escape) => self.raw.quit_down = down,
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }
}

/// Entry point: create the event loop and run.
pub fn run(overlay: Overlay, start_active: bool) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(overlay, start_active);
    event_loop.run_app(&mut app)?;
    Ok(())
}
