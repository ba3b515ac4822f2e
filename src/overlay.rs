use std::path::PathBuf;

use glam::Vec2;

use crate::assets::AssetBank;
use crate::clock::{Due, Schedule};
use crate::config::SimConfig;
use crate::sim::{SimEvent, Simulation};
use crate::viewport::Viewport;

/// Where the animation clips come from when cat mode switches on.
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// Load the clips from this directory in the background.
    Dir(PathBuf),
    /// Skip loading and render glyphs only.
    None,
}

/// Everything that exists only while cat mode is on.
struct Active {
    sim: Simulation,
    schedule: Schedule,
    assets: AssetBank,
}

/// The on/off toggle around the simulation.
///
/// Activating builds a fresh [`Simulation`], its timers and the asset loads;
/// deactivating drops all three, so nothing keeps ticking against a dead
/// registry.
pub struct Overlay {
    config: SimConfig,
    assets: AssetSource,
    seed: Option<u64>,
    active: Option<Active>,
}

impl Overlay {
    pub fn new(config: SimConfig, assets: AssetSource, seed: Option<u64>) -> Self {
        Self {
            config,
            assets,
            seed,
            active: None,
        }
    }

    pub fn activate(&mut self, viewport: Viewport) {
        if self.active.is_some() {
            return;
        }
        let assets = match &self.assets {
            AssetSource::Dir(dir) => AssetBank::load(dir),
            AssetSource::None => AssetBank::fallback(),
        };
        log::info!(
            "Cat mode on ({:.0}x{:.0}, {:?}, cap {})",
            viewport.width,
            viewport.height,
            viewport.device_class(&self.config),
            viewport.population_cap(&self.config)
        );
        self.active = Some(Active {
            sim: Simulation::new(self.config.clone(), viewport, self.seed),
            schedule: Schedule::for_viewport(&viewport, &self.config),
            assets,
        });
    }

    pub fn deactivate(&mut self) {
        if self.active.take().is_some() {
            log::info!("Cat mode off");
        }
    }

    /// Flip the toggle. Returns the new state.
    pub fn toggle(&mut self, viewport: Viewport) -> bool {
        if self.is_active() {
            self.deactivate();
        } else {
            self.activate(viewport);
        }
        self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Advance one host frame: run due motion ticks and collision passes,
    /// then let `dt` pass. Returns the work done (zero when inactive).
    pub fn frame(&mut self, dt: f64) -> Due {
        let Some(active) = &mut self.active else {
            return Due::default();
        };
        active.assets.poll();

        let due = active.schedule.advance(dt);
        for _ in 0..due.motion_ticks {
            active.sim.tick();
        }
        for _ in 0..due.collision_checks {
            active.sim.check_collisions();
        }
        active.sim.update(dt);

        for event in active.sim.drain_events() {
            match event {
                SimEvent::FirstInteraction => log::info!("Onboarding complete"),
                SimEvent::Respawned { id } => log::info!("Respawned cat {}", id.0),
                other => log::trace!("{other:?}"),
            }
        }
        due
    }

    /// Forward a click. False when inactive or nothing was hit.
    pub fn click(&mut self, point: Vec2) -> bool {
        self.active
            .as_mut()
            .map_or(false, |active| active.sim.click(point))
    }

    pub fn reset(&mut self) {
        if let Some(active) = &mut self.active {
            active.sim.reset();
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(active) = &mut self.active {
            active.sim.set_viewport(viewport);
            active.schedule.retune(&viewport, &self.config);
        }
    }

    /// Fraction of the way to the next motion tick, for render interpolation.
    pub fn motion_alpha(&self) -> f32 {
        self.active
            .as_ref()
            .map_or(0.0, |active| active.schedule.motion.alpha())
    }

    pub fn sim(&self) -> Option<&Simulation> {
        self.active.as_ref().map(|active| &active.sim)
    }

    pub fn sim_mut(&mut self) -> Option<&mut Simulation> {
        self.active.as_mut().map(|active| &mut active.sim)
    }

    pub fn assets(&self) -> Option<&AssetBank> {
        self.active.as_ref().map(|active| &active.assets)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> Overlay {
        Overlay::new(SimConfig::default(), AssetSource::None, Some(5))
    }

    #[test]
    fn inactive_overlay_does_nothing() {
        let mut overlay = overlay();
        assert!(!overlay.is_active());
        assert_eq!(overlay.frame(1.0), Due::default());
        assert!(!overlay.click(Vec2::new(10.0, 10.0)));
        assert!(overlay.sim().is_none());
    }

    #[test]
    fn toggling_rebuilds_the_simulation() {
        let mut overlay = overlay();
        let vp = Viewport::new(1920.0, 1080.0);
        assert!(overlay.toggle(vp));
        for _ in 0..10 {
            overlay.frame(0.05);
        }
        let sim = overlay.sim().unwrap();
        assert!(sim.tick_count() > 0);
        assert!(sim.now() > 0.0);

        assert!(!overlay.toggle(vp));
        assert!(overlay.sim().is_none());

        overlay.activate(vp);
        let sim = overlay.sim().unwrap();
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.population(), 1);
    }

    #[test]
    fn desktop_frame_runs_ticks_and_collision_passes() {
        let mut overlay = overlay();
        overlay.activate(Viewport::new(1920.0, 1080.0));
        let mut total = Due::default();
        for _ in 0..20 {
            let due = overlay.frame(0.05);
            total.motion_ticks += due.motion_ticks;
            total.collision_checks += due.collision_checks;
        }
        assert!((39..=40).contains(&total.motion_ticks), "{total:?}");
        assert!((9..=10).contains(&total.collision_checks), "{total:?}");
        assert!(overlay.assets().unwrap().settled());
    }

    #[test]
    fn resize_to_mobile_retunes() {
        let mut overlay = overlay();
        overlay.activate(Viewport::new(1920.0, 1080.0));
        overlay.resize(Viewport::new(400.0, 800.0));
        assert_eq!(overlay.sim().unwrap().cap(), 8);
    }
}
