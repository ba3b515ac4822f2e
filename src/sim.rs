use glam::Vec2;

use crate::cat::animation::AnimationState;
use crate::cat::{CatDice, CatSpec};
use crate::celebration::{Milestone, Milestones, Phase};
use crate::config::SimConfig;
use crate::ecs::components::{
    Appearance, CatId, Colliding, Heading, Motion, MotionMode, Position, PrevPosition,
};
use crate::ecs::systems::collision::{self, PendingCollision};
use crate::ecs::systems::{movement, population};
use crate::effects::Explosions;
use crate::particles::Confetti;
use crate::spatial::BoundsCache;
use crate::viewport::Viewport;

/// Something the host may want to react to. Drained with
/// [`Simulation::drain_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// The user clicked a cat for the first time; the prompt is gone.
    FirstInteraction,
    Spawned { id: CatId },
    CollisionDetected { a: CatId, b: CatId },
    CollisionResolved { explosion: u64, count: u32 },
    CelebrationStarted { count: u32 },
    CelebrationEnded,
    Respawned { id: CatId },
    Reset,
}

/// Read-only view of one cat for rendering and inspection.
#[derive(Debug, Clone, Copy)]
pub struct CatView {
    pub id: CatId,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub size: f32,
    pub color: u32,
    pub heading: Heading,
    pub mode: MotionMode,
    pub speed: f32,
    pub colliding: bool,
    pub dance: AnimationState,
}

/// The cat mode simulation.
///
/// Owns the cat registry, effects, counters and the random source. The host
/// drives it: [`tick`](Self::tick) on the motion cadence,
/// [`check_collisions`](Self::check_collisions) on the collision cadence and
/// [`update`](Self::update) every frame to let time pass.
pub struct Simulation {
    config: SimConfig,
    viewport: Viewport,
    world: hecs::World,
    ids: population::IdSource,
    dice: CatDice,
    bounds: BoundsCache,
    pending: Vec<PendingCollision>,
    explosions: Explosions,
    confetti: Confetti,
    milestones: Milestones,
    prompt_showing: bool,
    clock: f64,
    tick_count: u64,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Start with one cat entering from off-screen and the click prompt up.
    pub fn new(config: SimConfig, viewport: Viewport, seed: Option<u64>) -> Self {
        let mut dice = match seed {
            Some(seed) => CatDice::with_seed(seed),
            None => CatDice::new(),
        };
        let confetti = Confetti::with_seed(dice.rng().u64(..));
        let cap = viewport.population_cap(&config);
        let mut sim = Self {
            explosions: Explosions::new(config.explosion_lifetime),
            milestones: Milestones::new(config.milestone_every, config.celebration_duration),
            config,
            viewport,
            world: hecs::World::new(),
            ids: population::IdSource::default(),
            dice,
            bounds: BoundsCache::new(cap),
            pending: Vec::new(),
            confetti,
            prompt_showing: true,
            clock: 0.0,
            tick_count: 0,
            events: Vec::new(),
        };
        sim.spawn_fresh();
        sim
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// One motion tick: respawn if empty, then move every cat.
    pub fn tick(&mut self) {
        if !self.prompt_showing && population::count(&self.world) == 0 {
            let id = self.spawn_fresh();
            log::debug!("population hit zero, respawned cat {}", id.0);
            self.events.push(SimEvent::Respawned { id });
        }

        if self.milestones.celebrating() {
            return;
        }

        movement::advance(
            &mut self.world,
            &self.viewport,
            &self.config,
            &mut self.dice,
            &mut self.bounds,
        );
        self.tick_count += 1;
    }

    /// One collision pass. Marks at most one pair and schedules its removal.
    pub fn check_collisions(&mut self) -> Option<(CatId, CatId)> {
        if self.milestones.celebrating() {
            return None;
        }
        let found = collision::detect(
            &mut self.world,
            &self.bounds,
            &self.viewport,
            self.clock,
            self.config.collision_fade,
            &mut self.pending,
        )?;
        log::debug!("cats {} and {} collided", found.a.0, found.b.0);
        self.events.push(SimEvent::CollisionDetected {
            a: found.a,
            b: found.b,
        });
        Some((found.a, found.b))
    }

    /// Let `dt` seconds pass: finish faded collisions, expire explosions,
    /// run the celebration clock and the dance/confetti animations.
    pub fn update(&mut self, dt: f64) {
        self.clock += dt.max(0.0);
        let now = self.clock;

        self.resolve_due(now);
        self.explosions.update(now);

        if self.milestones.update(now) == Milestone::Ended {
            log::info!("Celebration over at {} explosions", self.milestones.count());
            self.events.push(SimEvent::CelebrationEnded);
        }

        let dt = dt as f32;
        if self.milestones.celebrating() {
            self.confetti.emit(&self.viewport, dt);
        }
        self.confetti.update(dt, &self.viewport);

        for (_, dance) in self.world.query_mut::<&mut AnimationState>() {
            dance.advance(dt);
        }
    }

    fn resolve_due(&mut self, now: f64) {
        if self.pending.is_empty() {
            return;
        }
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.resolve_at <= now);
        self.pending = waiting;

        for collision in due {
            let live = population::live(&self.world);
            let entity = |id: CatId| {
                live.binary_search_by_key(&id, |(i, _)| *i)
                    .ok()
                    .map(|i| live[i].1)
            };
            let (Some(ea), Some(eb)) = (entity(collision.a), entity(collision.b)) else {
                // One side is gone already (cap truncation); let the other go on.
                self.release(collision.a);
                self.release(collision.b);
                continue;
            };

            let midpoint = match (self.bounds.get(collision.a), self.bounds.get(collision.b)) {
                (Some(ra), Some(rb)) => (ra.center + rb.center) * 0.5,
                _ => collision.midpoint,
            };

            // Both entities came from the live list above.
            let _ = self.world.despawn(ea);
            let _ = self.world.despawn(eb);
            self.bounds.remove(collision.a);
            self.bounds.remove(collision.b);

            let explosion = self.explosions.spawn(midpoint, now);
            let started = self.milestones.record(now);
            let count = self.milestones.count();
            log::debug!("explosion {explosion} at {midpoint} (total {count})");
            self.events.push(SimEvent::CollisionResolved { explosion, count });

            if started == Milestone::Started {
                log::info!("{count} explosions, celebrating!");
                self.events.push(SimEvent::CelebrationStarted { count });
            }
        }
    }

    /// Clear the fade flag of a cat whose partner vanished.
    fn release(&mut self, id: CatId) {
        let entity = population::live(&self.world)
            .into_iter()
            .find(|(i, _)| *i == id)
            .map(|(_, e)| e);
        if let Some(entity) = entity {
            let _ = self.world.remove_one::<Colliding>(entity);
        }
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// A click at `point`. Hitting a cat dismisses the prompt and doubles the
    /// population up to the cap. Returns whether a cat was hit.
    pub fn click(&mut self, point: Vec2) -> bool {
        if self.milestones.celebrating() {
            return false;
        }
        let Some(hit) = self.hit_test(point) else {
            return false;
        };

        if self.prompt_showing {
            self.prompt_showing = false;
            log::info!("First cat clicked");
            self.events.push(SimEvent::FirstInteraction);
        }

        let cap = self.cap();
        let spawned = population::double(
            &mut self.world,
            &mut self.ids,
            &mut self.dice,
            &self.config,
            &self.viewport,
            cap,
        );
        self.enforce_cap();
        log::debug!(
            "cat {} clicked, +{} cats ({} live)",
            hit.0,
            spawned.len(),
            self.population()
        );
        self.events
            .extend(spawned.into_iter().map(|id| SimEvent::Spawned { id }));
        true
    }

    /// Cat whose last reported rectangle contains `point`.
    pub fn hit_test(&self, point: Vec2) -> Option<CatId> {
        self.bounds.hit(point)
    }

    /// Back to a single fresh cat: clears explosions, the counter and any
    /// celebration. The click prompt stays dismissed.
    pub fn reset(&mut self) {
        self.world.clear();
        self.bounds.clear();
        self.pending.clear();
        self.explosions.clear();
        self.confetti.clear();
        self.milestones.reset();
        self.spawn_fresh();
        log::info!("Cat mode reset");
        self.events.push(SimEvent::Reset);
    }

    /// Follow a resize. A smaller device class truncates the population.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.enforce_cap();
    }

    /// Place a cat directly. Refused (None) once the cap is reached.
    pub fn spawn_actor(&mut self, spec: CatSpec) -> Option<CatId> {
        if self.population() >= self.cap() {
            return None;
        }
        let id = population::spawn(&mut self.world, &mut self.ids, &mut self.dice, spec);
        self.events.push(SimEvent::Spawned { id });
        Some(id)
    }

    fn spawn_fresh(&mut self) -> CatId {
        let spec = self.dice.entering_cat(&self.config, &self.viewport);
        let id = population::spawn(&mut self.world, &mut self.ids, &mut self.dice, spec);
        self.events.push(SimEvent::Spawned { id });
        id
    }

    fn enforce_cap(&mut self) {
        let cap = self.cap();
        let removed = population::truncate(&mut self.world, cap);
        if removed.is_empty() {
            return;
        }
        log::debug!("over the cap, dropped {} cats", removed.len());
        for &id in &removed {
            self.bounds.remove(id);
        }
        // Pending pairs that lost a member resolve as no-ops in resolve_due.
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn cats(&self) -> Vec<CatView> {
        let mut cats: Vec<CatView> = self
            .world
            .query::<(
                &CatId,
                &Position,
                &PrevPosition,
                &Appearance,
                &Motion,
                &AnimationState,
                Option<&Colliding>,
            )>()
            .iter()
            .map(
                |(_, (id, pos, prev_pos, appearance, motion, dance, colliding))| CatView {
                    id: *id,
                    pos: pos.0,
                    prev_pos: prev_pos.0,
                    size: appearance.size,
                    color: appearance.color,
                    heading: motion.heading,
                    mode: motion.mode,
                    speed: motion.speed,
                    colliding: colliding.is_some(),
                    dance: *dance,
                },
            )
            .collect();
        cats.sort_by_key(|c| c.id);
        cats
    }

    pub fn cat(&self, id: CatId) -> Option<CatView> {
        self.cats().into_iter().find(|c| c.id == id)
    }

    pub fn population(&self) -> usize {
        population::count(&self.world)
    }

    pub fn cap(&self) -> usize {
        self.viewport.population_cap(&self.config)
    }

    pub fn prompt_showing(&self) -> bool {
        self.prompt_showing
    }

    pub fn reset_available(&self) -> bool {
        self.population() >= self.config.reset_threshold
    }

    pub fn explosion_count(&self) -> u32 {
        self.milestones.count()
    }

    pub fn phase(&self) -> Phase {
        self.milestones.phase()
    }

    pub fn celebrating(&self) -> bool {
        self.milestones.celebrating()
    }

    pub fn celebration_remaining(&self) -> f64 {
        self.milestones.remaining(self.clock)
    }

    pub fn explosions(&self) -> &Explosions {
        &self.explosions
    }

    pub fn confetti(&self) -> &Confetti {
        &self.confetti
    }

    pub fn pending_collisions(&self) -> &[PendingCollision] {
        &self.pending
    }

    pub fn bounds(&self) -> &BoundsCache {
        &self.bounds
    }

    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn dice(&mut self) -> &mut CatDice {
        &mut self.dice
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::new(SimConfig::default(), Viewport::new(1920.0, 1080.0), Some(99))
    }

    fn place(sim: &mut Simulation, pos: Vec2, heading: Heading) -> CatId {
        sim.spawn_actor(CatSpec {
            pos,
            size: 100.0,
            speed: 1.0,
            heading,
            mode: MotionMode::Bouncing,
            color: 0xFFFFFFFF,
        })
        .unwrap()
    }

    #[test]
    fn starts_with_one_entering_cat_and_the_prompt() {
        let mut sim = sim();
        assert_eq!(sim.population(), 1);
        assert!(sim.prompt_showing());
        let cat = sim.cats()[0];
        assert_eq!(cat.mode, MotionMode::Entering);
        assert!(!Viewport::new(1920.0, 1080.0).strictly_inside(cat.pos, cat.size));
        assert_eq!(sim.drain_events(), vec![SimEvent::Spawned { id: cat.id }]);
    }

    #[test]
    fn clicking_empty_space_does_nothing() {
        let mut sim = sim();
        sim.tick();
        assert!(!sim.click(Vec2::new(-5000.0, -5000.0)));
        assert!(sim.prompt_showing());
        assert_eq!(sim.population(), 1);
    }

    #[test]
    fn collision_removes_both_and_leaves_one_explosion() {
        let mut sim = sim();
        // The starting cat is still off-screen, so only our pair can collide.
        let a = place(&mut sim, Vec2::new(900.0, 500.0), Heading::E);
        let b = place(&mut sim, Vec2::new(960.0, 500.0), Heading::E);
        sim.tick();

        assert_eq!(sim.check_collisions(), Some((a, b)));
        assert!(sim.cat(a).unwrap().colliding);
        assert!(sim.cat(b).unwrap().colliding);
        let before = sim.population();

        sim.update(0.1);
        assert_eq!(sim.population(), before);
        sim.update(0.1);
        assert_eq!(sim.population(), before - 2);
        assert_eq!(sim.explosions().len(), 1);
        assert_eq!(sim.explosion_count(), 1);

        sim.update(2.5);
        assert!(sim.explosions().is_empty());
    }

    #[test]
    fn reset_clears_everything_but_the_dismissed_prompt() {
        let mut sim = sim();
        sim.tick();
        let first = sim.cats()[0];
        let at = sim.bounds().get(first.id).unwrap().center;
        assert!(sim.click(at));
        assert!(!sim.prompt_showing());
        assert_eq!(sim.population(), 2);

        sim.reset();
        assert_eq!(sim.population(), 1);
        assert_eq!(sim.explosion_count(), 0);
        assert!(!sim.celebrating());
        assert!(sim.explosions().is_empty());
        assert!(!sim.prompt_showing());
    }

    #[test]
    fn shrinking_to_mobile_truncates() {
        let mut sim = sim();
        for i in 0..14 {
            place(&mut sim, Vec2::new(100.0 + i as f32 * 120.0, 200.0), Heading::S);
        }
        assert_eq!(sim.population(), 15);
        sim.set_viewport(Viewport::new(390.0, 844.0));
        assert_eq!(sim.population(), 8);
        assert_eq!(sim.cap(), 8);
    }

    #[test]
    fn spawn_actor_respects_cap() {
        let mut sim = Simulation::new(SimConfig::default(), Viewport::new(390.0, 844.0), Some(1));
        for _ in 0..7 {
            assert!(place(&mut sim, Vec2::new(200.0, 400.0), Heading::N).0 > 0);
        }
        assert!(sim
            .spawn_actor(CatSpec {
                pos: Vec2::ZERO,
                size: 100.0,
                speed: 1.0,
                heading: Heading::N,
                mode: MotionMode::Entering,
                color: 0,
            })
            .is_none());
    }

    #[test]
    fn respawns_only_after_onboarding() {
        let mut sim = sim();
        sim.world.clear();
        sim.bounds.clear();
        sim.tick();
        assert_eq!(sim.population(), 0, "prompt still up, stays idle");

        sim.prompt_showing = false;
        sim.drain_events();
        sim.tick();
        assert_eq!(sim.population(), 1);
        let events = sim.drain_events();
        assert!(matches!(events.as_slice(), [SimEvent::Spawned { .. }, SimEvent::Respawned { .. }]));

        sim.tick();
        assert_eq!(sim.population(), 1);
    }

    #[test]
    fn truncated_partner_frees_the_survivor() {
        let mut sim = sim();
        let a = place(&mut sim, Vec2::new(900.0, 500.0), Heading::E);
        let b = place(&mut sim, Vec2::new(960.0, 500.0), Heading::E);
        sim.tick();
        assert_eq!(sim.check_collisions(), Some((a, b)));

        // Cap of 2 keeps the starting cat and `a`, drops `b`.
        sim.config.desktop_cap = 2;
        sim.set_viewport(*sim.viewport());
        assert!(sim.cat(b).is_none());

        sim.update(0.3);
        assert!(sim.pending_collisions().is_empty());
        assert!(!sim.cat(a).unwrap().colliding);
        assert_eq!(sim.explosion_count(), 0);
    }

    #[test]
    fn growing_viewport_never_bounces_a_giant_back_onto_its_heading() {
        let mut sim = Simulation::new(SimConfig::default(), Viewport::new(400.0, 300.0), Some(21));
        // Inside the small envelope, left of and above the one after the resize.
        let id = sim
            .spawn_actor(CatSpec {
                pos: Vec2::new(105.0, 80.0),
                size: 2000.0,
                speed: 1.0,
                heading: Heading::SE,
                mode: MotionMode::Bouncing,
                color: 0,
            })
            .unwrap();

        sim.set_viewport(Viewport::new(800.0, 600.0));
        sim.tick();

        let cat = sim.cat(id).unwrap();
        assert_ne!(cat.heading, Heading::SE);
        assert!(matches!(cat.heading, Heading::E | Heading::S), "{:?}", cat.heading);
        let (lo, _) = sim.viewport().envelope(cat.size);
        assert!(cat.pos.x > lo.x || cat.pos.y > lo.y, "{}", cat.pos);
    }

    #[test]
    fn confetti_does_not_shift_the_cat_dice() {
        let mut calm = sim();
        let mut party = sim();
        party.milestones = Milestones::new(1, 7.0);
        party.milestones.record(party.now());

        for _ in 0..20 {
            party.update(0.05);
            calm.update(0.05);
        }
        assert!(party.confetti().count() > 0);
        assert_eq!(calm.confetti().count(), 0);

        let config = calm.config().clone();
        let vp = *calm.viewport();
        let a = calm.dice().entering_cat(&config, &vp);
        let b = party.dice().entering_cat(&config, &vp);
        assert_eq!(a.pos, b.pos);
        assert_eq!(a.size, b.size);
        assert_eq!(a.heading, b.heading);
    }
}
