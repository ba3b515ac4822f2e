use catmode::assets::{AssetKind, AssetSlot};
use catmode::cat::{speed_for_size, CatSpec};
use catmode::celebration::Phase;
use catmode::ecs::components::{CatId, Heading, MotionMode};
use catmode::ecs::systems::movement::displacement;
use catmode::{AssetSource, Overlay, SimConfig, SimEvent, Simulation, Viewport};
use glam::Vec2;

const SEED: u64 = 0xCA7;

fn desktop() -> Viewport {
    Viewport::new(1920.0, 1080.0)
}

fn phone() -> Viewport {
    Viewport::new(390.0, 844.0)
}

/// A slow bouncing cat parked at `pos`.
fn parked(pos: Vec2) -> CatSpec {
    CatSpec {
        pos,
        size: 100.0,
        speed: 1.0,
        heading: Heading::E,
        mode: MotionMode::Bouncing,
        color: 0xFFFFFFFF,
    }
}

/// Click the first cat that has a rectangle, ticking once so newcomers get one.
fn click_any(sim: &mut Simulation) -> bool {
    sim.tick();
    let target = sim.bounds().iter().next().map(|s| s.rect.center);
    target.map_or(false, |at| sim.click(at))
}

/// Put two overlapping cats on screen and run them through a full collision.
fn collide_pair(sim: &mut Simulation) -> (CatId, CatId) {
    let a = sim.spawn_actor(parked(Vec2::new(900.0, 540.0))).unwrap();
    let b = sim.spawn_actor(parked(Vec2::new(950.0, 540.0))).unwrap();
    sim.tick();
    assert_eq!(sim.check_collisions(), Some((a, b)));
    sim.update(0.25);
    (a, b)
}

// ----- Scenario 1: entering cat reaches the screen -----

#[test]
fn entering_cat_flips_to_bouncing_once_inside() {
    let config = SimConfig::default();
    let vp = desktop();
    let mut sim = Simulation::new(config.clone(), vp, Some(SEED));

    let size = 100.0;
    let speed = speed_for_size(size, &config);
    let start = Vec2::new(-(size / 2.0 + config.entry_margin), vp.height / 2.0);
    let id = sim
        .spawn_actor(CatSpec {
            pos: start,
            size,
            speed,
            heading: Heading::E,
            mode: MotionMode::Entering,
            color: 0,
        })
        .unwrap();

    // Center has to travel from the spawn point past the envelope edge.
    let distance = size / 2.0 - start.x;
    let per_tick = displacement(speed, &vp, &config);
    let expected = (distance / per_tick).ceil() as u64;

    for _ in 0..expected - 1 {
        sim.tick();
        assert_eq!(sim.cat(id).unwrap().mode, MotionMode::Entering);
    }
    sim.tick();
    let cat = sim.cat(id).unwrap();
    assert_eq!(cat.mode, MotionMode::Bouncing);
    assert!(sim.bounds().get(id).unwrap().fully_within(&vp));

    // Never goes back to entering while on screen.
    for _ in 0..500 {
        sim.tick();
        assert_eq!(sim.cat(id).unwrap().mode, MotionMode::Bouncing);
    }
}

// ----- Scenario 2: collision, fade, explosion -----

#[test]
fn overlapping_pair_fades_then_explodes() {
    let mut sim = Simulation::new(SimConfig::default(), desktop(), Some(SEED));
    let start = sim.population();
    let a = sim.spawn_actor(parked(Vec2::new(900.0, 540.0))).unwrap();
    let b = sim.spawn_actor(parked(Vec2::new(960.0, 540.0))).unwrap();
    sim.tick();

    assert_eq!(sim.check_collisions(), Some((a, b)));
    assert!(sim.cat(a).unwrap().colliding);
    assert!(sim.cat(b).unwrap().colliding);
    // Already fading, so the next pass finds nothing new.
    assert_eq!(sim.check_collisions(), None);

    let midpoint = (sim.bounds().get(a).unwrap().center + sim.bounds().get(b).unwrap().center) * 0.5;

    sim.update(0.1);
    assert_eq!(sim.population(), start + 2);
    sim.update(0.15);
    assert_eq!(sim.population(), start);
    assert!(sim.cat(a).is_none() && sim.cat(b).is_none());
    assert!(sim.bounds().get(a).is_none());

    let explosions: Vec<_> = sim.explosions().iter().collect();
    assert_eq!(explosions.len(), 1);
    assert!((explosions[0].pos - midpoint).length() < 1e-3);
    assert_eq!(sim.explosion_count(), 1);

    sim.update(1.0);
    assert_eq!(sim.explosions().len(), 1);
    sim.update(1.5);
    assert!(sim.explosions().is_empty());

    let events = sim.drain_events();
    assert!(events.contains(&SimEvent::CollisionDetected { a, b }));
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::CollisionResolved { count: 1, .. })));
}

// ----- Scenario 3: click growth and the cap -----

#[test]
fn clicks_double_until_the_mobile_cap() {
    let mut sim = Simulation::new(SimConfig::default(), phone(), Some(SEED));
    let mut sizes = vec![sim.population()];
    for _ in 0..4 {
        assert!(click_any(&mut sim));
        sizes.push(sim.population());
    }
    assert_eq!(sizes, vec![1, 2, 4, 8, 8]);
    assert!(!sim.prompt_showing());
    assert_eq!(
        sim.drain_events()
            .iter()
            .filter(|e| **e == SimEvent::FirstInteraction)
            .count(),
        1
    );
}

#[test]
fn desktop_population_never_passes_fifteen() {
    let mut sim = Simulation::new(SimConfig::default(), desktop(), Some(SEED));
    for _ in 0..12 {
        click_any(&mut sim);
        assert!(sim.population() <= 15);
    }
    assert_eq!(sim.population(), 15);
    assert!(sim.reset_available());

    sim.reset();
    assert_eq!(sim.population(), 1);
    assert!(!sim.reset_available());
}

// ----- Scenario 4: tenth explosion celebrates -----

#[test]
fn tenth_explosion_starts_a_seven_second_celebration() {
    let mut sim = Simulation::new(SimConfig::default(), desktop(), Some(SEED));
    for n in 1..=9 {
        collide_pair(&mut sim);
        assert_eq!(sim.explosion_count(), n);
        assert!(!sim.celebrating());
    }
    collide_pair(&mut sim);
    assert_eq!(sim.explosion_count(), 10);
    assert!(matches!(sim.phase(), Phase::Celebrating { .. }));
    assert!(sim
        .drain_events()
        .contains(&SimEvent::CelebrationStarted { count: 10 }));

    // Frozen while celebrating.
    let ticks = sim.tick_count();
    sim.tick();
    assert_eq!(sim.tick_count(), ticks);
    assert_eq!(sim.check_collisions(), None);
    assert!(!sim.click(Vec2::new(960.0, 540.0)));

    sim.update(1.0);
    assert!(sim.confetti().count() > 0);

    sim.update(5.5);
    assert!(sim.celebrating());
    sim.update(0.6);
    assert_eq!(sim.phase(), Phase::Normal);
    assert!(sim.drain_events().contains(&SimEvent::CelebrationEnded));
    assert_eq!(sim.explosion_count(), 10);
}

// ----- Scenario 5: missing assets -----

#[test]
fn missing_assets_fall_back_to_glyphs_and_still_play() {
    let dir = tempfile::tempdir().unwrap();
    let mut overlay = Overlay::new(
        SimConfig::default(),
        AssetSource::Dir(dir.path().to_path_buf()),
        Some(SEED),
    );
    overlay.activate(desktop());

    let start = std::time::Instant::now();
    while !overlay.assets().unwrap().settled() && start.elapsed().as_secs() < 5 {
        overlay.frame(1.0 / 60.0);
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    let assets = overlay.assets().unwrap();
    for kind in AssetKind::ALL {
        assert!(matches!(assets.slot(kind), AssetSlot::Failed), "{kind:?}");
    }

    // Still clickable...
    let sim = overlay.sim_mut().unwrap();
    assert!(click_any(sim));
    assert_eq!(sim.population(), 2);

    // ...and still collidable.
    let before = sim.explosion_count();
    collide_pair(sim);
    assert_eq!(sim.explosion_count(), before + 1);
}

// ----- Reset -----

#[test]
fn reset_goes_back_to_one_fresh_cat() {
    let mut sim = Simulation::new(SimConfig::default(), desktop(), Some(SEED));
    for _ in 0..3 {
        click_any(&mut sim);
    }
    collide_pair(&mut sim);
    assert_eq!(sim.explosion_count(), 1);
    let before: Vec<CatId> = sim.cats().iter().map(|c| c.id).collect();

    sim.reset();
    let cats = sim.cats();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].mode, MotionMode::Entering);
    assert!(!before.contains(&cats[0].id));
    assert_eq!(sim.explosion_count(), 0);
    assert!(sim.explosions().is_empty());
    assert!(sim.bounds().is_empty());
}
