use glam::Vec2;

use crate::cat::CatDice;
use crate::config::SimConfig;
use crate::ecs::components::{Appearance, CatId, Edge, Motion, MotionMode, Position, PrevPosition};
use crate::spatial::{BoundsCache, Rect};
use crate::viewport::Viewport;

/// Pixels moved per tick by a cat with `speed` in this viewport.
pub fn displacement(speed: f32, viewport: &Viewport, config: &SimConfig) -> f32 {
    speed * (viewport.width + config.motion_margin) / config.reference_span
}

/// Outcome of advancing one cat by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    Entered,
    Bounced,
    Teleported,
}

/// Advance every cat by one tick and report its new rectangle to `bounds`.
///
/// Entering cats fly straight until they are fully inside the envelope,
/// then switch to bouncing. Bouncing cats are clamped just inside the
/// envelope and turned away from the wall they hit. A cat that somehow ends
/// up far outside the screen is sent back to its spawn point.
pub fn advance(
    world: &mut hecs::World,
    viewport: &Viewport,
    config: &SimConfig,
    dice: &mut CatDice,
    bounds: &mut BoundsCache,
) -> usize {
    let mut teleported = 0;
    for (_, (id, pos, prev_pos, motion, appearance)) in world.query_mut::<(
        &CatId,
        &mut Position,
        &mut PrevPosition,
        &mut Motion,
        &Appearance,
    )>() {
        // Store previous position for render interpolation
        prev_pos.0 = pos.0;

        let step = step_cat(&mut pos.0, motion, appearance.size, viewport, config, dice);
        match step {
            Step::Teleported => {
                prev_pos.0 = pos.0;
                teleported += 1;
                log::debug!("cat {} escaped the screen, respawning at its entry point", id.0);
            }
            Step::Entered => log::debug!("cat {} is on screen, bouncing", id.0),
            Step::Moved | Step::Bounced => {}
        }

        bounds.report(*id, Rect::square(pos.0, appearance.size));
    }
    teleported
}

/// Pure per-cat transform for one tick.
pub fn step_cat(
    pos: &mut Vec2,
    motion: &mut Motion,
    size: f32,
    viewport: &Viewport,
    config: &SimConfig,
    dice: &mut CatDice,
) -> Step {
    let delta = motion.heading.unit() * displacement(motion.speed, viewport, config);
    let mut next = *pos + delta;

    if escaped(next, size, viewport, config) {
        *pos = dice.entry_point(motion.heading, size, viewport, config);
        motion.mode = MotionMode::Entering;
        return Step::Teleported;
    }

    let step = match motion.mode {
        MotionMode::Entering => {
            if viewport.strictly_inside(next, size) {
                motion.mode = MotionMode::Bouncing;
                Step::Entered
            } else {
                Step::Moved
            }
        }
        MotionMode::Bouncing => {
            let (lo, hi) = viewport.envelope(size);
            let inset = config.bounce_inset;
            let mut touched = [Edge::Left; 2];
            let mut n = 0;

            if next.x <= lo.x {
                next.x = (lo.x + inset).min(hi.x);
                touched[n] = Edge::Left;
                n += 1;
            } else if next.x >= hi.x {
                next.x = (hi.x - inset).max(lo.x);
                touched[n] = Edge::Right;
                n += 1;
            }
            if next.y <= lo.y {
                next.y = (lo.y + inset).min(hi.y);
                touched[n] = Edge::Top;
                n += 1;
            } else if next.y >= hi.y {
                next.y = (hi.y - inset).max(lo.y);
                touched[n] = Edge::Bottom;
                n += 1;
            }

            if n > 0 {
                motion.heading = dice.bounce_heading(motion.heading, &touched[..n]);
                Step::Bounced
            } else {
                Step::Moved
            }
        }
    };

    *pos = next;
    step
}

/// Far enough outside the screen that no bounce or entry can bring it back.
fn escaped(center: Vec2, size: f32, viewport: &Viewport, config: &SimConfig) -> bool {
    let limit = size + 2.0 * config.entry_margin;
    center.x < -limit
        || center.y < -limit
        || center.x > viewport.width + limit
        || center.y > viewport.height + limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Heading;

    fn motion(heading: Heading, mode: MotionMode) -> Motion {
        Motion {
            speed: 6.0,
            heading,
            mode,
        }
    }

    #[test]
    fn entering_flips_to_bouncing_once() {
        let config = SimConfig::default();
        let vp = Viewport::new(1000.0, 800.0);
        let mut dice = CatDice::with_seed(1);
        let mut pos = Vec2::new(-70.0, 400.0);
        let mut m = motion(Heading::E, MotionMode::Entering);

        let mut flips = 0;
        for _ in 0..400 {
            let was = m.mode;
            let step = step_cat(&mut pos, &mut m, 100.0, &vp, &config, &mut dice);
            if step == Step::Entered {
                flips += 1;
                assert_eq!(was, MotionMode::Entering);
                assert!(vp.strictly_inside(pos, 100.0));
            }
        }
        assert_eq!(flips, 1);
        assert_eq!(m.mode, MotionMode::Bouncing);
    }

    #[test]
    fn entering_cat_is_not_clamped() {
        let config = SimConfig::default();
        let vp = Viewport::new(1000.0, 800.0);
        let mut dice = CatDice::with_seed(1);
        let mut pos = Vec2::new(-70.0, 400.0);
        let mut m = motion(Heading::E, MotionMode::Entering);
        let step = step_cat(&mut pos, &mut m, 100.0, &vp, &config, &mut dice);
        assert_eq!(step, Step::Moved);
        assert!(pos.x < 0.0);
    }

    #[test]
    fn bounce_clamps_and_turns_away() {
        let config = SimConfig::default();
        let vp = Viewport::new(1000.0, 800.0);
        let mut dice = CatDice::with_seed(9);
        for _ in 0..50 {
            let mut pos = Vec2::new(948.0, 400.0);
            let mut m = motion(Heading::E, MotionMode::Bouncing);
            let step = step_cat(&mut pos, &mut m, 100.0, &vp, &config, &mut dice);
            assert_eq!(step, Step::Bounced);
            assert!(pos.x < 950.0);
            assert_ne!(m.heading, Heading::E);
            assert!(m.heading.points_away_from(Edge::Right));
        }
    }

    #[test]
    fn corner_bounce_heads_diagonally_out() {
        let config = SimConfig::default();
        let vp = Viewport::new(1000.0, 800.0);
        let mut dice = CatDice::with_seed(5);
        let mut pos = Vec2::new(51.0, 51.0);
        let mut m = motion(Heading::NW, MotionMode::Bouncing);
        step_cat(&mut pos, &mut m, 100.0, &vp, &config, &mut dice);
        assert_eq!(m.heading, Heading::SE);
    }

    #[test]
    fn escaped_cat_teleports_home() {
        let config = SimConfig::default();
        let vp = Viewport::new(1000.0, 800.0);
        let mut dice = CatDice::with_seed(2);
        let mut pos = Vec2::new(5000.0, 400.0);
        let mut m = motion(Heading::W, MotionMode::Bouncing);
        let step = step_cat(&mut pos, &mut m, 100.0, &vp, &config, &mut dice);
        assert_eq!(step, Step::Teleported);
        assert_eq!(m.mode, MotionMode::Entering);
        assert!(pos.x > 1000.0 && pos.x < 1000.0 + 100.0);
    }

    #[test]
    fn bouncing_cats_stay_in_the_envelope() {
        let config = SimConfig::default();
        let vp = Viewport::new(640.0, 480.0);
        let mut dice = CatDice::with_seed(77);
        let mut pos = Vec2::new(320.0, 240.0);
        let mut m = Motion {
            speed: 30.0,
            heading: Heading::NE,
            mode: MotionMode::Bouncing,
        };
        let (lo, hi) = vp.envelope(120.0);
        for _ in 0..5_000 {
            step_cat(&mut pos, &mut m, 120.0, &vp, &config, &mut dice);
            assert!(pos.x >= lo.x && pos.x <= hi.x, "{pos}");
            assert!(pos.y >= lo.y && pos.y <= hi.y, "{pos}");
        }
    }

    #[test]
    fn advance_reports_bounds() {
        let config = SimConfig::default();
        let vp = Viewport::new(1000.0, 800.0);
        let mut dice = CatDice::with_seed(4);
        let mut world = hecs::World::new();
        let mut bounds = BoundsCache::new(4);
        world.spawn((
            CatId(1),
            Position(Vec2::new(500.0, 400.0)),
            PrevPosition(Vec2::new(500.0, 400.0)),
            motion(Heading::S, MotionMode::Bouncing),
            Appearance {
                size: 100.0,
                color: 0,
            },
        ));

        advance(&mut world, &vp, &config, &mut dice, &mut bounds);
        let rect = bounds.get(CatId(1)).unwrap();
        assert_eq!(rect.center.x, 500.0);
        assert!(rect.center.y > 400.0);
        assert_eq!(rect.size, Vec2::splat(100.0));
    }
}
