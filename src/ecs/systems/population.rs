use crate::cat::animation::AnimationState;
use crate::cat::{self, CatDice, CatSpec};
use crate::config::SimConfig;
use crate::ecs::components::CatId;
use crate::viewport::Viewport;

/// Hands out cat ids. Never reuses one, even across resets.
#[derive(Debug, Default)]
pub struct IdSource {
    next: u32,
}

impl IdSource {
    pub fn next(&mut self) -> CatId {
        self.next += 1;
        CatId(self.next)
    }
}

/// Live cats sorted by id.
pub fn live(world: &hecs::World) -> Vec<(CatId, hecs::Entity)> {
    let mut cats: Vec<(CatId, hecs::Entity)> = world
        .query::<&CatId>()
        .iter()
        .map(|(entity, id)| (*id, entity))
        .collect();
    cats.sort_by_key(|(id, _)| *id);
    cats
}

pub fn count(world: &hecs::World) -> usize {
    world.query::<&CatId>().iter().count()
}

/// Spawn one cat from `spec` with a randomized dance offset.
pub fn spawn(world: &mut hecs::World, ids: &mut IdSource, dice: &mut CatDice, spec: CatSpec) -> CatId {
    let id = ids.next();
    let dance = AnimationState::with_offset(dice.unit() * 4.0, 0.8 + dice.unit() * 0.4);
    cat::spawn_cat(world, id, spec, dance);
    id
}

/// Click growth: every live cat stays and brings one new cat along, until the
/// cap is hit. Returns the ids of the newcomers.
pub fn double(
    world: &mut hecs::World,
    ids: &mut IdSource,
    dice: &mut CatDice,
    config: &SimConfig,
    viewport: &Viewport,
    cap: usize,
) -> Vec<CatId> {
    let existing = count(world);
    let mut total = existing;
    let mut spawned = Vec::with_capacity(existing);
    for _ in 0..existing {
        if total >= cap {
            break;
        }
        let spec = dice.entering_cat(config, viewport);
        spawned.push(spawn(world, ids, dice, spec));
        total += 1;
    }
    spawned
}

/// Hard cap: keep the `cap` oldest cats, despawn the rest.
pub fn truncate(world: &mut hecs::World, cap: usize) -> Vec<CatId> {
    let cats = live(world);
    let mut removed = Vec::new();
    for (id, entity) in cats.into_iter().skip(cap) {
        if world.despawn(entity).is_ok() {
            removed.push(id);
        }
    }
    removed
}
