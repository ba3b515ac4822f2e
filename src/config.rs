use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// Viewport width (px) below which the device counts as mobile.
pub const MOBILE_BREAKPOINT: f32 = 768.0;
/// Max live cats on narrow viewports.
pub const MOBILE_CAP: usize = 8;
/// Max live cats on wide viewports.
pub const DESKTOP_CAP: usize = 15;
/// Motion ticks per second on mobile / desktop.
pub const MOBILE_TICK_HZ: f64 = 24.0;
pub const DESKTOP_TICK_HZ: f64 = 40.0;
/// Seconds between collision passes on mobile / desktop.
pub const MOBILE_COLLISION_INTERVAL: f64 = 0.2;
pub const DESKTOP_COLLISION_INTERVAL: f64 = 0.1;
/// Fade time between detecting a collision and removing the pair.
pub const COLLISION_FADE: f64 = 0.2;
/// How long an explosion stays on screen.
pub const EXPLOSION_LIFETIME: f64 = 2.0;
/// Celebration window length.
pub const CELEBRATION_DURATION: f64 = 7.0;
/// Every Nth explosion starts a celebration.
pub const MILESTONE_EVERY: u32 = 10;
/// Population at which the reset control is offered.
pub const RESET_THRESHOLD: usize = 5;

/// Size distribution (px).
pub const SIZE_MIN: f32 = 80.0;
pub const SIZE_TYPICAL_MAX: f32 = 200.0;
pub const SIZE_LARGE_MAX: f32 = 400.0;
/// Chance of a 200-400px cat.
pub const LARGE_CHANCE: f32 = 0.10;
/// Chance of a 400px..full-screen cat.
pub const GIANT_CHANCE: f32 = 0.02;

/// Speed model: `speed = max(MIN_SPEED, BASE_SPEED * REFERENCE_SIZE / size)`.
pub const BASE_SPEED: f32 = 6.0;
pub const REFERENCE_SIZE: f32 = 80.0;
pub const MIN_SPEED: f32 = 1.0;
/// Horizontal slack added to the viewport width when scaling displacement.
pub const MOTION_MARGIN: f32 = 200.0;
/// Viewport span (px) at which one unit of speed moves one pixel per tick.
pub const REFERENCE_SPAN: f32 = 1400.0;

/// Distance beyond the edge that entering cats start at.
pub const ENTRY_MARGIN: f32 = 20.0;
/// How far inside the envelope a bounced cat is clamped.
pub const BOUNCE_INSET: f32 = 1.0;

/// Tunables for one simulation. Every field falls back to its constant when
/// missing from a config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mobile_breakpoint: f32,
    pub mobile_cap: usize,
    pub desktop_cap: usize,
    pub mobile_tick_hz: f64,
    pub desktop_tick_hz: f64,
    pub mobile_collision_interval: f64,
    pub desktop_collision_interval: f64,
    pub collision_fade: f64,
    pub explosion_lifetime: f64,
    pub celebration_duration: f64,
    pub milestone_every: u32,
    pub reset_threshold: usize,
    pub size_min: f32,
    pub size_typical_max: f32,
    pub size_large_max: f32,
    pub large_chance: f32,
    pub giant_chance: f32,
    pub base_speed: f32,
    pub reference_size: f32,
    pub min_speed: f32,
    pub motion_margin: f32,
    pub reference_span: f32,
    pub entry_margin: f32,
    pub bounce_inset: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: MOBILE_BREAKPOINT,
            mobile_cap: MOBILE_CAP,
            desktop_cap: DESKTOP_CAP,
            mobile_tick_hz: MOBILE_TICK_HZ,
            desktop_tick_hz: DESKTOP_TICK_HZ,
            mobile_collision_interval: MOBILE_COLLISION_INTERVAL,
            desktop_collision_interval: DESKTOP_COLLISION_INTERVAL,
            collision_fade: COLLISION_FADE,
            explosion_lifetime: EXPLOSION_LIFETIME,
            celebration_duration: CELEBRATION_DURATION,
            milestone_every: MILESTONE_EVERY,
            reset_threshold: RESET_THRESHOLD,
            size_min: SIZE_MIN,
            size_typical_max: SIZE_TYPICAL_MAX,
            size_large_max: SIZE_LARGE_MAX,
            large_chance: LARGE_CHANCE,
            giant_chance: GIANT_CHANCE,
            base_speed: BASE_SPEED,
            reference_size: REFERENCE_SIZE,
            min_speed: MIN_SPEED,
            motion_margin: MOTION_MARGIN,
            reference_span: REFERENCE_SPAN,
            entry_margin: ENTRY_MARGIN,
            bounce_inset: BOUNCE_INSET,
        }
    }
}

impl SimConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        let config: SimConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.mobile_cap >= 1 && self.desktop_cap >= 1, "population caps must be >= 1");
        ensure!(
            self.mobile_tick_hz > 0.0 && self.desktop_tick_hz > 0.0,
            "tick rates must be positive"
        );
        ensure!(
            self.mobile_collision_interval > 0.0 && self.desktop_collision_interval > 0.0,
            "collision intervals must be positive"
        );
        ensure!(self.milestone_every >= 1, "milestone_every must be >= 1");
        ensure!(self.min_speed > 0.0, "min_speed must be positive");
        ensure!(self.reference_span > 0.0, "reference_span must be positive");
        ensure!(
            self.size_min > 0.0
                && self.size_min <= self.size_typical_max
                && self.size_typical_max <= self.size_large_max,
            "size bounds must be positive and ascending"
        );
        ensure!(
            self.large_chance >= 0.0
                && self.giant_chance >= 0.0
                && self.large_chance + self.giant_chance <= 1.0,
            "size chances must lie in [0, 1]"
        );
        Ok(())
    }
}
