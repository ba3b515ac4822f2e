use glam::Vec2;

use crate::config::SimConfig;

/// Screen area the cats live in, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Device class derived from the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn device_class(&self, config: &SimConfig) -> DeviceClass {
        if self.width < config.mobile_breakpoint {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// Max simultaneous cats for this viewport.
    pub fn population_cap(&self, config: &SimConfig) -> usize {
        match self.device_class(config) {
            DeviceClass::Mobile => config.mobile_cap,
            DeviceClass::Desktop => config.desktop_cap,
        }
    }

    /// Seconds between motion ticks.
    pub fn tick_interval(&self, config: &SimConfig) -> f64 {
        match self.device_class(config) {
            DeviceClass::Mobile => 1.0 / config.mobile_tick_hz,
            DeviceClass::Desktop => 1.0 / config.desktop_tick_hz,
        }
    }

    /// Seconds between collision passes.
    pub fn collision_interval(&self, config: &SimConfig) -> f64 {
        match self.device_class(config) {
            DeviceClass::Mobile => config.mobile_collision_interval,
            DeviceClass::Desktop => config.desktop_collision_interval,
        }
    }

    /// Half-extent of the allowed center range on one axis for a cat of `size`.
    /// Oversized cats get confined to the middle half of the axis.
    pub fn envelope_margin(size: f32, dim: f32) -> f32 {
        (size * 0.5).min(dim * 0.25)
    }

    /// `(min, max)` center bounds per axis for a cat of `size`.
    pub fn envelope(&self, size: f32) -> (Vec2, Vec2) {
        let mx = Self::envelope_margin(size, self.width);
        let my = Self::envelope_margin(size, self.height);
        (Vec2::new(mx, my), Vec2::new(self.width - mx, self.height - my))
    }

    /// True when the center lies strictly inside the envelope on both axes.
    pub fn strictly_inside(&self, center: Vec2, size: f32) -> bool {
        let (lo, hi) = self.envelope(size);
        center.x > lo.x && center.x < hi.x && center.y > lo.y && center.y < hi.y
    }
}
