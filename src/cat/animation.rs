/// Playback state of a cat's dance clip.
///
/// Cats share one clip but start at different offsets so a crowd does not
/// bob in lockstep. The frame index is derived from the clip's frame rate
/// once the clip has loaded; until then only `elapsed` advances.
#[derive(Debug, Clone, Copy)]
pub struct AnimationState {
    pub elapsed: f32,
    pub speed: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            speed: 1.0,
        }
    }
}

impl AnimationState {
    pub fn with_offset(offset: f32, speed: f32) -> Self {
        Self {
            elapsed: offset,
            speed,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt * self.speed;
    }

    /// Normalized position inside a loop of `duration` seconds, in [0, 1).
    pub fn phase(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        (self.elapsed / duration).fract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_wraps() {
        let mut anim = AnimationState::default();
        anim.advance(2.5);
        assert!((anim.phase(1.0) - 0.5).abs() < 1e-6);
        assert_eq!(anim.phase(0.0), 0.0);
    }
}
