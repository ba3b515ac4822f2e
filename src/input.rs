use glam::Vec2;

/// Seconds between two presses that still count as the same click.
/// Platforms report both a held bit and a transition bit, so a single
/// physical click can look like two presses on consecutive polls.
const DEBOUNCE: f64 = 0.05;

/// Raw button and key state for one frame, from polling or window events.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawInput {
    pub cursor: Vec2,
    pub left_down: bool,
    pub toggle_down: bool,
    pub debug_down: bool,
    pub quit_down: bool,
}

/// What happened this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pressed {
    /// Left press at this position.
    pub click: Option<Vec2>,
    pub toggle: bool,
    pub debug: bool,
    pub quit: bool,
}

/// Press-not-hold edge detector for one button.
#[derive(Debug, Default)]
struct Edge {
    was_down: bool,
}

impl Edge {
    fn pressed(&mut self, down: bool) -> bool {
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }
}

/// Turns held state into one-frame presses.
#[derive(Debug, Default)]
pub struct InputState {
    left: Edge,
    toggle: Edge,
    debug: Edge,
    quit: Edge,
    elapsed: f64,
    last_click: Option<f64>,
    pub cursor: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this frame's raw state. Call once per frame.
    pub fn update(&mut self, raw: RawInput, dt: f64) -> Pressed {
        self.elapsed += dt;
        self.cursor = raw.cursor;

        let mut click = None;
        if self.left.pressed(raw.left_down) {
            let bounce = self
                .last_click
                .is_some_and(|t| self.elapsed - t < DEBOUNCE);
            if !bounce {
                click = Some(raw.cursor);
            }
            self.last_click = Some(self.elapsed);
        }

        Pressed {
            click,
            toggle: self.toggle.pressed(raw.toggle_down),
            debug: self.debug.pressed(raw.debug_down),
            quit: self.quit.pressed(raw.quit_down),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(left: bool) -> RawInput {
        RawInput {
            cursor: Vec2::new(10.0, 20.0),
            left_down: left,
            ..Default::default()
        }
    }

    #[test]
    fn press_fires_once_while_held() {
        let mut input = InputState::new();
        assert_eq!(input.update(held(true), 0.016).click, Some(Vec2::new(10.0, 20.0)));
        assert_eq!(input.update(held(true), 0.016).click, None);
        assert_eq!(input.update(held(false), 0.016).click, None);
        assert!(input.update(held(true), 0.5).click.is_some());
    }

    #[test]
    fn rapid_release_and_press_is_debounced() {
        let mut input = InputState::new();
        assert!(input.update(held(true), 0.016).click.is_some());
        input.update(held(false), 0.01);
        assert!(input.update(held(true), 0.01).click.is_none());
    }

    #[test]
    fn keys_are_edge_detected() {
        let mut input = InputState::new();
        let f9 = RawInput {
            toggle_down: true,
            ..Default::default()
        };
        assert!(input.update(f9, 0.016).toggle);
        assert!(!input.update(f9, 0.016).toggle);
    }
}
