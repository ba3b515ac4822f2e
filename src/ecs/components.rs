use glam::Vec2;

/// Stable identity of a live cat. Monotonic per simulation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatId(pub u32);

/// Center of the cat in screen pixels.
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Position before the last tick, for render interpolation.
#[derive(Debug, Clone, Copy)]
pub struct PrevPosition(pub Vec2);

/// One of the eight compass headings. Screen space, so `N` is up (-y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Heading {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading::N,
        Heading::NE,
        Heading::E,
        Heading::SE,
        Heading::S,
        Heading::SW,
        Heading::W,
        Heading::NW,
    ];

    /// Integer step per axis, each in {-1, 0, 1}.
    pub fn step(self) -> (i8, i8) {
        match self {
            Heading::N => (0, -1),
            Heading::NE => (1, -1),
            Heading::E => (1, 0),
            Heading::SE => (1, 1),
            Heading::S => (0, 1),
            Heading::SW => (-1, 1),
            Heading::W => (-1, 0),
            Heading::NW => (-1, -1),
        }
    }

    /// Unit direction vector; diagonals are normalized.
    pub fn unit(self) -> Vec2 {
        let (dx, dy) = self.step();
        Vec2::new(dx as f32, dy as f32).normalize()
    }

    /// Whether this heading has a component moving toward `edge`.
    pub fn points_into(self, edge: Edge) -> bool {
        let (dx, dy) = self.step();
        match edge {
            Edge::Left => dx < 0,
            Edge::Right => dx > 0,
            Edge::Top => dy < 0,
            Edge::Bottom => dy > 0,
        }
    }

    /// Whether this heading moves strictly away from `edge`.
    pub fn points_away_from(self, edge: Edge) -> bool {
        let (dx, dy) = self.step();
        match edge {
            Edge::Left => dx > 0,
            Edge::Right => dx < 0,
            Edge::Top => dy > 0,
            Edge::Bottom => dy < 0,
        }
    }
}

/// A viewport edge touched during a bounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Whether the cat is still flying in from off-screen or already bouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    Entering,
    Bouncing,
}

/// Per-tick motion parameters.
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    /// Reference pixels per tick. Decreases with size, never below the floor.
    pub speed: f32,
    pub heading: Heading,
    pub mode: MotionMode,
}

/// Visual appearance.
#[derive(Debug, Clone, Copy)]
pub struct Appearance {
    /// Side of the square bounding box in pixels.
    pub size: f32,
    /// RGBA packed as u32.
    pub color: u32,
}

/// Marks a cat that has been caught in a collision and is fading out.
#[derive(Debug, Clone, Copy)]
pub struct Colliding {
    /// Simulation time the pair gets removed.
    pub resolve_at: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonals_are_unit_length() {
        for heading in Heading::ALL {
            assert!((heading.unit().length() - 1.0).abs() < 1e-6, "{heading:?}");
        }
    }

    #[test]
    fn three_headings_leave_each_edge() {
        for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
            let away = Heading::ALL
                .iter()
                .filter(|h| h.points_away_from(edge))
                .count();
            assert_eq!(away, 3, "{edge:?}");
        }
    }

    #[test]
    fn into_and_away_never_overlap() {
        for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
            for heading in Heading::ALL {
                assert!(!(heading.points_into(edge) && heading.points_away_from(edge)));
            }
            let along = Heading::ALL
                .iter()
                .filter(|h| !h.points_into(edge) && !h.points_away_from(edge))
                .count();
            assert_eq!(along, 2, "{edge:?}");
        }
    }
}
