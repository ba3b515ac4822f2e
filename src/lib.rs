//! Cat mode: a small overlay mini-game of cats that wander the screen,
//! multiply when clicked and explode when they bump into each other.
//!
//! The library is the headless simulation. [`overlay::Overlay`] is the
//! on/off switch a host drives once per frame; the `catmode` binary is one
//! such host.

pub mod assets;
pub mod cat;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod ecs;
pub mod effects;
pub mod overlay;
pub mod particles;
pub mod sim;
pub mod spatial;
pub mod viewport;

pub use config::SimConfig;
pub use overlay::{AssetSource, Overlay};
pub use sim::{SimEvent, Simulation};
pub use viewport::Viewport;
