pub mod collision;
pub mod movement;
pub mod population;
