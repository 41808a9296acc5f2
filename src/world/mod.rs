pub mod abilities;
pub mod actions;
pub mod bestiary;
pub mod biomes;
pub mod compendium;
pub mod pathfinding;
pub mod position;
pub mod settings;
pub mod skills;
