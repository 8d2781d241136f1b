pub mod animation;
pub mod rooms;
pub mod spells;
