pub mod controls;
pub mod player;
pub mod playlist;
pub mod progress;
