pub mod element;
pub mod player;
pub mod utils;
