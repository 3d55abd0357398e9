pub mod backend;
pub mod media;
pub mod playback;
pub mod state;
