pub mod api;
pub mod audio;
pub mod config;
pub mod event;
pub mod logging;
pub mod stream;
pub mod ui;
pub mod utils;
