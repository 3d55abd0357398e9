pub mod streamer;
