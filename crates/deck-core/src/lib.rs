pub mod artwork;
pub mod browser;
pub mod cards;
pub mod config;
pub mod debounce;
pub mod directory;
pub mod favorites;
pub mod handles;
pub mod library;
pub mod platform;
pub mod playback;
pub mod player;
pub mod playlist;
pub mod state;
pub mod station;
pub mod transport;
