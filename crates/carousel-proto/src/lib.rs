pub mod catalog;
pub mod config;
pub mod error;
pub mod gesture;
pub mod lookup;
pub mod platform;
pub mod playback;
pub mod playlist;
pub mod protocol;
pub mod selection;
pub mod state;
pub mod visibility;
