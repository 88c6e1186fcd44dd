pub mod config;
pub mod constants;
pub mod contact;
pub mod engine;
pub mod logger;
pub mod overlay;
pub mod page;
pub mod reveal;
pub mod ring;
pub mod scheduler;
pub mod terminal;

#[cfg(feature = "window")]
pub mod ffmpeg;
#[cfg(feature = "window")]
pub mod neon;
