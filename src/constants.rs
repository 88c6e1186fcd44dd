use std::time::Duration;

pub const RENDER_WIDTH: i32 = 1920;           // Width of the render texture
pub const RENDER_HEIGHT: i32 = 1080;          // Height of the render texture
pub const FPS: u32 = 60;                      // Frames per second
pub const FRAME_TIME: Duration = Duration::from_micros(1_000_000 / FPS as u64); // Time per frame

pub const ANIMATION_INTERVAL: Duration = Duration::from_millis(1000); // Pause between two slot activations
pub const DEFAULT_SLOTS: [&str; 5] = ["slot1", "slot2", "slot3", "slot4", "slot5"];

pub const OVERLAY_FADE_IN: Duration = Duration::from_millis(10);      // Delay before an opened overlay turns visible
pub const OVERLAY_FADE_OUT: Duration = Duration::from_millis(300);    // Hide transition length
pub const CONTACT_CLOSE_DELAY: Duration = Duration::from_millis(3000); // Success message stays up this long

pub const DEFAULT_CONTACT_ENDPOINT: &str = "/contact";
