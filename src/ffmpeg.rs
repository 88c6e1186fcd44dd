use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::{Context, Result};
use raylib::prelude::*;
use tracing::{info, warn};

/// Pipes raw RGBA frames into an ffmpeg process that encodes them to H.264.
pub struct Ffmpeg {
    process: Child,
    stdin: Option<ChildStdin>,
}

impl Ffmpeg {
    pub fn new(width: i32, height: i32, fps: u32, video: &Path) -> Result<Ffmpeg> {
        let mut process = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .args(["-loglevel", "error"])
            .arg("-y")
            .args(["-f", "rawvideo"])
            .args(["-pixel_format", "rgba"])
            .args(["-video_size", &format!("{}x{}", width, height)])
            .args(["-framerate", &format!("{}", fps)])
            .args(["-i", "-"])
            .args(["-c:v", "libx264"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(video)
            .spawn()
            .context("failed to start ffmpeg")?;
        let stdin = process.stdin.take().context("failed to open ffmpeg stdin")?;
        info!(video = %video.display(), "recording ring animation");
        Ok(Ffmpeg { process, stdin: Some(stdin) })
    }

    pub fn write(&mut self, image: &Image) -> Result<()> {
        let stdin = self.stdin.as_mut().context("ffmpeg stdin already closed")?;
        let width = image.width() as usize;
        let height = image.height() as usize;
        let row_len = width * 4; // RGBA

        // SAFETY: a loaded RGBA image owns width * height * 4 bytes of pixel data.
        let pixels = unsafe { std::slice::from_raw_parts(image.data() as *const u8, row_len * height) };

        // Render textures come out bottom-up; ffmpeg wants rows top-down.
        for row in pixels.chunks_exact(row_len).rev() {
            stdin.write_all(row).context("failed to write frame to ffmpeg")?;
        }
        Ok(())
    }
}

impl Drop for Ffmpeg {
    fn drop(&mut self) {
        // Closing stdin ends the stream; wait for ffmpeg to finish the file.
        self.stdin = None;
        if let Err(err) = self.process.wait() {
            warn!(error = %err, "failed to wait for ffmpeg");
        }
    }
}
