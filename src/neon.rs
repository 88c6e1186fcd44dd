use std::path::Path;

use anyhow::{Result, anyhow};
use raylib::prelude::*;

use crate::constants::*;
use crate::engine::Engine;
use crate::ffmpeg::Ffmpeg;
use crate::page::Page;
use crate::ring::SlotSet;

const NEON: Color = Color::new(0, 240, 255, 255);
const UNLIT: Color = Color::new(30, 40, 48, 255);
const GLOW_LAYERS: u8 = 4;

/// Draws the ring lights in a raylib window, optionally recording every frame.
pub struct NeonEngine {
    rl: RaylibHandle,
    thread: RaylibThread,
    framebuffer: RenderTexture2D,
    recorder: Option<Ffmpeg>,
}

impl NeonEngine {
    pub fn new(record: Option<&Path>) -> Result<Self> {
        let (mut rl, thread) = raylib::init()
            .size(RENDER_WIDTH / 2, RENDER_HEIGHT / 2)
            .title("Ring Light")
            .vsync()
            .resizable()
            .build();
        rl.set_target_fps(FPS);
        rl.set_trace_log(TraceLogLevel::LOG_ERROR);

        let framebuffer = rl
            .load_render_texture(&thread, RENDER_WIDTH as u32, RENDER_HEIGHT as u32)
            .map_err(|e| anyhow!("failed to create render texture: {e}"))?;

        let recorder = match record {
            Some(video) => Some(Ffmpeg::new(RENDER_WIDTH, RENDER_HEIGHT, FPS, video)?),
            None => None,
        };

        Ok(Self { rl, thread, framebuffer, recorder })
    }
}

fn draw_rings(d: &mut RaylibDrawHandle, slots: &SlotSet) {
    let count = slots.len().max(1) as f32;
    let spacing = RENDER_WIDTH as f32 / (count + 1.0);
    let outer = (spacing * 0.35).min(RENDER_HEIGHT as f32 * 0.2);
    let inner = outer * 0.8;
    let y = RENDER_HEIGHT as f32 * 0.5;

    for (i, slot) in slots.iter().enumerate() {
        let center = Vector2::new(spacing * (i as f32 + 1.0), y);
        if slot.active {
            // Fading halo around a lit ring
            for layer in (1..=GLOW_LAYERS).rev() {
                let spread = outer * 0.06 * layer as f32;
                let alpha = 70 / layer;
                d.draw_ring(center, inner - spread, outer + spread, 0.0, 360.0, 96, Color::new(NEON.r, NEON.g, NEON.b, alpha));
            }
            d.draw_ring(center, inner, outer, 0.0, 360.0, 96, NEON);
        } else {
            d.draw_ring(center, inner, outer, 0.0, 360.0, 96, UNLIT);
        }
    }
}

impl Engine for NeonEngine {
    fn render_frame(&mut self, page: &Page) -> Result<bool> {
        let thread = &self.thread;
        let slots = &page.document().slots;

        // --- Render each frame into fixed size "framebuffer" ---
        self.rl.draw_texture_mode(thread, &mut self.framebuffer, |mut tmd| {
            let mut d = tmd.begin_drawing(thread);
            d.clear_background(Color::BLACK);
            draw_rings(&mut d, slots);
        });

        // Draw inverted copy of framebuffer to the screen for feedback
        {
            let mut d = self.rl.begin_drawing(thread);
            let sw = d.get_screen_width() as f32;
            let sh = d.get_screen_height() as f32;
            d.draw_texture_pro(
                &self.framebuffer,
                Rectangle::new(0.0, 0.0, self.framebuffer.width() as f32, -(self.framebuffer.height() as f32)),
                Rectangle::new(0.0, 0.0, sw, sh),
                Vector2::new(0.0, 0.0),
                0.0,
                Color::WHITE,
            );
        }

        if let Some(recorder) = self.recorder.as_mut() {
            let image = self
                .framebuffer
                .load_image()
                .map_err(|e| anyhow!("failed to read back frame: {e}"))?;
            recorder.write(&image)?;
        }

        Ok(!self.rl.window_should_close())
    }
}
