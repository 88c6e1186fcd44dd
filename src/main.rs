use std::io;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ringlight::config::{self, Args};
use ringlight::constants::FRAME_TIME;
use ringlight::engine::Engine;
use ringlight::logger::init_logging;
use ringlight::page::Page;
use ringlight::terminal::TerminalEngine;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.no_color);

    let config = config::resolve(&args).context("invalid configuration")?;
    let mut page = Page::load(&config).context("failed to start the ring animation")?;
    let deadline = args.duration_secs.map(Duration::from_secs);

    #[cfg(feature = "window")]
    {
        if args.window {
            let engine = ringlight::neon::NeonEngine::new(args.record.as_deref())?;
            // raylib paces frames itself through vsync
            return run(&mut page, engine, deadline, false);
        }
    }

    run(&mut page, TerminalEngine::new(io::stdout()), deadline, true)
}

fn run(page: &mut Page, mut engine: impl Engine, deadline: Option<Duration>, pace: bool) -> Result<()> {
    // --- Main Loop ---
    loop {
        page.advance(FRAME_TIME);

        if !engine.render_frame(page)? {
            break;
        }
        if deadline.is_some_and(|limit| page.now() >= limit) {
            break;
        }
        if pace {
            thread::sleep(FRAME_TIME);
        }
    }

    page.stop_animation();
    engine.render_frame(page)?;
    info!(
        elapsed_ms = page.now().as_millis() as u64,
        cycles = page.ring().cycles_started(),
        "ring animation finished"
    );
    Ok(())
}
