use std::io::Write;

use anyhow::{Context, Result};

use crate::engine::Engine;
use crate::page::Page;
use crate::ring::SlotSet;

const LIT: char = '●';
const DARK: char = '○';

/// Prints one line per change of the ring.
pub struct TerminalEngine<W: Write> {
    out: W,
    last_revision: Option<u64>,
}

impl<W: Write> TerminalEngine<W> {
    pub fn new(out: W) -> Self {
        Self { out, last_revision: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn ring_line(slots: &SlotSet) -> String {
    slots
        .iter()
        .map(|slot| if slot.active { LIT } else { DARK })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}

impl<W: Write> Engine for TerminalEngine<W> {
    fn render_frame(&mut self, page: &Page) -> Result<bool> {
        let slots = &page.document().slots;
        if self.last_revision == Some(slots.revision()) {
            return Ok(true);
        }
        self.last_revision = Some(slots.revision());

        writeln!(self.out, "{:>9.3}s  {}", page.now().as_secs_f64(), ring_line(slots))
            .context("failed to write ring frame")?;
        self.out.flush().context("failed to flush ring frame")?;
        Ok(true)
    }
}
