use anyhow::Result;

use crate::page::Page;

pub trait Engine {
    /// Draws the current state of `page`. Returns false once the engine wants to stop.
    fn render_frame(&mut self, page: &Page) -> Result<bool>;
}
