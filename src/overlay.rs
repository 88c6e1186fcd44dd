//! Modal dialogs and the image lightbox.
//!
//! Both share one show/hide transition: opening displays the overlay and
//! fades it in a moment later, closing fades it out and takes it off the
//! page once the transition is over. Body scrolling stays locked while any
//! overlay is visible.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::constants::{OVERLAY_FADE_IN, OVERLAY_FADE_OUT};
use crate::scheduler::{Scheduler, TimerHandle};

pub const CONTACT_MODAL: &str = "contact-modal";
pub const IMPRESSUM_MODAL: &str = "impressum-modal";
pub const LIGHTBOX: &str = "image-lightbox";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    FadeIn(String),  // Opened overlay becomes visible
    FadeOut(String), // Closed overlay leaves the page
    Dismiss(String), // Delayed close
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub displayed: bool,
    pub visible: bool,
    pub image_src: Option<String>,
    transition: Option<TimerHandle>,
}

#[derive(Debug, Default)]
pub struct Overlays {
    overlays: BTreeMap<String, Overlay>,
    scroll_locked: bool,
}

impl Overlays {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            overlays: ids.into_iter().map(|id| (id.into(), Overlay::default())).collect(),
            scroll_locked: false,
        }
    }

    /// The two modals and the lightbox found on the landing page.
    pub fn landing_page() -> Self {
        Self::new([CONTACT_MODAL, IMPRESSUM_MODAL, LIGHTBOX])
    }

    pub fn get(&self, id: &str) -> Option<&Overlay> {
        self.overlays.get(id)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.get(id).is_some_and(|overlay| overlay.visible)
    }

    pub fn any_visible(&self) -> bool {
        self.overlays.values().any(|overlay| overlay.visible)
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Shows the overlay called `id`. Unknown ids are ignored.
    pub fn open<E, S>(&mut self, id: &str, timers: &mut S) -> bool
    where
        E: From<OverlayEvent>,
        S: Scheduler<E>,
    {
        let Some(overlay) = self.overlays.get_mut(id) else {
            debug!(overlay = id, "no such overlay");
            return false;
        };
        overlay.displayed = true;
        retarget::<E, S>(overlay, timers, OVERLAY_FADE_IN, OverlayEvent::FadeIn(id.to_string()));
        debug!(overlay = id, "overlay opening");
        true
    }

    pub fn close<E, S>(&mut self, id: &str, timers: &mut S) -> bool
    where
        E: From<OverlayEvent>,
        S: Scheduler<E>,
    {
        let Some(overlay) = self.overlays.get_mut(id) else {
            return false;
        };
        overlay.visible = false;
        retarget::<E, S>(overlay, timers, OVERLAY_FADE_OUT, OverlayEvent::FadeOut(id.to_string()));
        debug!(overlay = id, "overlay closing");
        true
    }

    /// Closes `id` after `delay`.
    pub fn close_after<E, S>(&mut self, id: &str, delay: Duration, timers: &mut S)
    where
        E: From<OverlayEvent>,
        S: Scheduler<E>,
    {
        timers.schedule_after(delay, OverlayEvent::Dismiss(id.to_string()).into());
    }

    /// Enlarges a clicked price tier. Tiers without an image do nothing.
    pub fn open_lightbox<E, S>(&mut self, image_src: Option<&str>, timers: &mut S) -> bool
    where
        E: From<OverlayEvent>,
        S: Scheduler<E>,
    {
        let Some(src) = image_src else {
            return false;
        };
        let Some(lightbox) = self.overlays.get_mut(LIGHTBOX) else {
            return false;
        };
        lightbox.image_src = Some(src.to_string());
        self.open::<E, S>(LIGHTBOX, timers)
    }

    pub fn on_timer<E, S>(&mut self, handle: TimerHandle, event: OverlayEvent, timers: &mut S)
    where
        E: From<OverlayEvent>,
        S: Scheduler<E>,
    {
        match event {
            OverlayEvent::FadeIn(id) => {
                if let Some(overlay) = self.transitioning(&id, handle) {
                    overlay.visible = true;
                    self.scroll_locked = true;
                }
            }
            OverlayEvent::FadeOut(id) => {
                if let Some(overlay) = self.transitioning(&id, handle) {
                    overlay.displayed = false;
                    if id == LIGHTBOX {
                        overlay.image_src = None;
                    }
                    if !self.any_visible() {
                        self.scroll_locked = false;
                    }
                }
            }
            OverlayEvent::Dismiss(id) => {
                self.close::<E, S>(&id, timers);
            }
        }
    }

    fn transitioning(&mut self, id: &str, handle: TimerHandle) -> Option<&mut Overlay> {
        let overlay = self.overlays.get_mut(id)?;
        if overlay.transition != Some(handle) {
            return None;
        }
        overlay.transition = None;
        Some(overlay)
    }
}

// An overlay runs one transition at a time; a new one replaces the old.
fn retarget<E, S>(overlay: &mut Overlay, timers: &mut S, delay: Duration, event: OverlayEvent)
where
    E: From<OverlayEvent>,
    S: Scheduler<E>,
{
    if let Some(previous) = overlay.transition.take() {
        timers.cancel(previous);
    }
    overlay.transition = Some(timers.schedule_after(delay, event.into()));
}
