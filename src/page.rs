//! The landing page: ring lights, overlays, contact form and reveal effects
//! sharing one timer queue.

use std::time::Duration;

use tracing::debug;

use crate::config::PageConfig;
use crate::constants::CONTACT_CLOSE_DELAY;
use crate::contact::{ContactForm, Fields, FormOutcome, FormResponse, TransportError};
use crate::overlay::{CONTACT_MODAL, IMPRESSUM_MODAL, LIGHTBOX, OverlayEvent, Overlays};
use crate::reveal::Reveal;
use crate::ring::{RingAnimator, RingError, RingEvent, SlotSet};
use crate::scheduler::{Fired, Scheduler, TimerQueue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Ring(RingEvent),
    Overlay(OverlayEvent),
}

impl From<RingEvent> for PageEvent {
    fn from(event: RingEvent) -> Self {
        PageEvent::Ring(event)
    }
}

impl From<OverlayEvent> for PageEvent {
    fn from(event: OverlayEvent) -> Self {
        PageEvent::Overlay(event)
    }
}

/// Something the visitor clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
    OpenForm,
    OpenImpressum,
    CloseButton(String),
    Backdrop(String),
    ZoomableTier(Option<String>), // Image source of the tier, if it has one
    Lightbox,
}

/// Element state the renderers read.
#[derive(Debug)]
pub struct Document {
    pub slots: SlotSet,
    pub overlays: Overlays,
    pub contact: ContactForm,
    pub reveal: Reveal,
}

pub struct Page {
    timers: TimerQueue<PageEvent>,
    ring: RingAnimator,
    document: Document,
}

impl Page {
    /// Builds the page and starts the ring, like the script's DOMContentLoaded handler.
    pub fn load(config: &PageConfig) -> Result<Self, RingError> {
        let mut page = Self::new(config)?;
        page.start_animation();
        Ok(page)
    }

    fn new(config: &PageConfig) -> Result<Self, RingError> {
        Ok(Self {
            timers: TimerQueue::new(),
            ring: RingAnimator::new(config.slots.clone(), config.interval)?,
            document: Document {
                slots: SlotSet::new(config.slots.iter().cloned()),
                overlays: Overlays::landing_page(),
                contact: ContactForm::new(config.contact_endpoint.clone()),
                reveal: Reveal::default(),
            },
        })
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn ring(&self) -> &RingAnimator {
        &self.ring
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn start_animation(&mut self) {
        self.ring.start(&mut self.timers, &mut self.document.slots);
    }

    pub fn stop_animation(&mut self) {
        self.ring.stop(&mut self.timers, &mut self.document.slots);
    }

    /// Runs every callback due within `dt`. Returns how many fired.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let until = self.timers.now() + dt;
        let mut fired = 0;
        while let Some(next) = self.timers.pop_due(until) {
            self.dispatch(next);
            fired += 1;
        }
        self.timers.skip_to(until);
        fired
    }

    fn dispatch(&mut self, fired: Fired<PageEvent>) {
        match fired.event {
            PageEvent::Ring(event) => {
                self.ring
                    .on_timer(fired.handle, event, &mut self.timers, &mut self.document.slots);
            }
            PageEvent::Overlay(event) => {
                self.document.overlays.on_timer(fired.handle, event, &mut self.timers);
            }
        }
    }

    pub fn click(&mut self, click: Click) -> bool {
        debug!(?click, "click");
        let overlays = &mut self.document.overlays;
        match click {
            Click::OpenForm => overlays.open(CONTACT_MODAL, &mut self.timers),
            Click::OpenImpressum => overlays.open(IMPRESSUM_MODAL, &mut self.timers),
            Click::CloseButton(id) | Click::Backdrop(id) => overlays.close(&id, &mut self.timers),
            Click::ZoomableTier(src) => overlays.open_lightbox(src.as_deref(), &mut self.timers),
            Click::Lightbox => overlays.close(LIGHTBOX, &mut self.timers),
        }
    }

    /// Submits the contact form once. On success the modal closes a few seconds later.
    pub fn submit_contact<F>(&mut self, send: F) -> Option<FormOutcome>
    where
        F: FnOnce(&str, &Fields) -> Result<FormResponse, TransportError>,
    {
        let outcome = self.document.contact.submit(send)?;
        if outcome == FormOutcome::Sent {
            self.document
                .overlays
                .close_after(CONTACT_MODAL, CONTACT_CLOSE_DELAY, &mut self.timers);
        }
        Some(outcome)
    }

    pub fn observe(&mut self, id: impl Into<String>) {
        self.document.reveal.observe(id);
    }

    pub fn scrolled_into_view(&mut self, id: &str) -> bool {
        self.document.reveal.intersect(id)
    }
}
