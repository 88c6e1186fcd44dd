use std::collections::BTreeMap;

use tracing::trace;

/// Fade-in on scroll: an observed element turns visible the first time it
/// enters the viewport and stays that way.
#[derive(Debug, Default)]
pub struct Reveal {
    observed: BTreeMap<String, bool>,
}

impl Reveal {
    pub fn observe(&mut self, id: impl Into<String>) {
        self.observed.entry(id.into()).or_insert(false);
    }

    /// Returns true only when this call revealed the element.
    pub fn intersect(&mut self, id: &str) -> bool {
        match self.observed.get_mut(id) {
            Some(visible) if !*visible => {
                *visible = true;
                trace!(element = id, "revealed");
                true
            }
            _ => false,
        }
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.observed.get(id).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.observed.values().filter(|visible| **visible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_once() {
        let mut reveal = Reveal::default();
        reveal.observe("pricing");
        assert!(!reveal.is_visible("pricing"));

        assert!(reveal.intersect("pricing"));
        assert!(!reveal.intersect("pricing"));
        assert!(reveal.is_visible("pricing"));
        assert_eq!(reveal.visible_count(), 1);
    }

    #[test]
    fn unobserved_elements_stay_hidden() {
        let mut reveal = Reveal::default();
        assert!(!reveal.intersect("footer"));
        assert!(!reveal.is_visible("footer"));
    }

    #[test]
    fn observing_again_keeps_the_revealed_state() {
        let mut reveal = Reveal::default();
        reveal.observe("hero");
        reveal.intersect("hero");
        reveal.observe("hero");
        assert!(reveal.is_visible("hero"));
    }
}
