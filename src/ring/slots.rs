/// Resolves slot ids to their "active" toggle.
pub trait SlotSurface {
    /// Sets the active flag of the element called `id`. Returns false when no such element exists.
    fn set_active(&mut self, id: &str, active: bool) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: String,
    pub active: bool,
}

/// The ring elements present on the page, in document order.
#[derive(Debug, Clone, Default)]
pub struct SlotSet {
    slots: Vec<Slot>,
    revision: u64,
}

impl SlotSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: ids
                .into_iter()
                .map(|id| Slot { id: id.into(), active: false })
                .collect(),
            revision: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.get(id).is_some_and(|slot| slot.active)
    }

    pub fn active_ids(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.active)
            .map(|slot| slot.id.as_str())
            .collect()
    }

    /// Bumped on every change of an active flag; renderers use it to skip unchanged frames.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl SlotSurface for SlotSet {
    fn set_active(&mut self, id: &str, active: bool) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) else {
            return false;
        };
        if slot.active != active {
            slot.active = active;
            self.revision += 1;
        }
        true
    }
}
