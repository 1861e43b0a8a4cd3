use crate::{errors::ListError, reference::Reference, types::Instance};

/// The set of references one production step needs resolved before it runs.
///
/// Owned jointly by an instantiator and the container during one resolution
/// pass and discarded afterwards. Slots keep insertion order and each slot
/// is written at most once.
#[derive(Debug, Clone, Default)]
pub struct DependencyList {
    slots: Vec<Slot>,
}

#[derive(Debug, Clone)]
struct Slot {
    reference: Reference,
    resolved: Option<Instance>,
}

impl DependencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference to resolve. Adding the same id twice is a no-op.
    pub fn add(&mut self, reference: Reference) {
        if !self.contains(reference.id()) {
            self.slots.push(Slot {
                reference,
                resolved: None,
            });
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slot(id).is_some()
    }

    pub fn is_resolved(&self, id: &str) -> bool {
        matches!(self.slot(id), Some(slot) if slot.resolved.is_some())
    }

    /// Writes a slot, failing on unknown ids and on second writes
    pub fn set_resolved(&mut self, id: &str, instance: Instance) -> Result<(), ListError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.reference.id() == id)
            .ok_or_else(|| ListError::UnknownDependency(id.to_string()))?;
        if slot.resolved.is_some() {
            return Err(ListError::AlreadyResolved(id.to_string()));
        }
        slot.resolved = Some(instance);
        Ok(())
    }

    /// Writes a slot if it exists and is still unset, reporting whether it
    /// was written. Used when a singleton result is offered to every frame
    /// that might be waiting on it.
    pub fn fill(&mut self, id: &str, instance: &Instance) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|slot| slot.reference.id() == id)
        {
            Some(slot) if slot.resolved.is_none() => {
                slot.resolved = Some(instance.clone());
                true
            }
            _ => false,
        }
    }

    /// True once every slot has a value
    pub fn is_fulfilled(&self) -> bool {
        self.slots.iter().all(|slot| slot.resolved.is_some())
    }

    pub fn resolved(&self, id: &str) -> Result<&Instance, ListError> {
        let slot = self
            .slot(id)
            .ok_or_else(|| ListError::UnknownDependency(id.to_string()))?;
        slot.resolved
            .as_ref()
            .ok_or_else(|| ListError::NotYetResolved(id.to_string()))
    }

    /// References whose slots are still unset, in insertion order
    pub fn unresolved(&self) -> impl Iterator<Item = &Reference> {
        self.slots
            .iter()
            .filter(|slot| slot.resolved.is_none())
            .map(|slot| &slot.reference)
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.slots.iter().map(|slot| &slot.reference)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.reference.id() == id)
    }
}
