/// Slot vocabulary registry: bidirectional value ↔ id maps per slot.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::schema::slot::{SlotSpec, ValueId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabError {
    #[error("unknown slot: {0}")]
    UnknownSlot(String),
    #[error("slot '{slot}' has no value with id {id}")]
    UnknownId { slot: String, id: ValueId },
}

#[derive(Debug, Clone, Default)]
struct SlotEntry {
    /// Inverse map: id → value. Ids are the dense positions.
    values: Vec<String>,
    /// Forward map: value → id.
    ids: FxHashMap<String, ValueId>,
}

impl SlotEntry {
    fn intern(&mut self, value: &str) -> ValueId {
        if let Some(id) = self.ids.get(value) {
            return *id;
        }
        let id = ValueId(self.values.len());
        self.values.push(value.to_string());
        self.ids.insert(value.to_string(), id);
        id
    }
}

/// Registry of every slot's vocabulary. Grows monotonically: looking up an
/// unseen value allocates the next id, nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct SlotVocabulary {
    slots: FxHashMap<String, SlotEntry>,
}

impl SlotVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry from slot declarations, ids following vocabulary order.
    pub fn from_slots<'a>(slots: impl IntoIterator<Item = &'a SlotSpec>) -> Self {
        let mut vocab = Self::new();
        for slot in slots {
            vocab.register(&slot.name, &slot.vocabulary);
        }
        vocab
    }

    /// Register a slot (if new) and intern its values in order. Duplicate
    /// values keep their first id.
    pub fn register(&mut self, slot: &str, values: &[String]) {
        let entry = self.slots.entry(slot.to_string()).or_default();
        for value in values {
            entry.intern(value);
        }
    }

    /// The id for `value`, allocating one if the value is unseen.
    pub fn get_id(&mut self, slot: &str, value: &str) -> Result<ValueId, VocabError> {
        self.slots
            .get_mut(slot)
            .map(|entry| entry.intern(value))
            .ok_or_else(|| VocabError::UnknownSlot(slot.to_string()))
    }

    /// The id for `value` without growing the vocabulary.
    pub fn lookup_id(&self, slot: &str, value: &str) -> Option<ValueId> {
        self.slots.get(slot)?.ids.get(value).copied()
    }

    pub fn get_value(&self, slot: &str, id: ValueId) -> Result<&str, VocabError> {
        let entry = self
            .slots
            .get(slot)
            .ok_or_else(|| VocabError::UnknownSlot(slot.to_string()))?;
        entry
            .values
            .get(id.0)
            .map(String::as_str)
            .ok_or_else(|| VocabError::UnknownId {
                slot: slot.to_string(),
                id,
            })
    }

    /// Number of values allocated for `slot` (0 for unknown slots).
    pub fn len(&self, slot: &str) -> usize {
        self.slots.get(slot).map_or(0, |e| e.values.len())
    }

    pub fn values(&self, slot: &str) -> Option<&[String]> {
        self.slots.get(slot).map(|e| e.values.as_slice())
    }
}
