use serde::{Deserialize, Serialize};

use super::slot::ValueId;

/// What the dialogue has established so far: one entry per searchable
/// slot, in domain order, either a known value or unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeliefState {
    values: Vec<Option<ValueId>>,
}

impl BeliefState {
    /// A belief state with every slot unconstrained.
    pub fn unconstrained(num_slots: usize) -> Self {
        Self {
            values: vec![None; num_slots],
        }
    }

    pub fn from_values(values: Vec<Option<ValueId>>) -> Self {
        Self { values }
    }

    pub fn with(mut self, slot: usize, value: ValueId) -> Self {
        self.set(slot, Some(value));
        self
    }

    /// Set or clear one slot. Slots past the end are appended as unconstrained.
    pub fn set(&mut self, slot: usize, value: Option<ValueId>) {
        if slot >= self.values.len() {
            self.values.resize(slot + 1, None);
        }
        self.values[slot] = value;
    }

    pub fn get(&self, slot: usize) -> Option<ValueId> {
        self.values.get(slot).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<ValueId>] {
        &self.values
    }

    /// Indices of the slots with a known value ("given" slots).
    pub fn given(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect()
    }

    pub fn has_constraints(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}
