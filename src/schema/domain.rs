/// Domain specification: the slots a simulated domain is made of.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::slot::SlotSpec;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid domain: {0}")]
    Invalid(String),
}

/// A domain: searchable (user) slots, non-searchable (system) slots, and
/// the size of the table to synthesize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    /// Greeting used for the system's greet act, when set.
    #[serde(default)]
    pub greet: Option<String>,
    pub usr_slots: Vec<SlotSpec>,
    #[serde(default)]
    pub sys_slots: Vec<SlotSpec>,
    #[serde(default = "default_db_size")]
    pub db_size: usize,
}

fn default_db_size() -> usize {
    200
}

impl DomainSpec {
    /// Load a domain specification from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<DomainSpec, DomainError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a domain specification from a RON string.
    pub fn parse_ron(input: &str) -> Result<DomainSpec, DomainError> {
        let spec: DomainSpec = ron::from_str(input)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.usr_slots.is_empty() {
            return Err(DomainError::Invalid(format!(
                "domain '{}' declares no searchable slots",
                self.name
            )));
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for slot in self.usr_slots.iter().chain(&self.sys_slots) {
            if !seen.insert(slot.name.as_str()) {
                return Err(DomainError::Invalid(format!(
                    "slot '{}' declared twice",
                    slot.name
                )));
            }
            if slot.vocabulary.is_empty() {
                return Err(DomainError::Invalid(format!(
                    "slot '{}' has an empty vocabulary",
                    slot.name
                )));
            }
            let mut values = rustc_hash::FxHashSet::default();
            if let Some(repeated) = slot.vocabulary.iter().find(|v| !values.insert(v.as_str())) {
                return Err(DomainError::Invalid(format!(
                    "slot '{}' lists value '{}' more than once",
                    slot.name, repeated
                )));
            }
            if !slot.dirichlet_prior.is_empty()
                && slot.dirichlet_prior.len() != slot.vocabulary.len()
            {
                return Err(DomainError::Invalid(format!(
                    "slot '{}' has {} prior weights for {} values",
                    slot.name,
                    slot.dirichlet_prior.len(),
                    slot.vocabulary.len()
                )));
            }
        }
        Ok(())
    }

    pub fn usr_slot(&self, name: &str) -> Option<&SlotSpec> {
        self.usr_slots.iter().find(|s| s.name == name)
    }

    pub fn sys_slot(&self, name: &str) -> Option<&SlotSpec> {
        self.sys_slots.iter().find(|s| s.name == name)
    }

    /// Position of a searchable slot in query and statistics order.
    pub fn usr_slot_index(&self, name: &str) -> Option<usize> {
        self.usr_slots.iter().position(|s| s.name == name)
    }

    pub fn usr_slot_names(&self) -> Vec<String> {
        self.usr_slots.iter().map(|s| s.name.clone()).collect()
    }
}
