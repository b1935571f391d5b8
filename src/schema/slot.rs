use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Newtype wrapper for a slot value id: a dense index into one slot's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueId(pub usize);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder substituted with the lexical value in inform phrases.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Surface phrases a slot offers to the act renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotPhrases {
    /// Inform phrasings containing a `{value}` placeholder.
    #[serde(default)]
    pub inform: Vec<String>,
    #[serde(default)]
    pub request: Vec<String>,
    /// Yes/no questions keyed by the value being asked about.
    #[serde(default)]
    pub yn_question: HashMap<String, Vec<String>>,
}

/// A categorical attribute of the domain, as declared by the domain specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub vocabulary: Vec<String>,
    /// Dirichlet concentration parameters, one per vocabulary entry.
    /// Empty means the uniform prior.
    #[serde(default)]
    pub dirichlet_prior: Vec<f64>,
    #[serde(default)]
    pub phrases: SlotPhrases,
}

impl SlotSpec {
    /// The concentration vector used to draw this slot's column distribution.
    pub fn prior(&self) -> Vec<f64> {
        if self.dirichlet_prior.is_empty() {
            vec![1.0; self.vocabulary.len()]
        } else {
            self.dirichlet_prior.clone()
        }
    }

    pub fn sample_inform<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.phrases.inform.choose(rng).map(String::as_str)
    }

    pub fn sample_request<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.phrases.request.choose(rng).map(String::as_str)
    }

    /// Sample a yes/no question about `expected`. Falls back to a generic
    /// question when the slot has no phrasing for that value.
    pub fn sample_yn_question<R: Rng + ?Sized>(&self, rng: &mut R, expected: &str) -> String {
        match self
            .phrases
            .yn_question
            .get(expected)
            .and_then(|qs| qs.choose(rng))
        {
            Some(q) => q.clone(),
            None => format!("Is it {}?", expected),
        }
    }

    /// Sample a value different from `value`.
    ///
    /// With no value given, any vocabulary entry may come back. Returns
    /// `None` ("don't care") when the vocabulary has nothing else to offer.
    pub fn sample_different<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        value: Option<ValueId>,
    ) -> Option<ValueId> {
        let candidates: Vec<ValueId> = (0..self.vocabulary.len())
            .map(ValueId)
            .filter(|id| Some(*id) != value)
            .collect();
        candidates.choose(rng).copied()
    }
}
