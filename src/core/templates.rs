/// Advice template table: typed combinatorial keys, placeholder phrasings,
/// RON loading, and coverage checks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::vocab::VocabError;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Placeholder(String),
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("bad template key '{key}': {reason}")]
    BadKey { key: String, reason: String },
    #[error("template key '{0}' defined twice")]
    DuplicateKey(String),
    #[error("no phrasing {variant} for template key '{key}'")]
    MissingTemplate { key: String, variant: usize },
    #[error("no value for attribute '{0}' in the chosen advice")]
    MissingValue(String),
    #[error("vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A set of searchable attribute positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AttrSet(u32);

impl AttrSet {
    /// Largest attribute count a set can address.
    pub const CAPACITY: usize = 32;

    pub fn empty() -> Self {
        Self(0)
    }

    /// Every attribute in `0..n`.
    pub fn full(n: usize) -> Self {
        (0..n.min(Self::CAPACITY)).collect()
    }

    pub fn insert(&mut self, attr: usize) {
        if attr < Self::CAPACITY {
            self.0 |= 1 << attr;
        }
    }

    pub fn contains(&self, attr: usize) -> bool {
        attr < Self::CAPACITY && self.0 & (1 << attr) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: AttrSet) -> AttrSet {
        AttrSet(self.0 | other.0)
    }

    pub fn difference(self, other: AttrSet) -> AttrSet {
        AttrSet(self.0 & !other.0)
    }

    pub fn is_disjoint(&self, other: &AttrSet) -> bool {
        self.0 & other.0 == 0
    }

    /// Ascending attribute positions.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::CAPACITY).filter(move |a| self.contains(*a))
    }
}

impl FromIterator<usize> for AttrSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = AttrSet::empty();
        for attr in iter {
            set.insert(attr);
        }
        set
    }
}

/// Which attributes the dialogue already knows (`given`) and which the
/// advice newly commits to (`conveyed`). Order within a side is irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateKey {
    pub given: AttrSet,
    pub conveyed: AttrSet,
}

impl TemplateKey {
    pub fn new(given: AttrSet, conveyed: AttrSet) -> Self {
        Self { given, conveyed }
    }

    /// Parse a label such as `food:area_pricerange` or `:area` against the
    /// domain's searchable slot names.
    pub fn parse(label: &str, slots: &[String]) -> Result<TemplateKey, TemplateError> {
        let bad = |reason: &str| TemplateError::BadKey {
            key: label.to_string(),
            reason: reason.to_string(),
        };

        let (given, conveyed) = label.split_once(':').ok_or_else(|| bad("missing ':'"))?;
        let given = parse_side(given, slots).map_err(|reason| bad(&reason))?;
        let conveyed = parse_side(conveyed, slots).map_err(|reason| bad(&reason))?;

        if conveyed.is_empty() {
            return Err(bad("nothing conveyed"));
        }
        if !given.is_disjoint(&conveyed) {
            return Err(bad("attribute both given and conveyed"));
        }
        Ok(TemplateKey { given, conveyed })
    }

    /// Canonical label, names in slot order.
    pub fn label(&self, slots: &[String]) -> String {
        let side = |set: &AttrSet| {
            set.iter()
                .filter_map(|a| slots.get(a).map(String::as_str))
                .collect::<Vec<_>>()
                .join("_")
        };
        format!("{}:{}", side(&self.given), side(&self.conveyed))
    }

    /// Attributes a phrasing under this key may mention.
    pub fn mentionable(&self) -> AttrSet {
        self.given.union(self.conveyed)
    }
}

/// Longest-match split of `a_b_c` into slot names, so slot names may
/// themselves contain underscores.
fn parse_side(side: &str, slots: &[String]) -> Result<AttrSet, String> {
    let mut set = AttrSet::empty();
    let mut rest = side;
    while !rest.is_empty() {
        let matched = slots
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                rest.starts_with(name.as_str())
                    && (rest.len() == name.len() || rest[name.len()..].starts_with('_'))
            })
            .max_by_key(|(_, name)| name.len());

        let Some((attr, name)) = matched else {
            return Err(format!("unknown attribute in '{}'", rest));
        };
        if attr >= AttrSet::CAPACITY {
            return Err(format!("attribute '{}' out of range", name));
        }
        if set.contains(attr) {
            return Err(format!("attribute '{}' repeated", name));
        }
        set.insert(attr);
        rest = rest[name.len()..].trim_start_matches('_');
    }
    Ok(set)
}

/// A piece of a phrasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhraseToken {
    Literal(String),
    /// `<SLOT>`: replaced with the value of that searchable attribute.
    Placeholder(usize),
}

/// One phrasing variant: literal text with embedded `<SLOT>` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrasing {
    pub tokens: Vec<PhraseToken>,
}

impl Phrasing {
    /// Parse `All <FOOD> restaurants are in the <AREA>.` Placeholder names
    /// are the uppercased slot names.
    pub fn parse(input: &str, slots: &[String]) -> Result<Phrasing, TemplateError> {
        let mut tokens = Vec::new();
        let mut rest = input;

        while let Some(open) = rest.find('<') {
            if open > 0 {
                tokens.push(PhraseToken::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('>').ok_or_else(|| {
                TemplateError::Placeholder(format!("unclosed '<' in \"{}\"", input))
            })?;
            let name = &after[..close];
            if name.is_empty() {
                return Err(TemplateError::Placeholder(format!(
                    "empty placeholder in \"{}\"",
                    input
                )));
            }
            let attr = slots
                .iter()
                .position(|s| s.to_uppercase() == name)
                .ok_or_else(|| TemplateError::UnknownAttribute(name.to_string()))?;
            tokens.push(PhraseToken::Placeholder(attr));
            rest = &after[close + 1..];
        }

        if rest.contains('>') {
            return Err(TemplateError::Placeholder(format!(
                "unmatched '>' in \"{}\"",
                input
            )));
        }
        if !rest.is_empty() {
            tokens.push(PhraseToken::Literal(rest.to_string()));
        }

        Ok(Phrasing { tokens })
    }

    /// Attributes referenced by placeholders.
    pub fn placeholders(&self) -> AttrSet {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                PhraseToken::Placeholder(attr) => Some(*attr),
                PhraseToken::Literal(_) => None,
            })
            .collect()
    }

    /// How many times `attr` is mentioned.
    pub fn occurrences(&self, attr: usize) -> usize {
        self.tokens
            .iter()
            .filter(|t| **t == PhraseToken::Placeholder(attr))
            .count()
    }

    /// Substitute placeholders. `fill` receives the attribute and how many
    /// times that attribute has already been filled in this phrasing.
    pub fn render<F>(&self, mut fill: F) -> Result<String, TemplateError>
    where
        F: FnMut(usize, usize) -> Result<String, TemplateError>,
    {
        let mut out = String::new();
        let mut seen: HashMap<usize, usize> = HashMap::new();
        for token in &self.tokens {
            match token {
                PhraseToken::Literal(text) => out.push_str(text),
                PhraseToken::Placeholder(attr) => {
                    let occurrence = seen.entry(*attr).or_insert(0);
                    out.push_str(&fill(*attr, *occurrence)?);
                    *occurrence += 1;
                }
            }
        }
        Ok(out)
    }
}

/// Phrasing variants per template key. Variant 0 states a single or
/// coordinated suggestion, variant 1 contrasts two differently supported ones.
#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    slots: Vec<String>,
    entries: HashMap<TemplateKey, Vec<Phrasing>>,
}

impl TemplateTable {
    pub fn new(slots: Vec<String>) -> Self {
        Self {
            slots,
            entries: HashMap::new(),
        }
    }

    /// Load a template table from a RON file.
    pub fn load_from_ron(path: &Path, slots: &[String]) -> Result<TemplateTable, TemplateError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents, slots)
    }

    /// Parse a RON map of key label → list of phrasings.
    pub fn parse_ron(input: &str, slots: &[String]) -> Result<TemplateTable, TemplateError> {
        let raw: HashMap<String, Vec<String>> = ron::from_str(input)?;
        let mut table = TemplateTable::new(slots.to_vec());

        for (label, texts) in raw {
            let key = TemplateKey::parse(&label, slots)?;
            if table.entries.contains_key(&key) {
                return Err(TemplateError::DuplicateKey(key.label(slots)));
            }
            let mut phrasings = Vec::with_capacity(texts.len());
            for text in &texts {
                let phrasing = Phrasing::parse(text, slots)?;
                let stray = phrasing.placeholders().difference(key.mentionable());
                if !stray.is_empty() {
                    return Err(TemplateError::Placeholder(format!(
                        "\"{}\" under '{}' mentions attributes outside its key",
                        text, label
                    )));
                }
                phrasings.push(phrasing);
            }
            table.entries.insert(key, phrasings);
        }

        Ok(table)
    }

    /// Merge another table into this one. Keys from `other` override keys
    /// in `self`.
    pub fn merge(&mut self, other: TemplateTable) {
        if self.slots.is_empty() {
            self.slots = other.slots;
        }
        for (key, phrasings) in other.entries {
            self.entries.insert(key, phrasings);
        }
    }

    pub fn insert(&mut self, key: TemplateKey, phrasings: Vec<Phrasing>) {
        self.entries.insert(key, phrasings);
    }

    pub fn get(&self, key: &TemplateKey) -> Option<&[Phrasing]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The phrasing at `variant`, or a `MissingTemplate` error.
    pub fn phrasing(&self, key: &TemplateKey, variant: usize) -> Result<&Phrasing, TemplateError> {
        self.get(key)
            .and_then(|p| p.get(variant))
            .ok_or_else(|| TemplateError::MissingTemplate {
                key: key.label(&self.slots),
                variant,
            })
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, variant)` pairs the selector can ask for that this table lacks.
    pub fn missing(&self) -> Vec<(TemplateKey, usize)> {
        let mut missing = Vec::new();
        for key in reachable_keys(self.slots.len()) {
            let have = self.get(&key).map_or(0, <[Phrasing]>::len);
            for variant in have..REQUIRED_VARIANTS {
                missing.push((key, variant));
            }
        }
        missing
    }
}

/// Every key needs a coordinated (0) and a contrastive (1) phrasing.
pub const REQUIRED_VARIANTS: usize = 2;

/// Keys the advice selector can construct for `n` searchable attributes.
///
/// With nothing given, any non-empty set can be conveyed. Once something is
/// given, advice rows fix every open attribute, so only the complement is
/// conveyed.
pub fn reachable_keys(n: usize) -> Vec<TemplateKey> {
    let n = n.min(AttrSet::CAPACITY);
    let all = AttrSet::full(n);
    let mut keys = Vec::new();
    for mask in 1u64..(1u64 << n) {
        let subset: AttrSet = (0..n).filter(|a| mask & (1 << a) != 0).collect();
        keys.push(TemplateKey::new(AttrSet::empty(), subset));
        let complement = all.difference(subset);
        if !complement.is_empty() {
            keys.push(TemplateKey::new(subset, complement));
        }
    }
    keys.sort();
    keys
}
