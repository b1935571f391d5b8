/// Advice template selection: turns ranked advice into an advisory clause.

use std::collections::BTreeMap;

use crate::core::stats::StatRow;
use crate::core::templates::{AttrSet, TemplateError, TemplateKey, TemplateTable};
use crate::core::vocab::SlotVocabulary;
use crate::schema::belief::BeliefState;
use crate::schema::slot::ValueId;

/// Slot name → value the advice volunteered, so the other agent need not ask.
pub type Suggestion = BTreeMap<String, ValueId>;

/// The advisory clause for one turn. Empty text means no advice was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdviceClause {
    pub text: String,
    pub key: Option<TemplateKey>,
    pub variant: Option<usize>,
    pub suggestion: Suggestion,
}

impl AdviceClause {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// How placeholder values are picked from the chosen advice rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    /// First row with a value wins.
    Precedence,
    /// The n-th occurrence of a conveyed placeholder reads the n-th row.
    Contrast,
}

pub struct AdviceTemplateSelector<'a> {
    templates: &'a TemplateTable,
    vocab: &'a SlotVocabulary,
    enabled: bool,
}

impl<'a> AdviceTemplateSelector<'a> {
    pub fn new(templates: &'a TemplateTable, vocab: &'a SlotVocabulary) -> Self {
        Self {
            templates,
            vocab,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Choose and fill an advice phrasing.
    ///
    /// `requested` is a searchable attribute the system just asked about;
    /// with nothing given yet it narrows the candidates to rows fixing it.
    pub fn select(
        &self,
        belief: &BeliefState,
        advice: &[StatRow],
        requested: Option<usize>,
    ) -> Result<AdviceClause, TemplateError> {
        if !self.enabled || advice.is_empty() {
            return Ok(AdviceClause::default());
        }

        let given: AttrSet = belief.given().into_iter().collect();
        let pool: Vec<&StatRow> = match requested {
            Some(attr) if given.is_empty() => {
                advice.iter().filter(|row| row.get(attr).is_some()).collect()
            }
            _ => advice.iter().collect(),
        };
        if pool.is_empty() {
            tracing::warn!(?requested, "no advice fixes the requested attribute");
            return Ok(AdviceClause::default());
        }

        let (rows, variant, fill) = match pool.as_slice() {
            [only] => (vec![*only], 0, Fill::Precedence),
            [first, second, ..] => {
                let rows = vec![*first, *second];
                if first.count == second.count {
                    (rows, 0, Fill::Precedence)
                } else {
                    (rows, 1, Fill::Contrast)
                }
            }
            [] => return Ok(AdviceClause::default()),
        };

        let conveyed = rows
            .iter()
            .fold(AttrSet::empty(), |acc, row| acc.union(self.fixed_by(row, given)));
        if conveyed.is_empty() {
            return Ok(AdviceClause::default());
        }
        // Contrast phrasing only makes sense for a single attribute.
        let fill = if fill == Fill::Contrast && conveyed.len() > 1 {
            Fill::Precedence
        } else {
            fill
        };

        let key = TemplateKey::new(given, conveyed);
        let phrasing = self.templates.phrasing(&key, variant)?;
        let slots = self.templates.slots();

        tracing::debug!(
            key = %key.label(slots),
            variant,
            candidates = pool.len(),
            "advice template selected"
        );

        let text = phrasing.render(|attr, occurrence| {
            let value = self
                .pick(&rows, attr, occurrence, fill, conveyed)
                .or_else(|| belief.get(attr));
            let slot = slot_name(slots, attr)?;
            let value = value.ok_or_else(|| TemplateError::MissingValue(slot.to_string()))?;
            Ok(self.vocab.get_value(slot, value)?.to_string())
        })?;

        let mut suggestion = Suggestion::new();
        for attr in conveyed.iter() {
            if let Some(value) = rows.iter().find_map(|row| row.get(attr)) {
                suggestion.insert(slot_name(slots, attr)?.to_string(), value);
            }
        }

        Ok(AdviceClause {
            text,
            key: Some(key),
            variant: Some(variant),
            suggestion,
        })
    }

    /// Attributes `row` commits to beyond what is already given.
    fn fixed_by(&self, row: &StatRow, given: AttrSet) -> AttrSet {
        (0..row.values.len())
            .filter(|&attr| row.get(attr).is_some() && !given.contains(attr))
            .collect()
    }

    fn pick(
        &self,
        rows: &[&StatRow],
        attr: usize,
        occurrence: usize,
        fill: Fill,
        conveyed: AttrSet,
    ) -> Option<ValueId> {
        if fill == Fill::Contrast && conveyed.contains(attr) {
            let row = rows.get(occurrence.min(rows.len() - 1))?;
            if let Some(value) = row.get(attr) {
                return Some(value);
            }
        }
        rows.iter().find_map(|row| row.get(attr))
    }
}

fn slot_name(slots: &[String], attr: usize) -> Result<&str, TemplateError> {
    slots
        .get(attr)
        .map(String::as_str)
        .ok_or_else(|| TemplateError::UnknownAttribute(format!("#{}", attr)))
}
