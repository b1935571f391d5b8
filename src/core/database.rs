/// Synthetic categorical database: sampled columns, inverted indexes,
/// exact-match multi-attribute selection.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Gamma;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

use crate::core::stats::StatisticsTable;
use crate::core::vocab::{SlotVocabulary, VocabError};
use crate::schema::domain::DomainSpec;
use crate::schema::slot::{SlotSpec, ValueId};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("invalid Dirichlet prior for slot '{slot}': {reason}")]
    InvalidPrior { slot: String, reason: String },
    #[error("slot '{slot}' has {prior} prior weights for {values} values")]
    PriorLength {
        slot: String,
        prior: usize,
        values: usize,
    },
    #[error("relation record {row} has no value for slot '{slot}'")]
    MissingColumn { row: usize, slot: String },
    #[error("query has {got} terms but the table has {expected} searchable slots")]
    QueryArity { expected: usize, got: usize },
    #[error("relation has no rows")]
    EmptyTable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One record of an external relation, keyed by slot name.
pub type RelationRecord = serde_json::Map<String, serde_json::Value>;

/// One attribute column of the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub slot: String,
    /// Categorical distribution the values were drawn from (empirical
    /// frequencies for loaded columns). Sums to 1.
    pub distribution: Vec<f64>,
    pub values: Vec<ValueId>,
}

/// Value id → ascending row indices holding that value. The posting lists
/// of one column partition the row range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: Vec<Vec<usize>>,
}

impl InvertedIndex {
    pub fn build(values: &[ValueId], modality: usize) -> InvertedIndex {
        let width = values
            .iter()
            .map(|v| v.0 + 1)
            .max()
            .unwrap_or(0)
            .max(modality);
        let mut postings = vec![Vec::new(); width];
        for (row, value) in values.iter().enumerate() {
            postings[value.0].push(row);
        }
        InvertedIndex { postings }
    }

    /// Rows holding `id`; empty for ids the column never saw.
    pub fn rows(&self, id: ValueId) -> &[usize] {
        self.postings.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of value ids covered (including ones with no rows).
    pub fn modality(&self) -> usize {
        self.postings.len()
    }

    pub fn postings(&self) -> impl Iterator<Item = (ValueId, &[usize])> {
        self.postings
            .iter()
            .enumerate()
            .map(|(i, rows)| (ValueId(i), rows.as_slice()))
    }
}

/// A non-searchable row: the row identifier followed by system attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRow {
    pub uid: usize,
    pub values: Vec<ValueId>,
}

/// The result of `select`: matching system rows and their row indices,
/// both ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub rows: Vec<SystemRow>,
    pub indices: Vec<usize>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseSummary {
    pub rows: usize,
    pub unique_rows: usize,
    pub attributes: usize,
}

/// The in-memory relation: searchable columns with their indexes, a
/// parallel system table, and the precomputed statistics. Immutable once built.
#[derive(Debug, Clone)]
pub struct SyntheticDatabase {
    columns: Vec<Column>,
    indexes: Vec<InvertedIndex>,
    sys_columns: Vec<Column>,
    num_rows: usize,
    stats: StatisticsTable,
}

impl SyntheticDatabase {
    /// Sample a table of `num_rows` rows from the domain's Dirichlet priors.
    pub fn generate<R: Rng + ?Sized>(
        domain: &DomainSpec,
        vocab: &mut SlotVocabulary,
        num_rows: usize,
        rng: &mut R,
    ) -> Result<SyntheticDatabase, DatabaseError> {
        let columns = domain
            .usr_slots
            .iter()
            .map(|slot| {
                vocab.register(&slot.name, &slot.vocabulary);
                sample_column(slot, num_rows, rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::assemble(domain, vocab, columns, rng)
    }

    /// Build the searchable table from an external relation instead of
    /// sampling it. Unseen values extend the vocabulary.
    pub fn from_relation<R: Rng + ?Sized>(
        domain: &DomainSpec,
        vocab: &mut SlotVocabulary,
        records: &[RelationRecord],
        rng: &mut R,
    ) -> Result<SyntheticDatabase, DatabaseError> {
        if records.is_empty() {
            return Err(DatabaseError::EmptyTable);
        }

        let mut columns = Vec::with_capacity(domain.usr_slots.len());
        for slot in &domain.usr_slots {
            vocab.register(&slot.name, &slot.vocabulary);
            let mut values = Vec::with_capacity(records.len());
            for (row, record) in records.iter().enumerate() {
                let raw = record
                    .get(&slot.name)
                    .and_then(field_text)
                    .ok_or_else(|| DatabaseError::MissingColumn {
                        row,
                        slot: slot.name.clone(),
                    })?;
                values.push(vocab.get_id(&slot.name, &raw)?);
            }
            let distribution = empirical_distribution(&values, vocab.len(&slot.name));
            columns.push(Column {
                slot: slot.name.clone(),
                distribution,
                values,
            });
        }

        tracing::info!(
            rows = records.len(),
            domain = %domain.name,
            "loaded searchable table from relation"
        );

        Self::assemble(domain, vocab, columns, rng)
    }

    /// Read a JSON array of records.
    pub fn load_relation(path: &Path) -> Result<Vec<RelationRecord>, DatabaseError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn assemble<R: Rng + ?Sized>(
        domain: &DomainSpec,
        vocab: &mut SlotVocabulary,
        columns: Vec<Column>,
        rng: &mut R,
    ) -> Result<SyntheticDatabase, DatabaseError> {
        let num_rows = columns.first().map_or(0, |c| c.values.len());

        let indexes = columns
            .iter()
            .map(|c| InvertedIndex::build(&c.values, vocab.len(&c.slot)))
            .collect();

        let sys_columns = domain
            .sys_slots
            .iter()
            .map(|slot| {
                vocab.register(&slot.name, &slot.vocabulary);
                sample_column(slot, num_rows, rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let searchable: Vec<Vec<ValueId>> = columns.iter().map(|c| c.values.clone()).collect();
        let stats = StatisticsTable::compute(&searchable);

        let db = SyntheticDatabase {
            columns,
            indexes,
            sys_columns,
            num_rows,
            stats,
        };

        let summary = db.summary();
        tracing::info!(
            rows = summary.rows,
            unique = summary.unique_rows,
            attributes = summary.attributes,
            stat_rows = db.stats.len(),
            "database built"
        );

        Ok(db)
    }

    /// Rows matching every constrained term of `query` (one term per
    /// searchable slot, `None` = don't care). No match is an empty selection.
    pub fn select(&self, query: &[Option<ValueId>]) -> Result<Selection, DatabaseError> {
        if query.len() != self.columns.len() {
            return Err(DatabaseError::QueryArity {
                expected: self.columns.len(),
                got: query.len(),
            });
        }

        let mut valid: Option<Vec<usize>> = None;
        for (attr, term) in query.iter().enumerate() {
            let Some(id) = term else { continue };
            let postings = self.indexes[attr].rows(*id);
            let next = match valid {
                None => postings.to_vec(),
                Some(current) => intersect_sorted(&current, postings),
            };
            let exhausted = next.is_empty();
            valid = Some(next);
            if exhausted {
                break;
            }
        }

        let indices = valid.unwrap_or_else(|| (0..self.num_rows).collect());
        let rows = indices.iter().map(|&i| self.system_row(i)).collect();
        Ok(Selection { rows, indices })
    }

    pub fn system_row(&self, row: usize) -> SystemRow {
        SystemRow {
            uid: row,
            values: self.sys_columns.iter().map(|c| c.values[row]).collect(),
        }
    }

    pub fn searchable_row(&self, row: usize) -> Vec<ValueId> {
        self.columns.iter().map(|c| c.values[row]).collect()
    }

    /// Distinct searchable rows, ascending.
    pub fn unique_rows(&self) -> Vec<Vec<ValueId>> {
        let distinct: BTreeSet<Vec<ValueId>> =
            (0..self.num_rows).map(|r| self.searchable_row(r)).collect();
        distinct.into_iter().collect()
    }

    /// A distinct searchable row chosen uniformly; `None` for an empty table.
    pub fn sample_unique_row<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<ValueId>> {
        self.unique_rows().choose(rng).cloned()
    }

    pub fn summary(&self) -> DatabaseSummary {
        DatabaseSummary {
            rows: self.num_rows,
            unique_rows: self.unique_rows().len(),
            attributes: self.columns.len(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn sys_columns(&self) -> &[Column] {
        &self.sys_columns
    }

    pub fn index(&self, attr: usize) -> Option<&InvertedIndex> {
        self.indexes.get(attr)
    }

    pub fn stats(&self) -> &StatisticsTable {
        &self.stats
    }

    pub fn usr_slot_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.slot.as_str()).collect()
    }
}

/// Draw a column distribution from the slot's Dirichlet prior, then every
/// row's value from it.
fn sample_column<R: Rng + ?Sized>(
    slot: &SlotSpec,
    num_rows: usize,
    rng: &mut R,
) -> Result<Column, DatabaseError> {
    let prior = slot.prior();
    if prior.len() != slot.vocabulary.len() {
        return Err(DatabaseError::PriorLength {
            slot: slot.name.clone(),
            prior: prior.len(),
            values: slot.vocabulary.len(),
        });
    }

    let distribution = sample_dirichlet(&slot.name, &prior, rng)?;
    let weights = WeightedIndex::new(&distribution).map_err(|e| DatabaseError::InvalidPrior {
        slot: slot.name.clone(),
        reason: e.to_string(),
    })?;
    let values = (0..num_rows).map(|_| ValueId(weights.sample(rng))).collect();

    Ok(Column {
        slot: slot.name.clone(),
        distribution,
        values,
    })
}

/// Dirichlet draw as normalised Gamma(alpha, 1) draws.
fn sample_dirichlet<R: Rng + ?Sized>(
    slot: &str,
    alphas: &[f64],
    rng: &mut R,
) -> Result<Vec<f64>, DatabaseError> {
    if alphas.is_empty() {
        return Err(DatabaseError::InvalidPrior {
            slot: slot.to_string(),
            reason: "empty concentration vector".to_string(),
        });
    }

    let mut draws = Vec::with_capacity(alphas.len());
    for &alpha in alphas {
        let gamma = Gamma::new(alpha, 1.0).map_err(|e| DatabaseError::InvalidPrior {
            slot: slot.to_string(),
            reason: format!("alpha {}: {}", alpha, e),
        })?;
        draws.push(gamma.sample(rng));
    }

    let total: f64 = draws.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        // All draws underflowed; tiny alphas concentrate on one value anyway.
        let pick = rng.gen_range(0..alphas.len());
        return Ok((0..alphas.len())
            .map(|i| if i == pick { 1.0 } else { 0.0 })
            .collect());
    }
    Ok(draws.into_iter().map(|d| d / total).collect())
}

fn empirical_distribution(values: &[ValueId], modality: usize) -> Vec<f64> {
    let mut counts = vec![0usize; modality];
    for v in values {
        if v.0 >= counts.len() {
            counts.resize(v.0 + 1, 0);
        }
        counts[v.0] += 1;
    }
    let total = values.len().max(1) as f64;
    counts.into_iter().map(|c| c as f64 / total).collect()
}

fn field_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
