/// Frequency statistics over attribute-value combinations of the searchable table.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::schema::belief::BeliefState;
use crate::schema::slot::ValueId;

/// Largest combination size the table enumerates.
pub const MAX_ARITY: usize = 3;

/// How many rows carry a given combination of fixed attribute values.
/// `None` marks an attribute left unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatRow {
    pub values: Vec<Option<ValueId>>,
    pub count: usize,
}

impl StatRow {
    pub fn get(&self, attr: usize) -> Option<ValueId> {
        self.values.get(attr).copied().flatten()
    }

    /// Number of attributes this row fixes.
    pub fn arity(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// True when every known attribute of `belief` is fixed to the same value here.
    pub fn agrees_with(&self, belief: &BeliefState) -> bool {
        belief
            .given()
            .into_iter()
            .all(|attr| self.get(attr) == belief.get(attr))
    }
}

/// Counts for every observed 1-, 2- and 3-way combination of searchable
/// values. Built once from the table and never mutated.
///
/// Row order: all single-attribute marginals, then pairs grouped by their
/// first attribute, then triples; within one attribute subset, combinations
/// ascend by value id. Only combinations with a positive count exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsTable {
    num_attributes: usize,
    rows: Vec<StatRow>,
}

impl StatisticsTable {
    /// Compute the table from column-major searchable data.
    pub fn compute(columns: &[Vec<ValueId>]) -> StatisticsTable {
        let num_attributes = columns.len();
        let num_rows = columns.first().map_or(0, Vec::len);
        let mut rows = Vec::new();

        for arity in 1..=num_attributes.min(MAX_ARITY) {
            for subset in combinations(num_attributes, arity) {
                let mut counts: FxHashMap<Vec<ValueId>, usize> = FxHashMap::default();
                for row in 0..num_rows {
                    let key: Vec<ValueId> = subset.iter().map(|&a| columns[a][row]).collect();
                    *counts.entry(key).or_insert(0) += 1;
                }

                let mut observed: Vec<(Vec<ValueId>, usize)> = counts.into_iter().collect();
                observed.sort();
                for (key, count) in observed {
                    let mut values = vec![None; num_attributes];
                    for (&attr, id) in subset.iter().zip(key) {
                        values[attr] = Some(id);
                    }
                    rows.push(StatRow { values, count });
                }
            }
        }

        tracing::debug!(
            attributes = num_attributes,
            rows = rows.len(),
            "statistics table computed"
        );

        StatisticsTable {
            num_attributes,
            rows,
        }
    }

    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    pub fn num_attributes(&self) -> usize {
        self.num_attributes
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count recorded for an exact combination, if observed.
    pub fn count_of(&self, values: &[Option<ValueId>]) -> Option<usize> {
        self.rows
            .iter()
            .find(|r| r.values == values)
            .map(|r| r.count)
    }
}

/// All `k`-element subsets of `0..n`, lexicographic.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, k: usize, acc: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if acc.len() == k {
            out.push(acc.clone());
            return;
        }
        for i in start..n {
            acc.push(i);
            extend(i + 1, n, k, acc, out);
            acc.pop();
        }
    }

    let mut out = Vec::new();
    extend(0, n, k, &mut Vec::with_capacity(k), &mut out);
    out
}
