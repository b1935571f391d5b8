/// Advice engine: ranks attribute combinations worth suggesting next.

use crate::core::stats::{StatRow, StatisticsTable};
use crate::schema::belief::BeliefState;

/// How many suggestions a single advice request returns at most.
pub const DEFAULT_ADVICE_LIMIT: usize = 6;

/// Reads the statistics table to propose concrete values for the slots a
/// belief state leaves open.
#[derive(Debug, Clone, Copy)]
pub struct AdviceEngine<'a> {
    stats: &'a StatisticsTable,
    limit: usize,
}

impl<'a> AdviceEngine<'a> {
    pub fn new(stats: &'a StatisticsTable) -> Self {
        Self {
            stats,
            limit: DEFAULT_ADVICE_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Statistics rows consistent with `belief`, best supported first.
    ///
    /// Known slots must match exactly. Once anything is known, open slots
    /// must be fixed by the row too, so advice always proposes values
    /// instead of restating marginals. With nothing known every row is
    /// eligible. Ties on count break on the attribute values, ascending.
    pub fn get_advice(&self, belief: &BeliefState) -> Vec<StatRow> {
        let constrained = belief.has_constraints();
        let num_attributes = self.stats.num_attributes();

        let mut advice: Vec<StatRow> = self
            .stats
            .rows()
            .iter()
            .filter(|row| {
                (0..num_attributes).all(|attr| match belief.get(attr) {
                    Some(value) => row.get(attr) == Some(value),
                    None => !constrained || row.get(attr).is_some(),
                })
            })
            .cloned()
            .collect();

        advice.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.values.cmp(&b.values)));
        advice.truncate(self.limit);

        tracing::debug!(
            given = ?belief.given(),
            candidates = advice.len(),
            "advice computed"
        );
        advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::slot::ValueId;

    fn ids(raw: &[usize]) -> Vec<ValueId> {
        raw.iter().copied().map(ValueId).collect()
    }

    fn stats() -> StatisticsTable {
        // food, area, pricerange
        StatisticsTable::compute(&[
            ids(&[0, 0, 0, 1, 1, 2, 0, 0]),
            ids(&[1, 1, 0, 1, 2, 2, 1, 1]),
            ids(&[2, 2, 2, 0, 0, 1, 0, 2]),
        ])
    }

    #[test]
    fn known_values_are_matched_and_open_ones_filled() {
        let stats = stats();
        let engine = AdviceEngine::new(&stats);
        let belief = BeliefState::unconstrained(3).with(0, ValueId(0));
        let advice = engine.get_advice(&belief);
        assert!(!advice.is_empty());
        for row in &advice {
            assert_eq!(row.get(0), Some(ValueId(0)));
            assert!(row.get(1).is_some());
            assert!(row.get(2).is_some());
        }
        // (0, 1, 2) appears three times
        assert_eq!(advice[0].values, vec![Some(ValueId(0)), Some(ValueId(1)), Some(ValueId(2))]);
        assert_eq!(advice[0].count, 3);
    }

    #[test]
    fn unconstrained_belief_admits_marginals() {
        let stats = stats();
        let advice = AdviceEngine::new(&stats).get_advice(&BeliefState::unconstrained(3));
        assert_eq!(advice.len(), DEFAULT_ADVICE_LIMIT);
        // area=1 and food=0 both cover five rows; unconstrained food sorts first
        assert_eq!(advice[0].values, vec![None, Some(ValueId(1)), None]);
        assert_eq!(advice[0].count, 5);
        assert_eq!(advice[1].values, vec![Some(ValueId(0)), None, None]);
        assert_eq!(advice[1].count, 5);
    }

    #[test]
    fn sorted_and_bounded() {
        let stats = stats();
        let engine = AdviceEngine::new(&stats);
        for belief in [
            BeliefState::unconstrained(3),
            BeliefState::unconstrained(3).with(1, ValueId(1)),
            BeliefState::unconstrained(3).with(2, ValueId(0)),
        ] {
            let advice = engine.get_advice(&belief);
            assert!(advice.len() <= DEFAULT_ADVICE_LIMIT);
            assert!(advice.windows(2).all(|w| w[0].count >= w[1].count));
        }
    }

    #[test]
    fn ties_break_on_values() {
        let stats = stats();
        let advice = AdviceEngine::new(&stats).get_advice(&BeliefState::unconstrained(3));
        for pair in advice.windows(2) {
            if pair[0].count == pair[1].count {
                assert!(pair[0].values < pair[1].values);
            }
        }
    }

    #[test]
    fn impossible_belief_has_no_advice() {
        let stats = stats();
        let belief = BeliefState::unconstrained(3).with(0, ValueId(2)).with(1, ValueId(0));
        assert!(AdviceEngine::new(&stats).get_advice(&belief).is_empty());
    }

    #[test]
    fn custom_limit() {
        let stats = stats();
        let advice = AdviceEngine::new(&stats)
            .with_limit(2)
            .get_advice(&BeliefState::unconstrained(3));
        assert_eq!(advice.len(), 2);
    }
}
