use super::Translator;
use crate::{tables::HmmTables, Word};
use ::core::cmp::Ordering;
use ahash::AHashMap;

/// Viterbi decoder over the hidden-state sequence model: forward
/// dynamic programming with backpointers, sparse per-step cell maps.
#[derive(Clone, Debug)]
pub struct HmmDecoder<'m> {
    tables: &'m HmmTables,
}

/// One materialized cell of the Viterbi matrix. Cells exist only for
/// states with evidence at their time step; absence means "no path".
#[derive(Clone, Debug)]
struct Cell {
    score: f64,
    backpointer: Option<Word>,
}

impl<'m> HmmDecoder<'m> {
    #[inline]
    pub fn new(tables: &'m HmmTables) -> Self {
        Self { tables }
    }

    /// Most probable state sequence for the observations, empty when no
    /// state path is reachable.
    #[inline]
    pub fn decode(&self, observations: &[Word]) -> Vec<Word> {
        self.decode_scored(observations)
            .map(|(states, _)| states)
            .unwrap_or_default()
    }

    /// As [`Self::decode`], also exposing the accumulated log-score of
    /// the returned path.
    pub fn decode_scored(&self, observations: &[Word]) -> Option<(Vec<Word>, f64)> {
        if observations.is_empty() {
            return None;
        }

        let mut steps: Vec<AHashMap<Word, Cell>> = Vec::with_capacity(observations.len());
        steps.push(self.initial_step(&observations[0]));

        for observation in &observations[1..] {
            let mut cells = AHashMap::new();
            if let Some(previous) = steps.last() {
                // an empty previous step propagates "no path" forward
                if !previous.is_empty() {
                    self.forward_step(previous, observation, &mut cells);
                }
            }
            steps.push(cells);
        }

        // highest-scoring final cell; ties resolve to the
        // lexicographically smallest state
        let last = steps.last()?;
        let (final_state, final_cell) = last.iter().max_by(|(state1, cell1), (state2, cell2)| {
            cell1
                .score
                .total_cmp(&cell2.score)
                .then_with(|| state2.cmp(state1))
        })?;
        let score = final_cell.score;

        let mut path = Vec::with_capacity(observations.len());
        path.push(final_state.clone());
        let mut cell = final_cell;
        for step in steps[..steps.len() - 1].iter().rev() {
            let predecessor = cell.backpointer.as_ref()?;
            path.push(predecessor.clone());
            cell = step.get(predecessor)?;
        }
        path.reverse();

        tracing::trace!(score, states = path.len(), "backtraced best state path");
        Some((path, score))
    }

    fn initial_step(&self, observation: &Word) -> AHashMap<Word, Cell> {
        let mut cells = AHashMap::new();
        for (state, initial) in self.tables.initial_states() {
            let Some(emission) = self.tables.log_emission(state, observation) else {
                continue;
            };
            cells.insert(
                state.clone(),
                Cell {
                    score: initial.ln() + emission,
                    backpointer: None,
                },
            );
        }
        cells
    }

    /// Extends every reachable candidate state for `observation` from
    /// the previous step's cells, keeping the best predecessor per
    /// state. A state with no valid transition into it is simply absent
    /// from the produced cells.
    fn forward_step(
        &self,
        previous: &AHashMap<Word, Cell>,
        observation: &Word,
        cells: &mut AHashMap<Word, Cell>,
    ) {
        for state in self.tables.candidate_states(observation).unwrap_or(&[]) {
            let Some(emission) = self.tables.log_emission(state, observation) else {
                continue;
            };

            let mut best: Option<(f64, &Word)> = None;
            for (predecessor, cell) in previous {
                let Some(transition) = self.tables.log_transition(predecessor, state) else {
                    continue;
                };
                let score = cell.score + transition + emission;

                // deterministic despite map iteration order: ties go to
                // the lexicographically smallest predecessor
                let better = match best {
                    None => true,
                    Some((best_score, best_state)) => match score.total_cmp(&best_score) {
                        Ordering::Greater => true,
                        Ordering::Equal => predecessor < best_state,
                        Ordering::Less => false,
                    },
                };
                if better {
                    best = Some((score, predecessor));
                }
            }

            if let Some((score, predecessor)) = best {
                cells.insert(
                    state.clone(),
                    Cell {
                        score,
                        backpointer: Some(predecessor.clone()),
                    },
                );
            }
        }
    }
}

impl Translator for HmmDecoder<'_> {
    #[inline]
    fn translate(&self, source: &[Word]) -> Vec<Word> {
        self.decode(source)
    }
}
