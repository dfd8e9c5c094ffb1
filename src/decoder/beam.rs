use super::{
    builder::{BeamConfig, BeamDecoderBuilder},
    Translator,
};
use crate::{
    scoring,
    tables::{LanguageModel, LexiconTable, FLOOR_PROBABILITY},
    Word,
};
use ahash::AHashSet;

/// Stack decoder: source positions are covered in arbitrary order, one
/// bounded priority stack of partial hypotheses per coverage count.
/// Expansion at step `i` is `O(|stack i−1| × (N−i+1) × top_k)` with
/// every stack bounded by the configured capacity.
#[derive(Clone, Debug)]
pub struct BeamDecoder<'m> {
    lexicon: &'m LexiconTable,
    language_model: &'m LanguageModel,
    config: BeamConfig,
}

/// Immutable partial translation. Extension always clones into a new
/// value, so sibling hypotheses never alias coverage or target state.
#[derive(Clone, Debug)]
struct Hypothesis {
    coverage: Vec<bool>,
    target: Vec<Word>,
    /// Source position covered by the latest extension, -1 before any.
    last_position: isize,
    translation_cost: f64,
    language_cost: f64,
    distortion_cost: f64,
    /// Ranking key: the weighted sum of the three accumulators.
    total_cost: f64,
}

impl Hypothesis {
    #[inline]
    fn root(source_len: usize) -> Self {
        Self {
            coverage: vec![false; source_len],
            target: Vec::new(),
            last_position: -1,
            translation_cost: 0.0,
            language_cost: 0.0,
            distortion_cost: 0.0,
            total_cost: 0.0,
        }
    }

    #[inline]
    fn last_word(&self) -> Option<&str> {
        self.target.last().map(Word::as_str)
    }

    fn extended(
        &self,
        position: usize,
        word: Word,
        translation_cost: f64,
        language_cost: f64,
        distortion_cost: f64,
        total_cost: f64,
    ) -> Self {
        let mut coverage = self.coverage.clone();
        coverage[position] = true;
        let mut target = self.target.clone();
        target.push(word);

        Self {
            coverage,
            target,
            last_position: position as isize,
            translation_cost,
            language_cost,
            distortion_cost,
            total_cost,
        }
    }
}

/// Bounded stack with strict top-K retention by total cost: below
/// capacity every hypothesis is kept, at capacity the minimum is
/// replaced only when strictly beaten. Hypotheses keep their insertion
/// order, which makes the expansion order of the next round (and with
/// it every tie-breaking decision) deterministic.
struct Stack {
    capacity: usize,
    hypotheses: Vec<Hypothesis>,
}

impl Stack {
    #[inline]
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hypotheses: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, hypothesis: Hypothesis) {
        if self.hypotheses.len() < self.capacity {
            self.hypotheses.push(hypothesis);
            return;
        }

        let Some((worst_index, worst)) = self
            .hypotheses
            .iter()
            .enumerate()
            .min_by(|(_, h1), (_, h2)| h1.total_cost.total_cmp(&h2.total_cost))
        else {
            return;
        };

        if hypothesis.total_cost > worst.total_cost {
            self.hypotheses.remove(worst_index);
            self.hypotheses.push(hypothesis);
        }
    }

    #[inline]
    fn into_hypotheses(self) -> Vec<Hypothesis> {
        self.hypotheses
    }
}

impl<'m> BeamDecoder<'m> {
    #[inline]
    pub(super) fn new(builder: BeamDecoderBuilder<'m>) -> Self {
        Self {
            lexicon: builder.lexicon,
            language_model: builder.language_model,
            config: builder.config,
        }
    }

    /// Target-word sequence of the best complete hypothesis, empty for
    /// an empty source.
    #[inline]
    pub fn decode(&self, source: &[Word]) -> Vec<Word> {
        self.decode_scored(source)
            .map(|(target, _)| target)
            .unwrap_or_default()
    }

    /// As [`Self::decode`], also exposing the total cost of the chosen
    /// hypothesis.
    pub fn decode_scored(&self, source: &[Word]) -> Option<(Vec<Word>, f64)> {
        if source.is_empty() {
            return None;
        }

        let BeamConfig {
            stack_capacity,
            top_k_per_word,
            weights,
            alpha,
        } = self.config;

        let mut previous = vec![Hypothesis::root(source.len())];
        for covered in 1..=source.len() {
            let mut stack = Stack::new(stack_capacity);
            // deduplication of identical totals within one expansion
            // round, keyed on the exact bit pattern
            let mut seen_costs = AHashSet::new();

            for hypothesis in &previous {
                for (position, source_word) in source.iter().enumerate() {
                    if hypothesis.coverage[position] {
                        continue;
                    }

                    // unknown source words pass through at the floor
                    // probability so coverage can still proceed
                    let fallback: [(Word, f64); 1];
                    let candidates = match self.lexicon.candidates(source_word) {
                        Some(ranked) => &ranked[..ranked.len().min(top_k_per_word)],
                        None => {
                            fallback = [(source_word.clone(), FLOOR_PROBABILITY)];
                            &fallback[..]
                        }
                    };

                    for (target_word, probability) in candidates {
                        let translation_cost = hypothesis.translation_cost + probability.ln();
                        let language_cost = hypothesis.language_cost
                            + self
                                .language_model
                                .log_continuation(hypothesis.last_word(), target_word);
                        let distortion_cost = hypothesis.distortion_cost
                            + scoring::distortion_cost(hypothesis.last_position, position, alpha);
                        let total_cost =
                            weights.total_cost(translation_cost, language_cost, distortion_cost);

                        if !seen_costs.insert(total_cost.to_bits()) {
                            continue;
                        }

                        stack.push(hypothesis.extended(
                            position,
                            target_word.clone(),
                            translation_cost,
                            language_cost,
                            distortion_cost,
                            total_cost,
                        ));
                    }
                }
            }

            previous = stack.into_hypotheses();
            tracing::trace!(covered, hypotheses = previous.len(), "expanded coverage stack");
        }

        // true maximum over the final stack; the first of equal-cost
        // hypotheses wins, keeping the result deterministic
        previous
            .into_iter()
            .reduce(|best, hypothesis| {
                if hypothesis.total_cost > best.total_cost {
                    hypothesis
                } else {
                    best
                }
            })
            .map(|best| (best.target, best.total_cost))
    }
}

impl Translator for BeamDecoder<'_> {
    #[inline]
    fn translate(&self, source: &[Word]) -> Vec<Word> {
        self.decode(source)
    }
}
