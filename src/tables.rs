//! Probability table store: immutable once constructed, shareable
//! read-only across any number of concurrent decode calls.

use crate::{
    file_model::{self, FileDistribution, FileNested, FileRanked, FileShortlists},
    Word,
};
use ::std::{
    io,
    path::{Path, PathBuf},
};
use ahash::AHashMap;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Retained entries per ranked distribution. Truncation is followed by
/// renormalization over the survivors, so the mass available to the
/// decoders changes; both load and in-memory construction apply the
/// same policy.
pub const TOP_K: usize = 10;

/// Substitute probability for keys the tables have no evidence for,
/// where search must still be able to proceed.
pub(crate) const FLOOR_PROBABILITY: f64 = 1e-6;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("table file {path:?} could not be opened")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("table file {path:?} could not be written")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("table file {path:?} is malformed")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("table file {path:?}: probability {probability} for key {key:?} is not positive")]
    InvalidProbability {
        path: PathBuf,
        key: Word,
        probability: f64,
    },
}

/// Zero and negative probabilities are data corruption, not "unseen
/// key"; unseen keys are simply absent from the maps.
#[inline]
fn validate_probability(path: &Path, key: &Word, probability: f64) -> Result<(), TableError> {
    if probability > 0.0 && probability.is_finite() {
        Ok(())
    } else {
        Err(TableError::InvalidProbability {
            path: path.to_owned(),
            key: key.clone(),
            probability,
        })
    }
}

fn validate_distribution(path: &Path, distribution: &FileDistribution) -> Result<(), TableError> {
    for (key, &probability) in distribution {
        validate_probability(path, key, probability)?;
    }
    Ok(())
}

fn validate_nested(path: &Path, nested: &FileNested) -> Result<(), TableError> {
    for inner in nested.values() {
        for (key, &probability) in inner {
            validate_probability(path, key, probability)?;
        }
    }
    Ok(())
}

fn validate_ranked(path: &Path, ranked: &FileRanked) -> Result<(), TableError> {
    for entries in ranked.values() {
        for (key, probability) in entries {
            validate_probability(path, key, *probability)?;
        }
    }
    Ok(())
}

/// Keeps the `k` highest-probability entries and renormalizes them to
/// sum to 1. Ordering is deterministic: probability descending, then
/// word ascending.
fn truncate_and_renormalize(entries: Vec<(Word, f64)>, k: usize) -> Vec<(Word, f64)> {
    let mut retained: Vec<(Word, f64)> = entries
        .into_iter()
        .sorted_by(|(word1, p1), (word2, p2)| p2.total_cmp(p1).then_with(|| word1.cmp(word2)))
        .take(k)
        .collect();

    let total: f64 = retained.iter().map(|(_, p)| p).sum();
    if total > 0.0 {
        for (_, p) in &mut retained {
            *p /= total;
        }
    }

    retained
}

/// Lexical translation table: source word → ranked target candidates,
/// top-K truncated and renormalized.
#[derive(Clone, Debug, Default)]
pub struct LexiconTable {
    entries: AHashMap<Word, Vec<(Word, f64)>>,
}

impl LexiconTable {
    pub fn from_entries<S, T, I, E>(entries: E) -> Self
    where
        S: Into<Word>,
        T: Into<Word>,
        I: IntoIterator<Item = (T, f64)>,
        E: IntoIterator<Item = (S, I)>,
    {
        let entries = entries
            .into_iter()
            .map(|(source_word, candidates)| {
                let candidates = candidates
                    .into_iter()
                    .map(|(word, probability)| (word.into(), probability))
                    .collect();
                (
                    source_word.into(),
                    truncate_and_renormalize(candidates, TOP_K),
                )
            })
            .collect();

        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let ranked: FileRanked = file_model::read_table(path)?;
        validate_ranked(path, &ranked)?;

        let entries: AHashMap<Word, Vec<(Word, f64)>> = ranked
            .into_iter()
            .map(|(source_word, candidates)| {
                (source_word, truncate_and_renormalize(candidates, TOP_K))
            })
            .collect();

        tracing::debug!(
            path = %path.display(),
            source_words = entries.len(),
            "loaded lexical translation table"
        );

        Ok(Self { entries })
    }

    pub fn write(&self, path: &Path) -> Result<(), TableError> {
        file_model::write_table(&self.entries, path)
    }

    /// Ranked candidates for a source word, best first. `None` when the
    /// table holds no evidence for the word.
    #[inline]
    pub fn candidates(&self, source_word: &str) -> Option<&[(Word, f64)]> {
        self.entries
            .get(source_word)
            .map(Vec::as_slice)
            .filter(|candidates| !candidates.is_empty())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Target language model: sentence-start unigram probabilities plus
/// bigram continuations.
#[derive(Clone, Debug, Default)]
pub struct LanguageModel {
    start: AHashMap<Word, f64>,
    bigram: AHashMap<Word, FxHashMap<Word, f64>>,
}

impl LanguageModel {
    pub const START_FILE: &'static str = "lm_start.json";
    pub const BIGRAM_FILE: &'static str = "lm_bigram.json";

    pub fn from_entries<S, T, I, B>(start: impl IntoIterator<Item = (S, f64)>, bigram: B) -> Self
    where
        S: Into<Word>,
        T: Into<Word>,
        I: IntoIterator<Item = (T, f64)>,
        B: IntoIterator<Item = (S, I)>,
    {
        Self {
            start: start
                .into_iter()
                .map(|(word, probability)| (word.into(), probability))
                .collect(),
            bigram: bigram
                .into_iter()
                .map(|(word, continuations)| {
                    (
                        word.into(),
                        continuations
                            .into_iter()
                            .map(|(next, probability)| (next.into(), probability))
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn load(dir: &Path) -> Result<Self, TableError> {
        let start_path = dir.join(Self::START_FILE);
        let start: FileDistribution = file_model::read_table(&start_path)?;
        validate_distribution(&start_path, &start)?;

        let bigram_path = dir.join(Self::BIGRAM_FILE);
        let bigram: FileNested = file_model::read_table(&bigram_path)?;
        validate_nested(&bigram_path, &bigram)?;

        tracing::debug!(
            dir = %dir.display(),
            start_words = start.len(),
            bigram_words = bigram.len(),
            "loaded language model"
        );

        Ok(Self { start, bigram })
    }

    pub fn write(&self, dir: &Path) -> Result<(), TableError> {
        file_model::write_table(&self.start, &dir.join(Self::START_FILE))?;
        file_model::write_table(&self.bigram, &dir.join(Self::BIGRAM_FILE))
    }

    /// Log-probability of `word` continuing the given history: the
    /// start distribution with no history, the bigram table otherwise.
    /// Unseen continuations fall back to the floor probability so the
    /// search can still proceed.
    #[inline]
    pub fn log_continuation(&self, previous: Option<&str>, word: &str) -> f64 {
        let probability = match previous {
            None => self.start.get(word).copied(),
            Some(previous) => self
                .bigram
                .get(previous)
                .and_then(|continuations| continuations.get(word))
                .copied(),
        };

        probability.unwrap_or(FLOOR_PROBABILITY).ln()
    }
}

/// Hidden-state sequence model: initial (π), transition (A), and
/// emission (B) distributions plus a precomputed candidate-state
/// shortlist per observation that restricts the Viterbi search space.
#[derive(Clone, Debug, Default)]
pub struct HmmTables {
    initial: AHashMap<Word, f64>,
    transition: AHashMap<Word, FxHashMap<Word, f64>>,
    emission: AHashMap<Word, FxHashMap<Word, f64>>,
    candidates: AHashMap<Word, Vec<Word>>,
}

impl HmmTables {
    pub const INITIAL_FILE: &'static str = "initial.json";
    pub const TRANSITION_FILE: &'static str = "transition.json";
    pub const EMISSION_FILE: &'static str = "emission.json";
    pub const CANDIDATES_FILE: &'static str = "candidates.json";

    pub fn from_entries<S, T, IT, IE, A, B, C>(
        initial: impl IntoIterator<Item = (S, f64)>,
        transition: A,
        emission: B,
        candidates: C,
    ) -> Self
    where
        S: Into<Word>,
        T: Into<Word>,
        IT: IntoIterator<Item = (T, f64)>,
        IE: IntoIterator<Item = (T, f64)>,
        A: IntoIterator<Item = (S, IT)>,
        B: IntoIterator<Item = (S, IE)>,
        C: IntoIterator<Item = (S, Vec<T>)>,
    {
        Self {
            initial: initial
                .into_iter()
                .map(|(state, probability)| (state.into(), probability))
                .collect(),
            transition: transition
                .into_iter()
                .map(|(state, successors)| {
                    (
                        state.into(),
                        successors
                            .into_iter()
                            .map(|(next, probability)| (next.into(), probability))
                            .collect(),
                    )
                })
                .collect(),
            emission: emission
                .into_iter()
                .map(|(state, observations)| {
                    let observations = observations
                        .into_iter()
                        .map(|(observation, probability)| (observation.into(), probability))
                        .collect();
                    (
                        state.into(),
                        truncate_and_renormalize(observations, TOP_K)
                            .into_iter()
                            .collect(),
                    )
                })
                .collect(),
            candidates: candidates
                .into_iter()
                .map(|(observation, states)| {
                    (
                        observation.into(),
                        states.into_iter().map(Into::into).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Loads all four tables from `dir`, all-or-nothing: any missing or
    /// invalid file fails the whole load, decoding never runs against a
    /// partially initialized store.
    pub fn load(dir: &Path) -> Result<Self, TableError> {
        let initial_path = dir.join(Self::INITIAL_FILE);
        let initial: FileDistribution = file_model::read_table(&initial_path)?;
        validate_distribution(&initial_path, &initial)?;

        let transition_path = dir.join(Self::TRANSITION_FILE);
        let transition: FileNested = file_model::read_table(&transition_path)?;
        validate_nested(&transition_path, &transition)?;

        let emission_path = dir.join(Self::EMISSION_FILE);
        let emission_ranked: FileRanked = file_model::read_table(&emission_path)?;
        validate_ranked(&emission_path, &emission_ranked)?;
        let emission = emission_ranked
            .into_iter()
            .map(|(state, observations)| {
                (
                    state,
                    truncate_and_renormalize(observations, TOP_K)
                        .into_iter()
                        .collect(),
                )
            })
            .collect();

        let candidates: FileShortlists = file_model::read_table(&dir.join(Self::CANDIDATES_FILE))?;

        tracing::debug!(
            dir = %dir.display(),
            states = initial.len(),
            observations = candidates.len(),
            "loaded hidden-state tables"
        );

        Ok(Self {
            initial,
            transition,
            emission,
            candidates,
        })
    }

    pub fn write(&self, dir: &Path) -> Result<(), TableError> {
        file_model::write_table(&self.initial, &dir.join(Self::INITIAL_FILE))?;
        file_model::write_table(&self.transition, &dir.join(Self::TRANSITION_FILE))?;

        let emission_ranked: FileRanked = self
            .emission
            .iter()
            .map(|(state, observations)| {
                let ranked = observations
                    .iter()
                    .map(|(observation, &probability)| (observation.clone(), probability))
                    .sorted_by(|(word1, p1), (word2, p2)| {
                        p2.total_cmp(p1).then_with(|| word1.cmp(word2))
                    })
                    .collect();
                (state.clone(), ranked)
            })
            .collect();
        file_model::write_table(&emission_ranked, &dir.join(Self::EMISSION_FILE))?;

        file_model::write_table(&self.candidates, &dir.join(Self::CANDIDATES_FILE))
    }

    /// `None` means no evidence: the caller must exclude the path, not
    /// score it.
    #[inline]
    pub fn log_emission(&self, state: &str, observation: &str) -> Option<f64> {
        self.emission
            .get(state)?
            .get(observation)
            .map(|probability| probability.ln())
    }

    /// Same contract as [`Self::log_emission`], over the transition
    /// table.
    #[inline]
    pub fn log_transition(&self, from_state: &str, to_state: &str) -> Option<f64> {
        self.transition
            .get(from_state)?
            .get(to_state)
            .map(|probability| probability.ln())
    }

    #[inline]
    pub(crate) fn initial_states(&self) -> impl Iterator<Item = (&Word, f64)> {
        self.initial
            .iter()
            .map(|(state, &probability)| (state, probability))
    }

    #[inline]
    pub(crate) fn candidate_states(&self, observation: &str) -> Option<&[Word]> {
        self.candidates.get(observation).map(Vec::as_slice)
    }
}
