use super::BeamDecoder;
use crate::{
    scoring::Weights,
    tables::{LanguageModel, LexiconTable},
};

/// Configuration surface of the beam decoder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamConfig {
    /// Retained hypotheses per coverage-count stack.
    pub stack_capacity: usize,
    /// Lexical candidates considered per source word.
    pub top_k_per_word: usize,
    pub weights: Weights,
    /// Distortion decay constant, in (0, 1).
    pub alpha: f64,
}

impl Default for BeamConfig {
    #[inline]
    fn default() -> Self {
        Self {
            stack_capacity: 30,
            top_k_per_word: 3,
            weights: Weights::default(),
            alpha: 0.5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BeamDecoderBuilder<'m> {
    pub(super) lexicon: &'m LexiconTable,
    pub(super) language_model: &'m LanguageModel,
    pub(super) config: BeamConfig,
}

impl<'m> BeamDecoderBuilder<'m> {
    #[inline]
    pub fn new(lexicon: &'m LexiconTable, language_model: &'m LanguageModel) -> Self {
        Self {
            lexicon,
            language_model,
            config: BeamConfig::default(),
        }
    }

    #[inline]
    pub fn config(mut self, config: BeamConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn stack_capacity(mut self, stack_capacity: usize) -> Self {
        debug_assert!(stack_capacity > 0, "stack capacity must be > 0");
        self.config.stack_capacity = stack_capacity;
        self
    }

    #[inline]
    pub fn top_k_per_word(mut self, top_k_per_word: usize) -> Self {
        debug_assert!(top_k_per_word > 0, "top-K per word must be > 0");
        self.config.top_k_per_word = top_k_per_word;
        self
    }

    #[inline]
    pub fn weights(mut self, weights: Weights) -> Self {
        self.config.weights = weights;
        self
    }

    #[inline]
    pub fn alpha(mut self, alpha: f64) -> Self {
        debug_assert!(
            alpha > 0.0 && alpha < 1.0,
            "distortion decay alpha {alpha} is not in (0, 1)"
        );
        self.config.alpha = alpha;
        self
    }

    #[inline]
    pub fn build(self) -> BeamDecoder<'m> {
        BeamDecoder::new(self)
    }
}
