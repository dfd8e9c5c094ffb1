//! # Word-based statistical machine translation decoders
//!
//! Turns pretrained probability tables into translations through one of
//! two search procedures:
//!
//! * [`HmmDecoder`]: Viterbi dynamic programming over a hidden-state
//!   (target-word) sequence model with backpointers.
//! * [`BeamDecoder`]: a stack decoder covering source positions in
//!   arbitrary order, keeping one bounded priority stack of partial
//!   hypotheses per coverage count.
//!
//! Both implement [`Translator`], the single uniform operation
//! `translate(source tokens) → target tokens`. Tokenization and surface
//! text assembly are the caller's responsibility.
//!
//! # Example
//! ```rust
//! use transgram::{BeamDecoderBuilder, LanguageModel, LexiconTable, Translator, Word};
//!
//! let lexicon = LexiconTable::from_entries([
//!     ("he", vec![("他", 0.9)]),
//!     ("goes", vec![("去", 0.6), ("走", 0.4)]),
//!     ("home", vec![("家", 0.8)]),
//! ]);
//! let language_model = LanguageModel::default();
//!
//! let decoder = BeamDecoderBuilder::new(&lexicon, &language_model).build();
//!
//! let source: Vec<Word> = ["he", "goes", "home"].map(Word::from).to_vec();
//! assert_eq!(decoder.translate(&source), ["他", "去", "家"]);
//! ```
//!
//! Tables are immutable once loaded, so one store may serve any number
//! of concurrent decode calls (rayon for example) without locks.

#[allow(unused_macros)]
macro_rules! ahashmap {
    (@single $($x:tt)*) => (());
    (@count $($rest:expr),*) => (<[()]>::len(&[$(ahashmap!(@single $rest)),*]));

    ($($key:expr => $value:expr,)+) => { ahashmap!($($key => $value),+) };
    ($($key:expr => $value:expr),*) => {
        {
            let _cap = ahashmap!(@count $($key),*);
            let mut _map = ::ahash::AHashMap::with_capacity(_cap);
            $(
                let _ = _map.insert($key, $value);
            )*
            _map
        }
    };
}

/// A single word token. Source and target vocabularies are both short
/// strings, so the compact inline representation pays off.
pub type Word = compact_str::CompactString;

mod decoder;
mod file_model;
mod scoring;
mod tables;

pub use decoder::{BeamConfig, BeamDecoder, BeamDecoderBuilder, HmmDecoder, Translator};
pub use file_model::{FileDistribution, FileNested, FileRanked, FileShortlists};
pub use scoring::{distortion_cost, Weights};
pub use tables::{HmmTables, LanguageModel, LexiconTable, TableError, TOP_K};
