//! On-disk table format: one JSON file per distribution.
//!
//! Three value shapes cover every table the decoders consume: a flat
//! `word → probability` mapping, a nested `word → (word → probability)`
//! mapping, and a ranked `word → [[word, probability], ..]` list used
//! by the top-K truncated tables. Candidate-state shortlists are plain
//! `word → [word, ..]` lists.

use crate::{tables::TableError, Word};
use ::std::{
    fs::{create_dir_all, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};
use ahash::AHashMap;
use rustc_hash::FxHashMap;
use serde::{de::DeserializeOwned, Serialize};

/// `word → probability`
pub type FileDistribution = AHashMap<Word, f64>;
/// `word → (word → probability)`
pub type FileNested = AHashMap<Word, FxHashMap<Word, f64>>;
/// `word → [[word, probability], ..]`, ranked by probability descending
pub type FileRanked = AHashMap<Word, Vec<(Word, f64)>>;
/// `word → [word, ..]`, ordered shortlists
pub type FileShortlists = AHashMap<Word, Vec<Word>>;

/// Reads a whole table file, all-or-nothing. A missing file or
/// malformed content is a configuration error, not a silent default.
pub(crate) fn read_table<T: DeserializeOwned>(path: &Path) -> Result<T, TableError> {
    let file = File::open(path).map_err(|source| TableError::Open {
        path: path.to_owned(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| TableError::Malformed {
        path: path.to_owned(),
        source,
    })
}

pub(crate) fn write_table<T: Serialize>(table: &T, path: &Path) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|source| TableError::Write {
            path: path.to_owned(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| TableError::Write {
        path: path.to_owned(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, table).map_err(|source| TableError::Malformed {
        path: path.to_owned(),
        source,
    })?;

    // a small table fits the buffer whole, so the only write syscall
    // happens on flush; dropping the writer would discard its error
    writer.flush().map_err(|source| TableError::Write {
        path: path.to_owned(),
        source,
    })
}
