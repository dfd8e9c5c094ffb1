use rayon::prelude::*;
use tempfile::tempdir;
use transgram::{
    BeamDecoderBuilder, HmmDecoder, HmmTables, LanguageModel, LexiconTable, Translator, Word,
};

fn words(tokens: &[&str]) -> Vec<Word> {
    tokens.iter().copied().map(Word::from).collect()
}

#[test]
fn test_beam_decoding_from_persisted_tables() {
    let dir = tempdir().unwrap();
    let lexicon_path = dir.path().join("lexicon.json");

    LexiconTable::from_entries([
        ("he", vec![("他", 0.9)]),
        ("goes", vec![("去", 0.6), ("走", 0.4)]),
        ("home", vec![("家", 0.8)]),
    ])
    .write(&lexicon_path)
    .unwrap();
    LanguageModel::from_entries(
        [("他", 0.5)],
        [("他", vec![("去", 0.6)]), ("去", vec![("家", 0.7)])],
    )
    .write(dir.path())
    .unwrap();

    let lexicon = LexiconTable::load(&lexicon_path).unwrap();
    let language_model = LanguageModel::load(dir.path()).unwrap();
    let decoder = BeamDecoderBuilder::new(&lexicon, &language_model).build();

    assert_eq!(
        decoder.decode(&words(&["he", "goes", "home"])),
        ["他", "去", "家"]
    );
}

#[test]
fn test_viterbi_decoding_from_persisted_tables() {
    let dir = tempdir().unwrap();

    HmmTables::from_entries(
        [("他", 0.6), ("去", 0.4)],
        [
            ("他", vec![("去", 0.7), ("家", 0.3)]),
            ("去", vec![("家", 0.9), ("他", 0.1)]),
        ],
        [
            ("他", vec![("he", 0.8), ("she", 0.2)]),
            ("去", vec![("goes", 0.7), ("walks", 0.3)]),
            ("家", vec![("home", 0.9), ("house", 0.1)]),
        ],
        [
            ("he", vec!["他"]),
            ("goes", vec!["去"]),
            ("home", vec!["家"]),
        ],
    )
    .write(dir.path())
    .unwrap();

    let tables = HmmTables::load(dir.path()).unwrap();
    let decoder = HmmDecoder::new(&tables);

    assert_eq!(
        decoder.decode(&words(&["he", "goes", "home"])),
        ["他", "去", "家"]
    );
    assert!(decoder.decode(&words(&["he", "fog"])).is_empty());
}

#[test]
fn test_parallel_decoding_shares_one_store() {
    let lexicon = LexiconTable::from_entries([
        ("he", vec![("他", 0.9)]),
        ("goes", vec![("去", 0.6), ("走", 0.4)]),
        ("home", vec![("家", 0.8)]),
    ]);
    let language_model = LanguageModel::default();
    let decoder = BeamDecoderBuilder::new(&lexicon, &language_model).build();

    let sources: Vec<Vec<Word>> = [
        &["he", "goes", "home"][..],
        &["home", "goes", "he"],
        &["he", "zzz", "home"],
        &["goes"],
    ]
    .iter()
    .map(|tokens| words(tokens))
    .collect();

    let sequential: Vec<Vec<Word>> = sources.iter().map(|s| decoder.translate(s)).collect();
    let parallel: Vec<Vec<Word>> = sources.par_iter().map(|s| decoder.translate(s)).collect();

    assert_eq!(parallel, sequential);
}
