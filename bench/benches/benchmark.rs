use ::std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use transgram::{BeamDecoderBuilder, HmmDecoder, HmmTables, LanguageModel, LexiconTable, Word};

const VOCABULARY: usize = 100;
const CANDIDATES: usize = 5;

fn synthetic_lexicon() -> LexiconTable {
    LexiconTable::from_entries((0..VOCABULARY).map(|i| {
        let candidates: Vec<(Word, f64)> = (0..CANDIDATES)
            .map(|j| (Word::from(format!("t{i}_{j}")), (CANDIDATES - j) as f64))
            .collect();
        (Word::from(format!("s{i}")), candidates)
    }))
}

fn synthetic_language_model() -> LanguageModel {
    let start = (0..VOCABULARY).map(|i| (Word::from(format!("t{i}_0")), 1.0 / VOCABULARY as f64));
    let bigram = (0..VOCABULARY).map(|i| {
        let continuations: Vec<(Word, f64)> = (0..CANDIDATES)
            .map(|j| {
                let next = (i + 1) % VOCABULARY;
                (Word::from(format!("t{next}_{j}")), 0.5 / (j + 1) as f64)
            })
            .collect();
        (Word::from(format!("t{i}_0")), continuations)
    });
    LanguageModel::from_entries(start, bigram)
}

fn synthetic_hmm_tables(states: usize) -> HmmTables {
    let initial = [(Word::from("z0"), 1.0)];
    let transition = (0..states.saturating_sub(1)).map(|i| {
        let next = i + 1;
        let skip = (i + 2).min(states - 1);
        (
            Word::from(format!("z{i}")),
            vec![
                (Word::from(format!("z{next}")), 0.9),
                (Word::from(format!("z{skip}")), 0.1),
            ],
        )
    });
    let emission = (0..states).map(|i| {
        (
            Word::from(format!("z{i}")),
            vec![
                (Word::from(format!("o{i}")), 0.8),
                (Word::from(format!("o{i}x")), 0.2),
            ],
        )
    });
    let candidates = (0..states).map(|i| {
        let shortlist = if i == 0 {
            vec![Word::from("z0")]
        } else {
            vec![Word::from(format!("z{i}")), Word::from(format!("z{}", i - 1))]
        };
        (Word::from(format!("o{i}")), shortlist)
    });
    HmmTables::from_entries(initial, transition, emission, candidates)
}

fn sentences() -> Vec<Vec<Word>> {
    (0..20)
        .map(|s| {
            (0..4 + s % 5)
                .map(|k| Word::from(format!("s{}", (s * 7 + k * 3) % VOCABULARY)))
                .collect()
        })
        .collect()
}

fn benchmark_beam_decoder(c: &mut Criterion) {
    let lexicon = synthetic_lexicon();
    let language_model = synthetic_language_model();
    let sentences = sentences();

    let mut group = c.benchmark_group("Beam decoder");

    let decoder_default = BeamDecoderBuilder::new(&lexicon, &language_model).build();
    group.bench_function("default config", |bencher| {
        bencher.iter(|| {
            sentences.iter().for_each(|sentence| {
                black_box(decoder_default.decode(sentence));
            });
        });
    });

    let decoder_wide = BeamDecoderBuilder::new(&lexicon, &language_model)
        .stack_capacity(100)
        .top_k_per_word(CANDIDATES)
        .build();
    group.bench_function("wide stack", |bencher| {
        bencher.iter(|| {
            sentences.iter().for_each(|sentence| {
                black_box(decoder_wide.decode(sentence));
            });
        });
    });

    let decoder_greedy = BeamDecoderBuilder::new(&lexicon, &language_model)
        .stack_capacity(1)
        .top_k_per_word(1)
        .build();
    group.bench_function("greedy", |bencher| {
        bencher.iter(|| {
            sentences.iter().for_each(|sentence| {
                black_box(decoder_greedy.decode(sentence));
            });
        });
    });

    group.finish();
}

fn benchmark_hmm_decoder(c: &mut Criterion) {
    let states = 50;
    let tables = synthetic_hmm_tables(states);
    let decoder = HmmDecoder::new(&tables);
    let observations: Vec<Word> = (0..states).map(|i| Word::from(format!("o{i}"))).collect();

    let mut group = c.benchmark_group("Viterbi decoder");
    group.bench_function("state chain", |bencher| {
        bencher.iter(|| {
            black_box(decoder.decode(&observations));
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_beam_decoder, benchmark_hmm_decoder);
criterion_main!(benches);
