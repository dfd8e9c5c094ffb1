use crate::Word;

mod beam;
mod builder;
mod hmm;

pub use beam::BeamDecoder;
pub use builder::{BeamConfig, BeamDecoderBuilder};
pub use hmm::HmmDecoder;

/// The single operation every translator exposes, whatever its model:
/// lowercased source tokens in, target tokens out. Joining target
/// tokens into surface text is the caller's concern.
pub trait Translator {
    fn translate(&self, source: &[Word]) -> Vec<Word>;
}
