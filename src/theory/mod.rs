// Module theory - Notes, chords, progressions and pitch lookup

pub mod frequency;
pub mod note;

pub use frequency::resolve;
pub use note::{Chord, ChordProgression, MusicTheoryInfo, Note, TheoryKind};
