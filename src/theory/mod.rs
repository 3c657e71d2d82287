// Music Theory Utilities - Scales, diatonic harmony, voicings, progressions

pub mod chords;
pub mod progression;
pub mod scale;

pub use chords::{build_voicing, degree_to_chord, ChordQuality};
pub use progression::{section_progression, Chord, BEATS_PER_CHORD};
pub use scale::{scale_tones, ScaleKind};
