// Chord Progressions - One chord per bar, cycling the active harmonic schema

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use super::chords::{degree_to_chord, ChordQuality};

/// Every chord occupies a full 4/4 bar
pub const BEATS_PER_CHORD: f64 = 4.0;

/// One chord of a section progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    /// Chord root as a (possibly low) MIDI pitch
    pub root: i32,
    pub quality: ChordQuality,

    /// Duration in beats
    pub beats: f64,
}

/// Total duration in beats of a progression
pub fn progression_beats(progression: &[Chord]) -> f64 {
    progression.iter().map(|c| c.beats).sum()
}

const BRIDGE_DEGREE_SETS: [[usize; 3]; 2] = [[1, 4, 0], [3, 4, 0]];

/// Generates the chord progression for one section: `bars` chords of four
/// beats each, cycling the schema degrees in the active key.
///
/// A modulating Bridge usually (80%) swaps in one of two short cadential
/// degree cycles instead of the song schema.
pub fn section_progression(
    bars: u32,
    key_root: u8,
    is_major: bool,
    schema_degrees: &[usize],
    seventh_probability: f64,
    modulating_bridge: bool,
    rng: &mut Pcg32,
) -> Vec<Chord> {
    let mut progression = Vec::with_capacity(bars as usize);

    let bridge_degrees = if modulating_bridge && rng.gen::<f64>() < 0.8 {
        BRIDGE_DEGREE_SETS.choose(rng).copied()
    } else {
        None
    };

    for bar in 0..bars as usize {
        let degree = match &bridge_degrees {
            Some(degrees) => degrees[bar % degrees.len()],
            None => {
                if schema_degrees.is_empty() {
                    0
                } else {
                    schema_degrees[bar % schema_degrees.len()]
                }
            }
        };
        let (root, quality) = degree_to_chord(degree, key_root, is_major, seventh_probability, rng);
        progression.push(Chord {
            root,
            quality,
            beats: BEATS_PER_CHORD,
        });
    }

    progression
}
