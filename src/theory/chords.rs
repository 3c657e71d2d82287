// Diatonic Harmony - Degree-to-chord mapping and chord voicing construction

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Chord quality tag - determines which intervals are voiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Maj7,
    Min7,
    Dom7,
    Min7b5,
}

impl ChordQuality {
    /// Semitones from root to the chord third
    pub fn third_interval(&self) -> i32 {
        match self {
            ChordQuality::Minor | ChordQuality::Min7 | ChordQuality::Diminished | ChordQuality::Min7b5 => 3,
            _ => 4,
        }
    }

    /// Semitones from root to the chord fifth
    pub fn fifth_interval(&self) -> i32 {
        match self {
            ChordQuality::Diminished | ChordQuality::Min7b5 => 6,
            _ => 7,
        }
    }

    /// Semitones from root to the seventh, if this quality carries one
    pub fn seventh_interval(&self) -> Option<i32> {
        match self {
            ChordQuality::Maj7 => Some(11),
            ChordQuality::Min7 | ChordQuality::Dom7 | ChordQuality::Min7b5 => Some(10),
            _ => None,
        }
    }

    /// Whether this quality extends the triad with a seventh
    pub fn is_extended(&self) -> bool {
        self.seventh_interval().is_some()
    }

    /// Pitch classes (0-11) implied by this quality on `root_pc`
    pub fn pitch_classes(&self, root_pc: i32) -> Vec<u8> {
        let mut pcs = vec![
            root_pc.rem_euclid(12) as u8,
            (root_pc + self.third_interval()).rem_euclid(12) as u8,
            (root_pc + self.fifth_interval()).rem_euclid(12) as u8,
        ];
        if let Some(seventh) = self.seventh_interval() {
            pcs.push((root_pc + seventh).rem_euclid(12) as u8);
        }
        pcs.sort_unstable();
        pcs.dedup();
        pcs
    }
}

const MAJOR_SCALE_INTERVALS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_SCALE_INTERVALS: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Maps a scale degree (0-6) in the given key to a chord root and quality.
///
/// The triad tables are fixed diatonic harmony; the upgrade to a diatonic
/// seventh is gated by a single random draw against `seventh_probability`.
pub fn degree_to_chord(
    degree: usize,
    key_root: u8,
    is_major: bool,
    seventh_probability: f64,
    rng: &mut Pcg32,
) -> (i32, ChordQuality) {
    let intervals = if is_major {
        &MAJOR_SCALE_INTERVALS
    } else {
        &MINOR_SCALE_INTERVALS
    };
    let degree = degree % 7;
    let chord_root = key_root as i32 + intervals[degree];

    let triad = if is_major {
        match degree {
            1 | 2 | 5 => ChordQuality::Minor,
            6 => ChordQuality::Diminished,
            _ => ChordQuality::Major,
        }
    } else {
        match degree {
            0 | 3 | 4 => ChordQuality::Minor,
            2 | 5 | 6 => ChordQuality::Major,
            1 => ChordQuality::Diminished,
            _ => ChordQuality::Major,
        }
    };

    let mut quality = triad;
    if seventh_probability > rng.gen::<f64>() {
        quality = if is_major {
            match degree {
                0 | 3 => ChordQuality::Maj7,
                1 | 2 | 5 => ChordQuality::Min7,
                4 => ChordQuality::Dom7,
                6 => ChordQuality::Min7b5,
                _ => triad,
            }
        } else {
            match degree {
                0 | 3 | 4 => ChordQuality::Min7,
                2 | 5 => ChordQuality::Maj7,
                1 => ChordQuality::Min7b5,
                6 => ChordQuality::Dom7,
                _ => triad,
            }
        };
    }

    (chord_root, quality)
}

/// Builds a concrete voicing for a chord: absolute MIDI pitches, sorted,
/// at most `preferred` notes, never empty.
///
/// The root anchors the register: roots below MIDI 36 are re-anchored at
/// `octave_center`. When trimming an extended chord down to three notes the
/// root, third and seventh are preferred; if distinct third/seventh
/// candidates cannot be resolved the sorted voicing is truncated instead.
pub fn build_voicing(
    root: i32,
    quality: ChordQuality,
    octave_center: i32,
    preferred: usize,
) -> Vec<i32> {
    let preferred = preferred.max(1);
    let root_pc = root.rem_euclid(12);
    let pcs = quality.pitch_classes(root_pc);

    let base = if root < 36 {
        octave_center * 12 + root_pc
    } else {
        root
    };
    let base_pc = base.rem_euclid(12);

    let mut voiced: Vec<i32> = pcs
        .iter()
        .map(|&pc| base + (pc as i32 - base_pc).rem_euclid(12))
        .collect();
    voiced.sort_unstable();
    voiced.dedup();

    if voiced.len() > preferred && quality.is_extended() {
        if preferred == 3 {
            let third_pc = (base + quality.third_interval()).rem_euclid(12);
            let seventh_pc = (base + quality.seventh_interval().unwrap_or(11)).rem_euclid(12);

            let mut selected = vec![base];
            if let Some(&third) = voiced
                .iter()
                .find(|&&n| n.rem_euclid(12) == third_pc && !selected.contains(&n))
            {
                selected.push(third);
            }
            if let Some(&seventh) = voiced
                .iter()
                .find(|&&n| n.rem_euclid(12) == seventh_pc && !selected.contains(&n))
            {
                selected.push(seventh);
            }

            if selected.len() < preferred {
                voiced.truncate(preferred);
            } else {
                selected.sort_unstable();
                selected.truncate(preferred);
                voiced = selected;
            }
        } else {
            voiced.truncate(preferred);
        }
    } else {
        voiced.truncate(preferred);
    }

    voiced
}
