// Parameter Resolution - Turns config knobs into one concrete plan per run
// Everything stochastic here draws from the single seeded stream, in a
// fixed order, so a seed fully determines the plan

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{
    GenerationConfig, Genre, InstrumentationFocus, MelodyMethod, Mood, SongLength,
    StructuralComplexity, TempoPreference,
};
use crate::sections::SectionType;

/// Drum idiom families; genres map onto these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmPersonality {
    /// Backbeat kit with ride/crash color
    PopRock,

    /// Syncopated kicks, sparse closed hats
    HipHopGroove,

    /// Four-on-the-floor with offbeat hats
    EdmPulse,
}

/// Internal melodic complexity tier mapped from the 1-5 UI scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
}

/// GM program numbers per pitched role. `None` silences the role entirely;
/// drums are channel 10 and carry no program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruments {
    pub bass: Option<u8>,
    pub chords: Option<u8>,
    pub melody: Option<u8>,
    pub pad: Option<u8>,
}

const MAJOR_KEYS: [(u8, &str); 4] = [(0, "C Major"), (2, "D Major"), (5, "F Major"), (7, "G Major")];
const MINOR_KEYS: [(u8, &str); 4] = [(9, "A Minor"), (4, "E Minor"), (2, "D Minor"), (7, "G Minor")];

/// Named harmonic schemas: degree cycles into the active scale.
/// Degrees are kept verbatim from the product tables even where a label
/// and its cycle disagree; the sound is the contract, not the name.
const SCHEMAS: [(&str, [usize; 4]); 4] = [
    ("I-V-vi-IV", [0, 7, 9, 5]),
    ("vi-IV-I-V", [9, 5, 0, 7]),
    ("I-vi-IV-V", [0, 9, 5, 7]),
    ("IV-V-vi-I", [5, 7, 9, 0]),
];

fn schema_degrees(name: &str) -> [usize; 4] {
    SCHEMAS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, d)| *d)
        .unwrap_or(SCHEMAS[0].1)
}

type FormTemplate = &'static [&'static str];

const SIMPLE_FORMS: [FormTemplate; 2] = [
    &["Intro", "Verse", "Chorus", "Verse", "Chorus", "Outro"],
    &["Verse", "Chorus", "Verse", "Chorus", "Chorus", "Outro"],
];
const STANDARD_FORMS: [FormTemplate; 2] = [
    &[
        "Intro", "Verse", "PreChorus", "Chorus", "Verse", "PreChorus", "Chorus", "Bridge",
        "Chorus", "Outro",
    ],
    &[
        "Intro", "Verse", "Chorus", "Verse", "Chorus", "InstrumentalHook", "Chorus", "Outro",
    ],
];
const DEVELOPED_FORMS: [FormTemplate; 2] = [
    &[
        "Intro", "Verse", "PreChorus", "Chorus", "Verse", "PreChorus", "Chorus", "Bridge",
        "InstrumentalHook", "Chorus", "Outro",
    ],
    &[
        "Intro", "Verse", "PreChorus", "Chorus", "Verse", "PreChorus", "Chorus", "Bridge",
        "Chorus", "Chorus", "Outro",
    ],
];

/// The fully resolved, immutable plan for one composition run
#[derive(Debug, Clone)]
pub struct ParamSet {
    pub seed: u64,
    pub bpm: u32,
    pub target_duration_seconds: u32,

    /// Original (pre-modulation) key
    pub key_root: u8,
    pub is_major: bool,
    pub key_name: &'static str,

    pub song_form: Vec<SectionType>,
    pub schema_name: &'static str,
    pub schema_degrees: Vec<usize>,
    pub seventh_probability: f64,

    pub genre: Genre,
    pub rhythm_personality: RhythmPersonality,
    pub instrumentation_focus: InstrumentationFocus,
    pub instruments: Instruments,

    /// Baseline MIDI velocity for the whole piece
    pub dynamic_level: i32,

    pub complexity_tier: ComplexityTier,
    pub melody_method: MelodyMethod,

    /// Hook motifs land their anchor notes on strong beats
    pub hook_accent_strong: bool,
}

impl ParamSet {
    /// Resolves every run-level decision from the config, drawing from the
    /// seeded stream in a fixed order: tempo, duration, key, form, schema,
    /// instruments, dynamics.
    pub fn resolve(config: &GenerationConfig, seed: u64, rng: &mut Pcg32) -> ParamSet {
        let genre = config.primary_genre;

        let mut bpm: i64 = match config.tempo_preference {
            TempoPreference::VerySlow => rng.gen_range(60..=80),
            TempoPreference::Slow => rng.gen_range(80..=100),
            TempoPreference::Medium => rng.gen_range(100..=120),
            TempoPreference::Fast => rng.gen_range(120..=140),
            TempoPreference::VeryFast => rng.gen_range(140..=165),
            TempoPreference::Any => {
                let base = match genre {
                    Genre::Ballad => rng.gen_range(65..=90),
                    Genre::HipHopGroove => rng.gen_range(80..=105),
                    Genre::EdmPulse => rng.gen_range(120..=135),
                    Genre::RetroSynthwave => rng.gen_range(90..=120),
                    Genre::ModernPop => rng.gen_range(100..=130),
                };
                // Any-tempo tracks the energy level, clamped to a sane band
                match config.energy_level {
                    1 => (base - 20).max(60),
                    2 => (base - 10).max(60),
                    4 => (base + 10).min(180),
                    5 => (base + 20).min(180),
                    _ => base,
                }
            }
        };
        bpm = bpm.clamp(60, 180);

        let target_duration_seconds: i64 = match config.song_length {
            SongLength::Short => rng.gen_range(120..=150),
            SongLength::Radio => rng.gen_range(150..=195),
            SongLength::Standard => rng.gen_range(195..=240),
            SongLength::Extended => rng.gen_range(240..=285),
        };

        let is_major = rng.gen::<f64>() < config.mood.major_key_probability();
        let keys: &[(u8, &'static str)] = if is_major { &MAJOR_KEYS } else { &MINOR_KEYS };
        let (key_root, key_name) = *keys.choose(rng).unwrap_or(&keys[0]);

        let templates: &[FormTemplate; 2] = match config.structural_complexity {
            StructuralComplexity::Simple => &SIMPLE_FORMS,
            StructuralComplexity::Standard => &STANDARD_FORMS,
            StructuralComplexity::Developed => &DEVELOPED_FORMS,
        };
        let form = *templates.choose(rng).unwrap_or(&templates[0]);
        let song_form: Vec<SectionType> = form.iter().map(|s| SectionType::from_string(s)).collect();

        let schema_name: &'static str =
            if config.mood == Mood::MelancholySentimental && rng.gen::<f64>() < 0.7 {
                "vi-IV-I-V"
            } else if config.mood == Mood::UpliftingEnergetic && rng.gen::<f64>() < 0.6 {
                "IV-V-vi-I"
            } else if genre == Genre::Ballad {
                "vi-IV-I-V"
            } else if genre == Genre::RetroSynthwave && rng.gen::<f64>() < 0.5 {
                *["I-V-vi-IV", "vi-IV-I-V"].choose(rng).unwrap_or(&"I-V-vi-IV")
            } else {
                SCHEMAS
                    .choose(rng)
                    .map(|(name, _)| *name)
                    .unwrap_or("I-V-vi-IV")
            };

        let rhythm_personality = match genre {
            Genre::HipHopGroove => RhythmPersonality::HipHopGroove,
            Genre::EdmPulse | Genre::RetroSynthwave => RhythmPersonality::EdmPulse,
            _ => RhythmPersonality::PopRock,
        };

        let focus = config.instrumentation_focus;

        let mut bass = *[33u8, 34, 38].choose(rng).unwrap_or(&33);
        let mut chords = *[0u8, 4, 88].choose(rng).unwrap_or(&0);
        let mut melody = *[80u8, 25, 52].choose(rng).unwrap_or(&80);
        let mut pad = *[89u8, 90, 92].choose(rng).unwrap_or(&89);

        if rhythm_personality != RhythmPersonality::PopRock {
            bass = *[38u8, 39].choose(rng).unwrap_or(&38);
        }
        match genre {
            Genre::Ballad => {
                chords = 0;
                melody = *[25u8, 40, 52].choose(rng).unwrap_or(&25);
                pad = *[48u8, 89].choose(rng).unwrap_or(&48);
            }
            Genre::RetroSynthwave => {
                chords = *[80u8, 81, 88, 89].choose(rng).unwrap_or(&80);
                melody = *[80u8, 81, 84].choose(rng).unwrap_or(&80);
                pad = *[88u8, 89, 90, 91, 92].choose(rng).unwrap_or(&88);
            }
            _ => {}
        }
        match focus {
            InstrumentationFocus::PianoLed => chords = 0,
            InstrumentationFocus::SynthHeavy => {
                chords = *[80u8, 81, 88, 89].choose(rng).unwrap_or(&80);
                melody = *[80u8, 81, 84].choose(rng).unwrap_or(&80);
                pad = *[88u8, 89, 90, 91, 92].choose(rng).unwrap_or(&88);
            }
            InstrumentationFocus::GuitarFocused => {
                chords = *[24u8, 25].choose(rng).unwrap_or(&24);
                melody = *[26u8, 27, 28, 29, 30].choose(rng).unwrap_or(&26);
            }
            _ => {}
        }

        let mut instruments = Instruments {
            bass: Some(bass),
            chords: Some(chords),
            melody: Some(melody),
            pad: Some(pad),
        };
        if focus == InstrumentationFocus::Minimalist {
            instruments.pad = None;
            if rng.gen::<f64>() < 0.5 {
                instruments.chords = None;
            }
        }

        let dynamic_level: i64 = match config.energy_level {
            1 => rng.gen_range(55..=65),
            2 => rng.gen_range(65..=75),
            3 => rng.gen_range(75..=85),
            4 => rng.gen_range(85..=95),
            5 => rng.gen_range(95..=105),
            _ => rng.gen_range(75..=85),
        };

        let complexity_tier = match config.melodic_complexity {
            0..=2 => ComplexityTier::Simple,
            4.. => ComplexityTier::Complex,
            _ => ComplexityTier::Moderate,
        };

        ParamSet {
            seed,
            bpm: bpm as u32,
            target_duration_seconds: target_duration_seconds as u32,
            key_root,
            is_major,
            key_name,
            song_form,
            schema_name,
            schema_degrees: schema_degrees(schema_name).to_vec(),
            seventh_probability: config.harmonic_richness.seventh_probability(),
            genre,
            rhythm_personality,
            instrumentation_focus: focus,
            instruments,
            dynamic_level: dynamic_level as i32,
            complexity_tier,
            melody_method: config.melody_generation_style,
            hook_accent_strong: true,
        }
    }
}

/// One note of a cached motif, relative to the motif start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotifNote {
    pub pitch: i32,

    /// Offset in beats from the motif start
    pub offset: f64,

    pub beats: f64,
}

/// A melodic motif cached per hook section type so repeats of the section
/// restate recognizable material
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Motif {
    pub notes: Vec<MotifNote>,
}

impl Motif {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Duration in beats from motif start to the end of its last note
    pub fn span(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.offset + n.beats)
            .fold(0.0, f64::max)
    }
}

/// Mutable state threaded through one composition run and reset between runs
#[derive(Debug, Clone)]
pub struct RunState {
    /// Key currently in effect (a Bridge may transpose it)
    pub active_key_root: u8,
    pub active_is_major: bool,

    /// Set while composing a modulated Bridge; reverted afterwards
    pub bridge_modulating: bool,

    /// Hook motifs established on first appearance of their section type
    pub motifs: HashMap<SectionType, Motif>,

    /// Hook section types whose motif has been stated at least once
    pub motif_played: HashSet<SectionType>,
}

impl RunState {
    pub fn new(params: &ParamSet) -> Self {
        RunState {
            active_key_root: params.key_root,
            active_is_major: params.is_major,
            bridge_modulating: false,
            motifs: HashMap::new(),
            motif_played: HashSet::new(),
        }
    }

    /// Restore the original key and forget per-run caches
    pub fn reset(&mut self, params: &ParamSet) {
        self.active_key_root = params.key_root;
        self.active_is_major = params.is_major;
        self.bridge_modulating = false;
        self.motifs.clear();
        self.motif_played.clear();
    }
}
