// Generation Config - User-facing style knobs for a composition run
// Every field falls back to a documented default on missing/unrecognized input

use serde::{Deserialize, Serialize};

/// Primary genre - drives rhythm personality, tempo defaults and instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    /// Contemporary pop - the default
    ModernPop,

    /// Slow, sparse, piano-led
    Ballad,

    /// Syncopated kicks and sparse hats
    HipHopGroove,

    /// Four-on-the-floor dance pulse
    EdmPulse,

    /// 80s-flavored synth pop
    RetroSynthwave,
}

impl Genre {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "ModernPop" => Genre::ModernPop,
            "Ballad" => Genre::Ballad,
            "HipHopGroove" => Genre::HipHopGroove,
            "EDMPulse" => Genre::EdmPulse,
            "RetroSynthwave" => Genre::RetroSynthwave,
            _ => Genre::ModernPop, // Default
        }
    }
}

/// Mood - biases the major/minor key choice and harmonic schema weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    UpliftingEnergetic,
    HappyBright,
    NeutralReflective,
    MelancholySentimental,
    DarkIntense,
}

impl Mood {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "UpliftingEnergetic" => Mood::UpliftingEnergetic,
            "HappyBright" => Mood::HappyBright,
            "NeutralReflective" => Mood::NeutralReflective,
            "MelancholySentimental" => Mood::MelancholySentimental,
            "DarkIntense" => Mood::DarkIntense,
            _ => Mood::UpliftingEnergetic, // Default
        }
    }

    /// Probability that the key is major for this mood
    pub fn major_key_probability(&self) -> f64 {
        match self {
            Mood::MelancholySentimental => 0.1,
            Mood::DarkIntense => 0.2,
            Mood::NeutralReflective => 0.5,
            Mood::HappyBright => 0.9,
            Mood::UpliftingEnergetic => 0.85,
        }
    }
}

/// Tempo preference - resolved to a concrete BPM range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoPreference {
    VerySlow,
    Slow,
    Medium,
    Fast,
    VeryFast,

    /// Genre decides, nudged by energy level
    Any,
}

impl TempoPreference {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "VerySlow" => TempoPreference::VerySlow,
            "Slow" => TempoPreference::Slow,
            "Medium" => TempoPreference::Medium,
            "Fast" => TempoPreference::Fast,
            "VeryFast" => TempoPreference::VeryFast,
            "Any" => TempoPreference::Any,
            _ => TempoPreference::Medium, // Default
        }
    }
}

/// Target song length - resolved to a duration budget in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongLength {
    /// ~2:00-2:30
    Short,

    /// ~2:30-3:15 - the default
    Radio,

    /// ~3:15-4:00
    Standard,

    /// ~4:00-4:45
    Extended,
}

impl SongLength {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "Short" => SongLength::Short,
            "Radio" => SongLength::Radio,
            "Standard" => SongLength::Standard,
            "Extended" => SongLength::Extended,
            _ => SongLength::Radio, // Default
        }
    }
}

/// Structural complexity - selects song-form templates and section lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralComplexity {
    Simple,
    Standard,
    Developed,
}

impl StructuralComplexity {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "Simple" => StructuralComplexity::Simple,
            "Standard" => StructuralComplexity::Standard,
            "Developed" => StructuralComplexity::Developed,
            _ => StructuralComplexity::Standard, // Default
        }
    }
}

/// Harmonic richness - how often triads are extended to 7th chords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicRichness {
    TriadsOnly,
    Some7ths,
    Mostly7ths,
}

impl HarmonicRichness {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "TriadsOnly" => HarmonicRichness::TriadsOnly,
            "Some7ths" => HarmonicRichness::Some7ths,
            "Mostly7ths" => HarmonicRichness::Mostly7ths,
            _ => HarmonicRichness::Some7ths, // Default
        }
    }

    /// Probability that a chord is upgraded to its diatonic 7th
    pub fn seventh_probability(&self) -> f64 {
        match self {
            HarmonicRichness::TriadsOnly => 0.0,
            HarmonicRichness::Some7ths => 0.4,
            HarmonicRichness::Mostly7ths => 0.8,
        }
    }
}

/// Instrumentation focus - shifts GM program choices and active layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentationFocus {
    Balanced,
    PianoLed,
    SynthHeavy,
    GuitarFocused,
    Minimalist,
}

impl InstrumentationFocus {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "Balanced" => InstrumentationFocus::Balanced,
            "PianoLed" => InstrumentationFocus::PianoLed,
            "SynthHeavy" => InstrumentationFocus::SynthHeavy,
            "GuitarFocused" => InstrumentationFocus::GuitarFocused,
            "Minimalist" => InstrumentationFocus::Minimalist,
            _ => InstrumentationFocus::Balanced, // Default
        }
    }
}

/// Melody generation strategy
///
/// MarkovChain is accepted as input but currently delegates to the Standard
/// motif-based strategy; a true chain implementation is an open product
/// question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MelodyMethod {
    Standard,
    ContourDriven,
    MarkovChain,
}

impl MelodyMethod {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "Standard" => MelodyMethod::Standard,
            "ContourDriven" => MelodyMethod::ContourDriven,
            "MarkovChain" => MelodyMethod::MarkovChain,
            _ => MelodyMethod::Standard, // Default
        }
    }
}

/// Complete configuration record for one composition run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed; `None` lets the generator pick one
    #[serde(default)]
    pub seed: Option<u64>,

    pub primary_genre: Genre,
    pub mood: Mood,

    /// Energy level 1-5; affects dynamic level and Any-tempo nudges
    pub energy_level: u8,

    pub tempo_preference: TempoPreference,
    pub song_length: SongLength,
    pub structural_complexity: StructuralComplexity,

    /// Melodic complexity 1-5; mapped to an internal Simple/Moderate/Complex tier
    pub melodic_complexity: u8,

    pub harmonic_richness: HarmonicRichness,
    pub instrumentation_focus: InstrumentationFocus,
    pub melody_generation_style: MelodyMethod,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            seed: None,
            primary_genre: Genre::ModernPop,
            mood: Mood::UpliftingEnergetic,
            energy_level: 3,
            tempo_preference: TempoPreference::Medium,
            song_length: SongLength::Radio,
            structural_complexity: StructuralComplexity::Standard,
            melodic_complexity: 3,
            harmonic_richness: HarmonicRichness::Some7ths,
            instrumentation_focus: InstrumentationFocus::Balanced,
            melody_generation_style: MelodyMethod::Standard,
        }
    }
}

impl GenerationConfig {
    /// Build a config from a loosely typed form submission.
    ///
    /// Mirrors the behavior of the web front-end contract: every field is
    /// optional and every unrecognized value silently falls back to its
    /// default, so no invalid state ever reaches the composition engine.
    pub fn from_form(form: &serde_json::Value) -> Self {
        let str_field = |key: &str| form.get(key).and_then(|v| v.as_str()).unwrap_or("");
        let int_field = |key: &str, default: i64| {
            form.get(key)
                .and_then(|v| {
                    v.as_i64()
                        .or_else(|| v.as_str().and_then(|s| s.parse::<i64>().ok()))
                })
                .unwrap_or(default)
        };

        let seed = form.get("seed").and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse::<u64>().ok()))
        });

        GenerationConfig {
            seed,
            primary_genre: Genre::from_string(str_field("primary_genre")),
            mood: Mood::from_string(str_field("mood")),
            energy_level: int_field("energy_level", 3).clamp(1, 5) as u8,
            tempo_preference: TempoPreference::from_string(str_field("tempo_preference")),
            song_length: SongLength::from_string(str_field("song_length")),
            structural_complexity: StructuralComplexity::from_string(str_field(
                "structural_complexity",
            )),
            melodic_complexity: int_field("melodic_complexity", 3).clamp(1, 5) as u8,
            harmonic_richness: HarmonicRichness::from_string(str_field("harmonic_richness")),
            instrumentation_focus: InstrumentationFocus::from_string(str_field(
                "instrumentation_focus",
            )),
            melody_generation_style: MelodyMethod::from_string(str_field(
                "melody_generation_style",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_from_string() {
        assert_eq!(Genre::from_string("EDMPulse"), Genre::EdmPulse);
        assert_eq!(Genre::from_string("bogus"), Genre::ModernPop);
        assert_eq!(Mood::from_string("DarkIntense"), Mood::DarkIntense);
        assert_eq!(Mood::from_string(""), Mood::UpliftingEnergetic);
        assert_eq!(
            TempoPreference::from_string("nonsense"),
            TempoPreference::Medium
        );
        assert_eq!(MelodyMethod::from_string("MarkovChain"), MelodyMethod::MarkovChain);
    }

    #[test]
    fn test_seventh_probability_table() {
        assert_eq!(HarmonicRichness::TriadsOnly.seventh_probability(), 0.0);
        assert_eq!(HarmonicRichness::Some7ths.seventh_probability(), 0.4);
        assert_eq!(HarmonicRichness::Mostly7ths.seventh_probability(), 0.8);
    }

    #[test]
    fn test_from_form_full() {
        let form = json!({
            "seed": "42",
            "primary_genre": "HipHopGroove",
            "mood": "HappyBright",
            "energy_level": "4",
            "tempo_preference": "Fast",
            "song_length": "Extended",
            "structural_complexity": "Developed",
            "melodic_complexity": 5,
            "harmonic_richness": "Mostly7ths",
            "instrumentation_focus": "SynthHeavy",
            "melody_generation_style": "ContourDriven"
        });

        let config = GenerationConfig::from_form(&form);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.primary_genre, Genre::HipHopGroove);
        assert_eq!(config.mood, Mood::HappyBright);
        assert_eq!(config.energy_level, 4);
        assert_eq!(config.tempo_preference, TempoPreference::Fast);
        assert_eq!(config.song_length, SongLength::Extended);
        assert_eq!(config.melodic_complexity, 5);
        assert_eq!(
            config.melody_generation_style,
            MelodyMethod::ContourDriven
        );
    }

    #[test]
    fn test_from_form_fallbacks() {
        // Empty form -> all defaults, no seed
        let config = GenerationConfig::from_form(&json!({}));
        assert_eq!(config.seed, None);
        assert_eq!(config.primary_genre, Genre::ModernPop);
        assert_eq!(config.energy_level, 3);

        // Garbage values fall back field by field
        let form = json!({
            "seed": "not-a-number",
            "primary_genre": "Jazz",
            "energy_level": 99,
            "melodic_complexity": -3
        });
        let config = GenerationConfig::from_form(&form);
        assert_eq!(config.seed, None);
        assert_eq!(config.primary_genre, Genre::ModernPop);
        assert_eq!(config.energy_level, 5); // clamped
        assert_eq!(config.melodic_complexity, 1); // clamped
    }

    #[test]
    fn test_serde_round_trip() {
        let config = GenerationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: GenerationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.primary_genre, config.primary_genre);
        assert_eq!(back.melody_generation_style, config.melody_generation_style);
    }
}
