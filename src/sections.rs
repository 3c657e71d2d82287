// Section Profiles - Declarative per-section arrangement decisions
// Maps section type + global dynamic level to layers, density and flags

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{Genre, InstrumentationFocus};
use crate::params::ParamSet;

/// Structural section types making up a song form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    InstrumentalHook,
    Bridge,
    Outro,
}

impl SectionType {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Self {
        match s {
            "Intro" => SectionType::Intro,
            "Verse" => SectionType::Verse,
            "PreChorus" => SectionType::PreChorus,
            "Chorus" => SectionType::Chorus,
            "InstrumentalHook" => SectionType::InstrumentalHook,
            "Bridge" => SectionType::Bridge,
            "Outro" => SectionType::Outro,
            _ => SectionType::Verse, // Default
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Intro => "Intro",
            SectionType::Verse => "Verse",
            SectionType::PreChorus => "PreChorus",
            SectionType::Chorus => "Chorus",
            SectionType::InstrumentalHook => "InstrumentalHook",
            SectionType::Bridge => "Bridge",
            SectionType::Outro => "Outro",
        }
    }

    /// Hook sections establish and repeat a cached melodic motif
    pub fn is_hook(&self) -> bool {
        matches!(self, SectionType::Chorus | SectionType::InstrumentalHook)
    }
}

/// Instrument layer category; presence checks are membership tests on this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerCategory {
    Drums,
    Bass,
    Chords,
    Melody,
    Pad,
    CounterMelody,
}

/// Coarse per-layer intensity tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerIntensity {
    Sparse,
    Light,
    Standard,
    Active,
    Full,
}

/// An active instrument layer in a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub category: LayerCategory,
    pub intensity: LayerIntensity,
}

impl Layer {
    pub fn new(category: LayerCategory, intensity: LayerIntensity) -> Self {
        Layer { category, intensity }
    }
}

/// Melody flavor of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MelodyStyle {
    Standard,

    /// Bridges use wider leaps, longer durations and the full diatonic scale
    BridgeDistinct,
}

/// Derived, per-section-instance arrangement profile
#[derive(Debug, Clone)]
pub struct SectionProfile {
    /// Baseline MIDI velocity for the section
    pub velocity_base: i32,

    /// Multiplier on rhythmic note density
    pub rhythmic_density: f64,

    /// Instrument layers active in this section
    pub layers: Vec<Layer>,

    pub fills_enabled: bool,
    pub build_tension: bool,
    pub is_peak_section: bool,
    pub modulate_key: bool,
    pub allow_rhythmic_break: bool,
    pub melody_style: MelodyStyle,
}

impl SectionProfile {
    /// Category membership test
    pub fn has_layer(&self, category: LayerCategory) -> bool {
        self.layers.iter().any(|l| l.category == category)
    }
}

use LayerCategory as C;
use LayerIntensity as I;

fn layer(category: LayerCategory, intensity: LayerIntensity) -> Layer {
    Layer::new(category, intensity)
}

/// Resolves the arrangement profile for one section instance.
///
/// Ballad dampens density and baseline velocity globally before the
/// per-section tables apply. Minimalist focus strips layers down, with a
/// guarantee that at least one melodic or harmonic layer survives.
pub fn resolve_profile(
    section: SectionType,
    dynamic_level: i32,
    params: &ParamSet,
    rng: &mut Pcg32,
) -> SectionProfile {
    let minimalist = params.instrumentation_focus == InstrumentationFocus::Minimalist;

    let mut profile = SectionProfile {
        velocity_base: dynamic_level,
        rhythmic_density: 1.0,
        layers: vec![layer(C::Chords, I::Standard)],
        fills_enabled: false,
        build_tension: false,
        is_peak_section: false,
        modulate_key: false,
        allow_rhythmic_break: false,
        melody_style: MelodyStyle::Standard,
    };

    let mut base = dynamic_level;
    if params.genre == Genre::Ballad {
        profile.rhythmic_density *= 0.7;
        base = (base - 10).max(50);
    }

    match section {
        SectionType::Intro => {
            profile.velocity_base = (base - 35).max(40);
            let options: [&[Layer]; 3] = [
                &[layer(C::Chords, I::Standard), layer(C::Pad, I::Standard)],
                &[layer(C::Melody, I::Sparse), layer(C::Pad, I::Standard)],
                &[layer(C::Chords, I::Standard)],
            ];
            profile.layers = options.choose(rng).map(|l| l.to_vec()).unwrap_or_default();
            if minimalist {
                let solo = [
                    layer(C::Chords, I::Standard),
                    layer(C::Pad, I::Standard),
                    layer(C::Melody, I::Sparse),
                ];
                profile.layers = vec![*solo.choose(rng).unwrap_or(&solo[0])];
            }
            profile.rhythmic_density *= 0.5;
        }
        SectionType::Verse => {
            profile.velocity_base = (base - 25).max(50);
            profile.layers = vec![
                layer(C::Drums, I::Light),
                layer(C::Bass, I::Standard),
                layer(C::Chords, I::Standard),
                layer(C::Melody, I::Standard),
            ];
            if rng.gen::<f64>() < 0.4 && !minimalist {
                profile.layers.push(layer(C::Pad, I::Light));
            }
            if minimalist {
                profile.layers = vec![layer(C::Bass, I::Standard), layer(C::Melody, I::Standard)];
            }
            profile.rhythmic_density *= 0.8;
            profile.fills_enabled = true;
        }
        SectionType::PreChorus => {
            profile.velocity_base = (base - 20).max(55);
            profile.layers = vec![
                layer(C::Drums, I::Active),
                layer(C::Bass, I::Active),
                layer(C::Chords, I::Active),
                layer(C::Melody, I::Active),
                layer(C::Pad, I::Active),
            ];
            if minimalist {
                profile.layers = vec![
                    layer(C::Drums, I::Active),
                    layer(C::Bass, I::Active),
                    layer(C::Melody, I::Active),
                ];
            }
            profile.rhythmic_density *= 1.2;
            profile.build_tension = true;
            profile.fills_enabled = true;
        }
        SectionType::Chorus => {
            profile.velocity_base = (base + 10).min(115);
            profile.layers = vec![
                layer(C::Drums, I::Full),
                layer(C::Bass, I::Full),
                layer(C::Chords, I::Full),
                layer(C::Melody, I::Full),
                layer(C::Pad, I::Full),
            ];
            if rng.gen::<f64>() < 0.5 && !minimalist {
                profile.layers.push(layer(C::CounterMelody, I::Light));
            }
            if minimalist {
                profile.layers = vec![
                    layer(C::Drums, I::Full),
                    layer(C::Bass, I::Full),
                    layer(C::Melody, I::Full),
                ];
            }
            profile.fills_enabled = true;
            profile.is_peak_section = true;
        }
        SectionType::InstrumentalHook => {
            profile.velocity_base = (base + 5).min(110);
            profile.layers = vec![
                layer(C::Drums, I::Full),
                layer(C::Bass, I::Full),
                layer(C::Chords, I::Full),
                layer(C::Melody, I::Full),
                layer(C::Pad, I::Full),
            ];
            if minimalist {
                profile.layers = vec![
                    layer(C::Drums, I::Full),
                    layer(C::Bass, I::Full),
                    layer(C::Melody, I::Full),
                ];
            }
            profile.fills_enabled = true;
            profile.is_peak_section = true;
            profile.allow_rhythmic_break = rng.gen::<f64>() < 0.3;
        }
        SectionType::Bridge => {
            profile.velocity_base = (base - 30).max(45);
            profile.modulate_key = rng.gen::<f64>() < 0.5;
            profile.melody_style = MelodyStyle::BridgeDistinct;
            if profile.modulate_key {
                profile.layers = vec![
                    layer(C::Drums, I::Light),
                    layer(C::Bass, I::Standard),
                    layer(C::Chords, I::Standard),
                    layer(C::Melody, I::Standard),
                    layer(C::Pad, I::Standard),
                ];
            } else if rng.gen::<f64>() < 0.6 {
                let options: [&[Layer]; 3] = [
                    &[layer(C::Chords, I::Sparse), layer(C::Pad, I::Standard)],
                    &[layer(C::Bass, I::Light), layer(C::Pad, I::Light)],
                    &[layer(C::Melody, I::Sparse)],
                ];
                profile.layers = options.choose(rng).map(|l| l.to_vec()).unwrap_or_default();
            } else {
                profile.layers = vec![
                    layer(C::Drums, I::Light),
                    layer(C::Bass, I::Standard),
                    layer(C::Chords, I::Standard),
                    layer(C::Melody, I::Standard),
                    layer(C::Pad, I::Standard),
                ];
            }
            if minimalist && !profile.modulate_key {
                let solo = [layer(C::Melody, I::Sparse), layer(C::Chords, I::Sparse)];
                profile.layers = vec![*solo.choose(rng).unwrap_or(&solo[0])];
            }
            profile.rhythmic_density *= if profile.modulate_key { 0.7 } else { 0.6 };
            profile.allow_rhythmic_break = rng.gen::<f64>() < 0.2;
            profile.fills_enabled = true;
        }
        SectionType::Outro => {
            profile.velocity_base = (base - 40).max(35);
            profile.rhythmic_density *= 0.5;
            let options: [&[Layer]; 3] = [
                &[layer(C::Chords, I::Sparse), layer(C::Pad, I::Sparse)],
                &[layer(C::Melody, I::Sparse)],
                &[layer(C::Chords, I::Sparse)],
            ];
            profile.layers = options.choose(rng).map(|l| l.to_vec()).unwrap_or_default();
            if minimalist {
                let solo = [layer(C::Melody, I::Sparse), layer(C::Chords, I::Sparse)];
                profile.layers = vec![*solo.choose(rng).unwrap_or(&solo[0])];
            }
        }
    }

    // Minimalist sections must keep at least one melodic or harmonic layer
    if minimalist {
        let has_melodic_or_harmonic = profile
            .layers
            .iter()
            .any(|l| matches!(l.category, C::Chords | C::Melody));
        if !has_melodic_or_harmonic {
            if params.instruments.melody.is_some() {
                profile.layers.push(layer(C::Melody, I::Standard));
            } else if params.instruments.chords.is_some() {
                profile.layers.push(layer(C::Chords, I::Standard));
            }
        }
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use rand::SeedableRng;

    fn test_params(mutate: impl FnOnce(&mut GenerationConfig)) -> ParamSet {
        let mut config = GenerationConfig::default();
        mutate(&mut config);
        let mut rng = Pcg32::seed_from_u64(1);
        ParamSet::resolve(&config, 1, &mut rng)
    }

    #[test]
    fn test_section_type_from_string() {
        assert_eq!(SectionType::from_string("Chorus"), SectionType::Chorus);
        assert_eq!(SectionType::from_string("unknown"), SectionType::Verse);
        assert!(SectionType::InstrumentalHook.is_hook());
        assert!(!SectionType::Bridge.is_hook());
    }

    #[test]
    fn test_chorus_profile_is_peak() {
        let params = test_params(|_| {});
        let mut rng = Pcg32::seed_from_u64(9);
        let profile = resolve_profile(SectionType::Chorus, 80, &params, &mut rng);

        assert_eq!(profile.velocity_base, 90);
        assert!(profile.is_peak_section);
        assert!(profile.fills_enabled);
        assert!(!profile.build_tension);
        assert!(profile.has_layer(C::Drums));
        assert!(profile.has_layer(C::Bass));
        assert!(profile.has_layer(C::Melody));
        assert!(profile.has_layer(C::Pad));
    }

    #[test]
    fn test_prechorus_builds_tension() {
        let params = test_params(|_| {});
        let mut rng = Pcg32::seed_from_u64(9);
        let profile = resolve_profile(SectionType::PreChorus, 80, &params, &mut rng);

        assert!(profile.build_tension);
        assert!((profile.rhythmic_density - 1.2).abs() < 1e-9);
        assert_eq!(profile.velocity_base, 60);
    }

    #[test]
    fn test_intro_is_quiet_and_sparse() {
        let params = test_params(|_| {});
        let mut rng = Pcg32::seed_from_u64(9);
        let profile = resolve_profile(SectionType::Intro, 80, &params, &mut rng);

        assert_eq!(profile.velocity_base, 45);
        assert!((profile.rhythmic_density - 0.5).abs() < 1e-9);
        assert!(!profile.has_layer(C::Drums));
        assert!(!profile.has_layer(C::Bass));
    }

    #[test]
    fn test_velocity_floors_apply() {
        let params = test_params(|_| {});
        let mut rng = Pcg32::seed_from_u64(9);
        // Very low dynamic level bottoms out at the per-section floors
        let intro = resolve_profile(SectionType::Intro, 40, &params, &mut rng);
        assert_eq!(intro.velocity_base, 40);
        let outro = resolve_profile(SectionType::Outro, 40, &params, &mut rng);
        assert_eq!(outro.velocity_base, 35);
    }

    #[test]
    fn test_ballad_dampens_density_and_velocity() {
        let params = test_params(|c| c.primary_genre = crate::config::Genre::Ballad);
        let mut rng = Pcg32::seed_from_u64(9);
        let profile = resolve_profile(SectionType::Verse, 80, &params, &mut rng);

        // Ballad: density 0.7 then verse 0.8; velocity base 80-10-25
        assert!((profile.rhythmic_density - 0.56).abs() < 1e-9);
        assert_eq!(profile.velocity_base, 50.max(70 - 25));
    }

    #[test]
    fn test_bridge_always_distinct_melody_style() {
        let params = test_params(|_| {});
        for seed in 0..25 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let profile = resolve_profile(SectionType::Bridge, 80, &params, &mut rng);
            assert_eq!(profile.melody_style, MelodyStyle::BridgeDistinct);
            assert!(profile.fills_enabled);
        }
    }

    #[test]
    fn test_minimalist_keeps_melodic_or_harmonic_layer() {
        let params = test_params(|c| {
            c.instrumentation_focus = InstrumentationFocus::Minimalist;
        });
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            for section in [
                SectionType::Intro,
                SectionType::Verse,
                SectionType::PreChorus,
                SectionType::Chorus,
                SectionType::InstrumentalHook,
                SectionType::Bridge,
                SectionType::Outro,
            ] {
                let profile = resolve_profile(section, 80, &params, &mut rng);
                assert!(
                    profile
                        .layers
                        .iter()
                        .any(|l| matches!(l.category, C::Chords | C::Melody)),
                    "section {:?} seed {} lost all melodic/harmonic layers",
                    section,
                    seed
                );
            }
        }
    }
}
