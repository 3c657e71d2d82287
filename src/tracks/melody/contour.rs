// Contour-Driven Melody - Notes traced along named pitch-height curves
// Each chord gets a contour; target heights are snapped to the nearest
// chord or scale tone, with leaps clamped for smoothness

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::params::{ComplexityTier, ParamSet, RunState};
use crate::sections::{MelodyStyle, SectionProfile, SectionType};
use crate::theory::{scale_tones, Chord, ScaleKind};
use crate::timeline::{Timeline, TrackId};

use super::{fold_to_melodic_range, MelodyGenerator};

/// Named contour shapes: relative heights in [0, 1] across the phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourShape {
    ArchSimple,
    ArchBroad,
    ValleySimple,
    ValleyBroad,
    AscendingGentle,
    DescendingGentle,
    WaveSimple,
    PlateauHigh,
    PlateauLow,

    /// Erratic shape regenerated per use
    RandomWalk,
}

const ALL_SHAPES: [ContourShape; 10] = [
    ContourShape::ArchSimple,
    ContourShape::ArchBroad,
    ContourShape::ValleySimple,
    ContourShape::ValleyBroad,
    ContourShape::AscendingGentle,
    ContourShape::DescendingGentle,
    ContourShape::WaveSimple,
    ContourShape::PlateauHigh,
    ContourShape::PlateauLow,
    ContourShape::RandomWalk,
];

const HOOK_SHAPES: [ContourShape; 3] = [
    ContourShape::ArchSimple,
    ContourShape::WaveSimple,
    ContourShape::PlateauHigh,
];

const BRIDGE_SHAPES: [ContourShape; 4] = [
    ContourShape::ValleyBroad,
    ContourShape::ArchBroad,
    ContourShape::DescendingGentle,
    ContourShape::AscendingGentle,
];

impl ContourShape {
    fn heights(&self, rng: &mut Pcg32) -> Vec<f64> {
        match self {
            ContourShape::ArchSimple => vec![0.0, 0.5, 1.0, 0.5, 0.0],
            ContourShape::ArchBroad => vec![0.0, 0.2, 0.5, 0.8, 1.0, 0.8, 0.5, 0.2, 0.0],
            ContourShape::ValleySimple => vec![1.0, 0.5, 0.0, 0.5, 1.0],
            ContourShape::ValleyBroad => vec![1.0, 0.8, 0.5, 0.2, 0.0, 0.2, 0.5, 0.8, 1.0],
            ContourShape::AscendingGentle => {
                vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
            }
            ContourShape::DescendingGentle => {
                vec![1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0]
            }
            ContourShape::WaveSimple => vec![0.0, 0.7, 1.0, 0.3, 0.0, 0.5, 0.8, 0.2],
            ContourShape::PlateauHigh => vec![0.2, 0.8, 1.0, 1.0, 1.0, 0.8, 0.2],
            ContourShape::PlateauLow => vec![0.8, 0.2, 0.0, 0.0, 0.0, 0.2, 0.8],
            ContourShape::RandomWalk => {
                let len = rng.gen_range(5..=9);
                (0..len).map(|_| rng.gen_range(0.2..0.8)).collect()
            }
        }
    }
}

/// Snaps a target pitch to the nearest chord tone, falling back to scale
/// tones, preferring the candidate closer to the previous pitch on ties.
fn snap_to_harmony(
    target: i32,
    chord_pcs: &[u8],
    scale_pcs: &[u8],
    last_pitch: Option<i32>,
) -> i32 {
    let octave = target.div_euclid(12);
    let mut best = target;
    let mut best_dist = i32::MAX;

    let mut consider = |candidate: i32| {
        let dist = (candidate - target).abs();
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        } else if dist == best_dist {
            if let Some(last) = last_pitch {
                if (candidate - last).abs() < (best - last).abs() {
                    best = candidate;
                }
            }
        }
    };

    for &pc in chord_pcs.iter().chain(scale_pcs.iter()) {
        for oct in [octave - 1, octave, octave + 1] {
            consider(oct * 12 + pc as i32);
        }
    }

    best
}

/// The contour-driven melody strategy
pub struct ContourDriven;

impl MelodyGenerator for ContourDriven {
    fn render(
        &self,
        timeline: &mut Timeline,
        progression: &[Chord],
        start_beat: f64,
        section: SectionType,
        profile: &SectionProfile,
        params: &ParamSet,
        state: &mut RunState,
        rng: &mut Pcg32,
    ) {
        let key_root = state.active_key_root;
        let is_major = state.active_is_major;
        let tier = params.complexity_tier;
        let bridge = profile.melody_style == MelodyStyle::BridgeDistinct;
        let is_hook = section.is_hook();

        let mut base_velocity = profile.velocity_base + rng.gen_range(5..=10);
        if profile.is_peak_section {
            base_velocity = (base_velocity + 10).min(127);
        }

        let total_beats: f64 = progression.iter().map(|c| c.beats).sum();
        let section_end = start_beat + total_beats;
        let mut current_beat = start_beat;
        let mut last_pitch: Option<i32> = None;

        for chord in progression {
            let shape = if bridge {
                *BRIDGE_SHAPES.choose(rng).unwrap_or(&ContourShape::ArchBroad)
            } else if is_hook {
                *HOOK_SHAPES.choose(rng).unwrap_or(&ContourShape::ArchSimple)
            } else {
                *ALL_SHAPES.choose(rng).unwrap_or(&ContourShape::ArchSimple)
            };
            let heights = shape.heights(rng);

            let mut phrase_octave: i32 = 5;
            if bridge && rng.gen::<f64>() < 0.4 {
                phrase_octave = *[4, 6].choose(rng).unwrap_or(&5);
            }

            let chord_pcs = chord.quality.pitch_classes(chord.root);
            let center_pc = *chord_pcs.choose(rng).unwrap_or(&(key_root % 12));
            let center = phrase_octave * 12 + center_pc as i32;

            let range_semitones: i32 = if bridge {
                rng.gen_range(7..=12)
            } else {
                match tier {
                    ComplexityTier::Simple => 5,
                    ComplexityTier::Moderate => 7,
                    ComplexityTier::Complex => 10,
                }
            };

            let note_count = if bridge {
                ((chord.beats * (0.5 + rng.gen::<f64>())) as usize).max(1)
            } else {
                let density = 1.5
                    + profile.rhythmic_density
                    + if tier == ComplexityTier::Complex { 0.5 } else { 0.0 };
                ((chord.beats * density) as usize).max(1)
            };
            let beat_step = chord.beats / note_count as f64;

            let scale_pcs = if bridge || rng.gen::<f64>() < 0.3 {
                scale_tones(key_root, is_major, ScaleKind::Diatonic)
            } else if is_major {
                scale_tones(key_root, is_major, ScaleKind::MajorPentatonic)
            } else {
                scale_tones(key_root, is_major, ScaleKind::MinorPentatonic)
            };

            for note_idx in 0..note_count {
                let offset = note_idx as f64 * beat_step;

                // Linear interpolation along the contour
                let progress = if note_count > 1 {
                    note_idx as f64 / (note_count - 1) as f64
                } else {
                    0.5
                };
                let point = progress * (heights.len() - 1) as f64;
                let idx1 = point as usize;
                let idx2 = (idx1 + 1).min(heights.len() - 1);
                let interp = point - idx1 as f64;
                let height = heights[idx1] + (heights[idx2] - heights[idx1]) * interp;

                let target =
                    center + ((height - 0.5) * range_semitones as f64).round() as i32;
                let target = fold_to_melodic_range(target);

                let mut pitch =
                    fold_to_melodic_range(snap_to_harmony(target, &chord_pcs, &scale_pcs, last_pitch));

                let mut max_leap = if bridge { 10 } else { 7 };
                if tier == ComplexityTier::Complex {
                    max_leap += 3;
                }
                if let Some(last) = last_pitch {
                    if (pitch - last).abs() > max_leap {
                        let dir = if pitch > last { 1 } else { -1 };
                        pitch = fold_to_melodic_range(
                            last + dir * rng.gen_range(1..=max_leap.min(5)),
                        );
                    }
                }

                let mut beats = beat_step;
                if rng.gen::<f64>() < 0.3 {
                    beats = *[beat_step * 0.5, beat_step * 1.5, beat_step * 0.75]
                        .choose(rng)
                        .unwrap_or(&beat_step);
                    beats = beats.max(0.125).min(chord.beats - offset);
                }
                let note_start = current_beat + offset;
                if note_start + beats > section_end + 0.01 {
                    beats = section_end - note_start;
                }
                if beats < 0.125 {
                    continue;
                }

                let mut velocity = base_velocity;
                let bar_downbeat = note_start % 4.0 < 0.1;
                let half_bar = note_start % 2.0 < 0.1;
                if is_hook && params.hook_accent_strong && (bar_downbeat || half_bar) {
                    velocity = (base_velocity + 10).min(127);
                }

                timeline.add_note(TrackId::Melody, pitch, note_start, beats * 0.98, velocity);
                last_pitch = Some(pitch);
            }

            current_beat += chord.beats;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, MelodyMethod};
    use crate::sections::{Layer, LayerCategory, LayerIntensity};
    use crate::theory::ChordQuality;
    use rand::SeedableRng;

    fn setup() -> (ParamSet, RunState) {
        let mut config = GenerationConfig::default();
        config.melody_generation_style = MelodyMethod::ContourDriven;
        let mut rng = Pcg32::seed_from_u64(41);
        let params = ParamSet::resolve(&config, 41, &mut rng);
        let state = RunState::new(&params);
        (params, state)
    }

    fn profile(style: MelodyStyle) -> SectionProfile {
        SectionProfile {
            velocity_base: 85,
            rhythmic_density: 1.0,
            layers: vec![Layer::new(LayerCategory::Melody, LayerIntensity::Full)],
            fills_enabled: false,
            build_tension: false,
            is_peak_section: false,
            modulate_key: false,
            allow_rhythmic_break: false,
            melody_style: style,
        }
    }

    fn prog() -> Vec<Chord> {
        [0, 7, 9, 5]
            .iter()
            .map(|&pc| Chord { root: pc, quality: ChordQuality::Major, beats: 4.0 })
            .collect()
    }

    #[test]
    fn test_fixed_shapes_have_expected_extremes() {
        let mut rng = Pcg32::seed_from_u64(1);
        let arch = ContourShape::ArchSimple.heights(&mut rng);
        assert_eq!(arch.first(), Some(&0.0));
        assert_eq!(arch[arch.len() / 2], 1.0);
        let valley = ContourShape::ValleySimple.heights(&mut rng);
        assert_eq!(valley[valley.len() / 2], 0.0);
    }

    #[test]
    fn test_random_walk_stays_mid_range() {
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let heights = ContourShape::RandomWalk.heights(&mut rng);
            assert!((5..=9).contains(&heights.len()));
            assert!(heights.iter().all(|&h| (0.2..0.8).contains(&h)));
        }
    }

    #[test]
    fn test_snap_moves_to_nearest_harmony_tone() {
        // Target B4 (71) against a bare C triad pool: C5 (72) is closest
        let snapped = snap_to_harmony(71, &[0, 4, 7], &[0, 4, 7], None);
        assert_eq!(snapped, 72);
    }

    #[test]
    fn test_snap_exact_tone_is_kept() {
        let snapped = snap_to_harmony(64, &[0, 4, 7], &[0, 2, 4, 5, 7, 9, 11], None);
        assert_eq!(snapped, 64);
    }

    #[test]
    fn test_all_pitches_in_melodic_register() {
        let (params, mut state) = setup();
        for seed in 0..25 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut timeline = Timeline::new();
            ContourDriven.render(
                &mut timeline, &prog(), 0.0, SectionType::Verse,
                &profile(MelodyStyle::Standard), &params, &mut state, &mut rng,
            );
            assert!(!timeline.events().is_empty());
            assert!(
                timeline.events().iter().all(|e| (48..=84).contains(&e.pitch)),
                "seed {}",
                seed
            );
        }
    }

    #[test]
    fn test_notes_never_bleed_past_section() {
        let (params, mut state) = setup();
        for seed in 0..25 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut timeline = Timeline::new();
            ContourDriven.render(
                &mut timeline, &prog(), 32.0, SectionType::Chorus,
                &profile(MelodyStyle::Standard), &params, &mut state, &mut rng,
            );
            for event in timeline.events() {
                assert!(
                    event.start_beat + event.beats <= 48.0 + 0.01,
                    "seed {} event at {}",
                    seed,
                    event.start_beat
                );
            }
        }
    }

    #[test]
    fn test_bridge_is_sparser_than_chorus() {
        let (params, mut state) = setup();
        let mut bridge_total = 0usize;
        let mut chorus_total = 0usize;
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut timeline = Timeline::new();
            ContourDriven.render(
                &mut timeline, &prog(), 0.0, SectionType::Bridge,
                &profile(MelodyStyle::BridgeDistinct), &params, &mut state, &mut rng,
            );
            bridge_total += timeline.events().len();

            let mut rng = Pcg32::seed_from_u64(seed + 1000);
            let mut timeline = Timeline::new();
            ContourDriven.render(
                &mut timeline, &prog(), 0.0, SectionType::Chorus,
                &profile(MelodyStyle::Standard), &params, &mut state, &mut rng,
            );
            chorus_total += timeline.events().len();
        }
        assert!(bridge_total < chorus_total);
    }
}
