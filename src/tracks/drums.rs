// Drum Renderer - Genre-personality kit patterns, fills, breaks and crashes
// All pitches are GM percussion key numbers on channel 10

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::Genre;
use crate::params::{ParamSet, RhythmPersonality};
use crate::sections::{SectionProfile, SectionType};
use crate::timeline::{Timeline, TrackId};

const CRASH: i32 = 49;
const RIDE: i32 = 51;

/// GM kit pieces for one rhythm personality
struct Kit {
    kick: i32,
    snare: i32,
    closed_hh: i32,
    open_hh: i32,
}

fn kit_for(personality: RhythmPersonality) -> Kit {
    match personality {
        RhythmPersonality::HipHopGroove => Kit {
            kick: 35,
            snare: 40,
            closed_hh: 22,
            open_hh: 26,
        },
        _ => Kit {
            kick: 36,
            snare: 38,
            closed_hh: 42,
            open_hh: 46,
        },
    }
}

/// Named fill figures. Each note is (pitch, offset back from the bar end,
/// duration); larger offsets land earlier in the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillPattern {
    StandardSnareRoll,
    TomRollSimple,
    HipHopStutterSnare,
    EdmNoiseSweep,
    KickAndCymbalTransition,
    SparseTomAccent,
    SyncopatedSnarePop,
}

impl FillPattern {
    fn notes(&self) -> &'static [(i32, f64, f64)] {
        match self {
            FillPattern::StandardSnareRoll => &[
                (38, 1.0, 0.25),
                (38, 0.75, 0.25),
                (38, 0.5, 0.25),
                (38, 0.25, 0.25),
            ],
            FillPattern::TomRollSimple => &[(48, 1.0, 0.33), (45, 0.66, 0.33), (41, 0.33, 0.33)],
            FillPattern::HipHopStutterSnare => &[
                (40, 1.0, 0.125),
                (22, 0.875, 0.125),
                (40, 0.75, 0.125),
                (22, 0.625, 0.125),
                (40, 0.5, 0.125),
                (22, 0.375, 0.125),
                (40, 0.25, 0.125),
            ],
            FillPattern::EdmNoiseSweep => &[
                (46, 1.0, 0.25),
                (46, 0.75, 0.25),
                (46, 0.5, 0.25),
                (46, 0.25, 0.25),
            ],
            FillPattern::KickAndCymbalTransition => &[(36, 1.0, 0.5), (49, 0.5, 0.5)],
            FillPattern::SparseTomAccent => &[(45, 0.5, 0.25), (41, 0.25, 0.25)],
            FillPattern::SyncopatedSnarePop => &[(38, 1.0, 0.25), (38, 0.5, 0.25)],
        }
    }
}

/// Renders the drum part for one section.
///
/// Ballads drop the kit entirely for a section 40% of the time. PreChorus
/// builds ramp velocity across the section; peak sections get a crash every
/// four bars; the last bar of a fill-enabled section usually carries a fill.
pub fn render_drums(
    timeline: &mut Timeline,
    start_beat: f64,
    bars: u32,
    section: SectionType,
    profile: &SectionProfile,
    params: &ParamSet,
    rng: &mut Pcg32,
) {
    let personality = params.rhythm_personality;
    let kit = kit_for(personality);
    let is_ballad = params.genre == Genre::Ballad;

    if is_ballad && rng.gen::<f64>() < 0.4 {
        return;
    }

    for bar_idx in 0..bars {
        let bar_start = start_beat + bar_idx as f64 * 4.0;

        let mut bar_velocity = profile.velocity_base;
        if profile.build_tension {
            let progress = bar_idx as f64 / bars as f64;
            bar_velocity = ((profile.velocity_base as f64 + 15.0 * progress) as i32).min(115);
        }

        // Mid-section silence for dramatic effect
        if profile.allow_rhythmic_break && bar_idx == bars / 2 && bars > 2 && rng.gen::<f64>() < 0.5
        {
            log::debug!("drum break in {} at bar {}", section.as_str(), bar_idx + 1);
            if rng.gen::<f64>() < 0.7 {
                timeline.add_note(TrackId::Drums, CRASH, bar_start, 2.0, bar_velocity - 10);
            }
            continue;
        }

        let kick_vel = (bar_velocity + 5).min(127);
        let snare_vel = (bar_velocity + 10).min(127);
        let hat_vel = (bar_velocity - if is_ballad { 25 } else { 20 }).max(30);

        match personality {
            RhythmPersonality::EdmPulse => {
                for i in 0..4 {
                    timeline.add_note(TrackId::Drums, kit.kick, bar_start + i as f64, 0.5, kick_vel);
                }
                timeline.add_note(TrackId::Drums, kit.snare, bar_start + 1.0, 0.5, snare_vel);
                timeline.add_note(TrackId::Drums, kit.snare, bar_start + 3.0, 0.5, snare_vel);
                for i in 0..8 {
                    if i % 2 == 1 {
                        timeline.add_note(
                            TrackId::Drums,
                            kit.closed_hh,
                            bar_start + i as f64 * 0.5,
                            0.25,
                            hat_vel,
                        );
                    }
                }
            }
            RhythmPersonality::HipHopGroove => {
                timeline.add_note(TrackId::Drums, kit.kick, bar_start, 0.5, kick_vel);
                if rng.gen::<f64>() < 0.6 {
                    let offset = *[0.75, 1.5, 1.75].choose(rng).unwrap_or(&0.75);
                    timeline.add_note(TrackId::Drums, kit.kick, bar_start + offset, 0.25, bar_velocity);
                }
                timeline.add_note(TrackId::Drums, kit.snare, bar_start + 1.0, 0.5, snare_vel);
                let second_kick_vel = if rng.gen::<f64>() < 0.7 { kick_vel } else { bar_velocity };
                timeline.add_note(TrackId::Drums, kit.kick, bar_start + 2.0, 0.5, second_kick_vel);
                if rng.gen::<f64>() < 0.4 {
                    let offset = *[2.5, 2.75, 3.5].choose(rng).unwrap_or(&2.5);
                    timeline.add_note(TrackId::Drums, kit.kick, bar_start + offset, 0.25, bar_velocity);
                }
                timeline.add_note(TrackId::Drums, kit.snare, bar_start + 3.0, 0.5, snare_vel);
                let hat_density = if profile.build_tension { 0.5 } else { 0.3 };
                for i in 0..16 {
                    if rng.gen::<f64>() < hat_density {
                        let hat = if rng.gen::<f64>() < 0.8 { kit.closed_hh } else { kit.open_hh };
                        timeline.add_note(
                            TrackId::Drums,
                            hat,
                            bar_start + i as f64 * 0.25,
                            0.125,
                            hat_vel - rng.gen_range(0..=5),
                        );
                    }
                }
            }
            RhythmPersonality::PopRock => {
                timeline.add_note(TrackId::Drums, kit.kick, bar_start, 1.0, kick_vel);
                timeline.add_note(TrackId::Drums, kit.snare, bar_start + 1.0, 1.0, snare_vel);
                timeline.add_note(TrackId::Drums, kit.kick, bar_start + 2.0, 1.0, kick_vel);
                timeline.add_note(TrackId::Drums, kit.snare, bar_start + 3.0, 1.0, snare_vel);

                let subdivision = if is_ballad {
                    1.0
                } else if profile.build_tension && bar_idx as f64 >= bars as f64 / 2.0 {
                    0.25
                } else if profile.is_peak_section || profile.rhythmic_density > 1.0 {
                    0.25
                } else {
                    0.5
                };
                let steps = (4.0 / subdivision) as usize;
                let open_period = ((1.0 / subdivision) as usize) * 2;
                for i in 0..steps {
                    if is_ballad && section == SectionType::Verse && rng.gen::<f64>() < 0.6 {
                        continue;
                    }
                    let mut hat = if is_ballad {
                        *[RIDE, kit.closed_hh].choose(rng).unwrap_or(&kit.closed_hh)
                    } else {
                        kit.closed_hh
                    };
                    if profile.build_tension
                        && i % open_period == open_period - 1
                        && rng.gen::<f64>() < 0.3
                    {
                        hat = kit.open_hh;
                    }
                    timeline.add_note(
                        TrackId::Drums,
                        hat,
                        bar_start + i as f64 * subdivision,
                        subdivision,
                        hat_vel,
                    );
                }
            }
        }

        if profile.is_peak_section && bar_idx % 4 == 0 {
            timeline.add_note(TrackId::Drums, CRASH, bar_start, 2.0, (bar_velocity + 15).min(127));
        }

        let bar_end = bar_start + 4.0;
        if profile.fills_enabled && bar_idx == bars - 1 && rng.gen::<f64>() < 0.85 {
            let mut options = vec![
                FillPattern::StandardSnareRoll,
                FillPattern::TomRollSimple,
                FillPattern::KickAndCymbalTransition,
                FillPattern::SyncopatedSnarePop,
            ];
            match personality {
                RhythmPersonality::HipHopGroove => options.push(FillPattern::HipHopStutterSnare),
                RhythmPersonality::EdmPulse => options.push(FillPattern::EdmNoiseSweep),
                RhythmPersonality::PopRock => {
                    if is_ballad {
                        options = vec![
                            FillPattern::SparseTomAccent,
                            FillPattern::KickAndCymbalTransition,
                        ];
                    }
                }
            }
            let fill = *options.choose(rng).unwrap_or(&FillPattern::StandardSnareRoll);
            let fill_vel = (bar_velocity + 10).min(127);
            for &(pitch, offset_from_end, beats) in fill.notes() {
                timeline.add_note(TrackId::Drums, pitch, bar_end - offset_from_end, beats, fill_vel);
            }
            timeline.add_note(TrackId::Drums, CRASH, bar_end - 0.01, 0.5, fill_vel + 5);
        } else if profile.fills_enabled
            && (bar_idx + 1) % 4 == 0
            && bar_idx < bars - 1
            && rng.gen::<f64>() < if is_ballad { 0.15 } else { 0.35 }
        {
            let mut options = vec![FillPattern::SparseTomAccent, FillPattern::SyncopatedSnarePop];
            if personality != RhythmPersonality::EdmPulse {
                options.push(FillPattern::StandardSnareRoll);
            }
            let fill = *options.choose(rng).unwrap_or(&FillPattern::SparseTomAccent);
            // Mid-section fills only occupy the back half of the bar
            for &(pitch, offset_from_end, beats) in fill.notes() {
                if offset_from_end <= 2.0 {
                    timeline.add_note(
                        TrackId::Drums,
                        pitch,
                        bar_end - offset_from_end,
                        beats,
                        bar_velocity,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use rand::SeedableRng;

    fn setup(genre: Genre) -> (ParamSet, Pcg32) {
        let mut config = GenerationConfig::default();
        config.primary_genre = genre;
        let mut rng = Pcg32::seed_from_u64(11);
        let params = ParamSet::resolve(&config, 11, &mut rng);
        (params, rng)
    }

    fn full_profile() -> SectionProfile {
        use crate::sections::{Layer, LayerCategory, LayerIntensity, MelodyStyle};
        SectionProfile {
            velocity_base: 90,
            rhythmic_density: 1.0,
            layers: vec![Layer::new(LayerCategory::Drums, LayerIntensity::Full)],
            fills_enabled: true,
            build_tension: false,
            is_peak_section: true,
            modulate_key: false,
            allow_rhythmic_break: false,
            melody_style: MelodyStyle::Standard,
        }
    }

    #[test]
    fn test_edm_four_on_floor() {
        let (params, mut rng) = setup(Genre::EdmPulse);
        assert_eq!(params.rhythm_personality, RhythmPersonality::EdmPulse);
        let mut timeline = Timeline::new();
        render_drums(&mut timeline, 0.0, 4, SectionType::Chorus, &full_profile(), &params, &mut rng);

        // Kick 36 on every beat of every bar
        for bar in 0..4 {
            for beat in 0..4 {
                let t = (bar * 4 + beat) as f64;
                assert!(
                    timeline
                        .events()
                        .iter()
                        .any(|e| e.pitch == 36 && (e.start_beat - t).abs() < 1e-9),
                    "missing kick at beat {}",
                    t
                );
            }
        }
    }

    #[test]
    fn test_poprock_backbeat() {
        let (params, mut rng) = setup(Genre::ModernPop);
        let mut timeline = Timeline::new();
        let mut profile = full_profile();
        profile.is_peak_section = false;
        render_drums(&mut timeline, 0.0, 2, SectionType::Verse, &profile, &params, &mut rng);

        // Snare 38 on beats 2 and 4
        for t in [1.0, 3.0, 5.0, 7.0] {
            assert!(
                timeline
                    .events()
                    .iter()
                    .any(|e| e.pitch == 38 && (e.start_beat - t).abs() < 1e-9),
                "missing snare at beat {}",
                t
            );
        }
    }

    #[test]
    fn test_peak_section_crashes_every_four_bars() {
        let (params, mut rng) = setup(Genre::ModernPop);
        let mut timeline = Timeline::new();
        let mut profile = full_profile();
        profile.fills_enabled = false;
        render_drums(&mut timeline, 0.0, 8, SectionType::Chorus, &profile, &params, &mut rng);

        for t in [0.0, 16.0] {
            assert!(
                timeline
                    .events()
                    .iter()
                    .any(|e| e.pitch == 49 && (e.start_beat - t).abs() < 1e-9),
                "missing crash at beat {}",
                t
            );
        }
    }

    #[test]
    fn test_hiphop_uses_its_kit_pieces() {
        let (params, mut rng) = setup(Genre::HipHopGroove);
        assert_eq!(params.rhythm_personality, RhythmPersonality::HipHopGroove);
        let mut timeline = Timeline::new();
        let mut profile = full_profile();
        profile.is_peak_section = false;
        profile.fills_enabled = false;
        render_drums(&mut timeline, 0.0, 4, SectionType::Verse, &profile, &params, &mut rng);

        // Kick 35 and snare 40 belong to the hip-hop kit
        assert!(timeline.events().iter().any(|e| e.pitch == 35));
        assert!(timeline.events().iter().any(|e| e.pitch == 40));
        assert!(!timeline.events().iter().any(|e| e.pitch == 36));
    }

    #[test]
    fn test_ballad_sometimes_omits_drums_entirely() {
        let (params, _) = setup(Genre::Ballad);
        let mut omitted = 0;
        for seed in 0..60 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut timeline = Timeline::new();
            render_drums(&mut timeline, 0.0, 4, SectionType::Verse, &full_profile(), &params, &mut rng);
            if timeline.events().is_empty() {
                omitted += 1;
            }
        }
        assert!(omitted > 10 && omitted < 40, "omitted {}", omitted);
    }

    #[test]
    fn test_build_ramp_never_exceeds_cap() {
        let (params, mut rng) = setup(Genre::EdmPulse);
        let mut timeline = Timeline::new();
        let mut profile = full_profile();
        profile.build_tension = true;
        profile.velocity_base = 110;
        render_drums(&mut timeline, 0.0, 8, SectionType::PreChorus, &profile, &params, &mut rng);
        assert!(timeline.events().iter().all(|e| e.velocity <= 127));
    }
}
